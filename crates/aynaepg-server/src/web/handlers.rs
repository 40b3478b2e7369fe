//! Request handlers.

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use aynaepg_api::ayna::feed_urls_for_today;
use aynaepg_guide::build_epg_xml;
use tracing::instrument;

use super::AppState;

/// Body of the `500` response. Upstream details stay in the log.
pub const ERROR_BODY: &str = "Failed to generate EPG";

/// `Content-Type` of the guide.
const XML_CONTENT_TYPE: &str = "application/xml";

/// Serves the XMLTV guide from cache, rebuilding it on a miss.
#[instrument(skip_all)]
pub async fn serve_epg(State(state): State<AppState>) -> Response {
    if let Some(xml) = state.cache.get().await {
        tracing::debug!(bytes = xml.len(), "Serving EPG from cache");
        return xml_response(&state, xml).await;
    }

    match rebuild(&state).await {
        Ok(xml) => {
            let xml = Bytes::from(xml);
            state.cache.set(xml.clone()).await;
            tracing::info!(bytes = xml.len(), "EPG rebuilt and cached");
            xml_response(&state, xml).await
        }
        Err(e) => {
            tracing::error!(error = ?e, "Failed to build EPG");
            (StatusCode::INTERNAL_SERVER_ERROR, ERROR_BODY).into_response()
        }
    }
}

/// Runs the full upstream pipeline for today's feeds.
async fn rebuild(state: &AppState) -> Result<String> {
    let urls = feed_urls_for_today(&state.feed_url_template)?;
    build_epg_xml(state.client.as_ref(), &urls).await
}

/// `200` response carrying the document.
///
/// The body shares the cached buffer; nothing is copied.
async fn xml_response(state: &AppState, xml: Bytes) -> Response {
    let max_age = state.cache.expires_in().await.map_or(0, |d| d.as_secs());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, String::from(XML_CONTENT_TYPE)),
            (header::CACHE_CONTROL, format!("public, max-age={max_age}")),
        ],
        xml,
    )
        .into_response()
}
