//! EPG feed URL construction.

use anyhow::{Context, Result, bail};
use chrono::{Days, Local, NaiveDate};

/// Placeholder replaced by the `DD-MM-YYYY` date in a feed URL template.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Default EPG feed URL template.
pub const DEFAULT_FEED_URL_TEMPLATE: &str = "https://epg.aynaott.com/api/epg/{date}.json";

/// Number of consecutive days fetched per rebuild (today, +1, +2).
pub const FEED_DAYS: u64 = 3;

/// Checks that a feed URL template contains [`DATE_PLACEHOLDER`].
///
/// # Errors
///
/// Returns an error if the placeholder is missing.
pub fn validate_template(template: &str) -> Result<()> {
    if !template.contains(DATE_PLACEHOLDER) {
        bail!("feed URL template must contain {DATE_PLACEHOLDER}: {template}");
    }
    Ok(())
}

/// Builds the feed URLs for `today` and the following days, in ascending
/// date order.
///
/// Example: `today = 2024-03-31` yields dates `31-03-2024`, `01-04-2024`,
/// `02-04-2024`.
///
/// # Errors
///
/// Returns an error if a date overflows the calendar.
pub fn feed_urls(template: &str, today: NaiveDate) -> Result<Vec<String>> {
    (0..FEED_DAYS)
        .map(|offset| {
            let day = today
                .checked_add_days(Days::new(offset))
                .with_context(|| format!("date overflow: {today} + {offset} days"))?;
            Ok(template.replace(DATE_PLACEHOLDER, &day.format("%d-%m-%Y").to_string()))
        })
        .collect()
}

/// Builds the feed URLs starting from the server's local date.
///
/// # Errors
///
/// Returns an error if a date overflows the calendar.
pub fn feed_urls_for_today(template: &str) -> Result<Vec<String>> {
    feed_urls(template, Local::now().date_naive())
}
