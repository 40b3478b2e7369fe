//! XMLTV document serialization.

use std::borrow::Cow;

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::merge::{EpgDocument, MergedChannel, MergedProgramme};

/// `generator-info-name` attribute of the root element.
pub const GENERATOR_NAME: &str = "aynaepg";

/// Language tag for programme titles and descriptions.
pub const PROGRAMME_LANG: &str = "bn";

/// Indentation width in spaces.
const INDENT_SIZE: usize = 2;

type XmlWriter = Writer<Vec<u8>>;

/// Whether `c` matches the XML 1.0 `Char` production.
const fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}'
            | '\u{A}'
            | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Removes characters that may not appear in an XML 1.0 document.
///
/// Applied to every upstream-supplied text and attribute value.
fn xml_safe(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_xml_char) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

/// Writes one event, attaching the element name to any error.
fn write_event(writer: &mut XmlWriter, event: Event<'_>, element: &str) -> Result<()> {
    writer
        .write_event(event)
        .with_context(|| format!("failed to write <{element}>"))
}

/// Writes `<name attrs...>text</name>`.
fn write_text_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    for &(key, value) in attributes {
        start.push_attribute((key, xml_safe(value).as_ref()));
    }
    write_event(writer, Event::Start(start), name)?;
    write_event(writer, Event::Text(BytesText::new(&xml_safe(text))), name)?;
    write_event(writer, Event::End(BytesEnd::new(name)), name)
}

fn write_channel(writer: &mut XmlWriter, channel: &MergedChannel) -> Result<()> {
    let mut start = BytesStart::new("channel");
    start.push_attribute(("id", xml_safe(&channel.id).as_ref()));
    write_event(writer, Event::Start(start), "channel")?;

    write_text_element(writer, "display-name", &[], &channel.display_name)?;
    if let Some(ref category) = channel.category {
        write_text_element(writer, "category", &[], category)?;
    }
    if let Some(ref logo_url) = channel.logo_url {
        let mut icon = BytesStart::new("icon");
        icon.push_attribute(("src", xml_safe(logo_url).as_ref()));
        write_event(writer, Event::Empty(icon), "icon")?;
    }

    write_event(writer, Event::End(BytesEnd::new("channel")), "channel")
}

fn write_programme(writer: &mut XmlWriter, programme: &MergedProgramme) -> Result<()> {
    let mut start = BytesStart::new("programme");
    start.push_attribute(("start", programme.start.as_str()));
    start.push_attribute(("stop", programme.stop.as_str()));
    start.push_attribute(("channel", xml_safe(&programme.channel_id).as_ref()));
    write_event(writer, Event::Start(start), "programme")?;

    let lang = [("lang", PROGRAMME_LANG)];
    write_text_element(writer, "title", &lang, &programme.title)?;
    write_text_element(writer, "desc", &lang, &programme.description)?;

    write_event(writer, Event::End(BytesEnd::new("programme")), "programme")
}

/// Serializes a merged guide as an indented, UTF-8 XMLTV document.
///
/// All `<channel>` elements precede all `<programme>` elements.
///
/// # Errors
///
/// Returns an error if writing an element fails or the output is not UTF-8.
pub fn write_document(doc: &EpgDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        "?xml",
    )?;

    let mut tv = BytesStart::new("tv");
    tv.push_attribute(("generator-info-name", GENERATOR_NAME));
    write_event(&mut writer, Event::Start(tv), "tv")?;

    for channel in &doc.channels {
        write_channel(&mut writer, channel)
            .with_context(|| format!("failed to write channel {}", channel.id))?;
    }
    for programme in &doc.programmes {
        let channel_id = &programme.channel_id;
        write_programme(&mut writer, programme)
            .with_context(|| format!("failed to write programme on {channel_id}"))?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("tv")), "tv")?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).context("XMLTV output is not valid UTF-8")
}
