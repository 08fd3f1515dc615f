//! RSS and Atom link extraction

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Extracts the entry links of an RSS or Atom feed, in document order
///
/// RSS entries contribute the text of `<item><link>`; Atom entries contribute
/// the `href` of their first `<link>` whose `rel` is absent or `alternate`.
/// Element names are matched without namespace prefixes. Entries without a
/// link are skipped with a warning.
///
/// # Examples
///
/// ```
/// use leafcutter::feed::parse_feed;
///
/// let rss = r#"<rss><channel><item><link>https://example.com/a</link></item></channel></rss>"#;
/// assert_eq!(parse_feed(rss).unwrap(), vec!["https://example.com/a"]);
/// ```
pub fn parse_feed(body: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut links = Vec::new();
    let mut in_entry = false;
    let mut in_link = false;
    let mut entry_link: Option<String> = None;
    let mut link_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" | b"entry" => {
                    in_entry = true;
                    entry_link = None;
                }
                b"link" if in_entry => {
                    if let Some(href) = atom_href(&e)? {
                        entry_link.get_or_insert(href);
                    } else {
                        in_link = true;
                        link_text.clear();
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if in_entry && e.local_name().as_ref() == b"link" {
                    if let Some(href) = atom_href(&e)? {
                        entry_link.get_or_insert(href);
                    }
                }
            }
            Event::Text(t) if in_link => link_text.push_str(&t.unescape()?),
            Event::CData(c) if in_link => {
                link_text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"link" if in_link => {
                    in_link = false;
                    let text = link_text.trim();
                    if !text.is_empty() {
                        entry_link.get_or_insert_with(|| text.to_string());
                    }
                }
                b"item" | b"entry" if in_entry => {
                    in_entry = false;
                    match entry_link.take() {
                        Some(link) => links.push(link),
                        None => tracing::warn!("Feed entry without a link skipped"),
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(links)
}

/// Returns the `href` of an Atom link that points at the entry itself
fn atom_href(element: &BytesStart<'_>) -> Result<Option<String>, quick_xml::Error> {
    let mut href = None;
    let mut alternate = true;

    for attr in element.attributes() {
        let attr = attr?;
        match attr.key.local_name().as_ref() {
            b"href" => href = Some(attr.unescape_value()?.trim().to_string()),
            b"rel" => alternate = attr.unescape_value()?.trim() == "alternate",
            _ => {}
        }
    }

    Ok(href.filter(|h| alternate && !h.is_empty()))
}
