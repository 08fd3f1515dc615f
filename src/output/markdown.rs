//! Markdown rendering of extracted pages
//!
//! A saved page has the shape:
//!
//! ```text
//! Source: <url>
//!
//! # <title>
//!
//! <lead paragraph>
//!
//! ---
//!
//! From:
//! <author>
//!
//! Published:
//! <date>
//!
//! ---
//!
//! <content as Markdown>
//!
//! ## Documents
//!
//! - [<link text>](<url>)
//! ```
//!
//! Sections whose data is missing are left out.

use crate::crawler::ExtractionResult;
use url::Url;

/// Renders an extracted page as a Markdown document
pub fn render_page(url: &Url, extraction: &ExtractionResult) -> String {
    let metadata = &extraction.metadata;
    let mut md = String::new();

    md.push_str(&format!("Source: {}\n\n", url));

    if let Some(title) = &metadata.title {
        md.push_str(&format!("# {}\n\n", title));
    }

    if let Some(lead) = &metadata.lead_paragraph {
        md.push_str(&format!("{}\n\n", lead));
    }

    let mut items = Vec::new();
    if let Some(author) = &metadata.author {
        items.push(format!("From:\n{}\n", author));
    }
    if let Some(published) = &metadata.published_date {
        items.push(format!("Published:\n{}\n", published));
    }
    if !items.is_empty() {
        md.push_str("---\n\n");
        md.push_str(&items.join("\n"));
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(html2md::parse_html(extraction.content.html()).trim());
    md.push('\n');

    if !extraction.document_links.is_empty() {
        md.push_str("\n## Documents\n\n");
        for link in &extraction.document_links {
            md.push_str(&format!("- [{}]({})\n", link.text, link.url));
        }
    }

    md
}
