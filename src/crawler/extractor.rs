//! Content extractor
//!
//! Locates the main content region of a fetched page and its metadata using
//! ordered selector chains, and splits the links inside the content region
//! into downloadable documents and crawl candidates.
//!
//! Extraction of a fetched page never fails. Anything that could not be found
//! is reported as a [`Degradation`] instead.

use crate::config::SelectorConfig;
use crate::url::{is_document_link, normalize_parsed, LinkOrigin};
use crate::ConfigError;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Ordered list of selectors where the first match wins
#[derive(Debug, Clone)]
pub struct SelectorChain {
    selectors: Vec<(String, Selector)>,
}

impl SelectorChain {
    /// Compiles a chain; fails on the first selector that does not parse
    pub fn parse<S: AsRef<str>>(selectors: &[S]) -> Result<Self, ConfigError> {
        let selectors = selectors
            .iter()
            .map(|s| {
                let s = s.as_ref();
                compile(s).map(|selector| (s.to_string(), selector))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { selectors })
    }

    /// Returns the first element, in chain order, that has non-blank text
    ///
    /// Later selectors are only tried when every earlier one found nothing
    /// usable.
    pub fn first_match<'a>(&self, scope: ElementRef<'a>) -> Option<(&str, ElementRef<'a>)> {
        self.selectors.iter().find_map(|(source, selector)| {
            scope
                .select(selector)
                .find(|element| !element_text(element).is_empty())
                .map(|element| (source.as_str(), element))
        })
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// The region of the page treated as primary content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRegion {
    /// A selector from the content chain matched
    Matched { selector: String, html: String },
    /// No selector matched; the whole body is used
    WholeBody { html: String },
}

impl ContentRegion {
    pub fn html(&self) -> &str {
        match self {
            Self::Matched { html, .. } | Self::WholeBody { html } => html,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::WholeBody { .. })
    }
}

/// Best-effort page metadata; absent fields stay `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub lead_paragraph: Option<String>,
    pub author: Option<String>,
    /// Published date exactly as shown on the page
    pub published_date: Option<String>,
    /// Calendar date parsed from `published_date`, used as file name prefix
    pub published_on: Option<NaiveDate>,
}

/// Something the extractor had to fall back on or leave out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Degradation {
    /// No content selector matched; the whole body was used
    WholeBody,
    /// A metadata field was not found by any selector in its chain
    MissingField(&'static str),
    /// A published date was found but could not be parsed
    UnparsedDate,
}

/// A downloadable document linked from the content region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub url: Url,
    /// Anchor text, or the URL when the anchor has none
    pub text: String,
}

/// A link that may be crawled, as written in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub href: String,
    pub origin: LinkOrigin,
}

/// Everything extracted from one page
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub content: ContentRegion,
    pub metadata: PageMetadata,
    pub document_links: Vec<DocumentLink>,
    pub candidate_links: Vec<CandidateLink>,
    pub degraded: Vec<Degradation>,
}

impl ExtractionResult {
    pub fn is_degraded(&self) -> bool {
        self.content.is_fallback()
    }
}

/// Compiled selector configuration
#[derive(Debug, Clone)]
pub struct Extractor {
    title: SelectorChain,
    content: SelectorChain,
    lead_paragraph: SelectorChain,
    metadata: SelectorChain,
    attachment: SelectorChain,
    attachment_link: Selector,
    anchor: Selector,
    body: Selector,
    term: Selector,
}

impl Extractor {
    /// Compiles every selector chain in `config`
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: SelectorChain::parse(&config.title)?,
            content: SelectorChain::parse(&config.content)?,
            lead_paragraph: SelectorChain::parse(&config.lead_paragraph)?,
            metadata: SelectorChain::parse(&config.metadata)?,
            attachment: SelectorChain::parse(&config.attachment)?,
            attachment_link: compile(&config.attachment_link)?,
            anchor: compile("a[href]")?,
            body: compile("body")?,
            term: compile("dt")?,
        })
    }

    /// Extracts content region, metadata and links from `html`
    ///
    /// Relative links are resolved against `source`.
    pub fn extract(&self, html: &str, source: &Url) -> ExtractionResult {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut degraded = Vec::new();

        let metadata = self.extract_metadata(root, &mut degraded);

        let (content, region_element) = match self.content.first_match(root) {
            Some((selector, element)) => {
                tracing::trace!("Content region of {} matched {}", source, selector);
                (
                    ContentRegion::Matched {
                        selector: selector.to_string(),
                        html: element.html(),
                    },
                    element,
                )
            }
            None => {
                tracing::debug!("No content selector matched for {}, using whole body", source);
                degraded.push(Degradation::WholeBody);
                let body = root.select(&self.body).next().unwrap_or(root);
                (ContentRegion::WholeBody { html: body.html() }, body)
            }
        };

        let (document_links, candidate_links) = self.extract_links(region_element, source);

        ExtractionResult {
            content,
            metadata,
            document_links,
            candidate_links,
            degraded,
        }
    }

    fn extract_metadata(&self, root: ElementRef<'_>, degraded: &mut Vec<Degradation>) -> PageMetadata {
        let mut metadata = PageMetadata {
            title: self
                .title
                .first_match(root)
                .map(|(_, element)| element_text(&element)),
            lead_paragraph: self
                .lead_paragraph
                .first_match(root)
                .map(|(_, element)| element_text(&element)),
            ..PageMetadata::default()
        };

        if let Some((_, block)) = self.metadata.first_match(root) {
            metadata.author = self.definition_for(block, "From:");
            metadata.published_date = self.definition_for(block, "Published");
        }

        if let Some(published) = &metadata.published_date {
            metadata.published_on = parse_published_date(published);
            if metadata.published_on.is_none() {
                tracing::warn!("Could not parse published date '{}'", published);
                degraded.push(Degradation::UnparsedDate);
            }
        }

        for (field, present) in [
            ("title", metadata.title.is_some()),
            ("lead_paragraph", metadata.lead_paragraph.is_some()),
            ("author", metadata.author.is_some()),
            ("published_date", metadata.published_date.is_some()),
        ] {
            if !present {
                degraded.push(Degradation::MissingField(field));
            }
        }

        metadata
    }

    /// Text of the `<dd>` that follows the first `<dt>` containing `term`
    fn definition_for(&self, block: ElementRef<'_>, term: &str) -> Option<String> {
        let dt = block
            .select(&self.term)
            .find(|dt| element_text(dt).contains(term))?;

        dt.next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|sibling| sibling.value().name() == "dd")
            .map(|dd| element_text(&dd))
            .filter(|text| !text.is_empty())
    }

    fn extract_links(
        &self,
        region: ElementRef<'_>,
        source: &Url,
    ) -> (Vec<DocumentLink>, Vec<CandidateLink>) {
        let mut documents = Vec::new();
        let mut candidates = Vec::new();
        let mut seen_documents = HashSet::new();
        let mut seen_candidates = HashSet::new();

        for anchor in region.select(&self.anchor) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() {
                continue;
            }

            let origin = if self.in_attachment(anchor) {
                LinkOrigin::Attachment
            } else {
                LinkOrigin::Content
            };

            let document_url = source
                .join(href)
                .ok()
                .filter(|url| is_document_link(url, origin))
                .and_then(|url| normalize_parsed(url).ok());

            match document_url {
                Some(url) => {
                    if seen_documents.insert(url.to_string()) {
                        let text = element_text(&anchor);
                        let text = if text.is_empty() { url.to_string() } else { text };
                        documents.push(DocumentLink { url, text });
                    }
                }
                None => {
                    if seen_candidates.insert(href.to_string()) {
                        candidates.push(CandidateLink {
                            href: href.to_string(),
                            origin,
                        });
                    }
                }
            }
        }

        (documents, candidates)
    }

    fn in_attachment(&self, anchor: ElementRef<'_>) -> bool {
        if self.attachment_link.matches(&anchor) {
            return true;
        }

        anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| {
                self.attachment
                    .selectors
                    .iter()
                    .any(|(_, selector)| selector.matches(&ancestor))
            })
    }
}

/// Parses dates like `28 March 2025` or `28 March 2025 at 9:30am`
pub fn parse_published_date(text: &str) -> Option<NaiveDate> {
    let date_part = text.split(" at ").next().unwrap_or(text).trim();
    NaiveDate::parse_from_str(date_part, "%d %B %Y").ok()
}

/// Visible text of an element with whitespace collapsed
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
