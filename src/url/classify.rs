//! Link classification
//!
//! Decides what happens to every link discovered inside a page's content
//! region: crawl it, download it as a document, or drop it.

use crate::url::domain::registrable_domain;
use crate::url::normalize::normalize_parsed;
use std::fmt;
use url::Url;

/// Suffixes of downloadable, non-HTML documents
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "csv", "zip",
    "epub",
];

/// Suffixes that are neither crawlable pages nor documents worth keeping
const NON_HTML_EXTENSIONS: &[&str] = &[
    "xml", "json", "rss", "atom", "css", "js", "ico", "jpg", "jpeg", "png", "gif", "svg", "webp",
    "mp3", "mp4", "webm",
];

/// Suffixes of server-rendered pages; never treated as documents
const WEB_PAGE_EXTENSIONS: &[&str] = &["html", "htm", "php", "asp", "aspx"];

/// Where in the content region a link was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    /// Ordinary anchor inside the content region
    Content,
    /// Anchor inside a designated attachments block
    Attachment,
}

/// Run-level scoping policy applied to discovered links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkScope {
    /// Whether link following is enabled at all
    pub crawl_enabled: bool,
    /// Only admit links on the same domain as the page they were found on
    pub same_domain_only: bool,
}

/// Outcome of classifying one discovered link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Candidate crawl target (still subject to depth gating and claiming)
    AdmitForCrawl(Url),
    /// Downloadable document; fetched once, never crawled
    FetchAsDocument(Url),
    /// Dropped
    Reject(RejectReason),
}

/// Why a link was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Could not be resolved to an absolute http(s) URL with a host
    Malformed,
    /// Crawling is disabled for this run
    CrawlDisabled,
    /// Different domain while same-domain scoping is on
    OffDomain,
    /// Not http or https
    UnsupportedScheme,
    /// Points at a non-HTML resource that is not a document
    NotHtml,
    /// Anchor to a fragment of the page it was found on
    Fragment,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Malformed => "malformed",
            Self::CrawlDisabled => "crawl_disabled",
            Self::OffDomain => "off_domain",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::NotHtml => "not_html",
            Self::Fragment => "fragment",
        };
        f.write_str(reason)
    }
}

/// Classifies a discovered link
///
/// # Rules (in order)
///
/// 1. Resolve against the source page; failure → `Reject(Malformed)`
/// 2. http(s) document suffix, or found in an attachments block and not an
///    obvious web page → `FetchAsDocument`, regardless of scoping
/// 3. Crawling disabled → `Reject(CrawlDisabled)`
/// 4. Same-domain scoping and a different registrable domain → `Reject(OffDomain)`
/// 5. Scheme other than http/https → `Reject(UnsupportedScheme)`
/// 6. Non-HTML suffix → `Reject(NotHtml)`; same-page anchor → `Reject(Fragment)`
/// 7. Otherwise → `AdmitForCrawl` with the normalized URL
///
/// # Examples
///
/// ```
/// use leafcutter::url::{classify, Classification, LinkOrigin, LinkScope};
/// use url::Url;
///
/// let page = Url::parse("https://www.gov.uk/guidance/a").unwrap();
/// let scope = LinkScope { crawl_enabled: false, same_domain_only: false };
///
/// let doc = classify("/files/report.pdf", &page, LinkOrigin::Content, &scope);
/// assert!(matches!(doc, Classification::FetchAsDocument(_)));
///
/// let link = classify("/guidance/b", &page, LinkOrigin::Content, &scope);
/// assert!(matches!(link, Classification::Reject(_)));
/// ```
pub fn classify(
    candidate: &str,
    source: &Url,
    origin: LinkOrigin,
    scope: &LinkScope,
) -> Classification {
    let site = registrable_domain(source).unwrap_or_default();
    classify_on_site(candidate, source, &site, origin, scope)
}

/// Classifies a link found on a page whose registrable domain is `site`
///
/// Same as [`classify`], for callers that already know the source page's
/// domain and classify many links from it.
pub fn classify_on_site(
    candidate: &str,
    source: &Url,
    site: &str,
    origin: LinkOrigin,
    scope: &LinkScope,
) -> Classification {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Classification::Reject(RejectReason::Malformed);
    }

    let resolved = match source.join(candidate) {
        Ok(url) => url,
        Err(_) => return Classification::Reject(RejectReason::Malformed),
    };

    if is_document_link(&resolved, origin) {
        return match normalize_parsed(resolved) {
            Ok(url) => Classification::FetchAsDocument(url),
            Err(_) => Classification::Reject(RejectReason::Malformed),
        };
    }

    if !scope.crawl_enabled {
        return Classification::Reject(RejectReason::CrawlDisabled);
    }

    if scope.same_domain_only && registrable_domain(&resolved).as_deref() != Some(site) {
        return Classification::Reject(RejectReason::OffDomain);
    }

    if !is_http(&resolved) {
        return Classification::Reject(RejectReason::UnsupportedScheme);
    }

    if extension_in(&resolved, NON_HTML_EXTENSIONS) {
        return Classification::Reject(RejectReason::NotHtml);
    }

    if resolved.fragment().is_some() && same_page(&resolved, source) {
        return Classification::Reject(RejectReason::Fragment);
    }

    match normalize_parsed(resolved) {
        Ok(url) => Classification::AdmitForCrawl(url),
        Err(_) => Classification::Reject(RejectReason::Malformed),
    }
}

/// Document test shared with the content extractor
///
/// A link is a document when it is an http(s) URL whose path ends in a known
/// document suffix, or when it sits in an attachments block and does not
/// look like a web page.
pub fn is_document_link(url: &Url, origin: LinkOrigin) -> bool {
    if !is_http(url) {
        return false;
    }

    if extension_in(url, DOCUMENT_EXTENSIONS) {
        return true;
    }

    origin == LinkOrigin::Attachment && !extension_in(url, WEB_PAGE_EXTENSIONS)
}

/// Returns the lowercase suffix of the last path segment, if any
pub fn path_extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn extension_in(url: &Url, list: &[&str]) -> bool {
    path_extension(url)
        .map(|ext| list.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}
