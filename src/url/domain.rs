use url::{Host, Url};

/// Returns the registrable domain (public suffix plus one label) of a URL
///
/// The host is lowercased and a leading `www.` is dropped before the lookup.
/// IP addresses, single-label hosts and hosts that are themselves a public
/// suffix (such as `gov.uk`) fall back to the host. Returns `None` only when
/// the URL has no host.
///
/// Two URLs are on the same site when their registrable domains are equal:
/// `blog.example.com` and `www.example.com` share `example.com`, while
/// `assets.publishing.service.gov.uk` and `www.gov.uk` do not, because
/// `gov.uk` is itself a public suffix.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use leafcutter::url::registrable_domain;
///
/// let url = Url::parse("https://blog.Example.co.uk/post").unwrap();
/// assert_eq!(registrable_domain(&url), Some("example.co.uk".to_string()));
/// ```
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => {
            let host = domain.trim_end_matches('.').to_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);
            let site = psl::domain_str(host).unwrap_or(host);
            Some(site.to_string())
        }
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}
