use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// The URL points at a loopback, private or link-local address.
    #[error("Non-public address not allowed: {0}")]
    NonPublicHost(String),
}

/// Validates a feed endpoint taken from a catalog file.
///
/// Rejects non-HTTP(S) schemes, `localhost`, and literal loopback, private
/// (RFC 1918 / fc00::/7), link-local and unspecified addresses, so a catalog
/// entry cannot aim the fetcher at internal services.
///
/// # Examples
///
/// ```
/// use newsdesk::util::validate_feed_url;
///
/// assert!(validate_feed_url("https://example.com/feed.xml").is_ok());
/// assert!(validate_feed_url("http://localhost/feed").is_err());
/// assert!(validate_feed_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_feed_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = parse_http_url(url_str)?;
    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;

    if host.eq_ignore_ascii_case("localhost") {
        return Err(UrlValidationError::NonPublicHost(host.to_owned()));
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if let Ok(ip) = host_for_parse.parse::<IpAddr>() {
        if is_non_public_ip(&ip) {
            return Err(UrlValidationError::NonPublicHost(ip.to_string()));
        }
    }

    Ok(url)
}

/// Parses an absolute http(s) URL without any host policy.
///
/// Used for article links, which are stored but never fetched.
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn is_non_public_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
