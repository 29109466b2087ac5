//! URL canonicalization used for bookmark matching and URL filtering.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;
use std::net::Ipv4Addr;
use unicode_normalization::UnicodeNormalization;
use url::Url;

/// Bytes left as-is when re-encoding: unreserved and reserved URL characters,
/// plus `%` so existing escapes survive.
const URL_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'%');

/// Second-level labels registered under a country code (`co.uk`, `com.au`).
/// A host under one of these keeps its third-from-last label as the name.
const TWO_LEVEL_SUFFIXES: &[&str] = &[
    "ac.uk", "co.uk", "gov.uk", "ltd.uk", "me.uk", "net.uk", "org.uk", "plc.uk",
    "com.au", "edu.au", "gov.au", "net.au", "org.au",
    "co.nz", "net.nz", "org.nz",
    "co.jp", "ne.jp", "or.jp",
    "co.za", "org.za",
    "com.br", "net.br", "org.br",
    "com.cn", "net.cn", "org.cn",
    "co.in", "net.in", "org.in",
    "co.kr", "or.kr",
    "com.mx", "com.tr", "com.ar", "com.sg", "com.hk", "com.tw",
    "co.il", "co.id", "co.th",
];

/// Adds `https://` when the string carries no scheme.
pub fn with_scheme(raw: &str) -> Cow<'_, str> {
    if raw.contains("://") {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("https://{}", raw))
    }
}

/// Percent-decodes and NFC-normalizes a URL fragment of any kind.
pub fn decode_component(input: &str) -> String {
    percent_decode_str(input)
        .decode_utf8_lossy()
        .nfc()
        .collect()
}

/// Percent-encodes everything except reserved/unreserved URL characters.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URL_SAFE).to_string()
}

/// Lowercased host without `www.`, userinfo or port. `None` when the string
/// does not parse or has no host.
pub fn host_only(raw: &str) -> Option<String> {
    let parsed = Url::parse(&with_scheme(raw.trim())).ok()?;
    host_of(&parsed)
}

fn host_of(parsed: &Url) -> Option<String> {
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Registrable part of a host, via a small exception table instead of the
/// full public suffix list. IP literals are returned unchanged.
///
/// `example.com` -> `example.com`, `news.foo.co.uk` -> `foo.uk`.
pub fn base_domain(host: &str) -> String {
    if host.parse::<Ipv4Addr>().is_ok() || host.starts_with('[') {
        return host.to_string();
    }

    let labels: Vec<&str> = host.split('.').collect();
    let n = labels.len();

    if n >= 3 {
        let suffix = format!("{}.{}", labels[n - 2], labels[n - 1]);
        if TWO_LEVEL_SUFFIXES.contains(&suffix.as_str()) {
            return format!("{}.{}", labels[n - 3], labels[n - 1]);
        }
    }

    if n >= 2 {
        format!("{}.{}", labels[n - 2], labels[n - 1])
    } else {
        host.to_string()
    }
}

/// Comparable forms of one URL. Fragments are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub host: String,
    pub base: String,
    /// Decoded, NFC, without trailing `/`.
    pub path: String,
    /// Decoded, NFC.
    pub query: String,
    /// As stored (percent-encoded), NFC, without trailing `/`.
    pub raw_path: String,
    pub raw_query: String,
}

impl NormalizedUrl {
    /// `None` for strings that do not parse as a URL with a host.
    pub fn parse(raw: &str) -> Option<Self> {
        let parsed = Url::parse(&with_scheme(raw.trim())).ok()?;
        let host = host_of(&parsed)?;
        let base = base_domain(&host);

        let raw_path: String = parsed.path().nfc().collect();
        let raw_path = raw_path.trim_end_matches('/').to_string();
        let raw_query: String = parsed.query().unwrap_or("").nfc().collect();

        let path = decode_component(&raw_path).trim_end_matches('/').to_string();
        let query = decode_component(&raw_query);

        Some(Self {
            host,
            base,
            path,
            query,
            raw_path,
            raw_query,
        })
    }

    /// Same host, path and query under either the decoded or the stored encoding.
    pub fn same_resource(&self, other: &NormalizedUrl) -> bool {
        if self.host != other.host {
            return false;
        }

        let decoded = self.path == other.path && self.query == other.query;
        let encoded = self.raw_path == other.raw_path && self.raw_query == other.raw_query;
        decoded || encoded
    }

    pub fn same_domain(&self, other: &NormalizedUrl) -> bool {
        self.host == other.host || self.base == other.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_domain_cctld_exceptions() {
        assert_eq!(base_domain("foo.co.uk"), "foo.uk");
        assert_eq!(base_domain("bar.com.au"), "bar.au");
        assert_eq!(base_domain("news.bbc.co.uk"), "bbc.uk");
        assert_eq!(base_domain("example.com"), "example.com");
        assert_eq!(base_domain("a.b.example.com"), "example.com");
        assert_eq!(base_domain("co.uk"), "co.uk");
        assert_eq!(base_domain("localhost"), "localhost");
    }

    #[test]
    fn test_base_domain_keeps_ip_literals() {
        assert_eq!(base_domain("192.168.0.1"), "192.168.0.1");
        assert_eq!(base_domain("[::1]"), "[::1]");
    }

    #[test]
    fn test_host_only_strips_noise() {
        assert_eq!(host_only("https://WWW.Example.com/x").as_deref(), Some("example.com"));
        assert_eq!(host_only("example.com/page").as_deref(), Some("example.com"));
        assert_eq!(host_only("https://user@example.com:8080/").as_deref(), Some("example.com"));
        assert_eq!(host_only("http://[::1"), None);
        assert_eq!(host_only("file:///tmp/x"), None);
    }

    #[test]
    fn test_decode_component_nfc() {
        // "o" + combining diaeresis composes to "ö"
        assert_eq!(decode_component("ko\u{0308}ln"), "köln");
        assert_eq!(decode_component("k%C3%B6ln"), "köln");
        assert_eq!(decode_component("a%20b"), "a b");
    }

    #[test]
    fn test_encode_component_keeps_reserved() {
        assert_eq!(encode_component("köln"), "k%C3%B6ln");
        assert_eq!(encode_component("/wiki/a?b=c&d"), "/wiki/a?b=c&d");
        assert_eq!(encode_component("a b"), "a%20b");
        assert_eq!(encode_component("%C3%B6"), "%C3%B6");
    }

    #[test]
    fn test_normalized_url_parts() {
        let url = NormalizedUrl::parse("https://www.Example.com/Wiki/K%C3%B6ln/?q=%C3%A4#frag").unwrap();
        assert_eq!(url.host, "example.com");
        assert_eq!(url.base, "example.com");
        assert_eq!(url.path, "/Wiki/Köln");
        assert_eq!(url.query, "q=ä");
        assert_eq!(url.raw_path, "/Wiki/K%C3%B6ln");
    }

    #[test]
    fn test_same_resource_tolerates_noise() {
        let stored = NormalizedUrl::parse("https://example.com/page").unwrap();
        for target in [
            "https://example.com/page/",
            "http://www.example.com/page",
            "example.com/page",
            "https://example.com/page#section",
        ] {
            let target = NormalizedUrl::parse(target).unwrap();
            assert!(stored.same_resource(&target), "{target:?}");
        }

        let decoded = NormalizedUrl::parse("https://de.wikipedia.org/wiki/Köln").unwrap();
        let encoded = NormalizedUrl::parse("https://de.wikipedia.org/wiki/K%C3%B6ln").unwrap();
        assert!(decoded.same_resource(&encoded));

        let other = NormalizedUrl::parse("https://example.com/other").unwrap();
        assert!(!stored.same_resource(&other));
        assert!(stored.same_domain(&other));
    }

    #[test]
    fn test_malformed_urls_do_not_parse() {
        assert!(NormalizedUrl::parse("").is_none());
        assert!(NormalizedUrl::parse("http://").is_none());
        assert!(NormalizedUrl::parse("https://exa mple.com").is_none());
    }
}
