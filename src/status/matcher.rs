use super::normalize::NormalizedUrl;
use serde::Serialize;

/// How well a target URL is covered by the bookmark set.
/// Ordered so that `Full > Domain > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    None,
    Domain,
    Full,
}

/// Compares two URL strings. Unparseable input on either side is `None`.
pub fn match_urls(stored: &str, target: &str) -> MatchKind {
    match (NormalizedUrl::parse(stored), NormalizedUrl::parse(target)) {
        (Some(stored), Some(target)) => match_normalized(&stored, &target),
        _ => MatchKind::None,
    }
}

pub fn match_normalized(stored: &NormalizedUrl, target: &NormalizedUrl) -> MatchKind {
    if stored.same_resource(target) {
        MatchKind::Full
    } else if stored.same_domain(target) {
        MatchKind::Domain
    } else {
        MatchKind::None
    }
}

/// Best match of `target` against every candidate, stopping at the first full match.
pub fn best_match<'a, I>(target: &str, candidates: I) -> MatchKind
where
    I: IntoIterator<Item = &'a str>,
{
    let Some(target) = NormalizedUrl::parse(target) else {
        return MatchKind::None;
    };

    let mut best = MatchKind::None;
    for candidate in candidates {
        let Some(candidate) = NormalizedUrl::parse(candidate) else {
            continue;
        };
        best = best.max(match_normalized(&candidate, &target));
        if best == MatchKind::Full {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_full_match() {
        assert_eq!(
            match_urls("https://example.com/page", "https://example.com/page/"),
            MatchKind::Full
        );
    }

    #[test]
    fn test_subdomain_is_domain_match() {
        assert_eq!(
            match_urls("https://sub.example.com", "https://example.com/other"),
            MatchKind::Domain
        );
    }

    #[test]
    fn test_cctld_domain_match() {
        assert_eq!(
            match_urls("https://news.bbc.co.uk/a", "https://www.bbc.co.uk/b"),
            MatchKind::Domain
        );
        assert_eq!(
            match_urls("https://bbc.co.uk/a", "https://itv.co.uk/a"),
            MatchKind::None
        );
    }

    #[test]
    fn test_query_must_match_for_full() {
        assert_eq!(
            match_urls("https://a.com/s?q=1", "https://a.com/s?q=2"),
            MatchKind::Domain
        );
        assert_eq!(
            match_urls("https://a.com/s?q=%C3%A4", "https://a.com/s?q=ä"),
            MatchKind::Full
        );
    }

    #[test]
    fn test_malformed_is_no_match() {
        assert_eq!(match_urls("not a url at all", "https://a.com"), MatchKind::None);
        assert_eq!(match_urls("https://a.com", "http://"), MatchKind::None);
    }

    #[test]
    fn test_best_match_prefers_full() {
        let stored = [
            "https://example.com/else",
            "garbage ::",
            "https://example.com/page",
        ];
        assert_eq!(best_match("https://example.com/page/", stored), MatchKind::Full);
        assert_eq!(best_match("https://example.com/none", stored), MatchKind::Domain);
        assert_eq!(best_match("https://other.org", stored), MatchKind::None);
        assert_eq!(best_match("https://other.org", []), MatchKind::None);
    }

    #[test]
    fn test_ordering() {
        assert!(MatchKind::Full > MatchKind::Domain);
        assert!(MatchKind::Domain > MatchKind::None);
    }
}
