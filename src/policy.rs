//! URL policy
//!
//! Normalization and the same-origin gate that keeps autonomous navigation
//! on the target application's own domain.

use url::Url;

/// URL normalization and origin checks
pub struct UrlPolicy;

impl UrlPolicy {
    /// Normalize a URL to its canonical string form with the fragment stripped.
    ///
    /// Fragment-only differences collapse to the same normalized value, which
    /// is what makes the visited-set an effective loop guard. Returns `None`
    /// for URLs that do not parse; callers skip such candidates rather than
    /// treating the failure as fatal.
    pub fn normalize(url: &str) -> Option<String> {
        let mut parsed = Url::parse(url).ok()?;
        parsed.set_fragment(None);
        Some(parsed.to_string())
    }

    /// Resolve an href (possibly relative) against the current page URL,
    /// then normalize the result.
    pub fn resolve(base: &str, href: &str) -> Option<String> {
        let mut resolved = Url::parse(base).ok()?.join(href).ok()?;
        resolved.set_fragment(None);
        Some(resolved.to_string())
    }

    /// Whether a navigation target stays within the current application.
    ///
    /// Path-relative references (`/foo`) are always same-origin. Otherwise the
    /// target's hostname must equal the current URL's hostname. Malformed URLs
    /// resolve to false.
    pub fn is_same_origin(target: &str, current: &str) -> bool {
        if target.starts_with('/') {
            return true;
        }
        match (Url::parse(target), Url::parse(current)) {
            (Ok(t), Ok(c)) => match (t.host_str(), c.host_str()) {
                (Some(th), Some(ch)) => th == ch,
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_fragment() {
        let normalized = UrlPolicy::normalize("https://example.test/page#section").unwrap();
        assert_eq!(normalized, "https://example.test/page");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = UrlPolicy::normalize("https://example.test/a/b?q=1#frag").unwrap();
        let twice = UrlPolicy::normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fragment_only_difference_collapses() {
        let a = UrlPolicy::normalize("https://example.test/docs#intro").unwrap();
        let b = UrlPolicy::normalize("https://example.test/docs#usage").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert!(UrlPolicy::normalize("not a url").is_none());
        assert!(UrlPolicy::normalize("").is_none());
    }

    #[test]
    fn test_resolve_relative_href() {
        let resolved = UrlPolicy::resolve("https://example.test/docs/", "../about").unwrap();
        assert_eq!(resolved, "https://example.test/about");

        let resolved = UrlPolicy::resolve("https://example.test/", "/contact#top").unwrap();
        assert_eq!(resolved, "https://example.test/contact");
    }

    #[test]
    fn test_resolve_absolute_href() {
        let resolved =
            UrlPolicy::resolve("https://example.test/", "https://other.test/p").unwrap();
        assert_eq!(resolved, "https://other.test/p");
    }

    #[test]
    fn test_path_relative_is_always_same_origin() {
        assert!(UrlPolicy::is_same_origin("/foo", "https://example.test/"));
        assert!(UrlPolicy::is_same_origin("/foo", "https://anything.else/"));
    }

    #[test]
    fn test_same_hostname_is_same_origin() {
        assert!(UrlPolicy::is_same_origin(
            "https://example.test/other",
            "https://example.test/start"
        ));
    }

    #[test]
    fn test_different_hostname_is_not_same_origin() {
        assert!(!UrlPolicy::is_same_origin(
            "https://evil.test/",
            "https://example.test/"
        ));
    }

    #[test]
    fn test_malformed_urls_are_not_same_origin() {
        assert!(!UrlPolicy::is_same_origin("%%%", "https://example.test/"));
        assert!(!UrlPolicy::is_same_origin("https://example.test/", "%%%"));
    }
}
