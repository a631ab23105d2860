//! URL classification for asset references.

/// Check whether a URL has a scheme (`https:`, `data:`, `mailto:`).
///
/// A scheme is at least one character of ASCII alphanumerics or `+ - .`
/// before the first colon, with no `/` in between.
#[inline]
pub fn has_scheme(url: &str) -> bool {
    url.find(':').is_some_and(|pos| {
        pos > 0
            && url[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Check whether an asset URL points at this site's own build output.
///
/// Rejects absolute (`scheme:`), protocol-relative (`//host`) and `data:`
/// URLs. With a non-empty `prefix`, the URL must also start with it.
pub fn is_local_url(url: &str, prefix: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.starts_with("//") || has_scheme(url) {
        return false;
    }
    prefix.is_empty() || url.starts_with(prefix)
}

/// Drop the `?query` and `#fragment` parts of a URL path.
#[inline]
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://example.com/app.js"));
        assert!(has_scheme("data:text/css,body{}"));
        assert!(!has_scheme("/assets/index-abc.js"));
        assert!(!has_scheme("assets/a:b.js"));
    }

    #[test]
    fn test_is_local_url() {
        assert!(is_local_url("/assets/index-abc.js", "/assets/"));
        assert!(!is_local_url("/vendor/gtag.js", "/assets/"));
        assert!(is_local_url("/vendor/gtag.js", ""));
        assert!(!is_local_url("https://cdn.example/app.js", ""));
        assert!(!is_local_url("//cdn.example/app.js", ""));
        assert!(!is_local_url("data:text/javascript,1", ""));
        assert!(!is_local_url("  ", ""));
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/about?ref=x#team"), "/about");
        assert_eq!(strip_query("/about#team"), "/about");
        assert_eq!(strip_query("/about"), "/about");
    }
}
