//! Path normalization and extension handling.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Sentinel extension reported when extension parsing is on but the path
/// carries none.
pub const DEFAULT_EXTENSION: &str = "html";

static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([0-9a-zA-Z]*)$").expect("static regex"));
static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z\-]+://").expect("static regex"));

/// Normalize a request path for comparison.
///
/// - Collapses consecutive slashes (`//` -> `/`)
/// - Strips trailing slash (but keeps root `/`)
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    let mut prev_slash = false;

    if !path.starts_with('/') {
        normalized.push('/');
        prev_slash = true;
    }
    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                normalized.push('/');
            }
            prev_slash = true;
        } else {
            normalized.push(ch);
            prev_slash = false;
        }
    }

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Collapse duplicate slashes, leaving a trailing slash in place.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Returns true for `scheme://...` URLs.
pub fn has_scheme(url: &str) -> bool {
    SCHEME.is_match(url)
}

/// Strip the request base from a URL and normalize what remains.
///
/// Absolute (`scheme://`) URLs are returned unchanged.
pub fn strip_base(url: &str, base: &str) -> String {
    if has_scheme(url) {
        return url.to_string();
    }
    let rest = if base.is_empty() {
        url
    } else {
        url.strip_prefix(base).unwrap_or(url)
    };
    normalize_path(rest)
}

/// Split a trailing `.ext` off a path.
///
/// When `whitelist` is non-empty only listed extensions (case-insensitive)
/// are stripped. Returns the remaining path and the extension, which is
/// [`DEFAULT_EXTENSION`] when nothing was stripped.
pub fn parse_extension(path: &str, whitelist: &[String]) -> (String, String) {
    let found = EXTENSION
        .captures(path)
        .and_then(|caps| Some((caps.get(0)?.start(), caps.get(1)?.as_str())));

    if let Some((start, ext)) = found {
        let allowed =
            whitelist.is_empty() || whitelist.iter().any(|w| w.eq_ignore_ascii_case(ext));
        if allowed {
            let ext = if ext.is_empty() {
                DEFAULT_EXTENSION.to_string()
            } else {
                ext.to_string()
            };
            return (path[..start].to_string(), ext);
        }
    }
    (path.to_string(), DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slashes() {
        assert_eq!(normalize_path("/posts//view/"), "/posts/view");
        assert_eq!(normalize_path("posts"), "/posts");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn collapse_keeps_trailing() {
        assert_eq!(collapse_slashes("//posts//"), "/posts/");
    }

    #[test]
    fn strips_base() {
        assert_eq!(strip_base("/app/posts/view/", "/app"), "/posts/view");
        assert_eq!(strip_base("/app", "/app"), "/");
        assert_eq!(strip_base("http://example.com/x", "/app"), "http://example.com/x");
    }

    #[test]
    fn extension_without_whitelist() {
        assert_eq!(
            parse_extension("/posts/view/5.json", &[]),
            ("/posts/view/5".to_string(), "json".to_string())
        );
        assert_eq!(
            parse_extension("/posts", &[]),
            ("/posts".to_string(), "html".to_string())
        );
    }

    #[test]
    fn extension_whitelist_is_case_insensitive() {
        let list = vec!["rss".to_string()];
        assert_eq!(
            parse_extension("/posts.RSS", &list),
            ("/posts".to_string(), "RSS".to_string())
        );
        assert_eq!(
            parse_extension("/posts.json", &list),
            ("/posts.json".to_string(), "html".to_string())
        );
    }
}
