//! Link normalization.
//!
//! Article anchors are frequently relative (`/2025/05/06/slug`, `post.html`).
//! They are made absolute by prefixing the origin of the page they were found
//! on. This is a plain prefix rather than full RFC 3986 resolution: a relative
//! path is always taken from the site root, never from the page's directory.

use url::Url;

/// `true` if `href` starts with an `http://` or `https://` scheme.
fn has_http_scheme(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve `href` against the origin of `page_url`.
///
/// - Absolute `http(s)` hrefs are returned unchanged.
/// - Protocol-relative hrefs (`//cdn.example.com/x`) take the page's scheme.
/// - Anything else is joined to the page origin with exactly one `/`.
///
/// The result is not validated; if `page_url` itself cannot be parsed the
/// href is passed through untouched.
pub fn normalize(href: &str, page_url: &str) -> String {
    if has_http_scheme(href) {
        return href.to_string();
    }
    let Ok(page) = Url::parse(page_url) else {
        return href.to_string();
    };

    if let Some(rest) = href.strip_prefix("//") {
        return format!("{}://{}", page.scheme(), rest);
    }

    let origin = page.origin().ascii_serialization();
    if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}
