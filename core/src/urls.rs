use crate::UrlParts;
use anyhow::Result;
use percent_encoding::percent_decode_str;
use url::Url;

/// Split a URL into scheme, host and path. The host keeps its port when one
/// is present, matching how per-host folders and politeness state are keyed.
pub fn url_parts(link: &str) -> Result<UrlParts> {
    let url = Url::parse(link)?;
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    Ok(UrlParts {
        scheme: url.scheme().to_string(),
        host,
        path: url.path().to_string(),
    })
}

/// `scheme://host`, the base that root-relative links resolve against.
pub fn base_url(parts: &UrlParts) -> String {
    format!("{}://{}", parts.scheme, parts.host)
}

/// Percent-decode a link once. Fails when the escapes are not valid UTF-8.
pub fn percent_decode(link: &str) -> Result<String> {
    Ok(percent_decode_str(link).decode_utf8()?.into_owned())
}

/// Canonicalize a raw href discovered on a page into an enqueueable URL.
/// Returns `None` for hrefs that are never crawlable: empty strings,
/// fragments, bare queries and escapes that do not decode to UTF-8.
/// Root-relative hrefs resolve against `base` (`scheme://host`); anything
/// else passes through untouched and relies on the scheme gate downstream.
pub fn canonicalize_child(href: &str, base: &str) -> Option<String> {
    if href.is_empty() {
        return None;
    }
    if href.starts_with('#') || href.starts_with('?') {
        return None;
    }
    let decoded = percent_decode(href).ok()?;
    if decoded.starts_with('/') {
        return Some(format!("{base}{decoded}"));
    }
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_scheme_host_path() {
        let parts = url_parts("https://example.com/a/b?q=1").unwrap();
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.path, "/a/b");
    }

    #[test]
    fn host_keeps_port() {
        let parts = url_parts("http://example.com:8080/x").unwrap();
        assert_eq!(parts.host, "example.com:8080");
        assert_eq!(base_url(&parts), "http://example.com:8080");
    }

    #[test]
    fn rejects_garbage() {
        assert!(url_parts("not a url").is_err());
    }

    #[test]
    fn drops_empty_fragment_and_query_hrefs() {
        assert_eq!(canonicalize_child("", "https://h"), None);
        assert_eq!(canonicalize_child("#frag", "https://h"), None);
        assert_eq!(canonicalize_child("?q=1", "https://h"), None);
    }

    #[test]
    fn resolves_root_relative_against_base() {
        assert_eq!(
            canonicalize_child("/x", "https://h").as_deref(),
            Some("https://h/x")
        );
    }

    #[test]
    fn absolute_href_unchanged() {
        assert_eq!(
            canonicalize_child("https://other.example/y", "https://h").as_deref(),
            Some("https://other.example/y")
        );
    }

    #[test]
    fn decodes_percent_escapes_once() {
        assert_eq!(
            canonicalize_child("/a%20b", "https://h").as_deref(),
            Some("https://h/a b")
        );
        // double-encoded input decodes a single level
        assert_eq!(percent_decode("a%2520b").unwrap(), "a%20b");
    }

    #[test]
    fn drops_non_utf8_escapes() {
        assert_eq!(canonicalize_child("/%FF%FE", "https://h"), None);
    }
}
