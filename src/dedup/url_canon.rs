use url::Url;

const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "source",
];

/// Canonicalises a URL per spec §4.C: lowercase scheme/host, strip fragment, drop trailing
/// slash from the path (except root), strip tracking params, sort the rest.
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut url = Url::parse(&raw.to_lowercase()).ok()?;
    url.set_fragment(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = kept
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment_and_trailing_slash() {
        assert_eq!(
            canonicalize("https://Example.com/Path/#section"),
            Some("https://example.com/path".to_string())
        );
    }

    #[test]
    fn keeps_root_slash() {
        assert_eq!(canonicalize("https://example.com/"), Some("https://example.com/".to_string()));
    }

    #[test]
    fn drops_tracking_params_and_sorts_rest() {
        let out = canonicalize("https://example.com/page?b=2&utm_source=x&a=1").unwrap();
        assert_eq!(out, "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn invalid_url_returns_none() {
        assert_eq!(canonicalize("not a url"), None);
    }
}
