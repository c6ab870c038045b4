use url::Url;

/// Resolve an avatar `src` to an absolute URL.
///
/// Protocol-relative references get `https:`, root-relative ones are joined
/// onto the tracker base. Anything else is returned as-is; bare relative
/// paths (`img/a.png`) are not resolved against the page.
pub fn normalize_avatar_url(reference: &str, base_url: &str) -> String {
    if reference.starts_with("//") {
        format!("https:{reference}")
    } else if reference.starts_with('/') {
        Url::parse(base_url)
            .and_then(|base| base.join(reference))
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", base_url.trim_end_matches('/'), reference))
    } else {
        reference.to_string()
    }
}
