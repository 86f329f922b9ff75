/// Whether `url` already carries an `http://` or `https://` scheme.
pub fn is_absolute_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a store-relative reference against `origin` (`scheme://host`).
pub fn absolutize(url: &str, origin: &str) -> String {
    if is_absolute_url(url) {
        url.to_string()
    } else if url.starts_with('/') {
        format!("{origin}{url}")
    } else {
        format!("{origin}/{url}")
    }
}

/// Make every image reference absolute using the requesting origin.
pub fn normalize_image_urls(urls: &[String], origin: &str) -> Vec<String> {
    urls.iter().map(|url| absolutize(url, origin)).collect()
}
