use url::Url;

/// Builds the URL of a numbered listing page
///
/// Page 1 is the bare base URL; later pages carry a `page` query parameter.
/// Any query already present on the base URL is preserved.
///
/// # Arguments
///
/// * `base` - The catalog's listing index URL
/// * `page` - 1-based page number
pub fn listing_url(base: &Url, page: u32) -> Url {
    if page <= 1 {
        return base.clone();
    }

    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("page", &page.to_string());
    url
}
