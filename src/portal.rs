use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.immoweb.be";

/// Where index pages live and how relative listing links resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    base_url: String,
}

impl Default for Portal {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Portal {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search results page `page` (1-based) for one property type.
    pub fn index_url(&self, property_type: &str, page: usize) -> String {
        format!(
            "{}/en/search/{}/for-sale?countries=BE&page={}&orderBy=relevance",
            self.base_url,
            urlencoding::encode(property_type),
            page
        )
    }

    /// Resolves a link found on an index page. `None` when the href (or the base) can't form a URL.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        let base = Url::parse(&self.base_url).ok()?;
        base.join(href).ok().map(String::from)
    }
}
