/// Rendered DOM of one column page, handed from the fetcher to the extractors.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The URL that was navigated to
    pub url: String,
    /// Serialized document after client-side rendering
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}
