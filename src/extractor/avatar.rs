use url::Url;

use crate::extractor::cascade::Cascade;
use crate::extractor::text::select_all;
use crate::extractor::PageView;

pub fn cascade<'a>() -> Cascade<PageView<'a>> {
    Cascade::new("avatar")
        .step("avatar_like_image", from_avatar_like)
        .step("first_image", from_first_image)
}

pub fn extract(view: &PageView<'_>) -> String {
    cascade().run(view).unwrap_or_default()
}

fn from_avatar_like(view: &PageView<'_>) -> Option<String> {
    view.config
        .avatar_selectors
        .iter()
        .flat_map(|css| select_all(view.doc, css))
        .find_map(|img| img.value().attr("src").and_then(|src| absolutize(view.url, src)))
}

fn from_first_image(view: &PageView<'_>) -> Option<String> {
    select_all(view.doc, "img[src]")
        .into_iter()
        .find_map(|img| img.value().attr("src").and_then(|src| absolutize(view.url, src)))
}

/// Resolve `src` against the page URL the way the browser's `img.src` does.
fn absolutize(page_url: &str, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    match Url::parse(page_url).and_then(|base| base.join(src)) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Some(src.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractorConfig;
    use scraper::Html;

    fn avatar_of(html: &str) -> String {
        let config = ExtractorConfig::default();
        let doc = Html::parse_document(html);
        extract(&PageView::new("https://xiaobot.net/p/abc", &doc, &config))
    }

    #[test]
    fn test_avatar_like_image_preferred() {
        let html = r#"<img src="/banner.png"><img src="https://thirdwx.qlogo.cn/mmopen/x/132">"#;
        assert_eq!(avatar_of(html), "https://thirdwx.qlogo.cn/mmopen/x/132");
    }

    #[test]
    fn test_falls_back_to_first_image_resolved() {
        let html = r#"<img src=""><img src="/static/cover.png">"#;
        assert_eq!(avatar_of(html), "https://xiaobot.net/static/cover.png");
    }

    #[test]
    fn test_blank_sources_are_skipped() {
        let html = r#"<img src="  "><img src=""><p><img src="cover.png"></p>"#;
        assert_eq!(avatar_of(html), "https://xiaobot.net/p/cover.png");
    }

    #[test]
    fn test_no_image() {
        assert_eq!(avatar_of("<p>no images</p>"), "");
    }
}
