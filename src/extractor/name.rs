use std::sync::LazyLock;

use regex::Regex;

use crate::extractor::cascade::Cascade;
use crate::extractor::text::{char_len, contains_any, element_text, select_all, select_first};
use crate::extractor::PageView;

/// `<n>读者<n>内容<title>` as rendered at the top of the info container
static STATS_PREFIXED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\s*读者\s*\d+\s*内容\s*([^拆解作者\n]{2,50})").expect("static regex")
});

pub fn cascade<'a>() -> Cascade<PageView<'a>> {
    Cascade::new("name")
        .step("title_region", from_title_region)
        .step("document_title", from_document_title)
        .step("shortest_heading", from_shortest_heading)
}

/// Column title, or an empty string when nothing matched.
pub fn extract(view: &PageView<'_>) -> String {
    cascade().run(view).unwrap_or_default()
}

fn from_title_region(view: &PageView<'_>) -> Option<String> {
    let structured = view.config.title_selectors.iter().find_map(|css| {
        select_first(view.doc, css)
            .map(element_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    });
    if structured.is_some() {
        return structured;
    }

    let info = select_first(view.doc, &view.config.info_container)?;
    let text = info.text().collect::<Vec<_>>().join("\n");
    STATS_PREFIXED_TITLE
        .captures(&text)
        .map(|caps| caps[1].trim().to_string())
}

fn from_document_title(view: &PageView<'_>) -> Option<String> {
    let title = select_first(view.doc, "title").map(element_text)?;
    let title = title.trim();
    if contains_any(title, &view.config.generic_title_markers) {
        return None;
    }
    Some(title.to_string())
}

/// Long headings are usually article titles nested in the page; the column title is short.
fn from_shortest_heading(view: &PageView<'_>) -> Option<String> {
    select_all(view.doc, &view.config.heading_selector)
        .into_iter()
        .map(|h| element_text(h).trim().to_string())
        .filter(|t| char_len(t) > view.config.min_heading_chars)
        .min_by_key(|t| char_len(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractorConfig;
    use scraper::Html;

    fn name_of(html: &str) -> String {
        let config = ExtractorConfig::default();
        let doc = Html::parse_document(html);
        extract(&PageView::new("https://site/p/abc", &doc, &config))
    }

    #[test]
    fn test_structured_title_beats_document_title() {
        let html = r#"<html><head><title>Doc Title</title></head>
            <body><div class="paper-info"><div class="title"> 效率手册 </div></div></body></html>"#;
        assert_eq!(name_of(html), "效率手册");
    }

    #[test]
    fn test_stats_prefixed_title_in_info_container() {
        let html = r#"<html><head><title>小报童</title></head><body>
            <div class="paper-info"><span>1024</span><span>读者</span><span>56</span><span>内容</span>
            <span>产品经理进阶</span><span>作者：阿明</span></div></body></html>"#;
        assert_eq!(name_of(html), "产品经理进阶");
    }

    #[test]
    fn test_document_title_used_unless_generic() {
        let html = "<html><head><title> 独立开发笔记 </title></head><body></body></html>";
        assert_eq!(name_of(html), "独立开发笔记");

        let html = "<html><head><title>登录 - 小报童</title></head><body><h1>A much longer article heading</h1><h1>短标题专栏</h1></body></html>";
        assert_eq!(name_of(html), "短标题专栏");
    }

    #[test]
    fn test_shortest_heading_skips_tiny_headings() {
        let html = "<html><head><title></title></head><body><h1>Hi</h1><h1>Rust Notes Weekly</h1><h1>Rust Notes</h1></body></html>";
        assert_eq!(name_of(html), "Rust Notes");
    }

    #[test]
    fn test_no_heuristic_matches() {
        assert_eq!(name_of("<html><head><title></title></head><body><p>text</p></body></html>"), "");
    }

    #[test]
    fn test_step_order() {
        assert_eq!(
            cascade().step_names(),
            vec!["title_region", "document_title", "shortest_heading"]
        );
    }
}
