use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((at, _)) => text[..at].trim_end().to_string(),
        None => text.to_string(),
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn contains_any(text: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| !n.is_empty() && text.contains(n.as_str()))
}

/// Parse a configured selector; an invalid one is logged and treated as matching nothing.
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("Ignoring invalid selector {:?}: {:?}", css, e);
            None
        }
    }
}

pub fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    selector(css)
        .map(|sel| doc.select(&sel).collect())
        .unwrap_or_default()
}

pub fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    doc.select(&sel).next()
}

/// The element's text content, concatenated like `textContent`.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// The element's text nodes as trimmed, non-empty lines.
pub fn element_lines(el: ElementRef<'_>) -> Vec<String> {
    el.text()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the element has no element children.
pub fn is_leaf(el: ElementRef<'_>) -> bool {
    !el.children().any(|child| child.value().is_element())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace("\n\n"), "");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_chars("专栏介绍文字", 2), "专栏");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("ab cd", 3), "ab");
    }

    #[test]
    fn test_contains_any_ignores_empty_needles() {
        let needles = vec![String::new(), "元".to_string()];
        assert!(contains_any("99元", &needles));
        assert!(!contains_any("free", &needles));
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = Html::parse_document("<p>hi</p>");
        assert!(select_all(&doc, "p[").is_empty());
        assert!(select_first(&doc, "p").is_some());
    }

    #[test]
    fn test_element_lines_splits_text_nodes() {
        let doc = Html::parse_document("<div id=x><span>12</span><span>读者</span>\n  line two\n</div>");
        let el = select_first(&doc, "#x").unwrap();
        assert_eq!(element_lines(el), vec!["12", "读者", "line two"]);
        assert!(!is_leaf(el));
    }
}
