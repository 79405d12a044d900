use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::extractor::text::select_first;
use crate::extractor::PageView;

const NUMBER: &str = r"(\d[\d,]*(?:\.\d+)?)\s*(万|w|W|千|k|K)?";

static STANDALONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^{NUMBER}\+?$")).expect("static regex"));

/// Reader and content counts, each defaulting to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub readers: u64,
    pub contents: u64,
}

/// Matchers for one stat, built from its configured labels.
struct StatPattern {
    /// `<n><label>` inside a single text node
    inline_after: Regex,
    /// `<label>: <n>` inside a single text node
    inline_before: Regex,
    /// A text node that is only the label
    bare_label: Regex,
}

impl StatPattern {
    fn new(labels: &[String]) -> Option<Self> {
        let alternation = label_alternation(labels)?;
        Some(Self {
            inline_after: Regex::new(&format!(r"{NUMBER}\s*(?:名|位|个)?\s*(?i:{alternation})")).ok()?,
            inline_before: Regex::new(&format!(r"(?i:{alternation})数?\s*[:：]\s*{NUMBER}")).ok()?,
            bare_label: Regex::new(&format!(r"^(?i:{alternation})数?\s*[:：]?$")).ok()?,
        })
    }
}

fn label_alternation(labels: &[String]) -> Option<String> {
    let mut labels: Vec<&String> = labels.iter().filter(|l| !l.is_empty()).collect();
    if labels.is_empty() {
        return None;
    }
    // Longest first so "readers" wins over "reader".
    labels.sort_by_key(|l| std::cmp::Reverse(l.chars().count()));
    Some(
        labels
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

pub fn extract(view: &PageView<'_>) -> Stats {
    let config = view.config;
    let readers = StatPattern::new(&config.reader_labels);
    let contents = StatPattern::new(&config.content_labels);
    let all_labels: Vec<String> = config
        .reader_labels
        .iter()
        .chain(&config.content_labels)
        .cloned()
        .collect();
    let any_label = StatPattern::new(&all_labels);

    let regions: Vec<ElementRef<'_>> = config
        .stats_selectors
        .iter()
        .filter_map(|css| select_first(view.doc, css))
        .collect();

    let count = |pattern: Option<&StatPattern>| -> u64 {
        let Some(pattern) = pattern else { return 0 };
        regions
            .iter()
            .find_map(|region| count_in_region(*region, pattern, any_label.as_ref()))
            .unwrap_or(0)
    };

    Stats {
        readers: count(readers.as_ref()),
        contents: count(contents.as_ref()),
    }
}

fn count_in_region(
    region: ElementRef<'_>,
    pattern: &StatPattern,
    any_label: Option<&StatPattern>,
) -> Option<u64> {
    let tokens: Vec<&str> = region
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let inline = tokens.iter().find_map(|t| {
        pattern
            .inline_after
            .captures(t)
            .and_then(|caps| parse_count(&caps[1], caps.get(2).map(|m| m.as_str())))
    });
    if inline.is_some() {
        return inline;
    }

    // Labeled stat blocks keep number and label in separate elements; a block
    // that opens with a label reads label-then-number, otherwise number-then-label.
    let label_first = any_label
        .zip(tokens.first())
        .is_some_and(|(p, first)| p.bare_label.is_match(first));
    let separated = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| pattern.bare_label.is_match(t))
        .find_map(|(i, _)| {
            let neighbour = if label_first {
                tokens.get(i + 1)
            } else {
                i.checked_sub(1).and_then(|j| tokens.get(j))
            };
            neighbour.and_then(|n| parse_standalone(n))
        });
    if separated.is_some() {
        return separated;
    }

    tokens.iter().find_map(|t| {
        pattern
            .inline_before
            .captures(t)
            .and_then(|caps| parse_count(&caps[1], caps.get(2).map(|m| m.as_str())))
    })
}

fn parse_standalone(token: &str) -> Option<u64> {
    let caps = STANDALONE_NUMBER.captures(token)?;
    parse_count(&caps[1], caps.get(2).map(|m| m.as_str()))
}

/// Parse `1,234`, `1.2万`, `3k` and plain integers.
fn parse_count(digits: &str, unit: Option<&str>) -> Option<u64> {
    let value: f64 = digits.replace(',', "").parse().ok()?;
    let multiplier = match unit {
        Some("万" | "w" | "W") => 10_000.0,
        Some("千" | "k" | "K") => 1_000.0,
        _ => 1.0,
    };
    let scaled = (value * multiplier).round();
    (scaled.is_finite() && scaled >= 0.0).then_some(scaled as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractorConfig;
    use scraper::Html;

    fn stats_of(html: &str) -> Stats {
        let config = ExtractorConfig::default();
        let doc = Html::parse_document(html);
        extract(&PageView::new("https://site/p/abc", &doc, &config))
    }

    #[test]
    fn test_inline_counts() {
        let stats = stats_of(r#"<div class="stats">1024读者 56内容</div>"#);
        assert_eq!(stats, Stats { readers: 1024, contents: 56 });
    }

    #[test]
    fn test_single_text_node_both_counts() {
        let stats = stats_of(r#"<div class="stats">123读者45内容</div>"#);
        assert_eq!(stats, Stats { readers: 123, contents: 45 });
    }

    #[test]
    fn test_number_then_label_blocks() {
        let html = r#"<div class="stats">
            <div><span class="num">1,280</span><span class="label">读者</span></div>
            <div><span class="num">36</span><span class="label">内容</span></div>
        </div>"#;
        assert_eq!(stats_of(html), Stats { readers: 1280, contents: 36 });
    }

    #[test]
    fn test_label_then_number_blocks() {
        let html = r#"<dl class="stats"><dt>读者</dt><dd>2.5万</dd><dt>内容</dt><dd>88</dd></dl>"#;
        assert_eq!(stats_of(html), Stats { readers: 25_000, contents: 88 });
    }

    #[test]
    fn test_falls_back_to_info_container() {
        let html = r#"<div class="paper-info"><span>99</span><span>读者</span><span>7</span><span>内容</span></div>"#;
        assert_eq!(stats_of(html), Stats { readers: 99, contents: 7 });
    }

    #[test]
    fn test_no_stats_markup_defaults_to_zero() {
        assert_eq!(stats_of("<p>hello</p>"), Stats::default());
        assert_eq!(
            stats_of(r#"<div class="stats">很多读者</div>"#),
            Stats::default()
        );
    }

    #[test]
    fn test_parse_count_units() {
        assert_eq!(parse_count("1.2", Some("万")), Some(12_000));
        assert_eq!(parse_count("3", Some("k")), Some(3_000));
        assert_eq!(parse_count("1,234", None), Some(1_234));
        assert_eq!(parse_count("abc", None), None);
    }
}
