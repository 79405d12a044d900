use std::sync::LazyLock;

use regex::Regex;

use crate::extractor::cascade::Cascade;
use crate::extractor::text::{
    char_len, contains_any, element_lines, element_text, is_leaf, normalize_whitespace,
    select_all, select_first, truncate_chars,
};
use crate::extractor::PageView;

static SENIOR_ONLY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^，。]*学长$").expect("static regex"));
static YEAR_PREFIXED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+年").expect("static regex"));

pub struct DescriptionInput<'v, 'a> {
    pub view: &'v PageView<'a>,
    pub name: &'v str,
    pub author: &'v str,
}

/// Steps reading the page's own text. Run before the author fallbacks, which read their result.
pub fn content_cascade<'v, 'a>() -> Cascade<DescriptionInput<'v, 'a>> {
    Cascade::new("description")
        .step("intro", from_intro)
        .step("keyword_candidates", from_keyword_candidates)
        .step("info_lines", from_info_lines)
        .step("long_paragraph", from_long_paragraph)
}

/// Steps run once the author is final.
pub fn closing_cascade<'v, 'a>() -> Cascade<DescriptionInput<'v, 'a>> {
    Cascade::new("description")
        .step("gated_summary", from_gated_state)
        .step("leaf_text", from_leaf_text)
}

fn capped(text: &str, max: usize) -> String {
    truncate_chars(&normalize_whitespace(text), max)
}

fn from_intro(input: &DescriptionInput<'_, '_>) -> Option<String> {
    let config = input.view.config;
    select_first(input.view.doc, &config.intro_selector)
        .map(|el| capped(&element_text(el), config.description_max_chars))
}

fn from_keyword_candidates(input: &DescriptionInput<'_, '_>) -> Option<String> {
    let config = input.view.config;
    config
        .description_selectors
        .iter()
        .flat_map(|css| select_all(input.view.doc, css))
        .map(|el| normalize_whitespace(&element_text(el)))
        .find(|text| {
            char_len(text) > config.description_min_chars
                && contains_any(text, &config.description_keywords)
                && !contains_any(text, &config.stat_markers)
        })
        .map(|text| truncate_chars(&text, config.description_max_chars))
}

/// Rebuild a synopsis from the info container, dropping price, share and stat lines.
fn from_info_lines(input: &DescriptionInput<'_, '_>) -> Option<String> {
    let config = input.view.config;
    let info = select_first(input.view.doc, &config.info_container)?;

    let lines: Vec<String> = element_lines(info)
        .into_iter()
        .filter(|line| {
            char_len(line) >= 10 && !contains_any(line, &config.line_boilerplate)
        })
        .filter(|line| {
            (input.name.is_empty() || !line.contains(input.name))
                && (input.author.is_empty() || !line.contains(input.author))
                && !SENIOR_ONLY_LINE.is_match(line)
                && !YEAR_PREFIXED_LINE.is_match(line)
                && char_len(line) > config.min_line_chars
        })
        .take(config.max_description_lines)
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(capped(&lines.join(" "), config.description_max_chars))
}

fn from_long_paragraph(input: &DescriptionInput<'_, '_>) -> Option<String> {
    let config = input.view.config;
    select_all(input.view.doc, "p")
        .into_iter()
        .map(|p| normalize_whitespace(&element_text(p)))
        .find(|text| {
            char_len(text) > config.paragraph_min_chars
                && !contains_any(text, &config.paragraph_boilerplate)
        })
        .map(|text| truncate_chars(&text, config.paragraph_max_chars))
}

/// Logged-out pages hide the intro; describe the column from what is known.
fn from_gated_state(input: &DescriptionInput<'_, '_>) -> Option<String> {
    let config = input.view.config;
    if input.name.is_empty() || !contains_any(&input.view.body_text(), &config.login_markers) {
        return None;
    }
    Some(
        config
            .gated_description_template
            .replace("{name}", input.name)
            .replace("{author}", input.author),
    )
}

fn from_leaf_text(input: &DescriptionInput<'_, '_>) -> Option<String> {
    let config = input.view.config;
    if contains_any(&input.view.body_text(), &config.login_markers) {
        return None;
    }
    select_all(input.view.doc, "body *:not(script):not(style):not(noscript)")
        .into_iter()
        .filter(|el| is_leaf(*el))
        .map(|el| element_text(el).trim().to_string())
        .find(|text| {
            let len = char_len(text);
            len > config.leaf_min_chars
                && len < config.leaf_max_chars
                && !contains_any(text, &config.leaf_boilerplate)
        })
        .map(|text| capped(&text, config.paragraph_max_chars))
}
