use regex::Regex;
use tracing::warn;

use crate::extractor::cascade::Cascade;
use crate::extractor::text::{
    char_len, contains_any, element_text, is_leaf, normalize_whitespace, select_all, select_first,
};
use crate::extractor::PageView;

/// Inputs for the fallback steps, which need the already-extracted description.
pub struct AuthorHints<'v, 'a> {
    pub view: &'v PageView<'a>,
    pub name: &'v str,
    pub description: &'v str,
}

/// Selector-based steps, run before the description is known.
pub fn selector_cascade<'a>() -> Cascade<PageView<'a>> {
    Cascade::new("author")
        .step("author_selector", from_author_selector)
        .step("secondary_selectors", from_secondary_selectors)
}

/// Text-based steps, run only when the selectors found nothing.
pub fn fallback_cascade<'v, 'a>() -> Cascade<AuthorHints<'v, 'a>> {
    Cascade::new("author")
        .step("description_patterns", from_description_patterns)
        .step("short_text_candidates", from_short_candidates)
}

fn from_author_selector(view: &PageView<'_>) -> Option<String> {
    select_first(view.doc, &view.config.author_selector).map(|el| normalize_whitespace(&element_text(el)))
}

fn from_secondary_selectors(view: &PageView<'_>) -> Option<String> {
    view.config.secondary_author_selectors.iter().find_map(|css| {
        select_first(view.doc, css)
            .map(|el| normalize_whitespace(&element_text(el)))
            .filter(|t| !t.is_empty())
    })
}

fn from_description_patterns(hints: &AuthorHints<'_, '_>) -> Option<String> {
    if hints.description.is_empty() {
        return None;
    }
    hints
        .view
        .config
        .author_patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring invalid author pattern {:?}: {}", pattern, e);
                None
            }
        })
        .find_map(|re| {
            re.captures(hints.description)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|a| !a.is_empty())
        })
}

fn from_short_candidates(hints: &AuthorHints<'_, '_>) -> Option<String> {
    let config = hints.view.config;
    config
        .author_candidate_selectors
        .iter()
        .flat_map(|css| select_all(hints.view.doc, css))
        .filter(|el| is_leaf(*el))
        .map(|el| normalize_whitespace(&element_text(el)))
        .find(|text| {
            let len = char_len(text);
            len >= 2
                && len <= config.author_max_chars
                && text != hints.name
                && !text.chars().any(|c| c.is_ascii_digit())
                && !contains_any(text, &config.line_boilerplate)
        })
}
