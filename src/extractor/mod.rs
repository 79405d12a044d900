//! Field extraction over a rendered column page.
//!
//! Every field is an ordered [`Cascade`] of read-only heuristics; the first
//! step producing a non-empty value wins. Misses resolve to defaults (empty
//! string, the configured unknown-author sentinel, zero counts) and never
//! fail the page.
//!
//! ```text
//! name → author selectors → description content → author fallbacks → description closing
//! ```
//!
//! The author fallbacks read the description, and the description's closing
//! steps read the final author, so the two cascades are interleaved in that
//! order. Avatar and stats are independent.

mod author;
mod avatar;
mod cascade;
mod config;
mod description;
mod name;
mod stats;
pub mod text;

pub use cascade::{Cascade, Step};
pub use config::ExtractorConfig;
pub use stats::Stats;

use scraper::Html;

use crate::domain::{PreviewRecord, RenderedPage};

/// Read-only view over one parsed document.
pub struct PageView<'a> {
    pub url: &'a str,
    pub doc: &'a Html,
    pub config: &'a ExtractorConfig,
}

impl<'a> PageView<'a> {
    pub fn new(url: &'a str, doc: &'a Html, config: &'a ExtractorConfig) -> Self {
        Self { url, doc, config }
    }

    pub fn body_text(&self) -> String {
        text::select_first(self.doc, "body")
            .map(text::element_text)
            .unwrap_or_default()
    }
}

/// Runs every field cascade over a rendered page.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    config: ExtractorConfig,
}

impl FieldExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a full record. Never fails; an empty `name` marks a failed extraction.
    pub fn extract_all(&self, page: &RenderedPage) -> PreviewRecord {
        let doc = Html::parse_document(&page.html);
        let view = PageView::new(&page.url, &doc, &self.config);

        let name = name::extract(&view);
        let selected_author = author::selector_cascade().run(&view);

        let content = {
            let input = description::DescriptionInput {
                view: &view,
                name: &name,
                author: selected_author.as_deref().unwrap_or(""),
            };
            description::content_cascade().run(&input)
        };

        let author = selected_author
            .or_else(|| {
                author::fallback_cascade().run(&author::AuthorHints {
                    view: &view,
                    name: &name,
                    description: content.as_deref().unwrap_or(""),
                })
            })
            .unwrap_or_else(|| self.config.unknown_author.clone());

        let description = content
            .or_else(|| {
                description::closing_cascade().run(&description::DescriptionInput {
                    view: &view,
                    name: &name,
                    author: &author,
                })
            })
            .unwrap_or_default();

        let Stats { readers, contents } = stats::extract(&view);

        PreviewRecord {
            url: page.url.clone(),
            name,
            author,
            description,
            avatar: avatar::extract(&view),
            reader_count: readers,
            content_count: contents,
        }
    }
}
