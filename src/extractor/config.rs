use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Selectors, keywords and thresholds driving the field cascades
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Container holding the column's own metadata (title, intro, stats)
    pub info_container: String,

    /// Structured title selectors, tried before the document title
    pub title_selectors: Vec<String>,

    /// Document titles containing any of these are site chrome, not a column name
    pub generic_title_markers: Vec<String>,

    /// Heading selector for the shortest-heading fallback
    pub heading_selector: String,

    /// Headings must be longer than this many characters to be considered
    pub min_heading_chars: usize,

    /// Dedicated author selector (first cascade step)
    pub author_selector: String,

    /// Secondary author/user-name selectors
    pub secondary_author_selectors: Vec<String>,

    /// Regexes run against the description; capture group 1 is the author
    pub author_patterns: Vec<String>,

    /// Elements scanned for a short author-like text as a last resort
    pub author_candidate_selectors: Vec<String>,

    /// Maximum length of a short-text author candidate
    pub author_max_chars: usize,

    /// Returned when no author heuristic matches
    pub unknown_author: String,

    /// Dedicated intro paragraph selector (highest precedence)
    pub intro_selector: String,

    /// Fallback description selectors, in priority order
    pub description_selectors: Vec<String>,

    /// Fallback candidates must be longer than this
    pub description_min_chars: usize,

    /// Fallback candidates must mention at least one of these
    pub description_keywords: Vec<String>,

    /// Fallback candidates containing any of these are stat blocks
    pub stat_markers: Vec<String>,

    /// Lines of the info container containing any of these are skipped
    pub line_boilerplate: Vec<String>,

    /// Info-container lines must be longer than this to be kept
    pub min_line_chars: usize,

    /// Number of info-container lines joined into a description
    pub max_description_lines: usize,

    /// Generic paragraphs must be longer than this
    pub paragraph_min_chars: usize,

    /// Generic paragraphs containing any of these are skipped
    pub paragraph_boilerplate: Vec<String>,

    /// Cap for descriptions taken from dedicated regions
    pub description_max_chars: usize,

    /// Cap for descriptions taken from generic page text
    pub paragraph_max_chars: usize,

    /// Body text containing any of these means the page rendered logged out
    pub login_markers: Vec<String>,

    /// Description synthesized for gated pages; `{name}` and `{author}` are substituted
    pub gated_description_template: String,

    /// Leaf elements scanned as the final description fallback, by length range
    pub leaf_min_chars: usize,
    pub leaf_max_chars: usize,

    /// Leaf elements containing any of these are skipped
    pub leaf_boilerplate: Vec<String>,

    /// Avatar-like image selectors, tried before the first image on the page
    pub avatar_selectors: Vec<String>,

    /// Regions searched for reader/content counts, in priority order
    pub stats_selectors: Vec<String>,

    /// Labels that follow (or precede) the reader count
    pub reader_labels: Vec<String>,

    /// Labels that follow (or precede) the content count
    pub content_labels: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            info_container: ".paper-info".to_string(),
            title_selectors: strings(&[".paper-info .title", ".paper-title", ".column-title"]),
            generic_title_markers: strings(&["小报童", "登录"]),
            heading_selector: "h1".to_string(),
            min_heading_chars: 3,
            author_selector: ".name".to_string(),
            secondary_author_selectors: strings(&[
                ".author",
                ".user-name",
                ".nickname",
                "[class*=\"author\"]",
            ]),
            author_patterns: strings(&[
                r"作者[:：]\s*([^\s，,。：:]{1,20})",
                r"作者[^，,。\n]*?([^，,。\n\s]+学长)",
                r"(?i)\bby\s+([^\s,，。]{1,30})",
                r"([^\s，,。：:]{1,20})\s*著",
            ]),
            author_candidate_selectors: strings(&[
                ".paper-info span",
                ".user-info span",
                ".profile span",
            ]),
            author_max_chars: 20,
            unknown_author: "unknown author".to_string(),
            intro_selector: ".paper-info p.intro".to_string(),
            description_selectors: strings(&[
                ".paper-info p:not(.intro)",
                ".paper-info div:last-child",
                ".intro",
                ".description",
                "[class*=\"intro\"]",
                "[class*=\"desc\"]",
            ]),
            description_min_chars: 200,
            description_keywords: strings(&["作者", "价值", "订阅", "author", "value", "subscribe"]),
            stat_markers: strings(&["读者数", "内容数"]),
            line_boilerplate: strings(&[
                "读者", "内容", "元", "原价", "现价", "分享", "订阅后", "立即", "微信", "企业服务",
            ]),
            min_line_chars: 15,
            max_description_lines: 3,
            paragraph_min_chars: 50,
            paragraph_boilerplate: strings(&["购买", "立即", "元"]),
            description_max_chars: 600,
            paragraph_max_chars: 300,
            login_markers: strings(&["登录"]),
            gated_description_template: "{name} - 由{author}创作的专栏".to_string(),
            leaf_min_chars: 100,
            leaf_max_chars: 500,
            leaf_boilerplate: strings(&["读者", "内容", "元"]),
            avatar_selectors: strings(&[
                "img[src*=\"qlogo\"]",
                "img[src*=\"avatar\"]",
                "img[class*=\"avatar\"]",
                "img[src*=\"head\"]",
                "img[class*=\"icon\"]",
            ]),
            stats_selectors: strings(&[".stats", ".paper-info"]),
            reader_labels: strings(&["读者", "订阅者", "readers", "reader", "subscribers"]),
            content_labels: strings(&["内容", "文章", "篇", "posts", "articles"]),
        }
    }
}
