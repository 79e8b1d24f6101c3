//! Definition paragraph extraction for sjp.pl pages.
//!
//! The page has no semantic markup around definitions; they are the `<p>`
//! blocks carrying one exact inline style. This is a pattern matcher for that
//! one layout, not an HTML parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MatchPolicy;

/// Opening tag of a definition paragraph, matched literally.
const PARAGRAPH_OPEN: &str =
    r#"<p style="margin: .5em 0; font: medium/1.4 sans-serif; max-width: 32em; ">"#;
const PARAGRAPH_CLOSE: &str = "</p>";

// `.` stops at newlines, so a greedy match never leaves its line.
static GREEDY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "{}.*{}",
        regex::escape(PARAGRAPH_OPEN),
        regex::escape(PARAGRAPH_CLOSE)
    ))
    .expect("invalid regex")
});

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}.*?{}",
        regex::escape(PARAGRAPH_OPEN),
        regex::escape(PARAGRAPH_CLOSE)
    ))
    .expect("invalid regex")
});

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("invalid regex"));

/// Pulls definition paragraphs out of a dictionary page.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    policy: MatchPolicy,
}

impl Extractor {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    /// Return the cleaned text of every marked paragraph, in document order.
    /// A page without markers yields an empty vector.
    pub fn extract(&self, html: &[u8]) -> Vec<String> {
        let document = String::from_utf8_lossy(html);
        let pattern = match self.policy {
            MatchPolicy::Greedy => &*GREEDY,
            MatchPolicy::Paragraph => &*PARAGRAPH,
        };

        pattern
            .find_iter(&document)
            .map(|m| clean(m.as_str()))
            .collect()
    }
}

/// Entities first, then line breaks, then the paragraph tags themselves.
fn clean(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let text = LINE_BREAK.replace_all(&decoded, "\n");
    text.replace(PARAGRAPH_OPEN, "")
        .replace(PARAGRAPH_CLOSE, "")
}
