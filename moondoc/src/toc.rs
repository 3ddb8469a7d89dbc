//! Heading anchors and index links.
//!
//! Slugs follow the Docusaurus/GitHub heading algorithm so links in the
//! generated index resolve on the rendered page.

use std::collections::HashMap;

/// Hands out unique anchors for a page, suffixing repeats with `-1`, `-2`, ...
///
/// A property and a function may share a name, and both get a heading.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let base = heading_slug(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        slug
    }
}

/// Heading anchor slug:
/// - lowercase
/// - keep alphanumerics, space, hyphen and underscore
/// - replace spaces with hyphens
pub fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}

/// Markdown index entry: `* [text](#anchor)`.
pub fn render_toc_item(text: &str, anchor: &str) -> String {
    format!("* [{}](#{})", escape_link_text(text), anchor)
}

/// Link to a source location, or plain `path:line` when no base URL is set.
pub fn source_link(base: Option<&str>, path: &str, line: u32) -> Option<String> {
    let base = base?.trim_end_matches('/');
    let path = path.trim_start_matches("./").trim_start_matches('/');
    Some(format!("{}/{}#L{}", base, path, line))
}

/// Underscores open emphasis in markdown link text (`_Name`).
fn escape_link_text(text: &str) -> String {
    text.replace('_', "\\_")
}
