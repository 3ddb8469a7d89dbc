//! Renderer module — trait-based format dispatch.

pub mod html;
pub mod json;
pub mod markdown;

use anyhow::{anyhow, Result};
use moondoc_model::{Annotated, ClassDoc};

/// Settings shared by all renderers.
#[derive(Debug, Default, Clone)]
pub struct RenderOptions {
    /// Base URL for source links, e.g. `https://github.com/owner/repo/blob/main`.
    pub source_url: Option<String>,
}

/// Trait for rendering a ClassDoc into a specific output format.
pub trait Renderer {
    fn render(&self, doc: &ClassDoc, opts: &RenderOptions) -> Result<String>;
    fn file_extension(&self) -> &str;

    /// Whether frontmatter and prefix templates may be prepended to the output.
    fn accepts_preamble(&self) -> bool {
        false
    }
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" | "mdx" => Ok(Box::new(markdown::MarkdownRenderer)),
        "html" => Ok(Box::new(html::HtmlRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!(
            "unknown format: {}. Use markdown, html, or json",
            format
        )),
    }
}

/// Short labels shown next to an item's heading.
pub(crate) fn badges<T: Annotated>(item: &T, extra: &[&str]) -> Vec<String> {
    let mut badges: Vec<String> = extra.iter().map(|b| b.to_string()).collect();
    if item.is_private() {
        badges.push("private".to_string());
    }
    if item.is_deprecated() {
        badges.push("deprecated".to_string());
    }
    if item.is_unreleased() {
        badges.push("unreleased".to_string());
    }
    if let Some(since) = item.since() {
        badges.push(format!("since {}", since));
    }
    badges.extend(item.realm().iter().map(|r| r.to_string()));
    badges.extend(item.tags().iter().cloned());
    badges
}
