//! JSON renderer — normalized record output for tooling integration.
//!
//! Emits the record in the same shape it was read in, pretty-printed, with
//! any filtered-out items removed. Unrecognized keys are kept and follow the
//! known ones. Feeding the output back into moondoc yields the same record.

use crate::render::{RenderOptions, Renderer};
use anyhow::{Context, Result};
use moondoc_model::ClassDoc;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, doc: &ClassDoc, _opts: &RenderOptions) -> Result<String> {
        let mut out = doc
            .to_json_pretty()
            .with_context(|| format!("failed to serialize {}", doc.name))?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
