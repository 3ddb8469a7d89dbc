//! moondoc — render Luau API documentation records.
//!
//! Reads the JSON records a Docusaurus doc extractor embeds in webpack
//! chunks (or the plain JSON) and renders them as MDX, HTML or normalized
//! JSON. Supports two modes:
//!
//! - **stdin mode**: `moondoc < 01b616b0.js`
//! - **file mode**: `moondoc -o docs/api build/assets/js/*.js`

mod desc;
mod filter;
mod render;
mod toc;

use anyhow::{Context, Result};
use clap::Parser;
use moondoc_model::{load_payloads, looks_like_record, ClassDoc, ExtractError, ModelError};
use render::RenderOptions;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "moondoc",
    about = "Render Luau API documentation records from doc-site chunks or JSON"
)]
struct Cli {
    /// Input files (glob patterns supported). If omitted, reads from stdin.
    files: Vec<String>,

    /// Output directory (required when files are given)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Prefix template file or directory containing _prefix.mdx.
    /// Supports ${name} substitution.
    #[arg(short = 'p', long)]
    prefix: Option<String>,

    /// Output format: markdown (default), html, json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Disable YAML frontmatter
    #[arg(long)]
    no_frontmatter: bool,

    /// Include private functions, properties and types in output
    #[arg(long)]
    show_private: bool,

    /// Filter items by tag. Prefix with ! to exclude.
    /// Can be specified multiple times. E.g. --filter '!deprecated'
    #[arg(long)]
    filter: Vec<String>,

    /// Base URL for source links, e.g. https://github.com/owner/repo/blob/main
    #[arg(long)]
    source_url: Option<String>,

    /// Validate records only; print a summary per record instead of rendering
    #[arg(long)]
    check: bool,

    /// Verbose logging (overridden by MOONDOC_LOG)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.files.is_empty() {
        return stdin_mode(&cli);
    }

    file_mode(&cli)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MOONDOC_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// stdin mode: read a chunk or JSON from stdin, write rendered records to stdout.
fn stdin_mode(cli: &Cli) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let docs = load_docs(&input, "<stdin>")?;

    if cli.check {
        for doc in &docs {
            println!("{}", check_summary("<stdin>", doc));
        }
        return Ok(());
    }

    let renderer = render::create_renderer(&cli.format)?;
    let opts = render_options(cli);
    let mut rendered = Vec::new();
    for mut doc in docs {
        filter::apply(&mut doc, cli.show_private, &cli.filter);
        rendered.push(renderer.render(&doc, &opts)?);
    }
    print!("{}", rendered.join("\n"));
    Ok(())
}

/// file mode: process multiple files, write one output file per record.
fn file_mode(cli: &Cli) -> Result<()> {
    let input_files = expand_globs(&cli.files)?;

    if cli.check {
        for path in &input_files {
            let label = path.display().to_string();
            for doc in read_docs(path)? {
                println!("{}", check_summary(&label, &doc));
            }
        }
        return Ok(());
    }

    let output_dir = cli
        .output
        .as_deref()
        .context("--output is required when files are given")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let prefix_template = resolve_prefix(cli.prefix.as_deref(), output_dir)?;
    let renderer = render::create_renderer(&cli.format)?;
    let ext = renderer.file_extension();
    let opts = render_options(cli);
    let mut written: HashSet<String> = HashSet::new();

    for path in &input_files {
        for mut doc in read_docs(path)? {
            filter::apply(&mut doc, cli.show_private, &cli.filter);

            let name = derive_output_name(&doc.name);
            if !written.insert(name.clone()) {
                tracing::warn!(record = %doc.name, file = %path.display(), "duplicate record name, overwriting");
            }
            let out_path = output_dir.join(format!("{}.{}", name, ext));

            let mut output = String::new();
            if renderer.accepts_preamble() {
                if !cli.no_frontmatter {
                    output.push_str(&frontmatter(&doc)?);
                }
                if let Some(ref tpl) = prefix_template {
                    output.push_str(&tpl.replace("${name}", &name));
                    output.push('\n');
                }
            }
            output.push_str(&renderer.render(&doc, &opts)?);

            fs::write(&out_path, &output)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            tracing::debug!(output = %out_path.display(), "wrote record");
        }
    }

    Ok(())
}

fn render_options(cli: &Cli) -> RenderOptions {
    RenderOptions {
        source_url: cli.source_url.clone(),
    }
}

/// Read a file and parse every record in it. Files without an embedded
/// payload (other webpack chunks) are skipped with a warning, as are payloads
/// that are not API records (see [`load_docs`]).
fn read_docs(path: &Path) -> Result<Vec<ClassDoc>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match load_docs(&content, &path.display().to_string()) {
        Ok(docs) => Ok(docs),
        Err(e) if matches!(e.downcast_ref::<ExtractError>(), Some(ExtractError::NoPayload)) => {
            tracing::warn!(file = %path.display(), "skipping: no JSON payload found");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Parse every payload in `content` into a record.
///
/// Payloads with none of the record's structural keys are other site data
/// and are skipped. Anything that looks like a record but breaks the schema
/// is an error.
fn load_docs(content: &str, label: &str) -> Result<Vec<ClassDoc>> {
    let payloads = load_payloads(content)?;
    let mut docs = Vec::with_capacity(payloads.len());
    for (i, payload) in payloads.iter().enumerate() {
        let context = || match payload.module_id {
            Some(id) => format!("{}: module {}", label, id),
            None if payloads.len() > 1 => format!("{}: record {}", label, i),
            None => label.to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&payload.json)
            .map_err(ModelError::from)
            .with_context(context)?;
        if !looks_like_record(&value) {
            tracing::warn!(source = %context(), "skipping: payload is not an API record");
            continue;
        }
        docs.push(ClassDoc::from_value(value).with_context(context)?);
    }
    Ok(docs)
}

fn check_summary(label: &str, doc: &ClassDoc) -> String {
    format!(
        "ok: {} ({}: {} functions, {} properties)",
        label,
        doc.name,
        doc.functions.len(),
        doc.properties.len()
    )
}

/// YAML frontmatter for Docusaurus. Values are JSON-quoted, which YAML accepts.
fn frontmatter(doc: &ClassDoc) -> Result<String> {
    let mut out = String::from("---\n");
    out.push_str(&format!("title: {}\n", serde_json::to_string(&doc.name)?));
    if let Some(summary) = desc::summary(&doc.desc) {
        out.push_str(&format!("description: {}\n", serde_json::to_string(&summary)?));
    }
    if let Some(ref tags) = doc.tags {
        if !tags.is_empty() {
            out.push_str(&format!("tags: {}\n", serde_json::to_string(tags)?));
        }
    }
    out.push_str("---\n\n");
    Ok(out)
}

/// Resolve the prefix template from the -p flag, falling back to
/// `_prefix.mdx` next to the given path or in the output directory.
fn resolve_prefix(prefix_arg: Option<&str>, output_dir: &Path) -> Result<Option<String>> {
    match prefix_arg {
        Some(p) => {
            let path = Path::new(p);
            if path.is_file() {
                Ok(Some(fs::read_to_string(path).with_context(|| {
                    format!("failed to read prefix file: {}", path.display())
                })?))
            } else if path.is_dir() {
                let candidate = path.join("_prefix.mdx");
                if candidate.is_file() {
                    Ok(Some(fs::read_to_string(&candidate)?))
                } else {
                    Ok(None)
                }
            } else {
                // Try _prefix.mdx in the same directory
                let candidate = Path::new(p).with_file_name("_prefix.mdx");
                if candidate.is_file() {
                    Ok(Some(fs::read_to_string(&candidate)?))
                } else {
                    anyhow::bail!("prefix not found: {}", p);
                }
            }
        }
        None => {
            let candidate = output_dir.join("_prefix.mdx");
            if candidate.is_file() {
                Ok(Some(fs::read_to_string(&candidate)?))
            } else {
                Ok(None)
            }
        }
    }
}

/// File extensions recognized as inputs.
const SUPPORTED_EXTENSIONS: &[&str] = &["js", "json"];

/// Expand glob patterns into a list of real file paths.
/// Also handles bare directory paths by scanning for supported file types.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        // If it's a directory, scan for supported extensions (non-recursive)
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() {
                    if let Some(ext) = p.extension().and_then(|e| e.to_str()) {
                        if SUPPORTED_EXTENSIONS.contains(&ext) {
                            files.push(p);
                        }
                    }
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            tracing::warn!(%pattern, "no files matched");
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}

/// Output file name (without extension) for a record name.
/// Characters outside `[A-Za-z0-9_.-]` become `_`.
fn derive_output_name(record_name: &str) -> String {
    let name: String = record_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = name.trim_start_matches('.');
    if name.is_empty() {
        "index".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_plain() {
        assert_eq!(derive_output_name("Channel"), "Channel");
    }

    #[test]
    fn output_name_sanitized() {
        assert_eq!(derive_output_name("Raycast Channel/v2"), "Raycast_Channel_v2");
        assert_eq!(derive_output_name("../x"), "_x");
    }

    #[test]
    fn output_name_empty() {
        assert_eq!(derive_output_name(""), "index");
        assert_eq!(derive_output_name("..."), "index");
    }

    #[test]
    fn frontmatter_quotes_values() {
        let doc = ClassDoc::from_json(r#"{"functions":[],"properties":[],"types":[],"name":"Channel","desc":"A set: of \"params\".","tags":["core"],"source":{"line":1,"path":"a.lua"}}"#).unwrap();
        assert_eq!(
            frontmatter(&doc).unwrap(),
            "---\ntitle: \"Channel\"\ndescription: \"A set: of \\\"params\\\".\"\ntags: [\"core\"]\n---\n\n"
        );
    }

    #[test]
    fn load_docs_labels_invalid_module() {
        let chunk = r#"(self.webpackChunkdocs=self.webpackChunkdocs||[]).push([[1],{42:e=>{e.exports=JSON.parse('{"functions":[]}')}}]);"#;
        let err = load_docs(chunk, "a.js").unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.starts_with("a.js: module 42: invalid record:"), "got: {chain}");
        assert!(chain.contains("properties: missing required field"));
    }

    #[test]
    fn load_docs_skips_site_metadata() {
        let chunk = concat!(
            r#"(self.webpackChunkdocs=self.webpackChunkdocs||[]).push([[58],{"#,
            r#"30283:e=>{e.exports=JSON.parse('{"name":"docusaurus-plugin-content-docs","id":"default"}')},"#,
            r#"42:e=>{e.exports=JSON.parse('{"functions":[],"properties":[],"types":[],"name":"Channel","desc":"","source":{"line":1,"path":"a.lua"}}')}"#,
            r#"}]);"#
        );
        let docs = load_docs(chunk, "a.js").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "Channel");
    }

    #[test]
    fn load_docs_reports_malformed_payload() {
        let err = load_docs("{\"functions\": [", "a.json").unwrap_err();
        assert!(format!("{:#}", err).starts_with("a.json: malformed JSON"));
    }
}
