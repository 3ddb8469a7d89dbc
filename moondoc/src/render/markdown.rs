//! MDX renderer for Docusaurus sites.
//!
//! Produces one page per class: title, description, an index, then one
//! section each for types, properties and functions. Descriptions keep their
//! markdown so Docusaurus admonitions (`:::info`) keep working; only `{`, `}`
//! and `<` outside code are escaped, since MDX reads them as expressions or
//! JSX.

use crate::render::{badges, RenderOptions, Renderer};
use crate::toc::{self, Slugger};
use anyhow::Result;
use moondoc_model::*;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, doc: &ClassDoc, opts: &RenderOptions) -> Result<String> {
        let anchors = Anchors::assign(doc);
        let mut blocks: Vec<String> = Vec::new();

        blocks.push(format!("# {}", doc.name));
        if let Some(ref dep) = doc.deprecated {
            blocks.push(deprecation_notice(dep));
        }
        push_desc(&mut blocks, &doc.desc);
        blocks.push(source_line(&doc.source, opts));

        // Index
        let has_items =
            !doc.types.is_empty() || !doc.properties.is_empty() || !doc.functions.is_empty();
        if has_items {
            blocks.push("## Index".to_string());
            index_group(&mut blocks, "Types", doc.types.iter().map(|t| &t.name), &anchors.types);
            index_group(
                &mut blocks,
                "Properties",
                doc.properties.iter().map(|p| &p.name),
                &anchors.properties,
            );
            index_group(
                &mut blocks,
                "Functions",
                doc.functions.iter().map(|f| &f.name),
                &anchors.functions,
            );
        }

        if !doc.types.is_empty() {
            blocks.push("## Types".to_string());
            for ty in &doc.types {
                render_type(&mut blocks, ty, opts);
            }
        }

        if !doc.properties.is_empty() {
            blocks.push("## Properties".to_string());
            for prop in &doc.properties {
                render_property(&mut blocks, &doc.name, prop, opts);
            }
        }

        if !doc.functions.is_empty() {
            blocks.push("## Functions".to_string());
            for func in &doc.functions {
                render_function(&mut blocks, &doc.name, func, opts);
            }
        }

        let mut output = blocks.join("\n\n");
        output.push('\n');
        Ok(output)
    }

    fn file_extension(&self) -> &str {
        "mdx"
    }

    fn accepts_preamble(&self) -> bool {
        true
    }
}

/// Heading anchors for every item, assigned in page order.
struct Anchors {
    types: Vec<String>,
    properties: Vec<String>,
    functions: Vec<String>,
}

impl Anchors {
    fn assign(doc: &ClassDoc) -> Self {
        let mut slugger = Slugger::default();
        slugger.slug(&doc.name);
        slugger.slug("Index");

        let mut section = |title: &str, names: Vec<&str>| -> Vec<String> {
            if names.is_empty() {
                return Vec::new();
            }
            slugger.slug(title);
            names.into_iter().map(|n| slugger.slug(n)).collect()
        };

        let types = section("Types", doc.types.iter().map(|t| t.name.as_str()).collect());
        let properties = section(
            "Properties",
            doc.properties.iter().map(|p| p.name.as_str()).collect(),
        );
        let functions = section(
            "Functions",
            doc.functions.iter().map(|f| f.name.as_str()).collect(),
        );
        Self {
            types,
            properties,
            functions,
        }
    }
}

fn index_group<'a>(
    blocks: &mut Vec<String>,
    title: &str,
    names: impl Iterator<Item = &'a String>,
    anchors: &[String],
) {
    let items: Vec<String> = names
        .zip(anchors)
        .map(|(name, anchor)| toc::render_toc_item(name, anchor))
        .collect();
    if items.is_empty() {
        return;
    }
    blocks.push(format!("**{}**", title));
    blocks.push(items.join("\n"));
}

fn render_type(blocks: &mut Vec<String>, ty: &TypeDoc, opts: &RenderOptions) {
    blocks.push(format!("### {}", ty.name));
    push_badges(blocks, badges(ty, &[]));
    blocks.push(lua_block(&format!("type {} = {}", ty.name, ty.lua_type)));
    push_desc(blocks, &ty.desc);

    if let Some(ref fields) = ty.fields {
        if !fields.is_empty() {
            blocks.push("#### Fields".to_string());
            blocks.push(
                fields
                    .iter()
                    .map(|f| named_item(&f.name, &f.lua_type, &f.desc))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
    }
    blocks.push(source_line(&ty.source, opts));
}

fn render_property(
    blocks: &mut Vec<String>,
    class_name: &str,
    prop: &PropertyDoc,
    opts: &RenderOptions,
) {
    blocks.push(format!("### {}", prop.name));
    let extra: &[&str] = if prop.is_readonly() { &["read only"] } else { &[] };
    push_badges(blocks, badges(prop, extra));
    blocks.push(lua_block(&prop.declaration(class_name)));
    if let Some(ref dep) = prop.deprecated {
        blocks.push(deprecation_notice(dep));
    }
    push_desc(blocks, &prop.desc);
    blocks.push(source_line(&prop.source, opts));
}

fn render_function(
    blocks: &mut Vec<String>,
    class_name: &str,
    func: &FunctionDoc,
    opts: &RenderOptions,
) {
    blocks.push(format!("### {}", func.name));
    push_badges(blocks, badges(func, &[func.function_type.as_str()]));
    blocks.push(lua_block(&func.signature(class_name)));
    if let Some(ref dep) = func.deprecated {
        blocks.push(deprecation_notice(dep));
    }
    push_desc(blocks, &func.desc);

    if !func.params.is_empty() {
        blocks.push("#### Parameters".to_string());
        blocks.push(
            func.params
                .iter()
                .map(|p| named_item(&p.name, &p.lua_type, &p.desc))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    if !func.returns.is_empty() {
        blocks.push("#### Returns".to_string());
        blocks.push(typed_list(func.returns.iter().map(|r| (&r.lua_type, &r.desc))));
    }

    if let Some(ref yields) = func.yields {
        if !yields.is_empty() {
            blocks.push("#### Yields".to_string());
            blocks.push(typed_list(yields.iter().map(|r| (&r.lua_type, &r.desc))));
        }
    }

    if let Some(ref errors) = func.errors {
        if !errors.is_empty() {
            blocks.push("#### Errors".to_string());
            blocks.push(typed_list(errors.iter().map(|e| (&e.lua_type, &e.desc))));
        }
    }

    blocks.push(source_line(&func.source, opts));
}

// -- Helpers ------------------------------------------------------------------

fn push_desc(blocks: &mut Vec<String>, desc: &str) {
    let desc = desc.trim();
    if !desc.is_empty() {
        blocks.push(escape_mdx(desc));
    }
}

/// Escape `{`, `}` and `<` in prose. Fenced blocks and code spans are left
/// alone; MDX treats their contents as literal text.
fn escape_mdx(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut fence: Option<&str> = None;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let marker = line.trim_start();
        match fence {
            Some(open) => {
                out.push_str(line);
                if marker.starts_with(open) {
                    fence = None;
                }
            }
            None if marker.starts_with("```") || marker.starts_with("~~~") => {
                fence = Some(&marker[..3]);
                out.push_str(line);
            }
            None => escape_line(line, &mut out),
        }
    }
    out
}

fn escape_line(line: &str, out: &mut String) {
    let mut rest = line;
    while let Some(pos) = rest.find(['{', '}', '<', '`']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.as_bytes()[0] {
            b'`' => {
                let end = code_span_len(tail).unwrap_or_else(|| backtick_run(tail));
                out.push_str(&tail[..end]);
                rest = &tail[end..];
                continue;
            }
            b'{' => out.push_str("\\{"),
            b'}' => out.push_str("\\}"),
            _ => out.push_str("&lt;"),
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
}

/// Byte length of the code span opening at the start of `text`, if a closing
/// backtick run of the same length follows.
fn code_span_len(text: &str) -> Option<usize> {
    let run = backtick_run(text);
    let mut offset = run;
    while let Some(found) = text[offset..].find('`') {
        let start = offset + found;
        let len = backtick_run(&text[start..]);
        if len == run {
            return Some(start + len);
        }
        offset = start + len;
    }
    None
}

fn backtick_run(text: &str) -> usize {
    text.len() - text.trim_start_matches('`').len()
}

/// `> `read only` `static``
fn push_badges(blocks: &mut Vec<String>, badges: Vec<String>) {
    if badges.is_empty() {
        return;
    }
    let rendered: Vec<String> = badges.iter().map(|b| format!("`{}`", b)).collect();
    blocks.push(format!("> {}", rendered.join(" ")));
}

fn lua_block(code: &str) -> String {
    format!("```lua\n{}\n```", code)
}

/// `* **name** (`type`): desc`
fn named_item(name: &str, lua_type: &str, desc: &str) -> String {
    let mut item = format!("* **{}** ({})", name, inline_code(lua_type));
    append_desc(&mut item, desc);
    item
}

/// `* `type`: desc` per entry.
fn typed_list<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    entries
        .map(|(lua_type, desc)| {
            let mut item = format!("* {}", inline_code(lua_type));
            append_desc(&mut item, desc);
            item
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn append_desc(item: &mut String, desc: &str) {
    let desc = desc.trim();
    if !desc.is_empty() {
        item.push_str(": ");
        // Continuation lines stay inside the list item.
        item.push_str(&escape_mdx(desc).replace('\n', "\n  "));
    }
}

/// Inline code span that survives backticks inside the type text.
fn inline_code(text: &str) -> String {
    if text.contains('`') {
        format!("`` {} ``", text)
    } else {
        format!("`{}`", text)
    }
}

fn deprecation_notice(dep: &Deprecation) -> String {
    let mut notice = format!(":::caution Deprecated since {}", dep.version);
    if let Some(ref desc) = dep.desc {
        let desc = desc.trim();
        if !desc.is_empty() {
            notice.push('\n');
            notice.push_str(&escape_mdx(desc));
        }
    }
    notice.push_str("\n:::");
    notice
}

fn source_line(source: &SourceLocation, opts: &RenderOptions) -> String {
    match toc::source_link(opts.source_url.as_deref(), &source.path, source.line) {
        Some(url) => format!("Source: [{}]({})", source, url),
        None => format!("Source: {}", source),
    }
}
