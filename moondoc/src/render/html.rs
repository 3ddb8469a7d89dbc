//! HTML renderer — standalone HTML page with semantic markup.

use crate::desc::{self, Block};
use crate::render::{badges, RenderOptions, Renderer};
use crate::toc::{self, Slugger};
use anyhow::Result;
use moondoc_model::*;
use regex::Regex;
use std::sync::LazyLock;

pub struct HtmlRenderer;

// Inline markup, applied to already-escaped text.
static RE_CODE_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``\s?(.+?)\s?``").unwrap());

static RE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

static RE_STRONG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

static RE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").unwrap());

impl Renderer for HtmlRenderer {
    fn render(&self, doc: &ClassDoc, opts: &RenderOptions) -> Result<String> {
        let mut out = String::new();
        let mut slugger = Slugger::default();

        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", html_escape(&doc.name)));
        out.push_str("<style>\n");
        out.push_str("body { font-family: system-ui, sans-serif; max-width: 48em; margin: 2em auto; padding: 0 1em; }\n");
        out.push_str("code { background: #f4f4f4; padding: 0.15em 0.3em; border-radius: 3px; }\n");
        out.push_str("pre { background: #f4f4f4; padding: 1em; border-radius: 5px; overflow-x: auto; }\n");
        out.push_str("dt { font-weight: bold; margin-top: 0.5em; }\n");
        out.push_str("dd { margin-left: 1.5em; }\n");
        out.push_str(".badge { display: inline-block; font-size: 0.75em; padding: 0.1em 0.4em; border-radius: 3px; margin-left: 0.5em; background: #e3e3e3; }\n");
        out.push_str(".admonition { border-left: 4px solid #888; padding: 0.5em 1em; margin: 1em 0; background: #fafafa; }\n");
        out.push_str(".admonition-info, .admonition-note { border-color: #4cb3d4; }\n");
        out.push_str(".admonition-tip { border-color: #009400; }\n");
        out.push_str(".admonition-warning, .admonition-caution { border-color: #e6a700; }\n");
        out.push_str(".admonition-danger { border-color: #e13238; }\n");
        out.push_str(".source { font-size: 0.85em; color: #666; }\n");
        out.push_str("</style>\n");
        out.push_str("</head>\n<body>\n");

        out.push_str(&format!(
            "<h1 id=\"{}\">{}</h1>\n",
            slugger.slug(&doc.name),
            html_escape(&doc.name)
        ));
        if let Some(ref dep) = doc.deprecated {
            out.push_str(&deprecation_html(dep));
        }
        out.push_str(&render_desc(&doc.desc));
        out.push_str(&source_html(&doc.source, opts));

        // Anchors are assigned before the index is written so links match
        // the headings below.
        let index_anchor = slugger.slug("Index");
        let types = section_anchors(&mut slugger, "Types", doc.types.iter().map(|t| &t.name));
        let props =
            section_anchors(&mut slugger, "Properties", doc.properties.iter().map(|p| &p.name));
        let funcs =
            section_anchors(&mut slugger, "Functions", doc.functions.iter().map(|f| &f.name));

        if !types.items.is_empty() || !props.items.is_empty() || !funcs.items.is_empty() {
            out.push_str(&format!("<h2 id=\"{}\">Index</h2>\n", index_anchor));
            index_list(&mut out, "Types", doc.types.iter().map(|t| &t.name), &types.items);
            index_list(&mut out, "Properties", doc.properties.iter().map(|p| &p.name), &props.items);
            index_list(&mut out, "Functions", doc.functions.iter().map(|f| &f.name), &funcs.items);
        }

        if !doc.types.is_empty() {
            out.push_str(&format!("<h2 id=\"{}\">Types</h2>\n", types.heading));
            for (ty, anchor) in doc.types.iter().zip(&types.items) {
                out.push_str(&render_type_html(ty, anchor, opts));
            }
        }

        if !doc.properties.is_empty() {
            out.push_str(&format!("<h2 id=\"{}\">Properties</h2>\n", props.heading));
            for (prop, anchor) in doc.properties.iter().zip(&props.items) {
                out.push_str(&render_property_html(&doc.name, prop, anchor, opts));
            }
        }

        if !doc.functions.is_empty() {
            out.push_str(&format!("<h2 id=\"{}\">Functions</h2>\n", funcs.heading));
            for (func, anchor) in doc.functions.iter().zip(&funcs.items) {
                out.push_str(&render_function_html(&doc.name, func, anchor, opts));
            }
        }

        out.push_str("</body>\n</html>\n");
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "html"
    }
}

/// Slugs for one section heading and its items.
#[derive(Default)]
struct SectionAnchors {
    heading: String,
    items: Vec<String>,
}

fn section_anchors<'a>(
    slugger: &mut Slugger,
    title: &str,
    names: impl Iterator<Item = &'a String>,
) -> SectionAnchors {
    let names: Vec<&String> = names.collect();
    if names.is_empty() {
        return SectionAnchors::default();
    }
    let heading = slugger.slug(title);
    let items = names.into_iter().map(|n| slugger.slug(n)).collect();
    SectionAnchors { heading, items }
}

fn index_list<'a>(
    out: &mut String,
    title: &str,
    names: impl Iterator<Item = &'a String>,
    anchors: &[String],
) {
    if anchors.is_empty() {
        return;
    }
    out.push_str(&format!("<h3>{}</h3>\n<ul>\n", title));
    for (name, anchor) in names.zip(anchors) {
        out.push_str(&format!(
            "  <li><a href=\"#{}\">{}</a></li>\n",
            html_escape(anchor),
            html_escape(name)
        ));
    }
    out.push_str("</ul>\n");
}

fn render_type_html(ty: &TypeDoc, anchor: &str, opts: &RenderOptions) -> String {
    let mut out = heading_html(&ty.name, anchor, &badges(ty, &[]));
    out.push_str(&code_html(&format!("type {} = {}", ty.name, ty.lua_type)));
    out.push_str(&render_desc(&ty.desc));
    if let Some(ref fields) = ty.fields {
        if !fields.is_empty() {
            out.push_str("<h4>Fields</h4>\n<dl>\n");
            for field in fields {
                out.push_str(&definition_html(&field.name, &field.lua_type, &field.desc));
            }
            out.push_str("</dl>\n");
        }
    }
    out.push_str(&source_html(&ty.source, opts));
    out
}

fn render_property_html(
    class_name: &str,
    prop: &PropertyDoc,
    anchor: &str,
    opts: &RenderOptions,
) -> String {
    let extra: &[&str] = if prop.is_readonly() { &["read only"] } else { &[] };
    let mut out = heading_html(&prop.name, anchor, &badges(prop, extra));
    out.push_str(&code_html(&prop.declaration(class_name)));
    if let Some(ref dep) = prop.deprecated {
        out.push_str(&deprecation_html(dep));
    }
    out.push_str(&render_desc(&prop.desc));
    out.push_str(&source_html(&prop.source, opts));
    out
}

fn render_function_html(
    class_name: &str,
    func: &FunctionDoc,
    anchor: &str,
    opts: &RenderOptions,
) -> String {
    let mut out = heading_html(
        &func.name,
        anchor,
        &badges(func, &[func.function_type.as_str()]),
    );
    out.push_str(&code_html(&func.signature(class_name)));
    if let Some(ref dep) = func.deprecated {
        out.push_str(&deprecation_html(dep));
    }
    out.push_str(&render_desc(&func.desc));

    if !func.params.is_empty() {
        out.push_str("<h4>Parameters</h4>\n<dl>\n");
        for param in &func.params {
            out.push_str(&definition_html(&param.name, &param.lua_type, &param.desc));
        }
        out.push_str("</dl>\n");
    }

    let lists = [
        ("Returns", Some(&func.returns)),
        ("Yields", func.yields.as_ref()),
    ];
    for (title, entries) in lists {
        let Some(entries) = entries.filter(|e| !e.is_empty()) else {
            continue;
        };
        out.push_str(&format!("<h4>{}</h4>\n<ul>\n", title));
        for ret in entries {
            out.push_str(&typed_item_html(&ret.lua_type, &ret.desc));
        }
        out.push_str("</ul>\n");
    }

    if let Some(ref errors) = func.errors {
        if !errors.is_empty() {
            out.push_str("<h4>Errors</h4>\n<ul>\n");
            for err in errors {
                out.push_str(&typed_item_html(&err.lua_type, &err.desc));
            }
            out.push_str("</ul>\n");
        }
    }

    out.push_str(&source_html(&func.source, opts));
    out
}

fn heading_html(name: &str, anchor: &str, badges: &[String]) -> String {
    let mut out = format!("<h3 id=\"{}\">{}", html_escape(anchor), html_escape(name));
    for badge in badges {
        out.push_str(&format!(" <span class=\"badge\">{}</span>", html_escape(badge)));
    }
    out.push_str("</h3>\n");
    out
}

fn code_html(code: &str) -> String {
    format!(
        "<pre><code class=\"language-lua\">{}</code></pre>\n",
        html_escape(code)
    )
}

fn definition_html(name: &str, lua_type: &str, desc: &str) -> String {
    let mut out = format!(
        "  <dt>{} <code>{}</code></dt>\n",
        html_escape(name),
        html_escape(lua_type)
    );
    if !desc.trim().is_empty() {
        out.push_str(&format!("  <dd>{}</dd>\n", inline(desc.trim())));
    }
    out
}

fn typed_item_html(lua_type: &str, desc: &str) -> String {
    if desc.trim().is_empty() {
        format!("  <li><code>{}</code></li>\n", html_escape(lua_type))
    } else {
        format!(
            "  <li><code>{}</code>: {}</li>\n",
            html_escape(lua_type),
            inline(desc.trim())
        )
    }
}

fn deprecation_html(dep: &Deprecation) -> String {
    render_blocks(&[Block::Admonition {
        kind: "caution".to_string(),
        title: Some(format!("Deprecated since {}", dep.version)),
        body: dep
            .desc
            .as_deref()
            .map(desc::parse_blocks)
            .unwrap_or_default(),
    }])
}

fn source_html(source: &SourceLocation, opts: &RenderOptions) -> String {
    let text = html_escape(&source.to_string());
    match toc::source_link(opts.source_url.as_deref(), &source.path, source.line) {
        Some(url) => format!(
            "<p class=\"source\">Source: <a href=\"{}\">{}</a></p>\n",
            html_escape(&url),
            text
        ),
        None => format!("<p class=\"source\">Source: {}</p>\n", text),
    }
}

/// Render description text: paragraphs, code fences and admonitions.
fn render_desc(text: &str) -> String {
    render_blocks(&desc::parse_blocks(text))
}

fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Paragraph(text) => {
                out.push_str(&format!("<p>{}</p>\n", inline(text)));
            }
            Block::Code { lang, body } => {
                let class = lang
                    .as_deref()
                    .map(|l| format!(" class=\"language-{}\"", html_escape(l)))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "<pre><code{}>{}</code></pre>\n",
                    class,
                    html_escape(body)
                ));
            }
            Block::Admonition { kind, title, body } => {
                let kind_class = if kind.is_empty() { "note" } else { kind.as_str() };
                out.push_str(&format!(
                    "<div class=\"admonition admonition-{}\">\n",
                    html_escape(kind_class)
                ));
                let heading = title.clone().unwrap_or_else(|| kind_class.to_uppercase());
                out.push_str(&format!("<p><strong>{}</strong></p>\n", html_escape(&heading)));
                out.push_str(&render_blocks(body));
                out.push_str("</div>\n");
            }
        }
    }
    out
}

/// Escape text, then apply inline code, bold and link markup.
fn inline(text: &str) -> String {
    let escaped = html_escape(text);
    let escaped = RE_CODE_DOUBLE.replace_all(&escaped, "<code>$1</code>");
    let escaped = RE_CODE.replace_all(&escaped, "<code>$1</code>");
    let escaped = RE_STRONG.replace_all(&escaped, "<strong>$1</strong>");
    let escaped = RE_LINK.replace_all(&escaped, "<a href=\"$2\">$1</a>");
    escaped.replace('\n', "<br>\n")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
