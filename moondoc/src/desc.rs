//! Block structure of description text.
//!
//! Descriptions are markdown with Docusaurus admonitions:
//!
//! ```text
//! :::warning Optional title
//! Body text.
//! :::
//! ```
//!
//! MDX output passes them through untouched; renderers for other formats
//! need the structure.

/// A top-level block of a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    /// Fenced code block, kept verbatim.
    Code { lang: Option<String>, body: String },
    Admonition {
        kind: String,
        title: Option<String>,
        body: Vec<Block>,
    },
}

/// Split description text into blocks. An admonition left open runs to the
/// end of the text.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let lines: Vec<&str> = text.lines().collect();
    let mut pos = 0;
    parse_until_close(&lines, &mut pos, false)
}

fn parse_until_close(lines: &[&str], pos: &mut usize, nested: bool) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut para: Vec<&str> = Vec::new();

    while *pos < lines.len() {
        let line = lines[*pos];
        let trimmed = line.trim();

        if trimmed == ":::" {
            *pos += 1;
            if nested {
                break;
            }
            // Stray closer outside an admonition.
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix(":::") {
            flush(&mut blocks, &mut para);
            let mut parts = rest.trim().splitn(2, char::is_whitespace);
            let kind = parts.next().unwrap_or_default().to_string();
            let title = parts
                .next()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            *pos += 1;
            let body = parse_until_close(lines, pos, true);
            blocks.push(Block::Admonition { kind, title, body });
            continue;
        }

        if let Some(info) = trimmed.strip_prefix("```") {
            flush(&mut blocks, &mut para);
            let lang = Some(info.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            *pos += 1;
            let mut body: Vec<&str> = Vec::new();
            while *pos < lines.len() && !lines[*pos].trim().starts_with("```") {
                body.push(lines[*pos]);
                *pos += 1;
            }
            // Skip the closing fence.
            *pos += 1;
            blocks.push(Block::Code {
                lang,
                body: body.join("\n"),
            });
            continue;
        }

        if trimmed.is_empty() {
            flush(&mut blocks, &mut para);
        } else {
            para.push(trimmed);
        }
        *pos += 1;
    }

    flush(&mut blocks, &mut para);
    blocks
}

fn flush(blocks: &mut Vec<Block>, para: &mut Vec<&str>) {
    if !para.is_empty() {
        blocks.push(Block::Paragraph(para.join("\n")));
        para.clear();
    }
}

/// First paragraph of a description, for one-line summaries.
pub fn summary(text: &str) -> Option<String> {
    parse_blocks(text).into_iter().find_map(|block| match block {
        Block::Paragraph(p) => Some(p.replace('\n', " ")),
        _ => None,
    })
}
