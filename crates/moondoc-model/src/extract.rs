//! Pull JSON payloads out of webpack-bundled doc chunks.
//!
//! Docusaurus emits each API page's data as a chunk of the form
//!
//! ```text
//! (self.webpackChunkdocs=self.webpackChunkdocs||[]).push([[317],{60904:e=>{e.exports=JSON.parse('{...}')}}]);
//! ```
//!
//! The payload is a JavaScript string literal, so it is decoded with JS
//! escape rules before being handed to the JSON parser.

use crate::error::ExtractError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static RE_JSON_PARSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"JSON\.parse\(\s*(['"])"#).unwrap());

/// Module factory head: `60904:e=>{`, `60904:(e,t)=>{` or `60904:function(e){`.
static RE_MODULE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*:\s*(?:function\s*\([\w$,\s]*\)|\(?[\w$]*(?:\s*,\s*[\w$]+)*\)?\s*=>)")
        .unwrap()
});

static RE_CHUNK_IDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.push\(\s*\[\s*\[([\d,\s]*)\]").unwrap());

/// One embedded JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Webpack module id, when the payload came from a chunk.
    pub module_id: Option<u64>,
    /// Decoded JSON text.
    pub json: String,
}

/// Load payloads from either plain JSON or a webpack chunk.
///
/// A top-level JSON array yields one payload per element. A leading UTF-8
/// byte order mark is ignored.
pub fn load_payloads(source: &str) -> Result<Vec<Payload>, ExtractError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let trimmed = source.trim_start();
    if trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed)?;
        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        return items
            .iter()
            .map(|item| {
                Ok(Payload {
                    module_id: None,
                    json: serde_json::to_string(item)?,
                })
            })
            .collect();
    }
    if trimmed.starts_with('{') {
        return Ok(vec![Payload {
            module_id: None,
            json: trimmed.to_string(),
        }]);
    }
    extract_payloads(source)
}

/// Find and decode every `JSON.parse('...')` call in a chunk.
pub fn extract_payloads(source: &str) -> Result<Vec<Payload>, ExtractError> {
    let mut payloads = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = RE_JSON_PARSE.captures(&source[cursor..]) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let quote = caps[1].chars().next().unwrap_or('\'');
        let head_window = &source[cursor..cursor + whole.start()];
        let module_id = RE_MODULE_HEAD
            .captures_iter(head_window)
            .last()
            .and_then(|m| m[1].parse().ok());

        let literal_start = cursor + whole.end();
        let (json, end) = decode_js_string(source, literal_start, quote)?;
        tracing::debug!(?module_id, bytes = json.len(), "decoded chunk payload");
        payloads.push(Payload { module_id, json });
        cursor = end;
    }

    if payloads.is_empty() {
        return Err(ExtractError::NoPayload);
    }
    Ok(payloads)
}

/// Numeric chunk ids from the `.push([[...]` registration call.
pub fn chunk_ids(source: &str) -> Vec<u64> {
    RE_CHUNK_IDS
        .captures(source)
        .map(|caps| {
            caps[1]
                .split(',')
                .filter_map(|id| id.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Decode a JS string literal whose body starts at byte `start`.
///
/// Returns the decoded text and the byte offset just past the closing quote.
fn decode_js_string(
    source: &str,
    start: usize,
    quote: char,
) -> Result<(String, usize), ExtractError> {
    let mut out = String::new();
    let mut chars = source[start..].char_indices().peekable();

    while let Some((rel, c)) = chars.next() {
        let offset = start + rel;
        match c {
            c if c == quote => return Ok((out, offset + c.len_utf8())),
            '\n' | '\r' => break,
            '\\' => {
                let Some((_, esc)) = chars.next() else {
                    break;
                };
                match esc {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'v' => out.push('\u{b}'),
                    '0' => out.push('\0'),
                    'x' => {
                        let code = take_hex(&mut chars, 2).ok_or(ExtractError::InvalidEscape {
                            offset,
                            reason: "\\x needs two hex digits",
                        })?;
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    'u' => {
                        let code = take_unicode(&mut chars, offset)?;
                        out.push(code);
                    }
                    // Line continuation: backslash-newline contributes nothing.
                    '\n' | '\u{2028}' | '\u{2029}' => {}
                    '\r' => {
                        if matches!(chars.peek(), Some((_, '\n'))) {
                            chars.next();
                        }
                    }
                    other => out.push(other),
                }
            }
            other => out.push(other),
        }
    }

    Err(ExtractError::UnterminatedString { offset: start })
}

type CharIter<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn take_hex(chars: &mut CharIter<'_>, count: usize) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..count {
        let (_, c) = chars.next()?;
        code = code * 16 + c.to_digit(16)?;
    }
    Some(code)
}

/// Decode the rest of a `\u` escape, joining UTF-16 surrogate pairs.
fn take_unicode(chars: &mut CharIter<'_>, offset: usize) -> Result<char, ExtractError> {
    let invalid = |reason| ExtractError::InvalidEscape { offset, reason };

    if matches!(chars.peek(), Some((_, '{'))) {
        chars.next();
        let mut code = 0u32;
        let mut digits = 0;
        loop {
            match chars.next() {
                Some((_, '}')) if digits > 0 => break,
                Some((_, c)) => {
                    let d = c.to_digit(16).ok_or(invalid("bad hex digit in \\u{...}"))?;
                    code = code
                        .checked_mul(16)
                        .and_then(|v| v.checked_add(d))
                        .ok_or(invalid("code point out of range"))?;
                    digits += 1;
                }
                None => return Err(invalid("unterminated \\u{...}")),
            }
        }
        return char::from_u32(code).ok_or(invalid("code point out of range"));
    }

    let high = take_hex(chars, 4).ok_or(invalid("\\u needs four hex digits"))?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).ok_or(invalid("lone low surrogate"));
    }

    // High surrogate: the low half must follow as another \uXXXX.
    let backslash = chars.next().map(|(_, c)| c);
    let u = chars.next().map(|(_, c)| c);
    if backslash != Some('\\') || u != Some('u') {
        return Err(invalid("unpaired high surrogate"));
    }
    let low = take_hex(chars, 4).ok_or(invalid("\\u needs four hex digits"))?;
    if !(0xDC00..0xE000).contains(&low) {
        return Err(invalid("unpaired high surrogate"));
    }
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or(invalid("code point out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(literal_body: &str) -> Result<String, ExtractError> {
        let source = format!("{literal_body}'");
        decode_js_string(&source, 0, '\'').map(|(s, _)| s)
    }

    #[test]
    fn decodes_simple_escapes() {
        assert_eq!(decode(r"a\'b\\c\nd").unwrap(), "a'b\\c\nd");
    }

    #[test]
    fn keeps_json_escapes_for_the_json_parser() {
        // JS `\\n` is the two characters `\` `n`, which JSON then decodes.
        assert_eq!(decode(r#"{"a":"x\\ny"}"#).unwrap(), r#"{"a":"x\ny"}"#);
    }

    #[test]
    fn decodes_hex_and_unicode() {
        assert_eq!(decode(r"\x41é\u{1F600}").unwrap(), "Aé\u{1F600}");
    }

    #[test]
    fn joins_surrogate_pairs() {
        assert_eq!(decode(r"\uD83D\uDE00").unwrap(), "\u{1F600}");
    }

    #[test]
    fn rejects_unpaired_surrogate() {
        assert!(matches!(
            decode(r"\uD83Dx"),
            Err(ExtractError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn unknown_escape_is_identity() {
        assert_eq!(decode(r"\q\/").unwrap(), "q/");
    }

    #[test]
    fn line_continuation() {
        assert_eq!(decode("a\\\nb").unwrap(), "ab");
    }

    #[test]
    fn unterminated_literal() {
        let err = decode_js_string("abc", 0, '\'').unwrap_err();
        assert!(matches!(err, ExtractError::UnterminatedString { offset: 0 }));
    }

    #[test]
    fn raw_newline_terminates_with_error() {
        assert!(decode_js_string("ab\ncd'", 0, '\'').is_err());
    }

    #[test]
    fn extracts_module_ids() {
        let chunk = r#"(self.webpackChunkdocs=self.webpackChunkdocs||[]).push([[1,2],{10:e=>{e.exports=JSON.parse('{"a":1}')},20:function(e){e.exports=JSON.parse("{\"b\":2}")}}]);"#;
        let payloads = extract_payloads(chunk).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].module_id, Some(10));
        assert_eq!(payloads[0].json, r#"{"a":1}"#);
        assert_eq!(payloads[1].module_id, Some(20));
        assert_eq!(payloads[1].json, r#"{"b":2}"#);
        assert_eq!(chunk_ids(chunk), vec![1, 2]);
    }

    #[test]
    fn no_payload_is_an_error() {
        assert!(matches!(
            extract_payloads("console.log(1)"),
            Err(ExtractError::NoPayload)
        ));
    }

    #[test]
    fn plain_json_passes_through() {
        let payloads = load_payloads("  {\"name\":\"x\"}").unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].module_id, None);
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let payloads = load_payloads("\u{feff}{\"name\":\"x\"}").unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].json, r#"{"name":"x"}"#);

        let payloads = load_payloads("\u{feff}\n[{\"a\":1}]").unwrap();
        assert_eq!(payloads[0].json, r#"{"a":1}"#);

        let chunk = "\u{feff}x=JSON.parse('{\"b\":2}')";
        assert_eq!(load_payloads(chunk).unwrap()[0].json, r#"{"b":2}"#);
    }

    #[test]
    fn json_array_splits_into_payloads() {
        let payloads = load_payloads(r#"[{"a":1},{"b":2}]"#).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1].json, r#"{"b":2}"#);
    }
}
