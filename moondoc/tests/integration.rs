use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_moondoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).unwrap()
}

// -- stdin mode --

#[test]
fn stdin_chunk_produces_markdown() {
    let assert = cmd()
        .write_stdin(fixture("channel.chunk.js"))
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert!(output.starts_with("# Channel\n\nA set of RayParams ties to this object."));
    assert!(output.contains("## Properties"));
    assert!(output.contains("## Functions"));
    assert!(output.contains("* [\\_MaintenanceCopy](#_maintenancecopy)"));
    assert!(output.contains("```lua\nChannel:AppendToFDI(Inst: Instance) -> ()\n```"));
    assert!(output.contains("* **InstanceLogic** (`((any) -> boolean | nil)?`): A function"));
    assert!(output.contains("* **FilterType** (`Enum.RaycastFilterType?`)\n"));
    assert!(output.contains("#### Returns\n\n* `Channel`"));
    // Admonitions pass through for MDX
    assert!(output.contains(":::info\nThis is the same function"));
    assert!(output.contains("Source: src/init.lua:375"));
}

#[test]
fn stdin_plain_json_matches_chunk() {
    let from_chunk = cmd()
        .write_stdin(fixture("channel.chunk.js"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let from_json = cmd()
        .write_stdin(fixture("channel.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(from_chunk, from_json);
}

#[test]
fn stdin_check_reports_counts() {
    cmd()
        .arg("--check")
        .write_stdin(fixture("channel.chunk.js"))
        .assert()
        .success()
        .stdout("ok: <stdin> (Channel: 4 functions, 6 properties)\n");
}

#[test]
fn stdin_html_format() {
    let assert = cmd()
        .args(["-f", "html"])
        .write_stdin(fixture("channel.chunk.js"))
        .assert()
        .success();

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("<!DOCTYPE html>"));
    assert!(output.contains("<title>Channel</title>"));
    assert!(output.contains("<div class=\"admonition admonition-info\">"));
    assert!(output.contains("<code>CreateChannel</code>"));
    assert!(output.contains("<h3 id=\"_name\">_Name <span class=\"badge\">read only</span></h3>"));
}

#[test]
fn stdin_json_round_trips() {
    let assert = cmd()
        .args(["-f", "json"])
        .write_stdin(fixture("channel.chunk.js"))
        .assert()
        .success();

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let rendered: serde_json::Value = serde_json::from_str(&output).unwrap();
    let original: serde_json::Value = serde_json::from_str(&fixture("channel.json")).unwrap();
    assert_eq!(rendered, original);
}

#[test]
fn stdin_source_links() {
    cmd()
        .args(["--source-url", "https://github.com/owner/repo/blob/main"])
        .write_stdin(fixture("channel.chunk.js"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Source: [src/init.lua:161](https://github.com/owner/repo/blob/main/src/init.lua#L161)",
        ));
}

// -- validation failures --

#[test]
fn invalid_record_reports_field_path() {
    let mut record: serde_json::Value = serde_json::from_str(&fixture("channel.json")).unwrap();
    record["functions"][1]["function_type"] = "getter".into();
    record["properties"][0]["readonly"] = "yes".into();

    cmd()
        .write_stdin(record.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("functions[1].function_type"))
        .stderr(predicate::str::contains(
            "properties[0].readonly: expected boolean, found string",
        ));
}

#[test]
fn malformed_json_fails() {
    cmd()
        .write_stdin("{\"functions\": [")
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed JSON"));
}

// -- file mode --

#[test]
fn file_mode_creates_output() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("channel.chunk.js"))
        .assert()
        .success();

    let output = std::fs::read_to_string(dir.path().join("Channel.mdx")).unwrap();
    assert!(
        output.starts_with("---\ntitle: \"Channel\"\ndescription: \"A set of RayParams"),
        "Should have frontmatter, got: {}",
        &output[..80.min(output.len())]
    );
    assert!(output.contains("\n---\n\n# Channel\n"));
}

#[test]
fn file_mode_no_frontmatter_flag() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg("--no-frontmatter")
        .arg(fixture_path("channel.json"))
        .assert()
        .success();

    let output = std::fs::read_to_string(dir.path().join("Channel.mdx")).unwrap();
    assert!(output.starts_with("# Channel\n"));
}

#[test]
fn file_mode_requires_output() {
    cmd()
        .arg(fixture_path("channel.chunk.js"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output is required"));
}

#[test]
fn file_mode_check_needs_no_output() {
    cmd()
        .arg("--check")
        .arg(fixture_path("channel.chunk.js"))
        .assert()
        .success()
        .stdout(predicate::str::contains("(Channel: 4 functions, 6 properties)"));
}

#[test]
fn file_mode_directory_input() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    std::fs::copy(
        fixture_path("channel.chunk.js"),
        input.path().join("01b616b0.dc83f763.js"),
    )
    .unwrap();
    // Runtime chunk with no payload is skipped.
    std::fs::write(input.path().join("runtime.js"), "console.log(1);").unwrap();
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    cmd()
        .args(["-o", out.path().to_str().unwrap()])
        .args(["-f", "json"])
        .arg(input.path().to_str().unwrap())
        .assert()
        .success();

    let entries: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(out.path().join("Channel.json").exists());
}

#[test]
fn file_mode_skips_site_metadata_chunks() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    std::fs::copy(
        fixture_path("channel.chunk.js"),
        input.path().join("01b616b0.dc83f763.js"),
    )
    .unwrap();
    std::fs::write(
        input.path().join("0058b4c6.js"),
        r#""use strict";(self.webpackChunkdocs=self.webpackChunkdocs||[]).push([[58],{30283:e=>{e.exports=JSON.parse('{"name":"docusaurus-plugin-content-docs","id":"default"}')}}]);"#,
    )
    .unwrap();

    cmd()
        .args(["-o", out.path().to_str().unwrap()])
        .arg(input.path().to_str().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains("not an API record"));

    assert!(out.path().join("Channel.mdx").exists());
}

#[test]
fn file_mode_accepts_byte_order_mark() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let path = input.path().join("Channel.json");
    std::fs::write(&path, format!("\u{feff}{}", fixture("channel.json"))).unwrap();

    cmd()
        .args(["-o", out.path().to_str().unwrap()])
        .arg(path.to_str().unwrap())
        .assert()
        .success();

    assert!(out.path().join("Channel.mdx").exists());
}

// -- prefix template --

#[test]
fn file_mode_with_prefix() {
    let dir = TempDir::new().unwrap();
    let mut prefix_file = NamedTempFile::new().unwrap();
    prefix_file
        .write_all(b"import Link from \"@docusaurus/Link\";\n\n<Link to=\"https://example.com/${name}\">\nSource\n</Link>\n")
        .unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["-p", prefix_file.path().to_str().unwrap()])
        .arg("--no-frontmatter")
        .arg(fixture_path("channel.chunk.js"))
        .assert()
        .success();

    let output = std::fs::read_to_string(dir.path().join("Channel.mdx")).unwrap();
    assert!(
        output.starts_with("import Link"),
        "Should start with prefix, got: {}",
        &output[..80.min(output.len())]
    );
    assert!(
        output.contains("https://example.com/Channel"),
        "${{name}} should be substituted"
    );
}

#[test]
fn missing_prefix_fails() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["-p", "/nonexistent/prefix.mdx"])
        .arg(fixture_path("channel.chunk.js"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("prefix not found"));
}

// -- filtering --

#[test]
fn private_items_hidden_unless_requested() {
    let mut record: serde_json::Value = serde_json::from_str(&fixture("channel.json")).unwrap();
    record["properties"][2]["private"] = true.into();
    let input = record.to_string();

    let assert = cmd().write_stdin(input.clone()).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(!output.contains("### _Janitor"));

    let assert = cmd()
        .arg("--show-private")
        .write_stdin(input)
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("### _Janitor"));
    assert!(output.contains("> `read only` `private`"));
}

// -- output formats --

#[test]
fn file_mode_html_format() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["-f", "html"])
        .arg(fixture_path("channel.chunk.js"))
        .assert()
        .success();

    let output_path = dir.path().join("Channel.html");
    assert!(output_path.exists(), "Should create .html file");
    let output = std::fs::read_to_string(output_path).unwrap();
    assert!(output.starts_with("<!DOCTYPE html>"));
    assert!(output.contains("RemoveFromFDI"));
}

#[test]
fn invalid_format_fails() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["-f", "xml"])
        .arg(fixture_path("channel.chunk.js"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}
