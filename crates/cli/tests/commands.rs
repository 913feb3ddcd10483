//! End-to-end tests that run the built `quarry` binary against local files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::{Value, json};
use tempfile::TempDir;

const PAGE: &str = r#"<!doctype html>
<html>
<head><title> Corner Shop </title></head>
<body>
	<h1>Today</h1>
	<ul class="products">
		<li class="item"><a href="/p/1">Lamp</a> <span class="price">12</span></li>
		<li class="item"><a href="/p/2">Desk</a> <span class="price">7</span></li>
	</ul>
</body>
</html>"#;

fn quarry_binary() -> PathBuf {
	let mut path = std::env::current_exe().expect("current_exe should resolve");
	path.pop();
	path.pop();
	path.push("quarry");
	path
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
	let path = dir.path().join(name);
	std::fs::write(&path, contents).expect("fixture should be writable");
	path
}

fn run_quarry(args: &[&str]) -> (bool, Value, String) {
	let output = Command::new(quarry_binary()).args(["-f", "json"]).args(args).output().expect("Failed to execute quarry");
	parse(output)
}

fn run_quarry_stdin(args: &[&str], stdin: &str) -> (bool, Value, String) {
	let mut child = Command::new(quarry_binary())
		.args(["-f", "json"])
		.args(args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("Failed to spawn quarry");
	child.stdin.take().expect("stdin should be piped").write_all(stdin.as_bytes()).expect("stdin should accept markup");
	parse(child.wait_with_output().expect("quarry should exit"))
}

fn parse(output: std::process::Output) -> (bool, Value, String) {
	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	let json = serde_json::from_str(&stdout).unwrap_or_else(|err| panic!("Expected JSON stdout from quarry -f json: {err}\nstdout:\n{stdout}\nstderr:\n{stderr}"));
	(output.status.success(), json, stderr)
}

fn path_str(path: &Path) -> &str {
	path.to_str().expect("temp paths should be UTF-8")
}

#[test]
fn extract_applies_schema_file() {
	let dir = TempDir::new().unwrap();
	let page = write(&dir, "page.html", PAGE);
	let schema = write(
		&dir,
		"schema.json",
		r#"{
			"heading": "h1",
			"products": {
				"selector": "li.item",
				"multiple": true,
				"fields": {
					"name": "a",
					"link": { "selector": "a", "attr": "href", "transform": "url" },
					"price": { "selector": ".price", "transform": "number" }
				}
			}
		}"#,
	);

	let (success, json, stderr) = run_quarry(&["extract", path_str(&page), "--schema", path_str(&schema), "--base", "https://shop.test/"]);

	assert!(success, "Command failed: {stderr}");
	assert_eq!(json["ok"], Value::Bool(true));
	assert_eq!(json["command"], "extract");
	assert_eq!(json["inputs"]["baseUrl"], "https://shop.test/");
	assert_eq!(
		json["data"],
		json!({
			"heading": "Today",
			"products": [
				{ "name": "Lamp", "link": "https://shop.test/p/1", "price": 12 },
				{ "name": "Desk", "link": "https://shop.test/p/2", "price": 7 }
			]
		})
	);
}

#[test]
fn extract_reports_failing_field_path() {
	let dir = TempDir::new().unwrap();
	let page = write(&dir, "page.html", PAGE);
	let schema = write(&dir, "schema.json", r#"{ "sku": { "selector": ".sku", "transform": "required" } }"#);

	let (success, json, _) = run_quarry(&["extract", path_str(&page), "-s", path_str(&schema)]);

	assert!(!success);
	assert_eq!(json["ok"], Value::Bool(false));
	assert_eq!(json["error"]["code"], "EXTRACTION_FAILED");
	assert_eq!(json["error"]["details"]["fieldPath"], json!(["sku"]));
	assert_eq!(json["error"]["details"]["cause"], "value is required");
}

#[test]
fn extract_rejects_malformed_schema() {
	let dir = TempDir::new().unwrap();
	let page = write(&dir, "page.html", PAGE);
	let schema = write(&dir, "schema.json", r#"{ "heading": 5 }"#);

	let (success, json, _) = run_quarry(&["extract", path_str(&page), "-s", path_str(&schema)]);

	assert!(!success);
	assert_eq!(json["error"]["code"], "SCHEMA_INVALID");
}

#[test]
fn extract_require_data_fails_on_empty_result() {
	let dir = TempDir::new().unwrap();
	let page = write(&dir, "page.html", PAGE);
	let schema = write(&dir, "schema.json", r#"{ "missing": ".nothing", "also": { "selector": "table td", "multiple": true } }"#);

	let (success, json, _) = run_quarry(&["extract", path_str(&page), "-s", path_str(&schema)]);
	assert!(success);
	assert_eq!(json["data"], json!({ "missing": null, "also": [] }));
	assert_eq!(json["diagnostics"][0]["level"], "warning");

	let (success, json, _) = run_quarry(&["extract", path_str(&page), "-s", path_str(&schema), "--require-data"]);
	assert!(!success);
	assert_eq!(json["error"]["code"], "NO_DATA");
}

#[test]
fn select_reads_attribute_with_limit() {
	let dir = TempDir::new().unwrap();
	let page = write(&dir, "page.html", PAGE);

	let (success, json, stderr) = run_quarry(&["select", path_str(&page), "ul.products a", "-a", "href", "-l", "1"]);

	assert!(success, "Command failed: {stderr}");
	assert_eq!(json["inputs"]["selector"], "ul.products a");
	assert_eq!(json["data"], json!({ "matched": 2, "items": ["/p/1"] }));
}

#[test]
fn select_reads_markup_from_stdin() {
	let (success, json, stderr) = run_quarry_stdin(&["select", "-", "li .price"], PAGE);

	assert!(success, "Command failed: {stderr}");
	assert_eq!(json["inputs"]["source"], "-");
	assert_eq!(json["data"]["items"], json!(["12", "7"]));
}

#[test]
fn select_without_matches_is_not_an_error() {
	let (success, json, _) = run_quarry_stdin(&["select", "-", "table td"], PAGE);

	assert!(success);
	assert_eq!(json["data"], json!({ "matched": 0, "items": [] }));
	assert_eq!(json["diagnostics"][0]["level"], "info");
}

#[test]
fn title_is_trimmed() {
	let dir = TempDir::new().unwrap();
	let page = write(&dir, "page.html", PAGE);

	let (success, json, stderr) = run_quarry(&["title", path_str(&page)]);

	assert!(success, "Command failed: {stderr}");
	assert_eq!(json["data"]["title"], "Corner Shop");
}

#[test]
fn missing_title_exits_nonzero() {
	let (success, json, _) = run_quarry_stdin(&["title", "-"], "<p>untitled</p>");

	assert!(!success);
	assert_eq!(json["error"]["code"], "SELECTOR_NOT_FOUND");
}

#[test]
fn missing_file_is_an_io_error() {
	let dir = TempDir::new().unwrap();
	let missing = dir.path().join("nope.html");

	let (success, json, _) = run_quarry(&["title", path_str(&missing)]);

	assert!(!success);
	assert_eq!(json["error"]["code"], "IO_ERROR");
}
