mod common;

use common::fixtures::*;
use common::{TestResult, compose_with, snapshot};
use galley::{DocumentBuilder, PipelineError, RunConfig};
use serde_json::{Value, json};
use std::fs;
use std::process::Command;

fn write_json(path: &std::path::Path, value: &Value) -> std::io::Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)
}

#[test]
fn template_file_sets_page_geometry() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir()?;
    let template = dir.path().join("template.json");
    write_json(
        &template,
        &json!({ "page": { "orientation": "landscape", "margins": { "top": 36, "bottom": 36, "left": 36, "right": 36 } } }),
    )?;

    let builder = DocumentBuilder::new().with_template_file(&template)?;
    let outcome = compose_with(&builder, doc(vec![para("Wide")]))?;
    let snap = snapshot(&outcome);
    assert_eq!(snap.pages[0].bounds.width, 792.0);
    assert_eq!(snap.pages[0].margins.left, 36.0);
    Ok(())
}

#[test]
fn missing_template_stops_the_run() {
    let result = DocumentBuilder::new().with_template_file("/nonexistent/template.json");
    assert!(matches!(result, Err(PipelineError::TemplateMissing(_))));
}

#[test]
fn config_file_enables_trimming() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("run.json");
    write_json(&path, &json!({ "layout": { "trimTrailingEmpty": true } }))?;
    let config = RunConfig::from_file(&path)?;
    assert!(config.layout.trim_trailing_empty);

    let wide = table_with(grid(2, 6), json!({ "layout": { "orientation": "landscape" } }));
    let content = doc(vec![para("Before"), vec![wide]]);
    let trimmed = compose_with(&DocumentBuilder::new().with_config(config), content.clone())?;
    let kept = compose_with(&DocumentBuilder::new(), content)?;
    assert_eq!(kept.report.pages, 3);
    assert_eq!(trimmed.report.pages, 2);
    Ok(())
}

#[test]
fn cli_writes_snapshot_and_event_log() -> TestResult {
    let dir = tempfile::tempdir()?;
    let content = dir.path().join("content.json");
    let out = dir.path().join("out.json");
    let log = dir.path().join("events.log");
    write_json(&content, &doc(vec![para("Hello"), vec![footnote(1, "Note.")], para("World")]))?;

    let status = Command::new(env!("CARGO_BIN_EXE_galley"))
        .arg("--content")
        .arg(&content)
        .arg("--out")
        .arg(&out)
        .arg("--log")
        .arg(&log)
        .status()?;
    assert!(status.success());

    let exported: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(exported["pages"].as_array().map(Vec::len), Some(1));
    assert_eq!(exported["notes"].as_array().map(Vec::len), Some(1));

    let events = fs::read_to_string(&log)?;
    assert!(events.contains("Loaded 5 directives"));
    Ok(())
}

#[test]
fn cli_fails_on_missing_template() -> TestResult {
    let dir = tempfile::tempdir()?;
    let content = dir.path().join("content.json");
    write_json(&content, &doc(vec![para("Hello")]))?;

    let output = Command::new(env!("CARGO_BIN_EXE_galley"))
        .arg("--content")
        .arg(&content)
        .arg("--template")
        .arg(dir.path().join("absent.json"))
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.json"));
    Ok(())
}
