use predicates::prelude::*;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::{jinja_provider, write_block};
use jinja_provider::test_utils::TestWorkspace;

#[test]
fn test_render_prints_state() {
    let workspace = TestWorkspace::new().unwrap();
    let block = workspace.data_source_block("Hello {{ name }}!", &[("yaml", "name: world")]);
    let path = write_block(&workspace, &block);

    let output = jinja_provider(&workspace).args(["render", &path]).assert().success();
    let state: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();

    assert_eq!(state["result"], "Hello world!");
    assert_eq!(state["id"], hex::encode(Sha256::digest(b"Hello world!")));
    assert_eq!(state["merged_context"], r#"{"name":"world"}"#);
}

#[test]
fn test_render_raw_from_yaml_block() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.write("partials/item.j2", "- {{ item }}\n").unwrap();
    let block = "\
source:
  directory: .
  template: |
    {% for item in items %}{% include 'partials/item.j2' %}{% endfor %}
context:
  - type: toml
    data: 'items = [\"a\", \"b\"]'
trim_blocks: true
";
    let path = workspace.write("block.yaml", block).unwrap();

    jinja_provider(&workspace)
        .args(["render", "--raw"])
        .arg(&path)
        .assert()
        .success()
        .stdout("- a\n- b\n");
}

#[test]
fn test_render_from_stdin_to_output_file() {
    let workspace = TestWorkspace::new().unwrap();
    let block = workspace.data_source_block("{{ 6 * 7 }}", &[]);

    jinja_provider(&workspace)
        .args(["render", "-", "--output", "answer.txt"])
        .write_stdin(block.to_string())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Rendered template written to"));

    assert_eq!(std::fs::read_to_string(workspace.join("answer.txt")).unwrap(), "42");
}

#[test]
fn test_later_layers_override_earlier_ones() {
    let workspace = TestWorkspace::new().unwrap();
    let block = workspace.data_source_block(
        "{{ list | length }}|{{ nested.key }}|{{ scalar.now }}|{{ kept }}",
        &[
            ("yaml", "list: [1, 2]\nnested: {key: yaml, other: 1}\nscalar: 1\nkept: yes"),
            ("json", r#"{"list": [], "nested": {"key": "json"}, "scalar": {"now": "mapping"}}"#),
            ("tfvars", "kept = \"tfvars\""),
        ],
    );
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["render", "--raw", &path])
        .assert()
        .success()
        .stdout("0|json|mapping|tfvars");
}

#[test]
fn test_schema_failures_are_reported_in_name_order() {
    let workspace = TestWorkspace::new().unwrap();
    let mut block = workspace.data_source_block("{{ name }}", &[("json", r#"{"name": 1}"#)]);
    block["validation"] = json!({
        "b-required": r#"{"type": "object", "required": ["missing"]}"#,
        "a-string": r#"{"type": "object", "properties": {"name": {"type": "string"}}}"#,
    });
    let path = write_block(&workspace, &block);

    let output = jinja_provider(&workspace).args(["render", &path]).assert().failure();
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("Failed to render: Rendering context returned an error: failed to validate context against schema"));
    let first = stderr.find("failed to pass 'a-string' JSON schema validation").unwrap();
    let second = stderr.find("failed to pass 'b-required' JSON schema validation").unwrap();
    assert!(first < second);
}

#[test]
fn test_invalid_context_layer() {
    let workspace = TestWorkspace::new().unwrap();
    let block = workspace.data_source_block("x", &[("json", "{}"), ("yaml", "- not\n- a mapping")]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["render", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse values: failed to decode 2nd values layer"));
}

#[test]
fn test_render_times_out() {
    let workspace = TestWorkspace::new().unwrap();
    let mut block = workspace.data_source_block(
        "{% for i in range(5000) %}{% for j in range(5000) %}{% for k in range(5000) %}{% endfor %}{% endfor %}{% endfor %}",
        &[],
    );
    block["timeouts"] = json!({"read": "100ms"});
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["render", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rendering timed out after 100ms"));
}

#[test]
fn test_template_errors_fail() {
    let workspace = TestWorkspace::new().unwrap();
    let block = workspace.data_source_block("{{ 'boom' | fail }}", &[]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["render", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to execute template"))
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn test_legacy_template_warns_and_renders() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.write("legacy.j2", "body").unwrap();
    let block = json!({"template": "legacy.j2", "header": "head", "footer": "foot"});
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["render", "--raw", &path])
        .assert()
        .success()
        .stdout("head\nbody\nfoot")
        .stderr(predicate::str::contains("Attribute Deprecated (template)"))
        .stderr(predicate::str::contains("Attribute Deprecated (header)"));
}

#[test]
fn test_deprecation_is_reported_once() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.write("legacy.j2", "body").unwrap();
    let path = write_block(&workspace, &json!({"template": "legacy.j2"}));

    let output = jinja_provider(&workspace).args(["render", "--raw", &path]).output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Deprecated in favor of the `source` block").count(), 1, "stderr: {stderr}");
}

#[test]
fn test_invalid_block_is_rejected() {
    let workspace = TestWorkspace::new().unwrap();
    let path = workspace.write("block.json", r#"{"sauce": {}}"#).unwrap();

    jinja_provider(&workspace)
        .arg("render")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid data source in"))
        .stderr(predicate::str::contains("jinja-provider schema"));
}

#[test]
fn test_missing_block_file() {
    let workspace = TestWorkspace::new().unwrap();
    jinja_provider(&workspace)
        .args(["render", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read data source from missing.json"));
}
