use predicates::prelude::*;
use serde_json::{Value, json};

use crate::{jinja_provider, write_block};
use jinja_provider::test_utils::TestWorkspace;

#[test]
fn test_valid_block() {
    let workspace = TestWorkspace::new().unwrap();
    let block = workspace.data_source_block("{{ a }}", &[("json", "{}")]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["validate", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓"))
        .stdout(predicate::str::contains("is a valid jinja_template data source"));
}

#[test]
fn test_conflicting_attributes() {
    let workspace = TestWorkspace::new().unwrap();
    let mut block = workspace.data_source_block("{{ a }}", &[("xml", "<a/>")]);
    block["template"] = json!("legacy");
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["validate", &path])
        .assert()
        .failure()
        .stdout(predicate::str::contains("These attributes cannot be configured together: [source,template]"))
        .stdout(predicate::str::contains("context[0].type"))
        .stderr(predicate::str::contains("Data source validation failed with 2 error(s)"));
}

#[test]
fn test_json_output() {
    let workspace = TestWorkspace::new().unwrap();
    let path = write_block(&workspace, &json!({}));

    let output = jinja_provider(&workspace).args(["validate", "--format", "json", &path]).assert().failure();
    let results: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(results["valid"], false);
    assert_eq!(
        results["errors"][0]["detail"],
        "At least one attribute out of [source,template] must be specified"
    );
    assert_eq!(results["warnings"], json!([]));
}

#[test]
fn test_strict_mode_turns_warnings_into_errors() {
    let workspace = TestWorkspace::new().unwrap();
    let path = write_block(&workspace, &json!({"template": "inline"}));

    jinja_provider(&workspace).args(["validate", &path]).assert().success();
    jinja_provider(&workspace)
        .args(["validate", "--strict", &path])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Attribute Deprecated"));
}
