use serde_json::Value;

use crate::jinja_provider;
use jinja_provider::test_utils::TestWorkspace;

#[test]
fn test_schema_output() {
    let workspace = TestWorkspace::new().unwrap();
    let output = jinja_provider(&workspace).arg("schema").assert().success();
    let schemas: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();

    assert_eq!(schemas["provider"], "jinja");
    let data_source = &schemas["data_source_schemas"]["jinja_template"];
    assert_eq!(data_source["attributes"]["id"]["markdown_description"], "The sha256 of the `result` field");
    assert_eq!(
        data_source["attributes"]["template"]["deprecation_message"],
        "Deprecated in favor of the `source` block"
    );
    assert_eq!(data_source["blocks"]["source"]["max_items"], 1);
}

#[test]
fn test_compact_schema_is_one_line() {
    let workspace = TestWorkspace::new().unwrap();
    let output = jinja_provider(&workspace).args(["schema", "--compact"]).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    assert_eq!(stdout.trim_end().lines().count(), 1);
}
