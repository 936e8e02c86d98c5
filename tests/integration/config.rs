use predicates::prelude::*;
use serde_json::json;

use crate::{jinja_provider, write_block};
use jinja_provider::test_utils::TestWorkspace;

const CONFIG: &str = "\
[provider]
strict_undefined = true

[provider.delimiters]
variable_start = \"<<\"
variable_end = \">>\"
";

#[test]
fn test_provider_configuration_from_flag() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace.write("provider.toml", CONFIG).unwrap();
    let block = workspace.data_source_block("<< name >> {{ name }}", &[("json", r#"{"name": "x"}"#)]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .arg("--config")
        .arg(&config)
        .args(["render", "--raw", &path])
        .assert()
        .success()
        .stdout("x {{ name }}");
}

#[test]
fn test_provider_configuration_from_environment() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace.write("provider.toml", CONFIG).unwrap();
    let block = workspace.data_source_block("<< missing >>", &[]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .env("JINJA_PROVIDER_CONFIG", &config)
        .args(["render", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to execute template"));
}

#[test]
fn test_data_source_overrides_provider_per_field() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace.write("provider.toml", CONFIG).unwrap();
    let mut block = workspace.data_source_block("[<< missing >>][%% if true %%]yes[%% endif %%]", &[]);
    block["strict_undefined"] = json!(false);
    block["delimiters"] = json!({"block_start": "[%%", "block_end": "%%]"});
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .arg("-c")
        .arg(&config)
        .args(["render", "--raw", &path])
        .assert()
        .success()
        .stdout("[]yes");
}

#[test]
fn test_default_configuration_location() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.write("xdg/jinja-provider/config.toml", CONFIG).unwrap();
    let block = workspace.data_source_block("<< 1 + 1 >>", &[]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace).args(["render", "--raw", &path]).assert().success().stdout("2");
}

#[test]
fn test_missing_explicit_configuration_fails() {
    let workspace = TestWorkspace::new().unwrap();
    let block = workspace.data_source_block("x", &[]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .args(["--config", "missing.toml", "render", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Provider configuration not found: missing.toml"));
}

#[test]
fn test_invalid_configuration_fails() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace.write("provider.toml", "[provider]\nstrict = true\n").unwrap();
    let block = workspace.data_source_block("x", &[]);
    let path = write_block(&workspace, &block);

    jinja_provider(&workspace)
        .arg("--config")
        .arg(&config)
        .args(["render", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid provider configuration"));
}
