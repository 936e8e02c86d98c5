//! Integration test suite for jinja-provider
//!
//! These tests drive the `jinja-provider` binary end to end: data source
//! blocks are written to a temporary workspace and rendered, validated or
//! inspected through the command line.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **render**: rendering, output modes, layered context, failures and timeouts
//! - **config**: provider configuration file and its precedence
//! - **validate**: configuration checks without rendering
//! - **schema**: schema output

use assert_cmd::Command;
use jinja_provider::test_utils::{TestWorkspace, init_test_logging};

mod config;
mod render;
mod schema;
mod validate;

/// The binary, isolated from the user's configuration and terminal settings.
pub fn jinja_provider(workspace: &TestWorkspace) -> Command {
    init_test_logging(None);
    let mut cmd = Command::cargo_bin("jinja-provider").unwrap();
    cmd.current_dir(workspace.path())
        .env("NO_COLOR", "1")
        .env("HOME", workspace.path())
        .env("XDG_CONFIG_HOME", workspace.join("xdg"))
        .env_remove("JINJA_PROVIDER_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Writes `block` as `block.json` and returns its path as a string argument.
pub fn write_block(workspace: &TestWorkspace, block: &serde_json::Value) -> String {
    workspace.write("block.json", &block.to_string()).unwrap().to_string_lossy().into_owned()
}
