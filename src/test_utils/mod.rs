//! Test utilities for jinja-provider
//!
//! Helpers shared by the unit tests and the `integration` test target:
//! - [`init_test_logging`] to see `tracing` output while a test runs
//! - [`TestWorkspace`] for a temporary directory holding templates, partials
//!   and data source blocks
//!
//! # Example
//!
//! ```rust,no_run
//! use jinja_provider::test_utils::TestWorkspace;
//!
//! let workspace = TestWorkspace::new().unwrap();
//! workspace.write("partials/footer.j2", "-- {{ name }}").unwrap();
//! let block = workspace.data_source_block("{% include 'partials/footer.j2' %}", &[("yaml", "name: me")]);
//! workspace.write("block.json", &block.to_string()).unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, `RUST_LOG` otherwise. Without either, nothing is
/// logged. Only the first call has an effect.
///
/// ```bash
/// RUST_LOG=jinja_provider=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// A temporary directory removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create test workspace")?;
        tracing::debug!("Created test workspace at {}", temp_dir.path().display());
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the workspace.
    pub fn join(&self, relative: &str) -> PathBuf {
        self.path().join(relative)
    }

    /// Writes `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// A data source block in Terraform JSON syntax rendering `template` from
    /// this workspace with the given `(type, data)` context layers.
    pub fn data_source_block(&self, template: &str, layers: &[(&str, &str)]) -> Value {
        let context: Vec<Value> =
            layers.iter().map(|(kind, data)| json!({"type": kind, "data": data})).collect();
        json!({
            "source": {
                "template": template,
                "directory": self.path().to_string_lossy(),
            },
            "context": context,
        })
    }
}
