//! Helpers shared by the CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::core::ProviderError;
use crate::provider::model::DataSourceModel;
use crate::provider::{Diagnostic, Diagnostics, Severity};

/// Path that stands for stdin.
pub const STDIN: &str = "-";

/// Encoding of a data source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// `.yaml` and `.yml` files are YAML, every other file is JSON. Stdin is
    /// read as YAML, which accepts JSON documents as well.
    pub fn detect(path: &Path) -> Self {
        if path.as_os_str() == STDIN {
            return Self::Yaml;
        }
        match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref() {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Reads and decodes a data source block from `path`, or from stdin for `-`.
///
/// # Errors
///
/// Returns an error if the input cannot be read, or
/// [`ProviderError::InvalidDataSource`] if it does not decode.
pub async fn load_data_source(path: &Path) -> Result<DataSourceModel> {
    let content = if path.as_os_str() == STDIN {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await.context("Failed to read data source from stdin")?;
        content
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read data source from {}", path.display()))?
    };

    let format = InputFormat::detect(path);
    debug!(path = %path.display(), ?format, "Decoding data source");
    let decoded = match format {
        InputFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        InputFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
    };
    decoded.map_err(|reason| {
        ProviderError::InvalidDataSource {
            file: path.display().to_string(),
            reason,
        }
        .into()
    })
}

/// Formats one diagnostic for the terminal.
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let marker = match diagnostic.severity {
        Severity::Error => "✗".red().to_string(),
        Severity::Warning => "⚠".yellow().to_string(),
    };
    let location = diagnostic.attribute.as_ref().map(|attribute| format!(" ({attribute})")).unwrap_or_default();
    format!("{marker} {}{location}: {}", diagnostic.summary.bold(), diagnostic.detail)
}

/// Prints every diagnostic to stderr.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", format_diagnostic(diagnostic));
    }
}
