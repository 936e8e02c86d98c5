//! Render a `jinja_template` data source from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::CliConfig;
use super::common::{load_data_source, print_diagnostics};
use crate::config::ProviderConfig;
use crate::core::ProviderError;
use crate::provider::{Diagnostics, JinjaProvider, Severity, TemplateDataSource};

/// Render a data source block and print its computed state.
///
/// ```bash
/// jinja-provider render block.json            # {"id": ..., "result": ..., "merged_context": ...}
/// jinja-provider render block.yaml --raw      # only the rendered text
/// jinja-provider render - -o out.txt < block.json
/// ```
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Data source block in JSON, or YAML for `.yaml`/`.yml` files. `-` reads stdin.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print only the rendered text instead of the JSON state.
    #[arg(long, conflicts_with = "output")]
    pub raw: bool,

    /// Write the rendered text to this file instead of printing the state.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl RenderCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let provider_config = ProviderConfig::load_with_optional(config.config_path.clone()).await?;
        let provider = JinjaProvider::configure(&provider_config.provider);
        let data_source = TemplateDataSource::from(&provider);

        let model = load_data_source(&self.file).await?;
        let diagnostics = data_source.validate_config(&model);
        print_diagnostics(&diagnostics);
        if diagnostics.has_error() {
            return Err(ProviderError::ValidationFailed {
                count: diagnostics.errors().count(),
            }
            .into());
        }

        let state = match data_source.read(&model).await {
            Ok(state) => state,
            Err(diagnostics) => return Err(read_failure(diagnostics).into()),
        };

        if let Some(output) = &self.output {
            tokio::fs::write(output, &state.result)
                .await
                .with_context(|| format!("Failed to write rendered template to {}", output.display()))?;
            info!("Rendered template written to {}", output.display());
        } else if self.raw {
            print!("{}", state.result);
        } else {
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Ok(())
    }
}

/// Turns the first error of a failed read into a [`ProviderError`] and prints the rest.
fn read_failure(diagnostics: Diagnostics) -> ProviderError {
    let mut failure = None;
    let mut remaining = Diagnostics::new();
    for diagnostic in diagnostics {
        if failure.is_none() && diagnostic.severity == Severity::Error {
            failure = Some(ProviderError::RenderFailed {
                summary: diagnostic.summary,
                detail: diagnostic.detail,
            });
        } else {
            remaining.push(diagnostic);
        }
    }
    print_diagnostics(&remaining);
    failure.unwrap_or_else(|| ProviderError::Other {
        message: "Reading the data source failed without an error diagnostic".to_string(),
    })
}
