//! Check a `jinja_template` data source block without rendering it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::common::{format_diagnostic, load_data_source};
use crate::core::ProviderError;
use crate::provider::{Diagnostic, TemplateDataSource};

/// Output format of the validation results.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored, human readable lines.
    Text,
    /// A JSON document with `valid`, `errors` and `warnings`.
    Json,
}

/// Validate a data source block: conflicting or missing attributes, context
/// types and the read timeout. Deprecated attributes produce warnings.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Data source block in JSON, or YAML for `.yaml`/`.yml` files. `-` reads stdin.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Default, Serialize)]
struct ValidationResults {
    valid: bool,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl ValidateCommand {
    pub async fn execute(self) -> Result<()> {
        let model = load_data_source(&self.file).await?;
        let diagnostics = TemplateDataSource::default().validate_config(&model);

        let mut results = ValidationResults {
            valid: false,
            errors: diagnostics.errors().cloned().collect(),
            warnings: diagnostics.warnings().cloned().collect(),
        };
        if self.strict {
            let warnings = std::mem::take(&mut results.warnings);
            results.errors.extend(warnings);
        }
        results.valid = results.errors.is_empty();

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
            OutputFormat::Text => {
                for diagnostic in results.errors.iter().chain(&results.warnings) {
                    println!("{}", format_diagnostic(diagnostic));
                }
                if results.valid {
                    println!(
                        "{} {} is a valid {} data source",
                        "✓".green(),
                        self.file.display(),
                        TemplateDataSource::TYPE_NAME
                    );
                }
            }
        }

        if results.valid {
            Ok(())
        } else {
            Err(ProviderError::ValidationFailed {
                count: results.errors.len(),
            }
            .into())
        }
    }
}
