//! Command line interface of `jinja-provider`.
//!
//! The binary exercises the `jinja_template` data source outside of
//! Terraform. Data source blocks are given in Terraform's JSON syntax (or the
//! equivalent YAML) and provider settings come from a TOML file.
//!
//! # Commands
//!
//! - `render <FILE>` - validate and read a data source, print its state
//! - `validate <FILE>` - run the configuration checks only
//! - `schema` - print the provider and data source schemas
//!
//! # Global options
//!
//! - `-v, --verbose` - debug logging, including every rendering stage
//! - `-q, --quiet` - errors only
//! - `-c, --config <PATH>` - provider configuration file, also read from
//!   `JINJA_PROVIDER_CONFIG`
//!
//! ```bash
//! echo '{"source": {"template": "{{ 6 * 7 }}", "directory": "."}}' | jinja-provider render - --raw
//! ```

pub mod common;
mod render;
mod schema;
mod validate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::CONFIG_ENV;

/// Settings derived from the global flags, shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter, `None` for the `RUST_LOG` environment variable.
    pub log_level: Option<String>,
    /// Explicit provider configuration file.
    pub config_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(
    name = "jinja-provider",
    about = "Render Jinja templates the way the jinja_template Terraform data source does",
    version,
    long_about = "Renders Jinja templates over merged JSON, YAML, TOML and TFVars context layers, \
                  with optional JSON Schema validation of the merged context."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging. Equivalent to `RUST_LOG=debug`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Provider configuration file (TOML).
    #[arg(short, long, global = true, env = CONFIG_ENV, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a jinja_template data source block.
    Render(render::RenderCommand),

    /// Validate a jinja_template data source block without rendering it.
    Validate(validate::ValidateCommand),

    /// Print the provider and data source schemas.
    Schema(schema::SchemaCommand),
}

impl Cli {
    /// Derives the [`CliConfig`] from the global flags.
    ///
    /// `--verbose` selects `debug`, `--quiet` selects `error` and the default is
    /// `info`. `RUST_LOG`, when set, wins over the default but not over a flag.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else if std::env::var_os("RUST_LOG").is_some() {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Render(cmd) => cmd.execute(&config).await,
            Commands::Validate(cmd) => cmd.execute().await,
            Commands::Schema(cmd) => cmd.execute().await,
        }
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `level` is an [`EnvFilter`] directive such as `debug`; `None` reads
/// `RUST_LOG`. Calling it twice is harmless.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
