//! Jinja template rendering with layered context and JSON Schema validation.
//!
//! This crate implements the `jinja` provider and its `jinja_template` data
//! source: a template is rendered with a context merged from any number of
//! JSON, YAML, TOML or TFVars layers, after the merged context passed every
//! configured JSON Schema, within a read timeout.
//!
//! # Modules
//!
//! - [`templating`] - the rendering engine: value layers, schema validation,
//!   the Jinja environment with its filters, globals and tests, and the timed
//!   render pipeline
//! - [`provider`] - the Terraform facing surface: provider and data source
//!   models, schemas, configuration validation and diagnostics
//! - [`config`] - provider settings read from a TOML file
//! - [`cli`] - the `jinja-provider` command line front end
//! - [`core`] - user facing error reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::time::Duration;
//! use jinja_provider::templating::{Configuration, RenderContext, Source, Values, render};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let rendered = render(RenderContext {
//!     source: Source {
//!         template: "{{ greeting }}, {{ name }}!".to_string(),
//!         directory: std::env::current_dir()?,
//!     },
//!     configuration: Configuration::default(),
//!     values: vec![
//!         Values::new("yaml", "greeting: Hello\nname: nobody"),
//!         Values::new("json", r#"{"name": "world"}"#),
//!     ],
//!     schemas: BTreeMap::new(),
//!     timeout: Duration::from_secs(30),
//! })
//! .await?;
//! assert_eq!(rendered.output, "Hello, world!");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod provider;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
