//! The `jinja` provider and its `jinja_template` data source.
//!
//! The provider block sets engine defaults for every template. Each data
//! source block may override any of them individually:
//!
//! ```rust,no_run
//! use jinja_provider::provider::{JinjaProvider, TemplateDataSource};
//! use jinja_provider::provider::model::{DataSourceModel, ProviderModel};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = JinjaProvider::configure(&ProviderModel {
//!     strict_undefined: Some(true),
//!     ..ProviderModel::default()
//! });
//! let data_source = TemplateDataSource::from(&provider);
//!
//! let model: DataSourceModel = serde_json::from_str(
//!     r#"{"source": {"template": "Hello {{ name }}", "directory": "."},
//!         "context": {"type": "yaml", "data": "name: world"}}"#,
//! )?;
//! let diagnostics = data_source.validate_config(&model);
//! assert!(!diagnostics.has_error());
//!
//! let state = data_source.read(&model).await.map_err(|d| anyhow::anyhow!("{} diagnostics", d.len()))?;
//! assert_eq!(state.result, "Hello world");
//! # Ok(())
//! # }
//! ```

pub mod data_source;
pub mod diagnostics;
pub mod model;
pub mod schema;

pub use data_source::{DEFAULT_TIMEOUT, TemplateDataSource};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};

use tracing::debug;

use crate::templating::Configuration;
use model::{DelimitersModel, ProviderModel};

/// A configured `jinja` provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JinjaProvider {
    configuration: Configuration,
}

impl JinjaProvider {
    pub const TYPE_NAME: &'static str = "jinja";

    /// Builds the provider level configuration: engine defaults with the
    /// provider block's settings applied on top.
    pub fn configure(model: &ProviderModel) -> Self {
        let mut configuration = Configuration::default();
        apply_overrides(
            &mut configuration,
            model.strict_undefined,
            model.trim_blocks,
            model.left_strip_blocks,
            model.delimiters.as_ref(),
        );
        debug!(?configuration, "Configured {} provider", Self::TYPE_NAME);
        Self {
            configuration,
        }
    }

    pub const fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// The data sources offered by this provider.
    pub fn data_sources(&self) -> Vec<TemplateDataSource> {
        vec![TemplateDataSource::from(self)]
    }
}

/// Applies every setting that is present onto `configuration`.
pub(crate) fn apply_overrides(
    configuration: &mut Configuration,
    strict_undefined: Option<bool>,
    trim_blocks: Option<bool>,
    left_strip_blocks: Option<bool>,
    delimiters: Option<&DelimitersModel>,
) {
    if let Some(strict_undefined) = strict_undefined {
        configuration.strict_undefined = strict_undefined;
    }
    if let Some(trim_blocks) = trim_blocks {
        configuration.trim_blocks = trim_blocks;
    }
    if let Some(left_strip_blocks) = left_strip_blocks {
        configuration.left_strip_blocks = left_strip_blocks;
    }

    let Some(overrides) = delimiters else {
        return;
    };
    let current = &mut configuration.delimiters;
    for (target, value) in [
        (&mut current.block_start, &overrides.block_start),
        (&mut current.block_end, &overrides.block_end),
        (&mut current.variable_start, &overrides.variable_start),
        (&mut current.variable_end, &overrides.variable_end),
        (&mut current.comment_start, &overrides.comment_start),
        (&mut current.comment_end, &overrides.comment_end),
    ] {
        if let Some(value) = value {
            target.clone_from(value);
        }
    }
}
