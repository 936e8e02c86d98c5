//! Print the provider and data source schemas.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::provider::schema::{Schema, data_source_schema, provider_schema};
use crate::provider::{JinjaProvider, TemplateDataSource};

/// Print the schemas of the `jinja` provider and its data sources as JSON.
#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Print compact JSON on a single line.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProviderSchemas {
    provider: String,
    version: String,
    provider_schema: Schema,
    data_source_schemas: BTreeMap<String, Schema>,
}

impl ProviderSchemas {
    pub(crate) fn collect() -> Self {
        Self {
            provider: JinjaProvider::TYPE_NAME.to_string(),
            version: crate::templating::globals::VERSION.to_string(),
            provider_schema: provider_schema(),
            data_source_schemas: BTreeMap::from([(TemplateDataSource::TYPE_NAME.to_string(), data_source_schema())]),
        }
    }
}

impl SchemaCommand {
    pub async fn execute(self) -> Result<()> {
        let schemas = ProviderSchemas::collect();
        let rendered = if self.compact {
            serde_json::to_string(&schemas)?
        } else {
            serde_json::to_string_pretty(&schemas)?
        };
        println!("{rendered}");
        Ok(())
    }
}
