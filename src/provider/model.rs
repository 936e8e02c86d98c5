//! Serde models of the provider block, the `jinja_template` data source block
//! and its computed state.
//!
//! Data sources are described the way Terraform's JSON configuration syntax
//! writes them:
//!
//! ```json
//! {
//!   "source": { "template": "Hello {{ name }}", "directory": "." },
//!   "context": [{ "type": "yaml", "data": "name: world" }],
//!   "validation": { "object": "{\"type\": \"object\"}" },
//!   "strict_undefined": true,
//!   "timeouts": { "read": "10s" }
//! }
//! ```
//!
//! Nested blocks accept a single object as well as a list of objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Overrides for the engine delimiters. Unset fields keep the inherited value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelimitersModel {
    pub block_start: Option<String>,
    pub block_end: Option<String>,
    pub variable_start: Option<String>,
    pub variable_end: Option<String>,
    pub comment_start: Option<String>,
    pub comment_end: Option<String>,
}

/// The `provider "jinja"` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderModel {
    pub strict_undefined: Option<bool>,
    pub trim_blocks: Option<bool>,
    pub left_strip_blocks: Option<bool>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub delimiters: Option<DelimitersModel>,
}

/// The `source` block of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceModel {
    pub template: String,
    pub directory: String,
}

/// One `context` block: a serialized layer and its format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextModel {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
}

/// The `timeouts` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsModel {
    /// Duration such as `30s` or `2h45m`.
    pub read: Option<String>,
}

/// The configuration of a `jinja_template` data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceModel {
    #[serde(default, deserialize_with = "blocks", skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<SourceModel>,
    #[serde(default, deserialize_with = "blocks", skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextModel>,
    /// JSON Schemas keyed by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<BTreeMap<String, String>>,
    pub strict_undefined: Option<bool>,
    pub trim_blocks: Option<bool>,
    pub left_strip_blocks: Option<bool>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub delimiters: Option<DelimitersModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<TimeoutsModel>,

    /// Inline template or path to a template file. Deprecated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Prepended to `template` with a newline. Deprecated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Appended to `template` with a newline. Deprecated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

/// Computed attributes of a successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateState {
    /// Lowercase hex SHA-256 of `result`.
    pub id: String,
    /// The rendered template.
    pub result: String,
    /// JSON encoding of the merged context.
    pub merged_context: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn blocks<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(block)) => vec![block],
        Some(OneOrMany::Many(blocks)) => blocks,
    })
}

fn single_block<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let mut blocks = blocks::<D, T>(deserializer)?;
    match blocks.len() {
        0 | 1 => Ok(blocks.pop()),
        n => Err(serde::de::Error::custom(format!("expected at most one block, found {n}"))),
    }
}
