//! Declarative schemas of the provider and of the `jinja_template` data source.
//!
//! The schemas mirror what Terraform shows in the registry documentation and
//! are printed by `jinja-provider schema`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::templating::ValuesFormat;

/// Value type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    /// Map with string values.
    MapOfString,
    /// Object with the given attribute types.
    Object(BTreeMap<String, AttributeType>),
}

/// A single attribute of a schema or block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
}

impl Attribute {
    fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            markdown_description: None,
            deprecation_message: None,
        }
    }

    pub fn required(kind: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    pub fn optional(kind: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(kind)
        }
    }

    pub fn computed(kind: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(kind)
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.markdown_description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecate(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = Some(message.into());
        self
    }
}

/// How a nested block is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    Single,
    List,
}

/// A nested block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub nesting: Nesting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    pub attributes: BTreeMap<String, Attribute>,
}

/// Attributes and blocks of a provider or data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    pub attributes: BTreeMap<String, Attribute>,
    pub blocks: BTreeMap<String, Block>,
}

pub const TEMPLATE_DEPRECATION: &str = "Deprecated in favor of the `source` block";
pub const HEADER_FOOTER_DEPRECATION: &str = "Deprecated as the `source.template` field can be used alongside string manipulation within terraform to achieve the same behavior";

fn delimiters_block(description: &str) -> Block {
    let attributes = [
        "block_start",
        "block_end",
        "variable_start",
        "variable_end",
        "comment_start",
        "comment_end",
    ]
    .into_iter()
    .map(|name| (name.to_string(), Attribute::optional(AttributeType::String)))
    .collect();

    Block {
        nesting: Nesting::Single,
        max_items: None,
        markdown_description: Some(description.to_string()),
        attributes,
    }
}

/// Schema of the `provider "jinja"` block.
pub fn provider_schema() -> Schema {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "strict_undefined".to_string(),
        Attribute::optional(AttributeType::Bool)
            .describe("Set to `true` to fail on missing items and attribute for all templates"),
    );
    attributes.insert(
        "trim_blocks".to_string(),
        Attribute::optional(AttributeType::Bool)
            .describe("Set to `true` the first newline after a block is removed for all templates"),
    );
    attributes.insert(
        "left_strip_blocks".to_string(),
        Attribute::optional(AttributeType::Bool).describe(
            "Set to `true` leading spaces and tabs are stripped from the start of a line to a block for all templates",
        ),
    );

    let mut blocks = BTreeMap::new();
    blocks.insert(
        "delimiters".to_string(),
        delimiters_block("Custom delimiters for the Jinja engine for all templates"),
    );

    Schema {
        markdown_description: None,
        attributes,
        blocks,
    }
}

/// Schema of the `jinja_template` data source.
pub fn data_source_schema() -> Schema {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "template".to_string(),
        Attribute::optional(AttributeType::String)
            .describe("Inlined or path to the jinja template to render. If the template is passed inlined, any filesystem calls such as using the `include` statement or the `fileset` filter won't work as expected. Deprecated in favor of the `source` block")
            .deprecate(TEMPLATE_DEPRECATION),
    );
    attributes.insert(
        "header".to_string(),
        Attribute::optional(AttributeType::String)
            .describe("Header to add at the top of the template before rendering. Deprecated in favor of the `source` block")
            .deprecate(HEADER_FOOTER_DEPRECATION),
    );
    attributes.insert(
        "footer".to_string(),
        Attribute::optional(AttributeType::String)
            .describe("Footer to add at the bottom of the template before rendering. Deprecated in favor of the `source` block")
            .deprecate(HEADER_FOOTER_DEPRECATION),
    );
    attributes.insert(
        "strict_undefined".to_string(),
        Attribute::optional(AttributeType::Bool).describe(
            "Set to `true` to fail on missing items and attribute. Setting this value overrides any value set at the provider level if any",
        ),
    );
    attributes.insert(
        "trim_blocks".to_string(),
        Attribute::optional(AttributeType::Bool).describe(
            "Set to `true` the first newline after a block is removed. Setting this value overrides any value set at the provider level if any",
        ),
    );
    attributes.insert(
        "left_strip_blocks".to_string(),
        Attribute::optional(AttributeType::Bool).describe(
            "Set to `true` leading spaces and tabs are stripped from the start of a line to a block. Setting this value overrides any value set at the provider level if any",
        ),
    );
    attributes.insert(
        "timeouts".to_string(),
        Attribute::optional(AttributeType::Object(BTreeMap::from([(
            "read".to_string(),
            AttributeType::String,
        )])))
        .describe("Timeouts of the data source. `read` is a duration such as `30s` or `2h45m` and defaults to `30s`"),
    );
    attributes.insert(
        "validation".to_string(),
        Attribute::optional(AttributeType::MapOfString).describe(
            "Map of JSON schemas to validate against the context. Schemas are tested sequentially in lexicographic order of this map's keys",
        ),
    );
    attributes.insert(
        "result".to_string(),
        Attribute::computed(AttributeType::String).describe("Rendered template with the given context"),
    );
    attributes.insert(
        "merged_context".to_string(),
        Attribute::computed(AttributeType::String).describe(
            "JSON encoded representation of the merged context that has been applied to the template",
        ),
    );
    attributes.insert(
        "id".to_string(),
        Attribute::computed(AttributeType::String).describe("The sha256 of the `result` field"),
    );

    let mut blocks = BTreeMap::new();
    blocks.insert(
        "source".to_string(),
        Block {
            nesting: Nesting::List,
            max_items: Some(1),
            markdown_description: Some("Source template to use for rendering".to_string()),
            attributes: BTreeMap::from([
                (
                    "template".to_string(),
                    Attribute::required(AttributeType::String).describe(
                        "Template to render. If required to load an external file, then the `file(...)` function can be used to retrieve the file's content",
                    ),
                ),
                (
                    "directory".to_string(),
                    Attribute::required(AttributeType::String).describe(
                        "Path to the directory to use as the root starting point. If the template is an external file, then the `dirname(...)` function can be used to get the path to the template's directory. Otherwise, just using `path.module` is usually a good idea",
                    ),
                ),
            ]),
        },
    );
    blocks.insert(
        "delimiters".to_string(),
        delimiters_block(
            "Custom delimiters for the Jinja engine. Setting any nested value overrides the one set at the provider level if any",
        ),
    );
    blocks.insert(
        "context".to_string(),
        Block {
            nesting: Nesting::List,
            max_items: None,
            markdown_description: Some(
                "Context to use while rendering the template. If multiple are passed, they are merged in order with overriding"
                    .to_string(),
            ),
            attributes: BTreeMap::from([
                (
                    "type".to_string(),
                    Attribute::required(AttributeType::String).describe(format!(
                        "Type of parsing (one of: `{}`) to perform on the given string",
                        ValuesFormat::SUPPORTED.join("`,`")
                    )),
                ),
                (
                    "data".to_string(),
                    Attribute::required(AttributeType::String)
                        .describe("A string holding the serialized context"),
                ),
            ]),
        },
    );

    Schema {
        markdown_description: Some(
            "The `jinja_template` data source renders a jinja template with a given template with possible JSON schema validation of the context"
                .to_string(),
        ),
        attributes,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_schema_shape() {
        let schema = data_source_schema();
        for computed in ["result", "merged_context", "id"] {
            assert!(schema.attributes[computed].computed, "{computed} must be computed");
        }
        assert_eq!(schema.attributes["template"].deprecation_message.as_deref(), Some(TEMPLATE_DEPRECATION));
        assert_eq!(schema.attributes["footer"].deprecation_message.as_deref(), Some(HEADER_FOOTER_DEPRECATION));
        assert_eq!(schema.blocks["source"].max_items, Some(1));
        assert!(schema.blocks["context"].attributes["type"]
            .markdown_description
            .as_deref()
            .unwrap()
            .contains("`json`,`yaml`,`toml`,`tfvars`"));
    }

    #[test]
    fn test_provider_schema_serializes() {
        let json = serde_json::to_value(provider_schema()).unwrap();
        assert_eq!(json["attributes"]["trim_blocks"]["type"], "bool");
        assert_eq!(json["blocks"]["delimiters"]["nesting"], "single");
        assert_eq!(json["blocks"]["delimiters"]["attributes"].as_object().unwrap().len(), 6);
        assert!(json.get("markdown_description").is_none());
    }

    #[test]
    fn test_timeouts_is_an_object_attribute() {
        let json = serde_json::to_value(data_source_schema()).unwrap();
        assert_eq!(json["attributes"]["timeouts"]["type"], serde_json::json!({"object": {"read": "string"}}));
        assert_eq!(json["attributes"]["validation"]["type"], "map_of_string");
    }
}
