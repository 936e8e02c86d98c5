//! Decoding and merging of value layers.
//!
//! Every layer is decoded into a JSON value on its own, must be a mapping (an
//! empty or `null` document counts as an empty mapping) and is then deep
//! merged onto the previous layers with [`merge_maps`]. JSON keeps integers as
//! integers, YAML keys that are not strings are stringified, TOML datetimes
//! become their RFC 3339 text and TFVars attributes are evaluated without any
//! variables in scope.
//!
//! The `parse_*` helpers are shared with the `from*` template filters, which
//! accept any document shape rather than only mappings.

use hcl::eval::{Context as HclContext, Evaluate};
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::context::{Values, ValuesFormat};
use super::error::ValuesError;
use super::utils::{json_kind, merge_maps, ordinal};

/// Decodes a single layer into a mapping.
///
/// # Errors
///
/// Returns an error when the format is unknown, the data does not decode in
/// that format, or the document is neither a mapping nor empty.
pub fn decode_layer(values: &Values) -> Result<Map<String, Value>, ValuesError> {
    let format: ValuesFormat = values.format.parse()?;
    let decoded = match format {
        ValuesFormat::Json => parse_json(std::str::from_utf8(&values.data)?)?,
        ValuesFormat::Yaml => parse_yaml(std::str::from_utf8(&values.data)?)?,
        ValuesFormat::Toml => parse_toml(std::str::from_utf8(&values.data)?)?,
        ValuesFormat::TfVars => parse_tfvars(std::str::from_utf8(&values.data)?)?,
    };
    match decoded {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ValuesError::NotAMapping {
            kind: json_kind(&other),
        }),
    }
}

/// Decodes every layer and deep merges them in order.
///
/// With no layers the result is an empty mapping.
///
/// # Errors
///
/// The first failing layer aborts the merge and is named by its position,
/// e.g. `failed to decode 2nd values layer: ...`.
pub fn merge_layers(layers: &[Values]) -> Result<Map<String, Value>, ValuesError> {
    let mut merged = Map::new();
    for (index, layer) in layers.iter().enumerate() {
        let decoded = decode_layer(layer).map_err(|source| ValuesError::Layer {
            ordinal: ordinal(index + 1),
            source: Box::new(source),
        })?;
        debug!(layer = index + 1, format = %layer.format, keys = decoded.len(), "Merging values layer");
        merge_maps(&mut merged, &decoded);
    }
    Ok(merged)
}

/// Parses a JSON document of any shape.
pub fn parse_json(text: &str) -> Result<Value, ValuesError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(ValuesError::Json)
}

/// Parses a YAML document of any shape, applying `<<` merge keys.
pub fn parse_yaml(text: &str) -> Result<Value, ValuesError> {
    let mut document: serde_yaml::Value = serde_yaml::from_str(text).map_err(ValuesError::Yaml)?;
    document.apply_merge().map_err(ValuesError::Yaml)?;
    yaml_to_json(document)
}

/// Parses a TOML document. The root is always a table.
pub fn parse_toml(text: &str) -> Result<Value, ValuesError> {
    let table: toml::Table = toml::from_str(text).map_err(ValuesError::Toml)?;
    Ok(toml_to_json(toml::Value::Table(table)))
}

/// Parses a `.tfvars` document into a mapping of its top-level attributes.
///
/// Attribute expressions are evaluated without variables or functions, so
/// literals, collections, operators, conditionals and `for` expressions work
/// while references to anything external fail.
pub fn parse_tfvars(text: &str) -> Result<Value, ValuesError> {
    let body = hcl::parse(text).map_err(|e| ValuesError::TfVars(e.to_string()))?;
    let context = HclContext::new();
    let mut attributes = Map::new();
    for structure in body {
        match structure {
            hcl::Structure::Attribute(attribute) => {
                let value = attribute
                    .expr
                    .evaluate(&context)
                    .map_err(|e| ValuesError::TfVars(format!("attribute '{}': {e}", attribute.key)))?;
                let value = serde_json::to_value(value).map_err(|e| ValuesError::TfVars(e.to_string()))?;
                attributes.insert(attribute.key.to_string(), value);
            }
            hcl::Structure::Block(block) => {
                return Err(ValuesError::TfVars(format!(
                    "blocks are not allowed, found '{}'",
                    block.identifier
                )));
            }
        }
    }
    Ok(Value::Object(attributes))
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, ValuesError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect::<Result<_, _>>()?)
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(number: &serde_yaml::Number) -> Value {
    if let Some(i) = number.as_i64() {
        Value::from(i)
    } else if let Some(u) = number.as_u64() {
        Value::from(u)
    } else {
        number.as_f64().and_then(Number::from_f64).map_or(Value::Null, Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, ValuesError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err(ValuesError::NotAMapping {
                kind: "a mapping with a collection as key",
            })
        }
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            Value::Object(table.into_iter().map(|(key, value)| (key, toml_to_json(value))).collect())
        }
    }
}
