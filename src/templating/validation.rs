//! JSON Schema validation of the merged context.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::error::ValidationError;

/// Validates `values` against every schema, in lexicographic order of the names.
///
/// All schemas are evaluated and every failing one contributes a line of the
/// form `failed to pass '<name>' JSON schema validation: <errors>`; the errors
/// of one schema are joined with `; `.
///
/// # Errors
///
/// - [`ValidationError::Compile`] as soon as a schema is not valid JSON or not
///   a valid JSON Schema; the remaining schemas are not evaluated.
/// - [`ValidationError::Failed`] with one entry per failing schema.
pub fn validate(
    values: &Map<String, Value>,
    schemas: &BTreeMap<String, String>,
) -> Result<(), ValidationError> {
    if schemas.is_empty() {
        return Ok(());
    }

    let instance = Value::Object(values.clone());
    let mut failures = Vec::new();
    for (name, raw) in schemas {
        let schema: Value = serde_json::from_str(raw).map_err(|e| ValidationError::Compile {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let validator = jsonschema::validator_for(&schema).map_err(|e| ValidationError::Compile {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        let errors: Vec<String> = validator
            .iter_errors(&instance)
            .map(|error| {
                let location = error.instance_path.to_string();
                if location.is_empty() {
                    error.to_string()
                } else {
                    format!("at '{location}': {error}")
                }
            })
            .collect();

        debug!(schema = %name, errors = errors.len(), "Validated context against schema");
        if !errors.is_empty() {
            failures.push(format!("failed to pass '{name}' JSON schema validation: {}", errors.join("; ")));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Failed { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test values must be an object"),
        }
    }

    fn schemas(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries.iter().map(|(name, schema)| (name.to_string(), schema.to_string())).collect()
    }

    #[test]
    fn test_no_schemas_is_valid() {
        assert!(validate(&values(json!({"a": 1})), &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_passing_schema() {
        let schemas = schemas(&[(
            "object",
            r#"{"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}"#,
        )]);
        assert!(validate(&values(json!({"name": "demo"})), &schemas).is_ok());
    }

    #[test]
    fn test_failures_are_collected_in_name_order() {
        let schemas = schemas(&[
            ("zeta", r#"{"type": "object", "required": ["missing"]}"#),
            ("alpha", r#"{"type": "object", "properties": {"name": {"type": "integer"}}}"#),
            ("middle", r#"{"type": "object"}"#),
        ]);
        let err = validate(&values(json!({"name": "demo"})), &schemas).unwrap_err();
        let ValidationError::Failed { failures } = &err else {
            panic!("expected validation failures, got {err}");
        };
        assert_eq!(failures.len(), 2);
        assert!(failures[0].starts_with("failed to pass 'alpha' JSON schema validation: at '/name'"));
        assert!(failures[1].starts_with("failed to pass 'zeta' JSON schema validation:"));
        assert!(failures[1].contains("missing"));
        assert!(err.to_string().starts_with("\nfailed to pass 'alpha'"));
    }

    #[test]
    fn test_invalid_schema_aborts() {
        let schemas = schemas(&[("a-broken", "{not json"), ("b-failing", r#"{"type": "string"}"#)]);
        let err = validate(&values(json!({})), &schemas).unwrap_err();
        assert!(matches!(err, ValidationError::Compile { ref name, .. } if name == "a-broken"));
        assert!(err.to_string().starts_with("failed to compile 'a-broken' JSON schema"));
    }

    #[test]
    fn test_schema_with_invalid_keyword_value_does_not_compile() {
        let schemas = schemas(&[("bad", r#"{"type": "not-a-type"}"#)]);
        let err = validate(&values(json!({})), &schemas).unwrap_err();
        assert!(matches!(err, ValidationError::Compile { .. }));
    }
}
