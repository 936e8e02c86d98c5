//! Error types of the rendering pipeline.
//!
//! Each stage of a render has its own error type so callers can tell a bad
//! value layer from a failed schema or a broken template. [`RenderError`] is
//! what [`render`](super::render) returns and wraps the other two.

use std::path::PathBuf;

use thiserror::Error;

/// Decoding or merging a value layer failed.
#[derive(Debug, Error)]
pub enum ValuesError {
    #[error("provided context has an unsupported type: {format}{}", suggestion_suffix(.suggestion))]
    UnsupportedFormat {
        format: String,
        suggestion: Option<String>,
    },

    #[error("failed to decode JSON context: {0}")]
    Json(serde_json::Error),

    #[error("failed to unmarshal YAML context: {0}")]
    Yaml(serde_yaml::Error),

    #[error("failed to unmarshal TOML context: {0}")]
    Toml(toml::de::Error),

    #[error("failed to unmarshal TFVars context: {0}")]
    TfVars(String),

    #[error("context is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("context must decode to a mapping but decoded to {kind}")]
    NotAMapping { kind: &'static str },

    #[error("failed to decode {ordinal} values layer: {source}")]
    Layer {
        ordinal: String,
        #[source]
        source: Box<ValuesError>,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion.as_ref().map(|name| format!(" (did you mean '{name}'?)")).unwrap_or_default()
}

/// The merged context failed JSON Schema validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A schema is not valid JSON or not a valid JSON Schema. Aborts validation.
    #[error("failed to compile '{name}' JSON schema: {reason}")]
    Compile { name: String, reason: String },

    /// One line per failing schema, in schema name order.
    #[error("\n{}", .failures.join("\n"))]
    Failed { failures: Vec<String> },
}

/// A render failed. The message of each variant names the failing stage.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create a file system loader: {} is not a readable directory", .directory.display())]
    Loader { directory: PathBuf },

    #[error("failed to parse template: {0}")]
    Parse(minijinja::Error),

    #[error("failed to parse values: {0}")]
    Values(#[from] ValuesError),

    #[error("failed to validate context against schema: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to execute template: {0}")]
    Execution(minijinja::Error),

    #[error("rendering timed out after {0}")]
    Timeout(String),

    #[error("a runtime error led the jinja engine to panic: {0}")]
    Panic(String),

    #[error("rendering worker was cancelled: {0}")]
    Cancelled(String),
}

impl RenderError {
    /// Short stage name, used as a structured logging field.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Loader { .. } => "loader",
            Self::Parse(_) => "parse",
            Self::Values(_) => "values",
            Self::Validation(_) => "validation",
            Self::Execution(_) => "execution",
            Self::Timeout(_) => "timeout",
            Self::Panic(_) => "panic",
            Self::Cancelled(_) => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failures_are_listed_one_per_line() {
        let err = ValidationError::Failed {
            failures: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "\nfirst\nsecond");
    }

    #[test]
    fn test_layer_error_names_the_ordinal() {
        let err = ValuesError::Layer {
            ordinal: "2nd".to_string(),
            source: Box::new(ValuesError::NotAMapping { kind: "a list" }),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode 2nd values layer: context must decode to a mapping but decoded to a list"
        );
    }

    #[test]
    fn test_render_error_wraps_values_error() {
        let err = RenderError::from(ValuesError::TfVars("boom".to_string()));
        assert_eq!(err.to_string(), "failed to parse values: failed to unmarshal TFVars context: boom");
        assert_eq!(err.stage(), "values");
    }
}
