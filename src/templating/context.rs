//! Inputs of a single render.
//!
//! A [`RenderContext`] bundles everything one `jinja_template` read needs: the
//! template text and the directory it is resolved against, the engine
//! configuration, the ordered value layers, the named JSON Schemas and the
//! wall-clock budget.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ValuesError;

/// Everything required to render one template.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Template text and base directory.
    pub source: Source,
    /// Delimiters and whitespace/undefined handling.
    pub configuration: Configuration,
    /// Value layers, merged in order with later layers winning.
    pub values: Vec<Values>,
    /// JSON Schemas keyed by name. Iterated in lexicographic order.
    pub schemas: BTreeMap<String, String>,
    /// Wall-clock budget for parsing, decoding, validation and execution.
    pub timeout: Duration,
}

/// Template text plus the directory used to resolve includes and file lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub template: String,
    pub directory: PathBuf,
}

/// One serialized layer of the rendering context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Values {
    /// Raw serialized document.
    pub data: Vec<u8>,
    /// Format name as given by the user, e.g. `yaml` or `JSON`.
    pub format: String,
}

impl Values {
    pub fn new(format: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            format: format.into(),
        }
    }
}

/// Supported encodings of a value layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuesFormat {
    Json,
    Yaml,
    Toml,
    TfVars,
}

impl ValuesFormat {
    /// Format names in the order they are documented.
    pub const SUPPORTED: [&'static str; 4] = ["json", "yaml", "toml", "tfvars"];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::TfVars => "tfvars",
        }
    }
}

impl fmt::Display for ValuesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuesFormat {
    type Err = ValuesError;

    /// Parses a format name case-insensitively.
    ///
    /// Unknown names produce [`ValuesError::UnsupportedFormat`] carrying the
    /// closest supported name when one is reasonably similar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "tfvars" => Ok(Self::TfVars),
            _ => Err(ValuesError::UnsupportedFormat {
                format: s.to_string(),
                suggestion: closest_format(s),
            }),
        }
    }
}

/// Finds the supported format name closest to `name` by Levenshtein distance.
fn closest_format(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    ValuesFormat::SUPPORTED
        .iter()
        .map(|candidate| (candidate, strsim::levenshtein(&lowered, candidate)))
        .filter(|(_, distance)| *distance <= 1)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| (*candidate).to_string())
}

/// Engine configuration shared by the provider and each data source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Configuration {
    pub strict_undefined: bool,
    pub trim_blocks: bool,
    pub left_strip_blocks: bool,
    pub delimiters: Delimiters,
}

/// Start and end tokens of the three Jinja tag kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub block_start: String,
    pub block_end: String,
    pub variable_start: String,
    pub variable_end: String,
    pub comment_start: String,
    pub comment_end: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            block_start: "{%".to_string(),
            block_end: "%}".to_string(),
            variable_start: "{{".to_string(),
            variable_end: "}}".to_string(),
            comment_start: "{#".to_string(),
            comment_end: "#}".to_string(),
        }
    }
}
