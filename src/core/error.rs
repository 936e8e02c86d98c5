//! Error handling for the command line front end.
//!
//! The rendering engine reports failures through its own typed errors (see
//! [`crate::templating::RenderError`]) and the provider turns them into
//! diagnostics. This module covers what happens once a command gives up:
//!
//! - [`ProviderError`] enumerates the failures the CLI knows how to explain
//! - [`ErrorContext`] wraps one with optional details and a suggestion
//! - [`user_friendly_error`] converts any [`anyhow::Error`] into an
//!   [`ErrorContext`] ready to be printed by `main`
//!
//! ```rust,no_run
//! use jinja_provider::core::{ProviderError, user_friendly_error};
//!
//! let error = anyhow::Error::from(ProviderError::ConfigNotFound {
//!     path: "/etc/jinja-provider/config.toml".to_string(),
//! });
//! user_friendly_error(error).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Failures surfaced by the CLI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// An explicitly requested provider configuration file does not exist.
    #[error("Provider configuration not found: {path}")]
    ConfigNotFound {
        /// Path given through `--config` or `JINJA_PROVIDER_CONFIG`
        path: String,
    },

    /// The provider configuration file is not valid TOML or has unknown fields.
    #[error("Invalid provider configuration in {file}: {reason}")]
    ConfigParseError {
        /// Path of the configuration file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A data source file could not be decoded into a `jinja_template` block.
    #[error("Invalid data source in {file}: {reason}")]
    InvalidDataSource {
        /// Path of the data source file, `-` for stdin
        file: String,
        /// Decoder message
        reason: String,
    },

    /// Configuration validation reported errors.
    #[error("Data source validation failed with {count} error(s)")]
    ValidationFailed {
        /// Number of error diagnostics
        count: usize,
    },

    /// The data source read returned an error diagnostic.
    #[error("{summary}: {detail}")]
    RenderFailed {
        /// Diagnostic summary
        summary: String,
        /// Diagnostic detail
        detail: String,
    },

    /// A file could not be read or written.
    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        /// What was being attempted
        operation: String,
        /// The affected path
        path: String,
    },

    /// Access to a file was denied.
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied {
        /// What was being attempted
        operation: String,
        /// The affected path
        path: String,
    },

    /// Anything else, with the full message.
    #[error("{message}")]
    Other {
        /// Error message, including its cause chain
        message: String,
    },
}

/// A [`ProviderError`] with optional details and a suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ProviderError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: ProviderError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Adds an actionable suggestion, printed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Adds details about the error, printed in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error, details and suggestion to stderr.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// [`ProviderError`], [`std::io::Error`] and [`toml::de::Error`] are recognized.
/// Anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(provider_error) = error.downcast_ref::<ProviderError>() {
        return create_error_context(provider_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let details = format!("{error:#}");
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ProviderError::PermissionDenied {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check the ownership and permissions of the template, its includes and the output path")
                .with_details(details);
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ProviderError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(details);
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(ProviderError::ConfigParseError {
            file: "config.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the provider configuration. Verify quotes, brackets and table names");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ProviderError::Other {
        message,
    })
}

fn create_error_context(error: ProviderError) -> ErrorContext {
    match &error {
        ProviderError::ConfigNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Create the file, point --config at an existing file or unset JINJA_PROVIDER_CONFIG")
            .with_details("Without an explicit path the provider falls back to its defaults when no configuration file exists"),

        ProviderError::ConfigParseError { .. } => ErrorContext::new(error)
            .with_suggestion("The file must contain a [provider] table with strict_undefined, trim_blocks, left_strip_blocks and an optional [provider.delimiters] table"),

        ProviderError::InvalidDataSource { .. } => ErrorContext::new(error)
            .with_suggestion("Describe the data source in JSON (or YAML for .yaml/.yml files) with the same attributes and blocks as the jinja_template data source")
            .with_details("Run 'jinja-provider schema' to print the accepted attributes and blocks"),

        ProviderError::ValidationFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the attributes reported above, then run the command again"),

        ProviderError::RenderFailed { detail, .. } => {
            let suggestion = if detail.contains("failed to parse template") {
                "Check the template syntax and the configured delimiters"
            } else if detail.contains("failed to parse values") {
                "Check that every context layer is valid for its declared type and decodes to a mapping"
            } else if detail.contains("failed to validate context against schema") {
                "Fix the context so that it satisfies every schema of the validation map"
            } else if detail.contains("timed out") {
                "Simplify the template or raise timeouts.read"
            } else {
                "Run with --verbose to see which rendering stage failed"
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        ProviderError::FileSystemError { .. }
        | ProviderError::PermissionDenied { .. }
        | ProviderError::Other { .. } => ErrorContext::new(error),
    }
}
