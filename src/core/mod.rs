//! Core types shared by the command line front end.
//!
//! - [`ProviderError`] - failures the CLI knows how to explain
//! - [`ErrorContext`] - an error plus details and a suggestion, printed in color
//! - [`user_friendly_error`] - turns any [`anyhow::Error`] into an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, ProviderError, user_friendly_error};
