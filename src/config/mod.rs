//! Configuration of the command line front end.
//!
//! Provider settings normally come from a `provider "jinja"` block. Outside of
//! Terraform they are read from a TOML file instead, see [`ProviderConfig`].
//! The file location is resolved in this order:
//!
//! 1. `--config <path>`
//! 2. the `JINJA_PROVIDER_CONFIG` environment variable
//! 3. `<config dir>/jinja-provider/config.toml`
//!
//! Only the last one may be missing.

mod provider;

pub use provider::{CONFIG_ENV, ProviderConfig};
