//! Jinja rendering over layered, schema-validated values.
//!
//! This module is the engine behind the `jinja_template` data source. It knows
//! nothing about Terraform: callers describe a render with a [`RenderContext`]
//! and get back the rendered text together with the merged context.
//!
//! # Pipeline
//!
//! 1. The base directory must exist; includes, `file` and `fileset` resolve
//!    relative paths against it.
//! 2. The template is parsed with the configured delimiters.
//! 3. Each value layer is decoded from JSON, YAML, TOML or TFVars into a
//!    mapping and merged over the previous ones. Nested mappings merge key by
//!    key, any other value replaces what was there.
//! 4. The merged mapping is validated against every named JSON Schema.
//! 5. The template is executed with the merged mapping as its context.
//!
//! Stages 2 to 5 run under the timeout of the context. See [`render()`].
//!
//! # Template surface
//!
//! On top of the standard Jinja filters, tests and functions the engine
//! registers the [`filters`], [`globals`] and [`predicates`] of this crate, for
//! example:
//!
//! ```text
//! {{ "config.yaml" | file | fromyaml | get("port", default=8080) }}
//! {% for path in fileset("partials/*.j2") %}{% include path %}{% endfor %}
//! {{ values | toyaml(indent=4) }}
//! ```

pub mod context;
pub mod environment;
pub mod error;
pub mod filters;
pub mod globals;
pub mod predicates;
pub mod render;
pub mod utils;
pub mod validation;
pub mod values;

pub use context::{Configuration, Delimiters, RenderContext, Source, Values, ValuesFormat};
pub use error::{RenderError, ValidationError, ValuesError};
pub use render::{Rendered, render, render_blocking};
