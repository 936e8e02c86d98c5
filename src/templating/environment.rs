//! Construction of the template engine environment.
//!
//! The environment carries the delimiters, the undefined and whitespace
//! behavior, the loader used by `include`, `import` and `extends`, and the
//! filters, globals and tests of this crate. The root template itself is added
//! under [`root_template_name`] so that it never collides with a file name.

use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};
use sha2::{Digest, Sha256};

use super::context::Configuration;
use super::utils::resolve_path;
use super::{filters, globals, predicates};

/// Name under which the root template is registered: `root-<sha256 of its text>`.
pub fn root_template_name(template: &str) -> String {
    format!("root-{}", hex::encode(Sha256::digest(template.as_bytes())))
}

/// Builds an environment rendering templates from `directory` with `configuration`.
///
/// # Errors
///
/// Fails when the delimiters do not form a valid syntax, e.g. an empty or
/// duplicated start token.
pub fn create_environment(
    directory: &Path,
    configuration: &Configuration,
) -> Result<Environment<'static>, Error> {
    let mut env = Environment::new();

    let delimiters = &configuration.delimiters;
    let syntax = SyntaxConfig::builder()
        .block_delimiters(delimiters.block_start.clone(), delimiters.block_end.clone())
        .variable_delimiters(delimiters.variable_start.clone(), delimiters.variable_end.clone())
        .comment_delimiters(delimiters.comment_start.clone(), delimiters.comment_end.clone())
        .build()?;
    env.set_syntax(syntax);

    env.set_undefined_behavior(if configuration.strict_undefined {
        UndefinedBehavior::Strict
    } else {
        UndefinedBehavior::Lenient
    });
    env.set_trim_blocks(configuration.trim_blocks);
    env.set_lstrip_blocks(configuration.left_strip_blocks);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);

    let base = directory.to_path_buf();
    env.set_loader(move |name| load_template(&base, name));

    filters::register(&mut env, directory);
    globals::register(&mut env, directory);
    predicates::register(&mut env);

    Ok(env)
}

/// Loads an included template. Relative names resolve against `directory`,
/// missing files are reported as not found so that `ignore missing` works.
fn load_template(directory: &Path, name: &str) -> Result<Option<String>, Error> {
    let path = resolve_path(directory, name);
    match std::fs::read_to_string(&path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("failed to read template at path {}: {e}", path.display()),
        )),
    }
}
