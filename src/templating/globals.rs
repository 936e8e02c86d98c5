//! Global variables and functions available to every template.
//!
//! | name | kind | result |
//! |---|---|---|
//! | `provider` | map | `version`, `commit`, `date`, `repository`, `registry` |
//! | `abspath(path)` | function | absolute path resolved against the source directory |
//! | `basename(path)` | function | last path element |
//! | `dirname(path)` | function | parent path |
//! | `env(name, default="")` | function | environment variable |
//! | `file(path)` | function | file content |
//! | `fileset(pattern)` | function | sorted list of matching paths |
//! | `uuid()` | function | random v4 UUID |
//!
//! Arguments can be given positionally or by keyword.

use std::path::Path;

use minijinja::value::{Kwargs, Value};
use minijinja::{Environment, Error, ErrorKind, context};

use super::filters::{expect_str, glob_paths, lookup_env, read_file, resolve_absolute};
use super::utils::{base_name, dir_name};

/// Release version of this build.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Commit of this build, injected through `JINJA_PROVIDER_COMMIT` at compile time.
pub const COMMIT: &str = match option_env!("JINJA_PROVIDER_COMMIT") {
    Some(commit) => commit,
    None => "0000000000000000000000000000000000000000",
};
/// Build date, injected through `JINJA_PROVIDER_DATE` at compile time.
pub const DATE: &str = match option_env!("JINJA_PROVIDER_DATE") {
    Some(date) => date,
    None => "1970-01-01T00:00:00+00:00",
};
pub const REPOSITORY: &str = "github.com/nikolalohinski/terraform-provider-jinja";
pub const REGISTRY: &str = "registry.terraform.io/NikolaLohinski/jinja";

/// Registers the `provider` map and the global functions on `env`.
pub fn register(env: &mut Environment<'static>, directory: &Path) {
    env.add_global(
        "provider",
        context! {
            version => VERSION,
            commit => COMMIT,
            date => DATE,
            repository => REPOSITORY,
            registry => REGISTRY,
        },
    );

    let base = directory.to_path_buf();
    env.add_function("abspath", move |path: Option<Value>, kwargs: Kwargs| {
        let path = argument(path, &kwargs, "path")?;
        kwargs.assert_all_used()?;
        resolve_absolute(&base, expect_str(&path)?).map(Value::from)
    });
    let base = directory.to_path_buf();
    env.add_function("file", move |path: Option<Value>, kwargs: Kwargs| {
        let path = argument(path, &kwargs, "path")?;
        kwargs.assert_all_used()?;
        read_file(&base, expect_str(&path)?).map(Value::from)
    });
    let base = directory.to_path_buf();
    env.add_function("fileset", move |pattern: Option<Value>, kwargs: Kwargs| {
        let pattern = argument(pattern, &kwargs, "pattern")?;
        kwargs.assert_all_used()?;
        let paths = glob_paths(&base, expect_str(&pattern)?)?;
        Ok::<_, Error>(Value::from(paths.into_iter().map(Value::from).collect::<Vec<_>>()))
    });

    env.add_function("basename", |path: Option<Value>, kwargs: Kwargs| {
        let path = argument(path, &kwargs, "path")?;
        kwargs.assert_all_used()?;
        Ok::<_, Error>(Value::from(base_name(expect_str(&path)?)))
    });
    env.add_function("dirname", |path: Option<Value>, kwargs: Kwargs| {
        let path = argument(path, &kwargs, "path")?;
        kwargs.assert_all_used()?;
        Ok::<_, Error>(Value::from(dir_name(expect_str(&path)?)))
    });
    env.add_function("env", env_function);
    env.add_function("uuid", || uuid::Uuid::new_v4().to_string());
}

fn env_function(name: Option<Value>, default: Option<Value>, kwargs: Kwargs) -> Result<Value, Error> {
    let name = argument(name, &kwargs, "name")?;
    let default = match default {
        Some(default) => Some(default),
        None => kwargs.get::<Option<Value>>("default")?,
    };
    kwargs.assert_all_used()?;
    let default = default.map(|value| expect_str(&value).map(str::to_string)).transpose()?;
    lookup_env(expect_str(&name)?, default)
}

/// Picks the positional argument if given, the keyword argument `name` otherwise.
///
/// Callers still have to call [`Kwargs::assert_all_used`] once every keyword is read.
fn argument(positional: Option<Value>, kwargs: &Kwargs, name: &str) -> Result<Value, Error> {
    let keyword: Option<Value> = kwargs.get(name)?;
    positional.or(keyword).ok_or_else(|| {
        Error::new(ErrorKind::MissingArgument, format!("missing argument '{name}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn environment(directory: &Path) -> Environment<'static> {
        let mut env = Environment::new();
        register(&mut env, directory);
        env
    }

    #[test]
    fn test_provider_map() {
        let env = environment(Path::new("/"));
        let rendered = env
            .render_str("{{ provider.version }}|{{ provider.repository }}|{{ provider.registry }}", context! {})
            .unwrap();
        assert_eq!(rendered, format!("{VERSION}|{REPOSITORY}|{REGISTRY}"));
        assert!(!env.render_str("{{ provider.commit }}", context! {}).unwrap().is_empty());
    }

    #[test]
    fn test_path_functions_accept_positional_and_keyword_arguments() {
        let env = environment(Path::new("/base"));
        assert_eq!(env.render_str("{{ abspath('dir/../file') }}", context! {}).unwrap(), "/base/file");
        assert_eq!(env.render_str("{{ abspath(path='file') }}", context! {}).unwrap(), "/base/file");
        assert_eq!(env.render_str("{{ basename('/a/b.txt') }}", context! {}).unwrap(), "b.txt");
        assert_eq!(env.render_str("{{ dirname(path='/a/b.txt') }}", context! {}).unwrap(), "/a");
        assert!(env.render_str("{{ basename() }}", context! {}).is_err());
        assert!(env.render_str("{{ basename(true) }}", context! {}).unwrap_err().to_string().contains("true is not a string"));
    }

    #[test]
    fn test_file_and_fileset_functions() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "content").unwrap();
        fs::write(temp.path().join("b.txt"), "").unwrap();
        let env = environment(temp.path());

        assert_eq!(env.render_str("{{ file('a.txt') }}", context! {}).unwrap(), "content");
        assert_eq!(env.render_str("{{ file(path='a.txt') }}", context! {}).unwrap(), "content");
        let listed = env.render_str("{{ fileset('*.txt') | join(',') }}", context! {}).unwrap();
        let root = temp.path().to_string_lossy();
        assert_eq!(listed, format!("{root}/a.txt,{root}/b.txt"));
        assert_eq!(env.render_str("{{ fileset(pattern='*.txt') | length }}", context! {}).unwrap(), "2");
    }

    #[test]
    #[serial]
    fn test_env_function() {
        let env = environment(Path::new("/"));
        unsafe { std::env::set_var("JINJA_PROVIDER_GLOBAL_TEST", "value") };
        assert_eq!(env.render_str("{{ env('JINJA_PROVIDER_GLOBAL_TEST') }}", context! {}).unwrap(), "value");
        unsafe { std::env::remove_var("JINJA_PROVIDER_GLOBAL_TEST") };

        assert_eq!(
            env.render_str("{{ env(name='JINJA_PROVIDER_GLOBAL_TEST', default='fallback') }}", context! {}).unwrap(),
            "fallback"
        );
        let err = env.render_str("{{ env('JINJA_PROVIDER_GLOBAL_TEST') }}", context! {}).unwrap_err();
        assert!(err.to_string().contains("failed to get 'JINJA_PROVIDER_GLOBAL_TEST' environment variable without default"));
    }

    #[test]
    fn test_uuid_is_random_v4() {
        let env = environment(Path::new("/"));
        let first = env.render_str("{{ uuid() }}", context! {}).unwrap();
        let second = env.render_str("{{ uuid() }}", context! {}).unwrap();
        assert_ne!(first, second);
        assert_eq!(uuid::Uuid::parse_str(&first).unwrap().get_version_num(), 4);
    }
}
