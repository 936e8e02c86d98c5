//! Utility functions for the templating system.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Recursively merges `overrides` into `base`.
///
/// When both sides of a key are mappings they are merged; in every other case
/// the value from `overrides` replaces the one in `base`, including empty
/// lists, empty strings and nulls.
pub fn merge_maps(base: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, override_value) in overrides {
        match base.get_mut(key) {
            Some(Value::Object(base_obj)) if override_value.is_object() => {
                if let Value::Object(override_obj) = override_value {
                    merge_maps(base_obj, override_obj);
                }
            }
            _ => {
                base.insert(key.clone(), override_value.clone());
            }
        }
    }
}

/// English ordinal of a 1-based position: `1st`, `2nd`, `3rd`, `4th`, `11th`, `22nd`.
pub fn ordinal(position: usize) -> String {
    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}

/// Human readable kind of a JSON value, used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Lexically cleans a slash separated path.
///
/// Repeated separators and `.` elements are removed, `..` elements consume the
/// preceding element, `..` directly under the root is dropped, and an empty
/// result becomes `.`. The file system is never consulted.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Last element of a path. `.` for an empty path, `/` for the root.
pub fn base_name(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        Some(index) => trimmed[index + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Everything but the last element of a path, cleaned. `.` when there is no parent.
pub fn dir_name(path: &str) -> String {
    match path.rfind('/') {
        Some(index) => clean_path(&path[..=index]),
        None => ".".to_string(),
    }
}

/// Joins a relative `path` onto `directory`; absolute paths are returned unchanged.
pub fn resolve_path(directory: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        directory.join(candidate)
    }
}

/// Absolute, lexically cleaned form of `path` resolved against `directory`.
///
/// A relative `directory` is itself made absolute against the process working
/// directory.
pub fn absolute_path(directory: &Path, path: &str) -> std::io::Result<String> {
    let resolved = resolve_path(directory, path);
    let absolute = if resolved.is_absolute() {
        resolved
    } else {
        std::env::current_dir()?.join(resolved)
    };
    Ok(clean_path(&absolute.to_string_lossy()))
}
