//! Template filters.
//!
//! Every filter checks the type of its input itself so that a wrong input
//! produces a message naming the offending value, e.g. `true is not a list`,
//! instead of a generic argument conversion error.
//!
//! Filters touching the file system (`abspath`, `file`, `fileset`) resolve
//! relative paths against the directory of the template source. `fileset`
//! patterns are joined onto that directory even when they start with `/`.
//! These filters are built as closures capturing the directory.
//!
//! # Examples
//!
//! ```jinja
//! {{ "./config/*.yaml" | fileset | length }}
//! {{ "secrets.yaml" | file | fromyaml | get("password", strict=true) }}
//! {{ ["a", "b"] | concat(["c"]) | distinct | join(",") }}
//! {{ context | toyaml(indent=4) }}
//! ```

use std::path::Path;

use base64::prelude::*;
use minijinja::value::{Kwargs, Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use regex::Regex;
use sha2::{Digest, Sha256, Sha512};

use super::utils::{absolute_path, base_name, clean_path, dir_name, ordinal, resolve_path};
use super::values::{parse_json, parse_tfvars, parse_toml, parse_yaml};

/// Registers every filter on `env`, resolving file system paths against `directory`.
pub fn register(env: &mut Environment<'static>, directory: &Path) {
    let base = directory.to_path_buf();
    env.add_filter("abspath", move |value: Value| abspath(&base, &value));
    let base = directory.to_path_buf();
    env.add_filter("file", move |value: Value| file(&base, &value));
    let base = directory.to_path_buf();
    env.add_filter("fileset", move |value: Value| fileset(&base, &value));

    env.add_filter("add", add);
    env.add_filter("append", append);
    env.add_filter("basename", basename);
    env.add_filter("bool", to_bool);
    env.add_filter("concat", concat);
    env.add_filter("dir", dirname);
    env.add_filter("dirname", dirname);
    env.add_filter("distinct", distinct);
    env.add_filter("env", env_var);
    env.add_filter("fail", fail);
    env.add_filter("flatten", flatten);
    env.add_filter("fromjson", fromjson);
    env.add_filter("fromyaml", fromyaml);
    env.add_filter("fromtoml", fromtoml);
    env.add_filter("fromtfvars", fromtfvars);
    env.add_filter("fromcsv", fromcsv);
    env.add_filter("frombase64", frombase64);
    env.add_filter("tobase64", tobase64);
    env.add_filter("get", get);
    env.add_filter("ifelse", ifelse);
    env.add_filter("insert", insert);
    env.add_filter("keys", keys);
    env.add_filter("values", values);
    env.add_filter("match", regex_match);
    env.add_filter("md5", md5);
    env.add_filter("sha1", sha1);
    env.add_filter("sha256", sha256);
    env.add_filter("sha512", sha512);
    env.add_filter("split", split);
    env.add_filter("totoml", totoml);
    env.add_filter("toyaml", toyaml);
    env.add_filter("try", try_value);
    env.add_filter("unset", unset);
}

/// Builds an `InvalidOperation` error carrying `message`.
pub(crate) fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

pub(crate) fn expect_str(value: &Value) -> Result<&str, Error> {
    value.as_str().ok_or_else(|| invalid(format!("{value} is not a string")))
}

fn expect_non_empty_str(value: &Value) -> Result<&str, Error> {
    match value.as_str() {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(invalid(format!("{value} is not a non-empty string"))),
    }
}

pub(crate) fn expect_list(value: &Value) -> Result<Vec<Value>, Error> {
    if value.kind() != ValueKind::Seq {
        return Err(invalid(format!("{value} is not a list")));
    }
    Ok(value.try_iter()?.collect())
}

pub(crate) fn expect_dict(value: &Value) -> Result<Vec<(Value, Value)>, Error> {
    if value.kind() != ValueKind::Map {
        return Err(invalid(format!("{value} is not a dict")));
    }
    value
        .try_iter()?
        .map(|key| {
            let item = value.get_item(&key)?;
            Ok((key, item))
        })
        .collect()
}

/// Reads a file, resolving relative paths against `directory`.
pub(crate) fn read_file(directory: &Path, path: &str) -> Result<String, Error> {
    let resolved = resolve_path(directory, path);
    std::fs::read_to_string(&resolved)
        .map_err(|e| invalid(format!("failed to read file at path {}: {e}", resolved.display())))
}

/// Expands a glob pattern into a sorted list of paths.
///
/// The pattern is always joined onto `directory`, so `/conf/*.yaml` matches
/// under the template directory rather than the file system root.
pub(crate) fn glob_paths(directory: &Path, pattern: &str) -> Result<Vec<String>, Error> {
    let base = directory.to_string_lossy();
    let joined = if base.is_empty() { clean_path(pattern) } else { clean_path(&format!("{base}/{pattern}")) };
    let entries = glob::glob(&joined).map_err(|e| invalid(format!("failed to traverse {pattern}: {e}")))?;
    let mut paths = entries
        .map(|entry| {
            entry
                .map(|path| path.to_string_lossy().into_owned())
                .map_err(|e| invalid(format!("failed to traverse {pattern}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

pub(crate) fn resolve_absolute(directory: &Path, path: &str) -> Result<String, Error> {
    absolute_path(directory, path)
        .map_err(|e| invalid(format!("failed to derive an absolute path of {path}: {e}")))
}

fn abspath(directory: &Path, value: &Value) -> Result<Value, Error> {
    resolve_absolute(directory, expect_str(value)?).map(Value::from)
}

fn file(directory: &Path, value: &Value) -> Result<Value, Error> {
    read_file(directory, expect_str(value)?).map(Value::from)
}

fn fileset(directory: &Path, value: &Value) -> Result<Value, Error> {
    let paths = glob_paths(directory, expect_str(value)?)?;
    Ok(Value::from(paths.into_iter().map(Value::from).collect::<Vec<_>>()))
}

/// `list | add(item)` appends, `dict | add(key, value)` inserts.
fn add(value: Value, item: Value, extra: Option<Value>) -> Result<Value, Error> {
    match value.kind() {
        ValueKind::Seq => append(value, item),
        ValueKind::Map => insert(value, item, extra.unwrap_or_else(|| Value::from(()))),
        _ => Err(invalid(format!("{value} is neither a dict nor a list"))),
    }
}

fn append(value: Value, item: Value) -> Result<Value, Error> {
    let mut items = expect_list(&value)?;
    items.push(item);
    Ok(Value::from(items))
}

fn insert(value: Value, key: Value, item: Value) -> Result<Value, Error> {
    let key = expect_str(&key)?.to_string();
    let mut entries = expect_dict(&value)?;
    entries.retain(|(existing, _)| existing.as_str() != Some(key.as_str()));
    entries.push((Value::from(key), item));
    Ok(Value::from_iter(entries))
}

fn unset(value: Value, key: Value) -> Result<Value, Error> {
    let key = expect_str(&key)?.to_string();
    let mut entries = expect_dict(&value)?;
    entries.retain(|(existing, _)| existing.as_str() != Some(key.as_str()));
    Ok(Value::from_iter(entries))
}

fn basename(value: Value) -> Result<Value, Error> {
    Ok(Value::from(base_name(expect_str(&value)?)))
}

fn dirname(value: Value) -> Result<Value, Error> {
    Ok(Value::from(dir_name(expect_str(&value)?)))
}

fn to_bool(value: Value) -> Result<Value, Error> {
    const YES: [&str; 4] = ["true", "yes", "on", "1"];
    const NO: [&str; 5] = ["false", "no", "off", "0", ""];

    match value.kind() {
        ValueKind::Bool => Ok(Value::from(value.is_true())),
        ValueKind::Undefined | ValueKind::None => Ok(Value::from(false)),
        ValueKind::String => {
            let lowered = expect_str(&value)?.to_lowercase();
            if YES.contains(&lowered.as_str()) {
                Ok(Value::from(true))
            } else if NO.contains(&lowered.as_str()) {
                Ok(Value::from(false))
            } else {
                Err(invalid(format!(
                    "{value} can not be cast to boolean as it's not in ['{}'] nor ['{}']",
                    YES.join("','"),
                    NO.join("','")
                )))
            }
        }
        ValueKind::Number => match f64::try_from(value.clone()) {
            Ok(number) if number == 1.0 => Ok(Value::from(true)),
            Ok(number) if number == 0.0 => Ok(Value::from(false)),
            _ => Err(invalid(format!("{value} can not be cast to boolean as it's not in [0,1]"))),
        },
        _ => Err(invalid(format!("failed to cast: {value}"))),
    }
}

fn concat(value: Value, lists: Rest<Value>) -> Result<Value, Error> {
    let mut items = expect_list(&value)?;
    for (index, list) in lists.iter().enumerate() {
        if list.kind() != ValueKind::Seq {
            return Err(invalid(format!("{} argument {list} is not a list", ordinal(index + 1))));
        }
        items.extend(list.try_iter()?);
    }
    Ok(Value::from(items))
}

fn distinct(value: Value) -> Result<Value, Error> {
    let mut unique: Vec<Value> = Vec::new();
    for item in expect_list(&value)? {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    Ok(Value::from(unique))
}

fn flatten(value: Value) -> Result<Value, Error> {
    let mut items = Vec::new();
    for item in expect_list(&value)? {
        if item.kind() == ValueKind::Seq {
            items.extend(item.try_iter()?);
        } else {
            items.push(item);
        }
    }
    Ok(Value::from(items))
}

/// Looks up an environment variable. Fails when it is unset and no non-empty
/// `default` keyword is given.
pub(crate) fn lookup_env(name: &str, default: Option<String>) -> Result<Value, Error> {
    match std::env::var(name) {
        Ok(value) => Ok(Value::from(value)),
        Err(_) => match default {
            Some(default) if !default.is_empty() => Ok(Value::from(default)),
            _ => Err(invalid(format!("failed to get '{name}' environment variable without default"))),
        },
    }
}

fn env_var(value: Value, kwargs: Kwargs) -> Result<Value, Error> {
    let default: Option<String> = kwargs.get("default")?;
    kwargs.assert_all_used()?;
    lookup_env(expect_str(&value)?, default)
}

fn fail(value: Value) -> Result<Value, Error> {
    Err(invalid(value.to_string()))
}

fn fromjson(value: Value) -> Result<Value, Error> {
    let text = expect_non_empty_str(&value)?;
    let parsed = parse_json(text).map_err(|e| invalid(format!("failed to unmarshal {text}: {e}")))?;
    Ok(Value::from_serialize(&parsed))
}

fn fromyaml(value: Value) -> Result<Value, Error> {
    let text = expect_non_empty_str(&value)?;
    let parsed = parse_yaml(text).map_err(|e| invalid(format!("failed to unmarshal {text}: {e}")))?;
    Ok(Value::from_serialize(&parsed))
}

fn fromtoml(value: Value) -> Result<Value, Error> {
    let text = expect_non_empty_str(&value)?;
    let parsed = parse_toml(text).map_err(|e| invalid(format!("failed to unmarshal from toml {text}: {e}")))?;
    Ok(Value::from_serialize(&parsed))
}

fn fromtfvars(value: Value) -> Result<Value, Error> {
    let text = expect_str(&value)?;
    let parsed = parse_tfvars(text).map_err(|e| invalid(format!("failed to parse '{text}' as tfvars: {e}")))?;
    Ok(Value::from_serialize(&parsed))
}

/// Header row plus records into a list of dicts of strings.
fn fromcsv(value: Value) -> Result<Value, Error> {
    let text = expect_str(&value)?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| invalid(format!("failed to read CSV header row: {e}")))?
        .clone();
    if headers.is_empty() {
        return Err(invalid("failed to read CSV header row: no header found"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| invalid(format!("failed to read CSV row: {e}")))?;
        let row: Vec<(Value, Value)> = headers
            .iter()
            .zip(record.iter())
            .map(|(name, field)| (Value::from(name), Value::from(field)))
            .collect();
        rows.push(Value::from_iter(row));
    }
    Ok(Value::from(rows))
}

fn frombase64(value: Value) -> Result<Value, Error> {
    let text = expect_str(&value)?;
    let decoded = BASE64_STANDARD
        .decode(text)
        .map_err(|e| invalid(format!("failed to decode '{text}' from base64: {e}")))?;
    Ok(Value::from(String::from_utf8_lossy(&decoded).into_owned()))
}

fn tobase64(value: Value) -> Result<Value, Error> {
    Ok(Value::from(BASE64_STANDARD.encode(expect_str(&value)?)))
}

/// `dict | get(key, strict=false, default=none)`
fn get(value: Value, key: Value, kwargs: Kwargs) -> Result<Value, Error> {
    let strict: Option<bool> = kwargs.get("strict")?;
    // `default=none` counts as no default.
    let default = kwargs.get::<Option<Value>>("default")?.filter(|v| !v.is_none() && !v.is_undefined());
    kwargs.assert_all_used()?;

    expect_dict(&value)?;
    let item = value.get_item(&key)?;
    if !item.is_undefined() {
        return Ok(item);
    }
    match default {
        Some(default) => Ok(default),
        None if strict.unwrap_or(false) => Err(invalid(format!("item '{key}' not found in: {value}"))),
        None => Ok(Value::from(())),
    }
}

fn ifelse(value: Value, if_value: Value, else_value: Value) -> Value {
    if value.is_true() { if_value } else { else_value }
}

fn keys(value: Value) -> Result<Value, Error> {
    Ok(Value::from(expect_dict(&value)?.into_iter().map(|(key, _)| key).collect::<Vec<_>>()))
}

fn values(value: Value) -> Result<Value, Error> {
    Ok(Value::from(expect_dict(&value)?.into_iter().map(|(_, item)| item).collect::<Vec<_>>()))
}

/// Shared by the `match` filter and test: the pattern comes positionally or as `regex=`.
pub(crate) fn matches_regex(value: &Value, regex: Option<Value>, kwargs: &Kwargs) -> Result<bool, Error> {
    let keyword: Option<Value> = kwargs.get("regex")?;
    kwargs.assert_all_used()?;
    let pattern = regex
        .or(keyword)
        .ok_or_else(|| Error::new(ErrorKind::MissingArgument, "missing regex argument"))?;
    let pattern = expect_str(&pattern)?;
    let text = expect_str(value)?;
    let matcher =
        Regex::new(pattern).map_err(|e| invalid(format!("failed to compile: {pattern}: {e}")))?;
    Ok(matcher.is_match(text))
}

fn regex_match(value: Value, regex: Option<Value>, kwargs: Kwargs) -> Result<Value, Error> {
    matches_regex(&value, regex, &kwargs).map(Value::from)
}

fn md5(value: Value) -> Result<Value, Error> {
    Ok(Value::from(hex::encode(md5::Md5::digest(expect_str(&value)?.as_bytes()))))
}

fn sha1(value: Value) -> Result<Value, Error> {
    Ok(Value::from(hex::encode(sha1::Sha1::digest(expect_str(&value)?.as_bytes()))))
}

fn sha256(value: Value) -> Result<Value, Error> {
    Ok(Value::from(hex::encode(Sha256::digest(expect_str(&value)?.as_bytes()))))
}

fn sha512(value: Value) -> Result<Value, Error> {
    Ok(Value::from(hex::encode(Sha512::digest(expect_str(&value)?.as_bytes()))))
}

fn split(value: Value, delimiter: Value) -> Result<Value, Error> {
    let delimiter = expect_str(&delimiter)?;
    let text = expect_str(&value)?;
    let parts: Vec<Value> = if delimiter.is_empty() {
        text.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        text.split(delimiter).map(Value::from).collect()
    };
    Ok(Value::from(parts))
}

/// Dicts become a TOML document; other values their inline TOML form.
fn totoml(value: Value) -> Result<Value, Error> {
    if value.is_undefined() || value.is_none() {
        return Err(invalid(format!("{value} is undefined")));
    }
    let converted = toml::Value::try_from(&value)
        .map_err(|e| invalid(format!("unable to marshal to toml: {e}")))?;
    let rendered = match converted {
        toml::Value::Table(table) => {
            toml::to_string(&table).map_err(|e| invalid(format!("unable to marshal to toml: {e}")))?
        }
        other => other.to_string(),
    };
    Ok(Value::from_safe_string(rendered))
}

/// YAML document of the input with `indent` spaces per nesting level (default 2).
///
/// With the default indentation the document is the one `serde_yaml` emits.
/// Any other width goes through [`YamlWriter`].
fn toyaml(value: Value, kwargs: Kwargs) -> Result<Value, Error> {
    let indent: Option<usize> = kwargs.get("indent")?;
    kwargs.assert_all_used()?;
    if value.is_undefined() || value.is_none() {
        return Err(invalid(format!("{value} is undefined")));
    }
    let indent = indent.unwrap_or(2);
    if indent == 0 {
        return Err(invalid("indent must be a positive integer"));
    }
    let marshal_error = |e: serde_yaml::Error| invalid(format!("unable to marshal to yaml: {value}: {e}"));
    if indent == 2 {
        return serde_yaml::to_string(&value).map(Value::from).map_err(marshal_error);
    }
    let document = serde_yaml::to_value(&value).map_err(marshal_error)?;
    let mut writer = YamlWriter {
        indent,
        output: String::new(),
    };
    writer.document(&document).map_err(marshal_error)?;
    Ok(Value::from(writer.output))
}

/// Block style YAML emitter with a configurable indentation width.
///
/// Nested collections are indented by `indent` columns, sequences nested in
/// mappings included. The content of a sequence item starts `indent` columns
/// after its dash (at least one space after it). Scalars are written by
/// `serde_yaml`; strings spanning several lines are written double quoted.
struct YamlWriter {
    indent: usize,
    output: String,
}

impl YamlWriter {
    fn document(&mut self, value: &serde_yaml::Value) -> Result<(), serde_yaml::Error> {
        match value {
            serde_yaml::Value::Mapping(mapping) if !mapping.is_empty() => self.mapping(mapping, 0, false),
            serde_yaml::Value::Sequence(items) if !items.is_empty() => self.sequence(items, 0, false),
            scalar => {
                let rendered = yaml_scalar(scalar)?;
                self.output.push_str(&rendered);
                self.output.push('\n');
                Ok(())
            }
        }
    }

    /// Writes `mapping` at `column`. With `inline`, the first key continues the
    /// current line, right after a sequence dash.
    fn mapping(&mut self, mapping: &serde_yaml::Mapping, column: usize, inline: bool) -> Result<(), serde_yaml::Error> {
        for (index, (key, value)) in mapping.iter().enumerate() {
            if index > 0 || !inline {
                self.pad(column);
            }
            let key = yaml_scalar(key)?;
            self.output.push_str(&key);
            self.output.push(':');
            self.nested(value, column + self.indent)?;
        }
        Ok(())
    }

    fn sequence(&mut self, items: &[serde_yaml::Value], column: usize, inline: bool) -> Result<(), serde_yaml::Error> {
        let content = column + self.indent.max(2);
        for (index, item) in items.iter().enumerate() {
            if index > 0 || !inline {
                self.pad(column);
            }
            self.output.push('-');
            self.pad(content - column - 1);
            match item {
                serde_yaml::Value::Mapping(mapping) if !mapping.is_empty() => self.mapping(mapping, content, true)?,
                serde_yaml::Value::Sequence(nested) if !nested.is_empty() => self.sequence(nested, content, true)?,
                scalar => {
                    let rendered = yaml_scalar(scalar)?;
                    self.output.push_str(&rendered);
                    self.output.push('\n');
                }
            }
        }
        Ok(())
    }

    /// Writes the value of a mapping entry whose key was just written.
    fn nested(&mut self, value: &serde_yaml::Value, column: usize) -> Result<(), serde_yaml::Error> {
        match value {
            serde_yaml::Value::Mapping(mapping) if !mapping.is_empty() => {
                self.output.push('\n');
                self.mapping(mapping, column, false)
            }
            serde_yaml::Value::Sequence(items) if !items.is_empty() => {
                self.output.push('\n');
                self.sequence(items, column, false)
            }
            scalar => {
                let rendered = yaml_scalar(scalar)?;
                self.output.push(' ');
                self.output.push_str(&rendered);
                self.output.push('\n');
                Ok(())
            }
        }
    }

    fn pad(&mut self, width: usize) {
        self.output.extend(std::iter::repeat_n(' ', width));
    }
}

/// Single line form of a scalar or of an empty collection.
fn yaml_scalar(value: &serde_yaml::Value) -> Result<String, serde_yaml::Error> {
    let rendered = serde_yaml::to_string(value)?;
    let rendered = rendered.trim_end_matches('\n');
    match value {
        serde_yaml::Value::String(text) if rendered.contains('\n') => {
            Ok(serde_json::to_string(text).unwrap_or_else(|_| format!("{text:?}")))
        }
        _ => Ok(rendered.to_string()),
    }
}

/// Returns none for undefined, none or falsy input and the input otherwise.
fn try_value(value: Value) -> Value {
    if value.is_true() { value } else { Value::from(()) }
}
