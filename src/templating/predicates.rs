//! Jinja tests (`x is empty`, `x is match(...)`).

use minijinja::value::{Kwargs, Value, ValueKind};
use minijinja::{Environment, Error};

use super::filters::{invalid, matches_regex};

pub fn register(env: &mut Environment<'static>) {
    env.add_test("empty", is_empty);
    env.add_test("match", is_match);
}

/// Lists, dicts and strings of length zero. Any other type is an error.
fn is_empty(value: Value) -> Result<bool, Error> {
    match value.kind() {
        ValueKind::Seq | ValueKind::Map | ValueKind::String => Ok(value.len() == Some(0)),
        _ => Err(invalid(format!("{value} is neither a list, a dict nor a string"))),
    }
}

fn is_match(value: Value, regex: Option<Value>, kwargs: Kwargs) -> Result<bool, Error> {
    matches_regex(&value, regex, &kwargs)
}
