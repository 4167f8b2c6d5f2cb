//! Dotted-path accessors over JSON state containers.
//!
//! Paths look like `user.address.city`. Bracket segments (`items[0]`,
//! `map['key']`, `map["key"]`) are normalized to dots before splitting.
//! An empty path reads the container itself and writes the key `""`.

use serde_json::Map;
use serde_json::Value;

use crate::constants::MAX_ARRAY_PADDING;

/// Split a path into its segments, normalizing bracket syntax.
pub fn path_segments(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }

    let mut normalized = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '[' {
            normalized.push(c);
            continue;
        }

        let mut inner = String::new();
        let mut closed = false;
        for n in chars.by_ref() {
            if n == ']' {
                closed = true;
                break;
            }
            inner.push(n);
        }
        if !closed {
            normalized.push('[');
            normalized.push_str(&inner);
            continue;
        }

        let trimmed = inner.trim_matches(|q| q == '\'' || q == '"');
        normalized.push('.');
        normalized.push_str(if trimmed.is_empty() { &inner } else { trimmed });
    }

    normalized.split('.').map(str::to_string).collect()
}

/// Join a base path and a child key.
pub fn join_path(
    base: &str,
    key: &str,
) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

/// Parent path of `path`; the root's parent is the root.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('.') {
        Some(i) => &path[..i],
        None => "",
    }
}

fn child<'a>(
    value: &'a Value,
    segment: &str,
) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Read the value at `path`, `Null` when any segment is missing.
pub fn data_get(
    container: &Value,
    path: &str,
) -> Value {
    get_segments(container, &path_segments(path))
        .cloned()
        .unwrap_or(Value::Null)
}

pub(crate) fn get_segments<'a>(
    container: &'a Value,
    segments: &[String],
) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(container, |carry, segment| child(carry, segment))
}

/// Outcome of a [`data_set`] call, used to decide which dependents to wake.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetOutcome {
    /// Whether the write landed
    pub written: bool,
    /// Whether the final key did not exist before
    pub added: bool,
    /// Whether the stored value differs from what was there before
    pub changed: bool,
    /// Intermediate paths that were created as empty objects
    pub created: Vec<String>,
}

/// Write `value` at `path`, creating missing intermediate objects.
///
/// Writes through a scalar are ignored. Array segments must be numeric;
/// writing past the end pads with `Null`, up to `MAX_ARRAY_PADDING` slots.
/// Indices further out are dropped.
pub fn data_set(
    container: &mut Value,
    path: &str,
    value: Value,
) -> SetOutcome {
    let segments = path_segments(path);
    set_segments(container, &segments, value)
}

pub(crate) fn set_segments(
    container: &mut Value,
    segments: &[String],
    value: Value,
) -> SetOutcome {
    let mut outcome = SetOutcome::default();
    let root_key = [String::new()];
    let segments = if segments.is_empty() { &root_key[..] } else { segments };
    let Some((last, parents)) = segments.split_last() else {
        return outcome;
    };

    let mut current = container;
    let mut walked = String::new();
    for segment in parents {
        walked = join_path(&walked, segment);
        let missing = child(current, segment).map_or(true, Value::is_null);
        if missing {
            if insert(current, segment, Value::Object(Map::new())).is_none() {
                return outcome;
            }
            outcome.created.push(walked.clone());
        }
        current = match child_mut(current, segment) {
            Some(next) => next,
            None => return outcome,
        };
    }

    match insert(current, last, value) {
        Some(Insert::Added) => {
            outcome.written = true;
            outcome.added = true;
            outcome.changed = true;
        }
        Some(Insert::Replaced) => {
            outcome.written = true;
            outcome.changed = true;
        }
        Some(Insert::Unchanged) => {
            outcome.written = true;
            outcome.changed = !outcome.created.is_empty();
        }
        None => {}
    }
    outcome
}

fn child_mut<'a>(
    value: &'a mut Value,
    segment: &str,
) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

enum Insert {
    Added,
    Replaced,
    Unchanged,
}

/// `None` when the write was dropped.
fn insert(
    target: &mut Value,
    key: &str,
    value: Value,
) -> Option<Insert> {
    match target {
        Value::Object(map) => match map.get_mut(key) {
            Some(slot) if *slot == value => Some(Insert::Unchanged),
            Some(slot) => {
                *slot = value;
                Some(Insert::Replaced)
            }
            None => {
                map.insert(key.to_string(), value);
                Some(Insert::Added)
            }
        },
        Value::Array(items) => {
            let index = key.parse::<usize>().ok()?;
            if let Some(slot) = items.get_mut(index) {
                if *slot == value {
                    return Some(Insert::Unchanged);
                }
                *slot = value;
                return Some(Insert::Replaced);
            }
            if index - items.len() > MAX_ARRAY_PADDING {
                return None;
            }
            items.resize(index, Value::Null);
            items.push(value);
            Some(Insert::Added)
        }
        _ => None,
    }
}

/// Truthiness of a JSON value as a script engine would see it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
