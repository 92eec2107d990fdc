//! Key-casing transcoder for request and response payloads.
//!
//! The API speaks `snake_case`; the application works in `camelCase`. Outbound
//! JSON bodies go through [`keys_to_snake`], inbound bodies through
//! [`keys_to_camel`]. Only mapping keys are rewritten: arrays are walked
//! element-wise, scalars are returned untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

/// Target naming convention for mapping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    Snake,
    Camel,
}

impl KeyCase {
    pub fn convert(self, key: &str) -> String {
        match self {
            KeyCase::Snake => to_snake_case(key),
            KeyCase::Camel => to_camel_case(key),
        }
    }
}

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}]+")
        .unwrap_or_else(|e| panic!("separator regex must be valid: {e}"))
});

/// Split a key into its words.
///
/// Separator runs (`_`, `-`, spaces, ...) always split. Inside a run, a new word
/// starts at an uppercase letter that follows a lowercase letter, at the last
/// capital of an acronym that is followed by a lowercase letter
/// (`XMLHttp` -> `XML`, `Http`), and wherever letters and digits meet
/// (`room2Bed` -> `room`, `2`, `Bed`).
fn words(key: &str) -> Vec<String> {
    let mut out = Vec::new();

    for segment in SEPARATOR_RE.split(key).filter(|s| !s.is_empty()) {
        let chars: Vec<char> = segment.chars().collect();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && is_boundary(chars[i - 1], c, chars.get(i + 1).copied()) {
                out.push(std::mem::take(&mut current));
            }
            current.push(c);
        }

        if !current.is_empty() {
            out.push(current);
        }
    }

    out
}

fn is_boundary(prev: char, c: char, next: Option<char>) -> bool {
    if prev.is_numeric() != c.is_numeric() {
        return true;
    }
    c.is_uppercase()
        && (prev.is_lowercase() || (prev.is_uppercase() && next.is_some_and(char::is_lowercase)))
}

pub fn to_snake_case(key: &str) -> String {
    words(key)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, word) in words(key).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Rewrite every mapping key in `value` under `case`, recursively.
pub fn transcode(value: Value, case: KeyCase) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| transcode(item, case))
                .collect(),
        ),
        Value::Object(map) => Value::Object(transcode_map(map, case)),
        scalar => scalar,
    }
}

fn transcode_map(map: Map<String, Value>, case: KeyCase) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let renamed = case.convert(&key);
        if out.contains_key(&renamed) {
            warn!(key = %key, renamed = %renamed, "key collision while transcoding payload; later key wins");
        }
        out.insert(renamed, transcode(value, case));
    }
    out
}

pub fn keys_to_snake(value: Value) -> Value {
    transcode(value, KeyCase::Snake)
}

pub fn keys_to_camel(value: Value) -> Value {
    transcode(value, KeyCase::Camel)
}
