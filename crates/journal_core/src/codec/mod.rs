//! Key-aliasing compression for stored and exported JSON.
//!
//! # Responsibility
//! - Shrink payloads by renaming well-known field names to short aliases and
//!   emitting whitespace-free JSON.
//! - Restore long names on the way back in, accepting plain payloads too.
//!
//! # Invariants
//! - Renaming walks the parsed tree and touches object keys only; string
//!   values are never rewritten.
//! - The alias table is a bijection and no alias equals a long name, so
//!   decoding a plain payload is the identity.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `(long, short)` field aliases.
pub const KEY_ALIASES: &[(&str, &str)] = &[
    ("id", "i"),
    ("title", "t"),
    ("content", "c"),
    ("mood", "m"),
    ("energy", "e"),
    ("category", "cat"),
    ("tags", "tg"),
    ("timestamp", "ts"),
    ("description", "d"),
    ("priority", "p"),
    ("targetDate", "td"),
    ("progress", "pr"),
    ("completed", "comp"),
    ("createdAt", "ca"),
    ("milestones", "ms"),
];

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug)]
pub enum CodecError {
    /// Value could not be turned into JSON.
    Encode(serde_json::Error),
    /// Input is not JSON at all.
    Parse(serde_json::Error),
    /// JSON is well-formed but does not match the requested type.
    Shape(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode payload: {err}"),
            Self::Parse(err) => write!(f, "payload is not valid JSON: {err}"),
            Self::Shape(err) => write!(f, "payload has an unexpected shape: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Parse(err) | Self::Shape(err) => Some(err),
        }
    }
}

/// Serialises `data` with short keys and no insignificant whitespace.
pub fn compress<T: Serialize + ?Sized>(data: &T) -> CodecResult<String> {
    let mut value = serde_json::to_value(data).map_err(CodecError::Encode)?;
    rename_keys(&mut value, shorten);
    serde_json::to_string(&value).map_err(CodecError::Encode)
}

/// Parses compressed or plain JSON and restores long key names.
pub fn decompress(text: &str) -> CodecResult<Value> {
    let mut value: Value = serde_json::from_str(text).map_err(CodecError::Parse)?;
    rename_keys(&mut value, expand);
    Ok(value)
}

/// `decompress` followed by a typed decode.
pub fn decompress_into<T: DeserializeOwned>(text: &str) -> CodecResult<T> {
    let value = decompress(text)?;
    serde_json::from_value(value).map_err(CodecError::Shape)
}

fn shorten(key: &str) -> Option<&'static str> {
    KEY_ALIASES
        .iter()
        .find(|(long, _)| *long == key)
        .map(|(_, short)| *short)
}

fn expand(key: &str) -> Option<&'static str> {
    KEY_ALIASES
        .iter()
        .find(|(_, short)| *short == key)
        .map(|(long, _)| *long)
}

fn rename_keys(value: &mut Value, rename: fn(&str) -> Option<&'static str>) {
    match value {
        Value::Object(map) => {
            let renamed = std::mem::take(map)
                .into_iter()
                .map(|(key, mut child)| {
                    rename_keys(&mut child, rename);
                    let key = rename(&key).map_or(key, str::to_string);
                    (key, child)
                })
                .collect::<Map<String, Value>>();
            *map = renamed;
        }
        Value::Array(items) => {
            for item in items {
                rename_keys(item, rename);
            }
        }
        _ => {}
    }
}
