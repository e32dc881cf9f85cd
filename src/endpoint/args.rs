//! Argument extraction
//!
//! Turns a raw `key=value&...` payload into the positional and keyword
//! arguments an endpoint declared.

use super::value::{coerce_values, Value};
use thiserror::Error;

/// Key validation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("mandatory keys missing {missing:?}, mandatory keys are: {required:?}")]
    MissingKeys {
        missing: Vec<String>,
        required: Vec<String>,
    },
    #[error(
        "unexpected keys provided {unexpected:?}. Permitted optional keys are: {optional:?}, mandatory keys are: {required:?}"
    )]
    UnexpectedKeys {
        unexpected: Vec<String>,
        optional: Vec<String>,
        required: Vec<String>,
    },
}

/// Arguments ready to be handed to an endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArguments {
    /// Values of the required keys, in declaration order
    pub positional: Vec<Value>,
    /// Optional keys that were supplied, in declaration order
    pub keyword: Vec<(String, Value)>,
}

/// Parse a urlencoded payload into keys and their raw values.
///
/// Keys keep first-appearance order and repeated keys accumulate. Fields
/// with an empty value are dropped.
pub fn parse_query(raw: &str) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }
    grouped
}

/// Parse and coerce a payload in one step
pub fn coerce_query(raw: &str) -> Vec<(String, Value)> {
    parse_query(raw)
        .into_iter()
        .map(|(key, values)| {
            let value = coerce_values(&values);
            (key, value)
        })
        .collect()
}

/// Split coerced pairs into required positional values and optional keywords.
///
/// Every missing required key is an error, as is any key that is neither
/// required nor optional.
pub fn split_arguments(
    mut coerced: Vec<(String, Value)>,
    required: &[String],
    optional: &[String],
) -> Result<ParsedArguments, ArgumentError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|key| !coerced.iter().any(|(k, _)| k == *key))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ArgumentError::MissingKeys {
            missing,
            required: required.to_vec(),
        });
    }

    let positional = required
        .iter()
        .filter_map(|key| take(&mut coerced, key))
        .collect();
    let keyword = optional
        .iter()
        .filter_map(|key| take(&mut coerced, key).map(|value| (key.clone(), value)))
        .collect();

    if !coerced.is_empty() {
        return Err(ArgumentError::UnexpectedKeys {
            unexpected: coerced.into_iter().map(|(k, _)| k).collect(),
            optional: optional.to_vec(),
            required: required.to_vec(),
        });
    }

    Ok(ParsedArguments {
        positional,
        keyword,
    })
}

fn take(pairs: &mut Vec<(String, Value)>, key: &str) -> Option<Value> {
    let index = pairs.iter().position(|(k, _)| k == key)?;
    Some(pairs.remove(index).1)
}
