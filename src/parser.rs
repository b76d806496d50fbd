//! Line parser for tagged movement records.
//!
//! A movement line looks like `[user:alice] [type:deposit] [ammount:120]`.

use serde::Serialize;

use crate::error::ParseError;

/// One parsed movement. Only built once all three fields were found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementRecord {
    pub user: String,
    pub category: String,
    pub amount: u64,
}

/// Parses a single line of text into a [`MovementRecord`].
///
/// Tokens are separated by whitespace and shaped `tag:value`, optionally
/// wrapped in one decoration character on each side (e.g. `[user:alice]` or
/// `【user:alice】`). Recognized tags are `user`, `type` and `ammount`;
/// anything else is ignored. When a tag repeats, the last value wins.
///
/// A decoration is any single non-alphanumeric character, so undecorated
/// tokens (`user:alice`) parse too. The flip side is that a value ending in
/// punctuation always loses that last character: `type:fee.` has the
/// category `fee`, and `[type:fee.]` has the category `fee.`.
///
/// # Errors
///
/// - [`ParseError::MalformedRecord`] if any token lacks a `:`.
/// - [`ParseError::InvalidAmount`] if the `ammount` value is not a
///   non-negative integer.
/// - [`ParseError::MissingField`] if a required tag never appears.
pub fn parse_movement(line: &str) -> Result<MovementRecord, ParseError> {
    let mut user = None;
    let mut category = None;
    let mut amount = None;

    for token in line.split_whitespace() {
        let Some((raw_tag, raw_value)) = token.split_once(':') else {
            return Err(ParseError::MalformedRecord {
                token: token.to_string(),
            });
        };

        let value = strip_trailing_decoration(raw_value);

        match strip_leading_decoration(raw_tag) {
            "user" => user = Some(value.to_string()),
            "type" => category = Some(value.to_string()),
            "ammount" => amount = Some(parse_amount(value)?),
            _ => {}
        }
    }

    Ok(MovementRecord {
        user: user.ok_or(ParseError::MissingField { field: "user" })?,
        category: category.ok_or(ParseError::MissingField { field: "type" })?,
        amount: amount.ok_or(ParseError::MissingField { field: "ammount" })?,
    })
}

fn parse_amount(value: &str) -> Result<u64, ParseError> {
    let invalid = || ParseError::InvalidAmount {
        value: value.to_string(),
    };

    // `u64::from_str` would accept a leading '+'
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    value.parse::<u64>().map_err(|_| invalid())
}

fn strip_leading_decoration(tag: &str) -> &str {
    match tag.chars().next() {
        Some(c) if !c.is_alphanumeric() => &tag[c.len_utf8()..],
        _ => tag,
    }
}

fn strip_trailing_decoration(value: &str) -> &str {
    match value.chars().next_back() {
        Some(c) if !c.is_alphanumeric() => &value[..value.len() - c.len_utf8()],
        _ => value,
    }
}
