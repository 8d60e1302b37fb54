//! The argument/flag parser.
//!
//! Commands declare an ordered flag schema ([`ArgSpec`]); the pipeline runs
//! [`parse_arguments`] over the tokens that follow the command name and hands
//! the result to the handler. The grammar is deliberately small:
//!
//! - `--name` is a presence flag and carries the value `true`;
//! - `--name=value` is a value flag, split on the *first* `=`;
//! - every other token is positional and keeps its original relative order,
//!   no matter where flags appear between positionals.
//!
//! There is no quoting or escaping; tokenization happens upstream on plain
//! whitespace.

use std::collections::HashMap;

use crate::error::{ParseArgumentsError, ParseResult};

/// The value type a declared flag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// `--name=value`, value passed through verbatim.
    String,
    /// `--name`, presence only.
    Boolean,
    /// `--name=value`, value parsed as a signed integer.
    Number,
}

/// A single flag declaration in a command's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    /// Flag name without the leading `--`.
    pub name: String,
    /// The value type the flag accepts.
    pub ty: ArgType,
}

impl ArgSpec {
    /// Declares a flag with the given name and type.
    pub fn new(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Shorthand for a string-valued flag.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::String)
    }

    /// Shorthand for a presence flag.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::Boolean)
    }

    /// Shorthand for a number-valued flag.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::Number)
    }
}

/// A typed value parsed from a flag token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Value of a [`ArgType::String`] flag.
    String(String),
    /// Value of a [`ArgType::Boolean`] flag (always `true`; absent flags
    /// simply have no entry).
    Boolean(bool),
    /// Value of a [`ArgType::Number`] flag.
    Number(i64),
}

impl ArgValue {
    /// Returns the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the numeric payload, if this is a number value.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// The output of a successful [`parse_arguments`] call.
///
/// Every token consumed into `values` has been removed from `input`; the
/// relative order of the remaining positional tokens is untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArguments {
    /// Leftover positional tokens, in their original order.
    pub input: Vec<String>,
    /// One entry per flag matched in the token stream.
    pub values: HashMap<String, ArgValue>,
}

/// Splits a token stream into positional arguments and typed flag values.
///
/// Fails atomically: any flag token whose name is not declared in `schema`,
/// or whose value does not fit the declared type, aborts the whole call with
/// a [`ParseArgumentsError`] naming the offending flag. No partial result is
/// ever returned.
///
/// If the same flag appears more than once, the last occurrence wins.
///
/// Flags declared in `schema` but absent from `tokens` get no entry in
/// `values`; defaulting is the handler's concern, not the parser's.
pub fn parse_arguments(tokens: &[String], schema: &[ArgSpec]) -> ParseResult<ParsedArguments> {
    let mut input = Vec::with_capacity(tokens.len());
    let mut values = HashMap::new();

    for token in tokens {
        let Some(body) = token.strip_prefix("--") else {
            input.push(token.clone());
            continue;
        };

        // Split on the first '=' only; embedded '=' stays in the value.
        let (name, raw_value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let spec = schema
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| ParseArgumentsError::UnknownFlag(name.to_string()))?;

        let value = match (spec.ty, raw_value) {
            (ArgType::Boolean, None) => ArgValue::Boolean(true),
            (ArgType::Boolean, Some(_)) => {
                return Err(ParseArgumentsError::InvalidValue {
                    flag: name.to_string(),
                    expected: "presence form (--name)",
                });
            }
            (ArgType::String, Some(value)) => ArgValue::String(value.to_string()),
            (ArgType::String, None) => {
                return Err(ParseArgumentsError::InvalidValue {
                    flag: name.to_string(),
                    expected: "--name=value",
                });
            }
            (ArgType::Number, Some(value)) => match value.parse::<i64>() {
                Ok(number) => ArgValue::Number(number),
                Err(_) => {
                    return Err(ParseArgumentsError::InvalidValue {
                        flag: name.to_string(),
                        expected: "an integer",
                    });
                }
            },
            (ArgType::Number, None) => {
                return Err(ParseArgumentsError::InvalidValue {
                    flag: name.to_string(),
                    expected: "--name=value",
                });
            }
        };

        values.insert(name.to_string(), value);
    }

    Ok(ParsedArguments { input, values })
}
