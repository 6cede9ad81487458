use blockforge::core::models::attributes::AttrValue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format '{0}'. Expected KEY=VALUE.")]
    MissingSeparator(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),
}

/// Splits `KEY=VALUE` at the first `=`, trimming whitespace around the key.
pub fn parse_key_value(input: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(input.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(input.to_string()));
    }
    Ok((key, value))
}

/// Parses `KEY=VALUE` into an attribute, inferring the value type from its literal.
pub fn parse_attribute(input: &str) -> Result<(String, AttrValue), ParseError> {
    let (key, value) = parse_key_value(input)?;
    Ok((key.to_string(), AttrValue::infer(value.trim())))
}
