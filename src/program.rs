use std::fs;
use std::path::Path;

use crate::error::ParseError;

/// Parse the comma-separated program encoding. Element `i` becomes the
/// initial value of address `i`. Whitespace around elements is ignored, as is
/// a single trailing comma.
pub fn parse_program(text: &str) -> Result<Vec<i64>, ParseError> {
    let text = text.trim();
    let text = text.strip_suffix(',').unwrap_or(text);
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    text.split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token.parse::<i64>().map_err(|_| ParseError::InvalidInteger {
                index,
                token: token.to_string(),
            })
        })
        .collect()
}

/// Read and parse a program file.
pub fn load_program(path: impl AsRef<Path>) -> Result<Vec<i64>, ParseError> {
    let text = fs::read_to_string(path)?;
    parse_program(&text)
}
