//! Pure value transforms available inside templates
//!
//! Each transform is registered both as a function (`{{ indent(2, v) }}`)
//! and as a filter (`{{ v | indent(2) }}`), so documents can use whichever
//! form reads better in place.

use base64::Engine as _;
use minijinja::{Environment, Error, ErrorKind};

use crate::error::DecodeError;

/// Register the transforms on an environment
pub(crate) fn register(env: &mut Environment<'static>) {
    env.add_function("base64enc", base64enc);
    env.add_function("base64dec", base64dec);
    env.add_function("indent", indent);

    env.add_filter("base64enc", base64enc);
    env.add_filter("base64dec", base64dec);
    env.add_filter("indent", indent_filter);
}

/// Base64 encode a string
///
/// Usage: {{ base64enc("secret") }}
#[must_use]
pub fn base64enc(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
}

/// Base64 decode a string back to plain text
///
/// Usage: {{ base64dec(encoded) }}
pub fn base64dec(value: String) -> Result<String, Error> {
    decode(&value).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, format!("base64dec: {}", e)).with_source(e)
    })
}

fn decode(value: &str) -> Result<String, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(value.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}

/// Re-indent every line of a string by the given number of spaces,
/// trimming surrounding whitespace of the whole result
///
/// Usage: {{ indent(4, content) }}
#[must_use]
pub fn indent(spaces: usize, value: String) -> String {
    let pad = " ".repeat(spaces);
    let line_count = value.lines().count();
    let mut padded = String::with_capacity(value.len() + (spaces + 1) * (line_count + 1));

    padded.push('\n');
    padded.push_str(&pad);
    for ch in value.chars() {
        padded.push(ch);
        if ch == '\n' {
            padded.push_str(&pad);
        }
    }

    padded.trim().to_string()
}

/// Filter form of [`indent`], taking the value from the pipeline
///
/// Usage: {{ content | indent(4) }}
#[must_use]
pub fn indent_filter(value: String, spaces: usize) -> String {
    indent(spaces, value)
}
