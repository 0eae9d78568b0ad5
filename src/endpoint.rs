//! Destination URL templating
//!
//! A template is a URL containing `{{key}}` tokens, where `key` names a field
//! of the [`LegacyPayload`]. Resolution splits the template into literal and
//! placeholder segments, then joins them back with every substituted value
//! percent-encoded for a URL path segment.
//!
//! A token naming an unknown key stays in the URL as written. A known key
//! without a value resolves to the empty string, so tokens are only allowed
//! in the path, query and fragment: the scheme, host and port are fixed.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::warn;

use crate::error::{RelayError, Result};
use crate::payload::LegacyPayload;

/// Everything outside the RFC 3986 `pchar` set plus `/`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@')
    .remove(b'/');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Split a template into literal text and `{{identifier}}` tokens.
///
/// Braces that do not enclose an identifier are literal text.
pub fn tokenize(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find("{{") {
        let open = cursor + offset;
        let name_start = open + 2;
        match template[name_start..].find("}}") {
            Some(len) if is_identifier(&template[name_start..name_start + len]) => {
                if literal_start < open {
                    segments.push(Segment::Literal(&template[literal_start..open]));
                }
                segments.push(Segment::Placeholder(
                    &template[name_start..name_start + len],
                ));
                cursor = name_start + len + 2;
                literal_start = cursor;
            }
            Some(_) => cursor = open + 1,
            None => break,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}

/// Build the destination URL for one payload.
pub fn resolve(template: &str, payload: &LegacyPayload) -> String {
    let mut url = String::with_capacity(template.len());
    for segment in tokenize(template) {
        match segment {
            Segment::Literal(text) => url.push_str(text),
            Segment::Placeholder(name) => match payload.field(name) {
                Some(value) => {
                    let value = value.unwrap_or_default();
                    url.extend(utf8_percent_encode(&value, PATH_SEGMENT));
                }
                None => {
                    warn!(placeholder = %name, "Unknown placeholder left in endpoint URL");
                    url.push_str("{{");
                    url.push_str(name);
                    url.push_str("}}");
                }
            },
        }
    }
    url
}

fn fill_placeholders(template: &str, filler: &str) -> Result<url::Url> {
    let filled: String = tokenize(template)
        .into_iter()
        .map(|segment| match segment {
            Segment::Literal(text) => text,
            Segment::Placeholder(_) => filler,
        })
        .collect();

    url::Url::parse(&filled).map_err(|e| {
        RelayError::ConfigError(format!("HTTP_ENDPOINT is not a valid URL: {}", e))
    })
}

/// Check at startup that a template yields an absolute http(s) URL whose
/// origin does not depend on payload values.
pub fn validate_template(template: &str) -> Result<()> {
    let url = fill_placeholders(template, "x")?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(RelayError::ConfigError(format!(
                "HTTP_ENDPOINT must use http or https, got '{}'",
                scheme
            )));
        }
    }

    // An empty value must leave the origin untouched
    let emptied = fill_placeholders(template, "")?;
    if url.origin() != emptied.origin()
        || url.username() != emptied.username()
        || url.password() != emptied.password()
    {
        return Err(RelayError::ConfigError(
            "HTTP_ENDPOINT placeholders are only allowed in the path, query or fragment"
                .to_string(),
        ));
    }
    Ok(())
}
