//! Line-oriented `key=value` codec
//!
//! Reading:
//! - blank lines and lines starting with `#` or `!` are skipped
//! - the key ends at the first `=` or `:`; key and value are trimmed
//! - a line ending in an unescaped `\` continues on the next line
//! - a value ending in `\\` ends in a single literal `\`
//! - a repeated key keeps its last value
//!
//! Writing emits one `key=value` line per entry, sorted by key, so the same
//! content always serializes to the same bytes. Trailing backslashes of a
//! value are doubled so they never read back as a continuation.

use std::collections::BTreeMap;

use tracing::warn;

use crate::model::error::ModelError;

/// Parse properties text into a sorted map
pub fn parse_properties(content: &str) -> Result<BTreeMap<String, String>, ModelError> {
    let mut entries = BTreeMap::new();
    let mut lines = content.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let Some(separator) = logical.find(['=', ':']) else {
            warn!("Rejecting properties line {} without separator", index + 1);
            return Err(ModelError::InvalidLine {
                line_number: index + 1,
                line: line.to_string(),
            });
        };

        let key = logical[..separator].trim();
        if key.is_empty() {
            return Err(ModelError::InvalidLine {
                line_number: index + 1,
                line: line.to_string(),
            });
        }
        let value = unescape_trailing_backslashes(logical[separator + 1..].trim());
        entries.insert(key.to_string(), value);
    }

    Ok(entries)
}

/// Serialize entries as `key=value` lines in key order
pub fn write_properties<'a>(entries: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    let mut sorted: Vec<(&String, &String)> = entries.into_iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

    sorted
        .into_iter()
        .map(|(key, value)| format!("{key}={}\n", escape_trailing_backslashes(value)))
        .collect()
}

fn trailing_backslashes(value: &str) -> usize {
    value.bytes().rev().take_while(|b| *b == b'\\').count()
}

fn escape_trailing_backslashes(value: &str) -> String {
    let count = trailing_backslashes(value);
    format!("{value}{}", "\\".repeat(count))
}

fn unescape_trailing_backslashes(value: &str) -> String {
    let count = trailing_backslashes(value);
    let kept = &value[..value.len() - count];
    format!("{kept}{}", "\\".repeat(count.div_ceil(2)))
}

/// An odd number of trailing backslashes means the last one escapes the newline
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}
