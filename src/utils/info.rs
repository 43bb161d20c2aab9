//! Parser for the line-oriented `INFO` reply.

use std::collections::HashMap;

/// Flat `field -> value` view of an `INFO` reply.
pub type ServerInfo = HashMap<String, String>;

/// Parse an `INFO` reply into a flat mapping.
///
/// Blank lines and `# Section` headers are skipped. A line without a colon
/// is kept with an empty value. Only the first colon separates field from
/// value.
pub fn parse_info(raw: &str) -> ServerInfo {
    raw.lines()
        .filter(|line| !line.is_empty() && !line.starts_with("# "))
        .map(|line| match line.split_once(':') {
            Some((field, value)) => (field.to_string(), value.to_string()),
            None => (line.to_string(), String::new()),
        })
        .collect()
}
