//! Loading statement lists from SQL files.

use anyhow::Context;
use std::path::Path;

/// Read `path` and split it into statements on `;`.
///
/// Statements are trimmed and empty ones are dropped. Semicolons inside
/// string literals are not special-cased.
pub fn load_queries_from_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read query file: {}", path.display()))?;
    Ok(split_statements(&content))
}

pub fn split_statements(content: &str) -> Vec<String> {
    content
        .split(';')
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .map(str::to_string)
        .collect()
}
