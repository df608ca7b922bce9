//! Line protocol read from stdin: one JSON intent or provider event per line.
//!
//! ```text
//! {"intent":"connect"}
//! {"intent":"set_filter","patch":{"sort_key":"price-low"}}
//! {"event":"accounts_changed","accounts":["0xb0b"]}
//! ```

use anyhow::{Context, Result};
use nm_api_types::{Intent, ProviderEvent};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptLine {
    Intent(Intent),
    Event(ProviderEvent),
}

/// `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<ScriptLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let parsed = serde_json::from_str(line)
        .with_context(|| format!("not an intent or provider event: {line}"))?;
    Ok(Some(parsed))
}
