pub mod regex;

use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn get_chatrelay_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("CHATRELAY_HOME") {
        return Ok(PathBuf::from(home));
    }
    Ok(dirs::home_dir()
        .context("Could not determine home directory")?
        .join(".chatrelay"))
}

/// Shorten `text` to at most `max_chars` characters for log output.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
