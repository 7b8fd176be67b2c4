//! Ignore-list maintenance

use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Comment written above patterns added by extship
pub const IGNORE_HEADER: &str = "# extship release archives";

/// Make sure `pattern` is listed in the ignore file
///
/// Appends a commented block when the pattern is missing and creates the
/// file if needed. Returns whether the file changed.
pub fn ensure_ignored(ignore_file: &Path, pattern: &str) -> Result<bool> {
    let existing = if ignore_file.exists() {
        std::fs::read_to_string(ignore_file)?
    } else {
        String::new()
    };

    if existing.lines().any(|line| line.trim() == pattern) {
        return Ok(false);
    }

    let mut block = String::new();
    if !existing.is_empty() {
        if !existing.ends_with('\n') {
            block.push('\n');
        }
        block.push('\n');
    }
    block.push_str(IGNORE_HEADER);
    block.push('\n');
    block.push_str(pattern);
    block.push('\n');

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(ignore_file)?;
    file.write_all(block.as_bytes())?;

    Ok(true)
}
