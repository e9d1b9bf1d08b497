pub mod compile;
pub mod completions;
pub mod man_pages;
pub mod options;
pub mod parse;
pub mod presets;
pub mod session;
pub mod wizard;

use devstaller_schema::{OptionId, PresetLabel};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INPUT_ERROR: u8 = 2;
pub const EXIT_CONFLICT: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_preset(label: PresetLabel) -> String {
    use console::Style;
    match label {
        PresetLabel::Named(name) => Style::new().green().bold().apply_to(name).to_string(),
        PresetLabel::Custom => Style::new()
            .yellow()
            .apply_to(PresetLabel::CUSTOM)
            .to_string(),
    }
}

pub fn join_ids(ids: &[&OptionId]) -> String {
    if ids.is_empty() {
        return "-".to_owned();
    }
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace `dest` with `content` without ever leaving a half-written file.
pub fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    use std::io::Write;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist {}: {}", dest.display(), e.error))?;
    Ok(())
}
