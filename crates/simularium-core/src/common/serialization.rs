use crate::domain::{ConversionError, ConversionResult};
use std::fs;
use std::path::Path;

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str, overwrite: bool) -> ConversionResult<()> {
    write_binary_artifact(path, normalize_text_artifact(content).as_bytes(), overwrite)
}

/// Writes one artifact, creating parent directories. Refuses to replace an existing file
/// unless `overwrite` is set.
pub fn write_binary_artifact(path: &Path, bytes: &[u8], overwrite: bool) -> ConversionResult<()> {
    if !overwrite && path.exists() {
        return Err(ConversionError::serialization(
            "SERIALIZE.EXISTS",
            "output file already exists and overwrite is disabled",
        )
        .with_path(path));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| {
            ConversionError::serialization(
                "SERIALIZE.CREATE_DIR",
                format!("failed to create output directory: {}", source),
            )
            .with_path(parent)
        })?;
    }
    fs::write(path, bytes).map_err(|source| {
        ConversionError::serialization(
            "SERIALIZE.WRITE",
            format!("failed to write output: {}", source),
        )
        .with_path(path)
    })
}
