//! Temporary files for configuration loading tests.

use std::io::Write;

use tempfile::NamedTempFile;

/// Write `contents` to a temporary file ending in `suffix`.
///
/// The file is removed when the returned handle is dropped.
pub fn write_temp_file(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap_or_else(|e| panic!("failed to create temp file: {}", e));
    file.write_all(contents.as_bytes())
        .unwrap_or_else(|e| panic!("failed to write temp file: {}", e));
    file
}
