use std::path::Path;

use crate::TransferError;

/// Checks that `path` is a readable regular file and returns its size.
pub fn validate_source_file(path: &Path) -> Result<u64, TransferError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        TransferError::InvalidSource(format!("{}: {e}", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(TransferError::InvalidSource(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    // Opening surfaces permission problems before any network call.
    std::fs::File::open(path)?;
    Ok(metadata.len())
}

/// Returns the lowercased extension of `path` with a leading dot.
///
/// Everything after the last `.` of the file name counts, so `.mkv` for
/// `Movie.Part1.MKV`; a name without a dot yields an empty string.
pub fn file_extension(path: &Path) -> String {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return String::new();
    };
    match name.rsplit_once('.') {
        Some((_, ext)) => format!(".{}", ext.to_lowercase()),
        None => String::new(),
    }
}
