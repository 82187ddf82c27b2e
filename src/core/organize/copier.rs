//! Copying without ever replacing an existing file.

use crate::error::OrganizeError;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// Copy `source` to `destination`, failing if `destination` exists
///
/// Returns the number of bytes copied. A partially written destination is
/// removed on failure.
pub fn copy_new(source: &Path, destination: &Path) -> Result<u64, OrganizeError> {
    let copy_error = |source_err: io::Error| OrganizeError::Copy {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source: source_err,
    };

    let mut input = File::open(source).map_err(copy_error)?;
    let mut output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(copy_error)?;

    let copied = io::copy(&mut input, &mut output).and_then(|n| output.sync_all().map(|_| n));

    match copied {
        Ok(bytes) => {
            if let Ok(metadata) = input.metadata() {
                if let Ok(modified) = metadata.modified() {
                    let _ = output.set_modified(modified);
                }
            }
            Ok(bytes)
        }
        Err(e) => {
            drop(output);
            let _ = fs::remove_file(destination);
            Err(copy_error(e))
        }
    }
}
