//! Output folder preparation.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{OutputError, Result};

/// Creates `folder` if missing and, when `clear` is set, removes everything in it.
///
/// Returns the number of entries removed.
pub fn prepare_output_dir(folder: &Path, clear: bool) -> Result<usize> {
    let dir_error = |source: std::io::Error| OutputError::OutputDir {
        path: folder.to_path_buf(),
        source,
    };
    fs::create_dir_all(folder).map_err(dir_error)?;
    if !clear {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(folder).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(dir_error)?;
        } else {
            fs::remove_file(&path).map_err(dir_error)?;
        }
        removed += 1;
    }
    debug!(folder = %folder.display(), removed, "cleared output folder");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_folder() {
        let dir = tempfile::tempdir().expect("temp dir");
        let folder = dir.path().join("data/output");
        assert_eq!(prepare_output_dir(&folder, true).expect("prepare"), 0);
        assert!(folder.is_dir());
    }

    #[test]
    fn clears_only_when_asked() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("old.csv"), "key\n").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");

        assert_eq!(prepare_output_dir(dir.path(), false).expect("keep"), 0);
        assert!(dir.path().join("old.csv").exists());

        assert_eq!(prepare_output_dir(dir.path(), true).expect("clear"), 2);
        assert_eq!(fs::read_dir(dir.path()).expect("read").count(), 0);
    }
}
