use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::error::{OrganizeError, Result};

/// A regular file found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub filename: OsString,
}

impl InputFile {
    pub fn new(path: PathBuf) -> Self {
        let filename = path.file_name().map(OsString::from).unwrap_or_default();
        Self { path, filename }
    }
}

/// Make `path` absolute without touching symlinks.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| OrganizeError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

/// Every regular file under `root`, at most `max_depth` levels down,
/// in file-name order. Symlinks are not followed.
pub fn discover(root: &Path, max_depth: usize) -> Result<Vec<InputFile>> {
    fs::read_dir(root).map_err(|source| OrganizeError::SourceRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(InputFile::new(entry.into_path()));
        }
    }
    Ok(files)
}
