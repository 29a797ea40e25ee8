use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::date::Timestamp;

/// Where an eligible file goes: `<dest_root>/YYYY/MM/<filename>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub timestamp: Timestamp,
    pub dest_dir: PathBuf,
    pub dest_path: PathBuf,
}

/// Date bucket directory for `timestamp`, e.g. `2020/06`.
pub fn date_bucket(dest_root: &Path, timestamp: &Timestamp) -> PathBuf {
    dest_root
        .join(format!("{:04}", timestamp.year()))
        .join(format!("{:02}", timestamp.month()))
}

/// The file name is kept verbatim; collisions are left to the classifier.
pub fn plan(source: &Path, filename: &OsStr, timestamp: Timestamp, dest_root: &Path) -> PlanEntry {
    let dest_dir = date_bucket(dest_root, &timestamp);
    let dest_path = dest_dir.join(filename);
    PlanEntry {
        source: source.to_path_buf(),
        timestamp,
        dest_dir,
        dest_path,
    }
}
