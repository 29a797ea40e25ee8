use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;
use thiserror::Error;

use crate::date::Timestamp;
use crate::plan::PlanEntry;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("unable to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("destination {0} appeared before the copy started")]
    AlreadyExists(PathBuf),
    #[error("unable to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to copy {from} to {to}")]
    Write {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Copy `entry.source` to `entry.dest_path`, never replacing an existing file.
///
/// A partially written destination is removed on failure.
pub fn copy_file(entry: &PlanEntry) -> Result<u64, CopyError> {
    fs::create_dir_all(&entry.dest_dir).map_err(|source| CopyError::CreateDir {
        path: entry.dest_dir.clone(),
        source,
    })?;

    let input = File::open(&entry.source).map_err(|source| CopyError::Open {
        path: entry.source.clone(),
        source,
    })?;

    let output = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&entry.dest_path)
    {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(CopyError::AlreadyExists(entry.dest_path.clone()));
        }
        Err(source) => {
            return Err(CopyError::Open {
                path: entry.dest_path.clone(),
                source,
            })
        }
    };

    let written = match write_all(input, output) {
        Ok(n) => n,
        Err(source) => {
            if let Err(e) = fs::remove_file(&entry.dest_path) {
                warn!(
                    "unable to remove partial copy {}: {}",
                    entry.dest_path.display(),
                    e
                );
            }
            return Err(CopyError::Write {
                from: entry.source.clone(),
                to: entry.dest_path.clone(),
                source,
            });
        }
    };

    stamp_mtime(&entry.dest_path, &entry.timestamp);

    Ok(written)
}

/// Best effort: the copy itself already succeeded.
fn stamp_mtime(path: &Path, timestamp: &Timestamp) {
    let ft = filetime::FileTime::from_unix_time(timestamp.timestamp(), timestamp.timestamp_subsec_nanos());
    if let Err(e) = filetime::set_file_mtime(path, ft) {
        warn!("unable to set modification time on {}: {}", path.display(), e);
    }
}

fn write_all(input: File, output: File) -> io::Result<u64> {
    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    let n = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(n)
}
