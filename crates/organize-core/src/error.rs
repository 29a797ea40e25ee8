use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::date::Timestamp;

/// Errors that abort a whole run.
///
/// Per-file problems never surface here: they end up as a
/// [`Disposition`](crate::report::Disposition) in the report instead.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("source root {path} is not a readable directory")]
    SourceRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination root {0} exists but is not a directory")]
    DestinationNotDirectory(PathBuf),

    #[error("unable to resolve {path}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Two or more distinct capture dates were found for one file.
    #[error("found multiple dates for {path}: {values:?}")]
    InconsistentTimestamps {
        path: PathBuf,
        values: Vec<Timestamp>,
    },

    #[error("unable to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("unable to write report to {path}")]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = OrganizeError> = std::result::Result<T, E>;
