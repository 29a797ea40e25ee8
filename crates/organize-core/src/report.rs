use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrganizeError, Result};

/// The single outcome assigned to each input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    SkippedInDestination,
    SkippedUnreadable,
    SkippedNoTimestamp,
    SkippedOutOfRange,
    SkippedAlreadyPresent,
    Copied,
    FailedCopy,
}

impl Disposition {
    pub const ALL: [Disposition; 7] = [
        Disposition::SkippedInDestination,
        Disposition::SkippedUnreadable,
        Disposition::SkippedNoTimestamp,
        Disposition::SkippedOutOfRange,
        Disposition::SkippedAlreadyPresent,
        Disposition::Copied,
        Disposition::FailedCopy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::SkippedInDestination => "SKIPPED_IN_DESTINATION",
            Disposition::SkippedUnreadable => "SKIPPED_UNREADABLE",
            Disposition::SkippedNoTimestamp => "SKIPPED_NO_TIMESTAMP",
            Disposition::SkippedOutOfRange => "SKIPPED_OUT_OF_RANGE",
            Disposition::SkippedAlreadyPresent => "SKIPPED_ALREADY_PRESENT",
            Disposition::Copied => "COPIED",
            Disposition::FailedCopy => "FAILED_COPY",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-disposition lists of source paths, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub buckets: BTreeMap<Disposition, Vec<PathBuf>>,
    pub total: u64,
    /// Set when the run stopped early on an interrupt.
    #[serde(default)]
    pub interrupted: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: PathBuf, disposition: Disposition) {
        self.buckets.entry(disposition).or_default().push(path);
        self.total += 1;
    }

    pub fn paths(&self, disposition: Disposition) -> &[PathBuf] {
        self.buckets
            .get(&disposition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn count(&self, disposition: Disposition) -> usize {
        self.paths(disposition).len()
    }

    /// Which bucket `path` landed in, if it was processed.
    #[cfg(test)]
    pub(crate) fn disposition_of(&self, path: &Path) -> Option<Disposition> {
        self.buckets
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(d, _)| *d)
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Summary:")?;
        for d in Disposition::ALL {
            let n = self.count(d);
            if n > 0 {
                writeln!(out, "  {}: {}", d, n)?;
            }
        }
        writeln!(out, "  TOTAL: {}", self.total)?;
        if self.interrupted {
            writeln!(out, "  (interrupted)")?;
        }
        Ok(())
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let to_err = |source: io::Error| OrganizeError::Report {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(to_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| to_err(e.into()))?;
        writer.flush().map_err(to_err)
    }
}
