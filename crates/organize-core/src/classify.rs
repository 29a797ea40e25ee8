use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::date::{self, DateSource, Dated, Timestamp};
use crate::error::Result;
use crate::metadata::MetadataReader;
use crate::plan::{self, PlanEntry};
use crate::report::Disposition;
use crate::walk::InputFile;

pub const DEFAULT_CUTOFF_YEAR: i32 = 2016;

/// Earliest capture year eligible for copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cutoff {
    pub year: i32,
    /// `true` keeps files from `year` itself.
    pub inclusive: bool,
}

impl Default for Cutoff {
    fn default() -> Self {
        Self {
            year: DEFAULT_CUTOFF_YEAR,
            inclusive: true,
        }
    }
}

impl Cutoff {
    pub fn min_year(&self) -> i32 {
        if self.inclusive {
            self.year
        } else {
            self.year + 1
        }
    }

    pub fn admits(&self, timestamp: &Timestamp) -> bool {
        timestamp.year() >= self.min_year()
    }
}

/// Result of the read-only steps: containment, metadata, date, cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    InDestination,
    Unreadable,
    NoTimestamp,
    OutOfRange(Dated),
    Eligible(Dated),
}

/// Why a file was not copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InDestination,
    NullMetadata,
    NoDate,
    PriorTo(i32),
    DestinationExists(PathBuf),
}

impl SkipReason {
    pub fn disposition(&self) -> Disposition {
        match self {
            SkipReason::InDestination => Disposition::SkippedInDestination,
            SkipReason::NullMetadata => Disposition::SkippedUnreadable,
            SkipReason::NoDate => Disposition::SkippedNoTimestamp,
            SkipReason::PriorTo(_) => Disposition::SkippedOutOfRange,
            SkipReason::DestinationExists(_) => Disposition::SkippedAlreadyPresent,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InDestination => f.write_str("file is already in destination"),
            SkipReason::NullMetadata => f.write_str("null metadata"),
            SkipReason::NoDate => f.write_str("unable to extract date"),
            SkipReason::PriorTo(year) => write!(f, "Prior to {}", year),
            SkipReason::DestinationExists(_) => f.write_str("Destination file already exists"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Copy(PlanEntry),
}

/// Decides the disposition of each file against one destination root.
pub struct Classifier<'a> {
    dest_root: &'a Path,
    cutoff: Cutoff,
    sources: &'a [DateSource],
    reader: &'a dyn MetadataReader,
}

impl<'a> Classifier<'a> {
    pub fn new(
        dest_root: &'a Path,
        cutoff: Cutoff,
        sources: &'a [DateSource],
        reader: &'a dyn MetadataReader,
    ) -> Self {
        Self {
            dest_root,
            cutoff,
            sources,
            reader,
        }
    }

    /// Lexical containment; nothing is resolved on disk.
    pub fn in_destination(&self, path: &Path) -> bool {
        path.starts_with(self.dest_root)
    }

    /// Steps that only read: safe to run for many files at once.
    pub fn analyze(&self, file: &InputFile) -> Result<Analysis> {
        if self.in_destination(&file.path) {
            return Ok(Analysis::InDestination);
        }

        let bundle = match self.reader.read(&file.path) {
            Ok(bundle) => bundle,
            Err(e) => {
                debug!("{}", e);
                return Ok(Analysis::Unreadable);
            }
        };

        let Some(dated) = date::extract_timestamp(&file.path, &bundle, self.sources)? else {
            return Ok(Analysis::NoTimestamp);
        };

        if self.cutoff.admits(&dated.timestamp) {
            Ok(Analysis::Eligible(dated))
        } else {
            Ok(Analysis::OutOfRange(dated))
        }
    }

    /// Final step: plan the destination and check it is free.
    ///
    /// Must run immediately before the copy for the same file.
    pub fn decide(&self, file: &InputFile, analysis: &Analysis) -> Decision {
        match analysis {
            Analysis::InDestination => Decision::Skip(SkipReason::InDestination),
            Analysis::Unreadable => Decision::Skip(SkipReason::NullMetadata),
            Analysis::NoTimestamp => Decision::Skip(SkipReason::NoDate),
            Analysis::OutOfRange(_) => Decision::Skip(SkipReason::PriorTo(self.cutoff.min_year())),
            Analysis::Eligible(dated) => {
                let entry = plan::plan(&file.path, &file.filename, dated.timestamp, self.dest_root);
                if entry.dest_path.exists() {
                    Decision::Skip(SkipReason::DestinationExists(entry.dest_path))
                } else {
                    Decision::Copy(entry)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Directory, DirectoryKind, MetadataBundle, Unreadable};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Serves one fixed outcome for every path and counts calls.
    struct FixedReader {
        date: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedReader {
        fn dated(date: &'static str) -> Self {
            Self { date: Some(date), calls: AtomicUsize::new(0) }
        }

        fn broken() -> Self {
            Self { date: None, calls: AtomicUsize::new(0) }
        }
    }

    impl MetadataReader for FixedReader {
        fn read(&self, path: &Path) -> std::result::Result<MetadataBundle, Unreadable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.date {
                Some(d) => Ok(MetadataBundle::new(vec![
                    Directory::new(DirectoryKind::Ifd0).with_tag(0x0132, "DateTime", d),
                ])),
                None => Err(Unreadable { path: path.to_path_buf(), reason: "broken".into() }),
            }
        }
    }

    fn input(path: &Path) -> InputFile {
        InputFile::new(path.to_path_buf())
    }

    const SOURCES: &[DateSource] = &[DateSource::Ifd0DateTime];

    fn classify(classifier: &Classifier<'_>, file: &InputFile) -> Decision {
        let analysis = classifier.analyze(file).unwrap();
        classifier.decide(file, &analysis)
    }

    #[test]
    fn test_cutoff_boundary() {
        let cutoff = Cutoff::default();
        assert!(cutoff.admits(&Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()));
        assert!(!cutoff.admits(&Utc.with_ymd_and_hms(2015, 12, 31, 23, 59, 59).unwrap()));

        let exclusive = Cutoff { year: 2016, inclusive: false };
        assert_eq!(exclusive.min_year(), 2017);
        assert!(!exclusive.admits(&Utc.with_ymd_and_hms(2016, 6, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_destination_short_circuits_reader() {
        let reader = FixedReader::dated("2020:06:15 10:30:00");
        let classifier = Classifier::new(Path::new("/out"), Cutoff::default(), SOURCES, &reader);

        let decision = classify(&classifier, &input(Path::new("/out/stray.jpg")));
        assert_eq!(decision, Decision::Skip(SkipReason::InDestination));
        assert_eq!(reader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_containment_is_by_component() {
        let reader = FixedReader::dated("2020:06:15 10:30:00");
        let classifier = Classifier::new(Path::new("/out"), Cutoff::default(), SOURCES, &reader);
        assert!(!classifier.in_destination(Path::new("/outside/a.jpg")));
        assert!(classifier.in_destination(Path::new("/out/2020/06/a.jpg")));
    }

    #[test]
    fn test_unreadable() {
        let reader = FixedReader::broken();
        let classifier = Classifier::new(Path::new("/out"), Cutoff::default(), SOURCES, &reader);
        let decision = classify(&classifier, &input(Path::new("/in/plain.txt")));
        assert_eq!(decision, Decision::Skip(SkipReason::NullMetadata));
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_out_of_range_reason_names_min_year() {
        let reader = FixedReader::dated("2015:12:31 23:59:59");
        let classifier = Classifier::new(Path::new("/out"), Cutoff::default(), SOURCES, &reader);
        let decision = classify(&classifier, &input(Path::new("/in/old.jpg")));
        assert_eq!(decision, Decision::Skip(SkipReason::PriorTo(2016)));
        if let Decision::Skip(reason) = decision {
            assert_eq!(reason.to_string(), "Prior to 2016");
            assert_eq!(reason.disposition(), Disposition::SkippedOutOfRange);
        }
    }

    #[test]
    fn test_eligible_then_already_present() {
        let dst = tempdir().unwrap();
        let reader = FixedReader::dated("2020:06:15 10:30:00");
        let classifier = Classifier::new(dst.path(), Cutoff::default(), SOURCES, &reader);
        let file = input(Path::new("/in/a.jpg"));

        let Decision::Copy(entry) = classify(&classifier, &file) else {
            panic!("expected a copy decision");
        };
        assert_eq!(entry.dest_path, dst.path().join("2020/06/a.jpg"));

        std::fs::create_dir_all(&entry.dest_dir).unwrap();
        std::fs::write(&entry.dest_path, b"x").unwrap();
        assert_eq!(
            classify(&classifier, &file),
            Decision::Skip(SkipReason::DestinationExists(entry.dest_path.clone()))
        );
    }
}
