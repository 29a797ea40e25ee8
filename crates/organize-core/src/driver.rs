use std::fmt;
use std::path::Path;

use log::warn;
use rayon::prelude::*;

use crate::classify::{Analysis, Classifier, Decision, SkipReason};
use crate::copier::{self, CopyError};
use crate::date::{DateSource, Timestamp};
use crate::error::{OrganizeError, Result};
use crate::metadata::{MetadataBundle, MetadataReader, Unreadable};
use crate::report::{Disposition, Report};
use crate::walk::{self, InputFile};
use crate::{OrganizeOptions, ProcessControl};

/// Progress notifications, one per printed line.
#[derive(Debug)]
pub enum Event<'a> {
    Found {
        count: usize,
    },
    Processing {
        path: &'a Path,
        /// 1-based.
        index: usize,
        total: usize,
    },
    Dated {
        path: &'a Path,
        timestamp: Timestamp,
        source: DateSource,
    },
    Copying {
        dest: &'a Path,
    },
    Skipping {
        reason: &'a SkipReason,
    },
    CopyFailed {
        path: &'a Path,
        error: &'a CopyError,
    },
    /// Dump mode: everything read from one file.
    Metadata {
        path: &'a Path,
        bundle: &'a MetadataBundle,
    },
    /// Dump mode: the file could not be read.
    MetadataError {
        path: &'a Path,
        error: &'a Unreadable,
    },
}

impl Event<'_> {
    /// Whether the line belongs on stderr rather than stdout.
    pub fn is_error(&self) -> bool {
        matches!(self, Event::CopyFailed { .. } | Event::MetadataError { .. })
    }
}

fn source_label(source: DateSource) -> &'static str {
    match source {
        DateSource::Ifd0DateTime => "ExifIFD0 Date/Time",
        DateSource::ExifDateTimeOriginal => "ExifSubIFD Date/Time Original",
        DateSource::Filename => "Filename Date/Time",
        DateSource::FileModified => "File Modified Date/Time",
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Found { count } => write!(f, "Found {} files", count),
            Event::Processing { path, index, total } => {
                write!(f, "Processing '{}': ({}/{})", path.display(), index, total)
            }
            Event::Dated {
                path,
                timestamp,
                source,
            } => write!(
                f,
                "{}: {}: {}",
                path.display(),
                source_label(*source),
                timestamp.format("%Y-%m-%dT%H:%M:%S UTC")
            ),
            Event::Copying { dest } => write!(f, "Copying to: {}", dest.display()),
            Event::Skipping { reason } => write!(f, "Skipping: {}", reason),
            Event::CopyFailed { .. } => f.write_str("Error copying file!"),
            Event::Metadata { path, bundle } => {
                write!(f, "{}", path.display())?;
                if !bundle.is_empty() {
                    write!(f, "\n{}", bundle)?;
                }
                Ok(())
            }
            Event::MetadataError { path, error } => {
                write!(f, "{}\nERROR: {}", path.display(), error.reason)
            }
        }
    }
}

pub type EventCallback<'a> = dyn Fn(&Event<'_>) + 'a;

/// Walk the source root and run every file through the pipeline.
///
/// Per-file failures are recorded in the report; only configuration
/// problems and inconsistent timestamps end the run with an error.
pub fn run(
    options: &OrganizeOptions,
    control: &ProcessControl,
    reader: &dyn MetadataReader,
    on_event: &EventCallback<'_>,
) -> Result<Report> {
    options.validate()?;
    let source_root = walk::absolute(&options.source)?;
    let dest_root = walk::absolute(&options.destination)?;
    if dest_root.exists() && !dest_root.is_dir() {
        return Err(OrganizeError::DestinationNotDirectory(dest_root));
    }

    let files = walk::discover(&source_root, options.max_depth)?;
    let total = files.len();
    on_event(&Event::Found { count: total });

    let classifier = Classifier::new(&dest_root, options.cutoff(), &options.date_sources, reader);

    let mut prepared = if options.jobs > 1 {
        analyze_parallel(&classifier, &files, options.jobs, control)?
    } else {
        Vec::new()
    };

    let mut report = Report::new();
    for (i, file) in files.iter().enumerate() {
        if control.is_cancelled() {
            report.interrupted = true;
            break;
        }
        on_event(&Event::Processing {
            path: &file.path,
            index: i + 1,
            total,
        });

        let analysis = match prepared.get_mut(i).and_then(Option::take) {
            Some(result) => result?,
            None => classifier.analyze(file)?,
        };
        let disposition = finish(&classifier, file, &analysis, on_event);
        report.record(file.path.clone(), disposition);
    }

    if let Some(path) = &options.report_json {
        report.save_json(path)?;
    }
    Ok(report)
}

/// Outcome of a metadata dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub total: usize,
    pub unreadable: usize,
    pub interrupted: bool,
}

/// Print every tag of every file under `source` without copying anything.
pub fn dump(
    source: &Path,
    max_depth: usize,
    control: &ProcessControl,
    reader: &dyn MetadataReader,
    on_event: &EventCallback<'_>,
) -> Result<DumpSummary> {
    let source_root = walk::absolute(source)?;
    let files = walk::discover(&source_root, max_depth)?;
    on_event(&Event::Found { count: files.len() });

    let mut summary = DumpSummary::default();
    for file in &files {
        if control.is_cancelled() {
            summary.interrupted = true;
            break;
        }
        summary.total += 1;
        match reader.read(&file.path) {
            Ok(bundle) => on_event(&Event::Metadata {
                path: &file.path,
                bundle: &bundle,
            }),
            Err(error) => {
                summary.unreadable += 1;
                on_event(&Event::MetadataError {
                    path: &file.path,
                    error: &error,
                });
            }
        }
    }
    Ok(summary)
}

/// Plan, check and copy one analysed file.
fn finish(
    classifier: &Classifier<'_>,
    file: &InputFile,
    analysis: &Analysis,
    on_event: &EventCallback<'_>,
) -> Disposition {
    if let Analysis::Eligible(dated) = analysis {
        on_event(&Event::Dated {
            path: &file.path,
            timestamp: dated.timestamp,
            source: dated.source,
        });
    }

    match classifier.decide(file, analysis) {
        Decision::Skip(reason) => {
            on_event(&Event::Skipping { reason: &reason });
            reason.disposition()
        }
        Decision::Copy(entry) => {
            on_event(&Event::Copying {
                dest: &entry.dest_path,
            });
            match copier::copy_file(&entry) {
                Ok(_) => Disposition::Copied,
                Err(error) => {
                    warn!("{}: {}", file.path.display(), error);
                    on_event(&Event::CopyFailed {
                        path: &file.path,
                        error: &error,
                    });
                    Disposition::FailedCopy
                }
            }
        }
    }
}

/// Read-only analysis of every file on a pool of `jobs` threads, in input
/// order. Entries left `None` were skipped because of cancellation.
fn analyze_parallel(
    classifier: &Classifier<'_>,
    files: &[InputFile],
    jobs: usize,
    control: &ProcessControl,
) -> Result<Vec<Option<Result<Analysis>>>> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    Ok(pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                if control.is_cancelled() {
                    None
                } else {
                    Some(classifier.analyze(file))
                }
            })
            .collect()
    }))
}
