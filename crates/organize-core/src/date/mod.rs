pub mod exif;
pub mod guess;

use std::fs;
use std::path::Path;

use ::exif::Tag;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{OrganizeError, Result};
use crate::metadata::{DirectoryKind, MetadataBundle};

use self::exif::TagDates;

/// Capture instant, always in UTC.
pub type Timestamp = DateTime<Utc>;

/// Where a capture date may come from. Sources are tried in the configured
/// order and the first one that yields a date wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DateSource {
    /// `DateTime` from IFD0.
    Ifd0DateTime,
    /// `DateTimeOriginal` from the Exif sub-IFD.
    ExifDateTimeOriginal,
    /// Date patterns embedded in the file name.
    Filename,
    /// The source file's modification time.
    FileModified,
}

pub fn default_date_sources() -> Vec<DateSource> {
    vec![DateSource::Ifd0DateTime]
}

/// A capture date together with the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dated {
    pub timestamp: Timestamp,
    pub source: DateSource,
}

/// Resolve a single capture instant for `path`.
///
/// `Ok(None)` means no source produced a date. Two distinct dates from the
/// same source are an error and abort the run.
pub fn extract_timestamp(
    path: &Path,
    bundle: &MetadataBundle,
    sources: &[DateSource],
) -> Result<Option<Dated>> {
    for &source in sources {
        let found = match source {
            DateSource::Ifd0DateTime => {
                from_tag(path, bundle, DirectoryKind::Ifd0, Tag::DateTime)?
            }
            DateSource::ExifDateTimeOriginal => {
                from_tag(path, bundle, DirectoryKind::ExifSubIfd, Tag::DateTimeOriginal)?
            }
            DateSource::Filename => path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(guess::guess_date_from_filename)
                .map(|dt| dt.and_utc()),
            DateSource::FileModified => fs::metadata(path)
                .and_then(|m| m.modified())
                .map(Timestamp::from)
                .ok(),
        };
        if let Some(timestamp) = found {
            debug!("{}: date from {:?}", path.display(), source);
            return Ok(Some(Dated { timestamp, source }));
        }
    }
    Ok(None)
}

fn from_tag(
    path: &Path,
    bundle: &MetadataBundle,
    kind: DirectoryKind,
    tag: Tag,
) -> Result<Option<Timestamp>> {
    match exif::tag_dates(bundle, kind, tag) {
        TagDates::None => Ok(None),
        TagDates::One(ts) => Ok(Some(ts)),
        TagDates::Conflicting(values) => Err(OrganizeError::InconsistentTimestamps {
            path: path.to_path_buf(),
            values,
        }),
    }
}
