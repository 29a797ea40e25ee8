use chrono::{NaiveDate, NaiveDateTime};
use exif::Tag;

use crate::metadata::{DirectoryKind, MetadataBundle};

use super::Timestamp;

/// Outcome of looking a date tag up across every directory of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagDates {
    None,
    One(Timestamp),
    /// Two or more distinct values; callers treat this as fatal.
    Conflicting(Vec<Timestamp>),
}

/// Collect `tag` from every directory of `kind`.
/// EXIF datetimes carry no zone; they are read as UTC.
pub fn tag_dates(bundle: &MetadataBundle, kind: DirectoryKind, tag: Tag) -> TagDates {
    let mut found: Vec<Timestamp> = Vec::new();
    for dir in bundle.directories_of(kind) {
        let Some(raw) = dir.get(tag.number()) else {
            continue;
        };
        if let Some(dt) = parse_exif_datetime(raw) {
            let ts = dt.and_utc();
            if !found.contains(&ts) {
                found.push(ts);
            }
        }
    }

    match found.len() {
        0 => TagDates::None,
        1 => TagDates::One(found[0]),
        _ => TagDates::Conflicting(found),
    }
}

pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim()
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    let date_part = cleaned.split(' ').next()?;
    NaiveDate::parse_from_str(date_part, "%Y:%m:%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
}
