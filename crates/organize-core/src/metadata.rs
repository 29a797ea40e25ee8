use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use exif::{Context, Field, In, Reader, Value};
use thiserror::Error;

/// Which EXIF directory a group of tags came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryKind {
    /// Image File Directory zero: primary image, TIFF tags.
    Ifd0,
    /// Exif sub-IFD of the primary image.
    ExifSubIfd,
    Gps,
    Interop,
    /// Thumbnail IFD.
    Ifd1,
    Other(u16),
}

impl DirectoryKind {
    fn of(field: &Field) -> Self {
        if field.ifd_num == In::PRIMARY {
            match field.tag.context() {
                Context::Tiff => DirectoryKind::Ifd0,
                Context::Exif => DirectoryKind::ExifSubIfd,
                Context::Gps => DirectoryKind::Gps,
                _ => DirectoryKind::Interop,
            }
        } else if field.ifd_num == In::THUMBNAIL {
            DirectoryKind::Ifd1
        } else {
            DirectoryKind::Other(field.ifd_num.index())
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryKind::Ifd0 => f.write_str("ExifIFD0"),
            DirectoryKind::ExifSubIfd => f.write_str("ExifSubIFD"),
            DirectoryKind::Gps => f.write_str("GPS"),
            DirectoryKind::Interop => f.write_str("Interoperability"),
            DirectoryKind::Ifd1 => f.write_str("ExifIFD1"),
            DirectoryKind::Other(n) => write!(f, "IFD{}", n),
        }
    }
}

/// A single tag inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub code: u16,
    pub name: String,
    /// ASCII values verbatim, anything else in the parser's display form.
    pub value: String,
}

/// A named group of tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub kind: DirectoryKind,
    tags: Vec<TagEntry>,
}

impl Directory {
    pub fn new(kind: DirectoryKind) -> Self {
        Self {
            kind,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, code: u16, name: &str, value: &str) -> Self {
        self.push(TagEntry {
            code,
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn push(&mut self, tag: TagEntry) {
        self.tags.push(tag);
    }

    pub fn tags(&self) -> &[TagEntry] {
        &self.tags
    }

    /// First value stored under `code`, if any.
    pub fn get(&self, code: u16) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.code == code)
            .map(|t| t.value.as_str())
    }
}

/// Everything the parser found in one file, directories in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBundle {
    directories: Vec<Directory>,
}

impl MetadataBundle {
    pub fn new(directories: Vec<Directory>) -> Self {
        Self { directories }
    }

    pub fn directories_of(&self, kind: DirectoryKind) -> impl Iterator<Item = &Directory> {
        self.directories.iter().filter(move |d| d.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    fn from_fields<'a>(fields: impl Iterator<Item = &'a Field>) -> Self {
        let mut directories: Vec<Directory> = Vec::new();
        for field in fields {
            let kind = DirectoryKind::of(field);
            let entry = TagEntry {
                code: field.tag.number(),
                name: field.tag.to_string(),
                value: field_text(field),
            };
            match directories.iter_mut().find(|d| d.kind == kind) {
                Some(dir) => dir.push(entry),
                None => {
                    let mut dir = Directory::new(kind);
                    dir.push(entry);
                    directories.push(dir);
                }
            }
        }
        Self::new(directories)
    }
}

/// One `[Directory] Tag - value` line per tag.
impl fmt::Display for MetadataBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for dir in &self.directories {
            for tag in dir.tags() {
                if !first {
                    writeln!(f)?;
                }
                first = false;
                write!(f, "[{}] {} - {}", dir.kind, tag.name, tag.value)?;
            }
        }
        Ok(())
    }
}

fn field_text(field: &Field) -> String {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string())
            .unwrap_or_default(),
        _ => field.display_value().to_string(),
    }
}

/// The file's metadata could not be obtained.
#[derive(Debug, Error)]
#[error("unable to read metadata from {path}: {reason}")]
pub struct Unreadable {
    pub path: PathBuf,
    pub reason: String,
}

impl Unreadable {
    fn new(path: &Path, reason: impl ToString) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Source of per-file metadata bundles.
pub trait MetadataReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<MetadataBundle, Unreadable>;
}

/// Reads embedded EXIF from any container `kamadak-exif` understands.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifReader;

impl MetadataReader for ExifReader {
    fn read(&self, path: &Path) -> Result<MetadataBundle, Unreadable> {
        let file = File::open(path).map_err(|e| Unreadable::new(path, e))?;
        let mut reader = BufReader::new(file);

        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| Unreadable::new(path, e))?;

        let bundle = MetadataBundle::from_fields(exif.fields());
        if bundle.is_empty() {
            return Err(Unreadable::new(path, "no metadata directories"));
        }
        Ok(bundle)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Little-endian TIFF with a single IFD0 holding the given ASCII tags.
    pub fn tiff(tags: &[(u16, &str)]) -> Vec<u8> {
        let count = tags.len();
        let ifd_len = 2 + count * 12 + 4;
        let mut data_offset = 8 + ifd_len;

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&(count as u16).to_le_bytes());

        let mut data = Vec::new();
        for (code, text) in tags {
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(0);
            out.extend_from_slice(&code.to_le_bytes());
            out.extend_from_slice(&2u16.to_le_bytes());
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            if bytes.len() <= 4 {
                bytes.resize(4, 0);
                out.extend_from_slice(&bytes);
            } else {
                out.extend_from_slice(&(data_offset as u32).to_le_bytes());
                data_offset += bytes.len();
                data.extend_from_slice(&bytes);
            }
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    /// TIFF carrying an IFD0 DateTime.
    pub fn tiff_with_date(date: &str) -> Vec<u8> {
        tiff(&[(0x010f, "Acme"), (0x0132, date)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reads_ifd0_tags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, fixtures::tiff_with_date("2020:06:15 10:30:00")).unwrap();

        let bundle = ExifReader.read(&path).unwrap();
        let ifd0: Vec<_> = bundle.directories_of(DirectoryKind::Ifd0).collect();
        assert_eq!(ifd0.len(), 1);
        assert_eq!(ifd0[0].get(exif::Tag::DateTime.number()), Some("2020:06:15 10:30:00"));
        assert_eq!(ifd0[0].get(exif::Tag::Make.number()), Some("Acme"));
    }

    #[test]
    fn test_non_image_is_unreadable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, b"just some text, no pictures here").unwrap();

        let err = ExifReader.read(&path).unwrap_err();
        assert_eq!(err.path, path);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        assert!(ExifReader.read(&dir.path().join("gone.jpg")).is_err());
    }

    #[test]
    fn test_directory_lookup_takes_first_value() {
        let dir = Directory::new(DirectoryKind::Ifd0)
            .with_tag(0x0132, "DateTime", "2020:01:01 00:00:00")
            .with_tag(0x0132, "DateTime", "2021:01:01 00:00:00");
        assert_eq!(dir.get(0x0132), Some("2020:01:01 00:00:00"));
        assert_eq!(dir.get(0x9003), None);
    }

    #[test]
    fn test_display_lists_every_tag() {
        let bundle = MetadataBundle::new(vec![
            Directory::new(DirectoryKind::Ifd0)
                .with_tag(0x010f, "Make", "Acme")
                .with_tag(0x0132, "DateTime", "2020:06:15 10:30:00"),
            Directory::new(DirectoryKind::ExifSubIfd).with_tag(0x9003, "DateTimeOriginal", "2020:06:15 10:29:58"),
        ]);
        assert_eq!(
            bundle.to_string(),
            "[ExifIFD0] Make - Acme\n\
             [ExifIFD0] DateTime - 2020:06:15 10:30:00\n\
             [ExifSubIFD] DateTimeOriginal - 2020:06:15 10:29:58"
        );
    }
}
