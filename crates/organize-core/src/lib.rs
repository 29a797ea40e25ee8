pub mod cancel;
pub mod classify;
pub mod copier;
pub mod date;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod plan;
pub mod report;
pub mod walk;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use cancel::CancellationToken;
pub use classify::{Cutoff, DEFAULT_CUTOFF_YEAR};
pub use date::{DateSource, Timestamp};
pub use driver::{DumpSummary, Event, EventCallback};
pub use error::{OrganizeError, Result};
pub use metadata::{ExifReader, MetadataReader};
pub use report::{Disposition, Report};

pub const DEFAULT_MAX_DEPTH: usize = 20;

fn default_cutoff_year() -> i32 {
    DEFAULT_CUTOFF_YEAR
}

fn default_include_cutoff() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_jobs() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(default = "default_cutoff_year")]
    pub cutoff_year: i32,
    /// Keep files from `cutoff_year` itself (`>=`) rather than only later ones.
    #[serde(default = "default_include_cutoff")]
    pub include_cutoff: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Threads for metadata reading. Copies always run one at a time.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default = "date::default_date_sources")]
    pub date_sources: Vec<DateSource>,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

impl OrganizeOptions {
    pub fn new(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            cutoff_year: default_cutoff_year(),
            include_cutoff: default_include_cutoff(),
            max_depth: default_max_depth(),
            jobs: default_jobs(),
            date_sources: date::default_date_sources(),
            report_json: None,
        }
    }

    pub fn cutoff(&self) -> Cutoff {
        Cutoff {
            year: self.cutoff_year,
            inclusive: self.include_cutoff,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(OrganizeError::InvalidOption("jobs must be at least 1".into()));
        }
        if self.date_sources.is_empty() {
            return Err(OrganizeError::InvalidOption(
                "at least one date source is required".into(),
            ));
        }
        Ok(())
    }
}

/// Control options for a run.
#[derive(Debug, Clone, Default)]
pub struct ProcessControl {
    pub cancel_token: Option<CancellationToken>,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Organize `options.source` into `options.destination` using embedded EXIF.
pub fn organize(options: &OrganizeOptions, on_event: &EventCallback<'_>) -> Result<Report> {
    organize_with_control(options, &ProcessControl::default(), on_event)
}

/// Like [`organize`], honouring cancellation requests from `control`.
pub fn organize_with_control(
    options: &OrganizeOptions,
    control: &ProcessControl,
    on_event: &EventCallback<'_>,
) -> Result<Report> {
    driver::run(options, control, &ExifReader, on_event)
}

/// List the metadata of every file under `source` without copying.
pub fn dump_metadata(
    source: &Path,
    max_depth: usize,
    control: &ProcessControl,
    on_event: &EventCallback<'_>,
) -> Result<DumpSummary> {
    driver::dump(source, max_depth, control, &ExifReader, on_event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_from_json() {
        let options: OrganizeOptions =
            serde_json::from_str(r#"{"source": "/in", "destination": "/out"}"#).unwrap();
        assert_eq!(options.cutoff_year, 2016);
        assert!(options.include_cutoff);
        assert_eq!(options.max_depth, 20);
        assert_eq!(options.jobs, 1);
        assert_eq!(options.date_sources, vec![DateSource::Ifd0DateTime]);
    }

    #[test]
    fn test_options_validation() {
        let mut options = OrganizeOptions::new("/in".into(), "/out".into());
        assert!(options.validate().is_ok());

        options.jobs = 0;
        assert!(matches!(options.validate(), Err(OrganizeError::InvalidOption(_))));

        options.jobs = 2;
        options.date_sources.clear();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_control_without_token_never_cancels() {
        assert!(!ProcessControl::new().is_cancelled());
    }
}
