use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use organize_core::{
    CancellationToken, DateSource, Event, OrganizeOptions, ProcessControl, DEFAULT_CUTOFF_YEAR,
    DEFAULT_MAX_DEPTH,
};

/// Exit status after an interrupt, as shells report SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "organize", version, about = "Copy photos into YYYY/MM folders by their EXIF capture date")]
struct Cli {
    /// Directory tree to read photos from
    source: PathBuf,

    /// Directory to copy photos into
    #[arg(required_unless_present = "dump_metadata")]
    destination: Option<PathBuf>,

    /// Skip photos taken before this year
    #[arg(long, default_value_t = DEFAULT_CUTOFF_YEAR)]
    cutoff_year: i32,

    /// Also skip photos taken during the cutoff year
    #[arg(long)]
    exclusive_cutoff: bool,

    /// Maximum directory depth to descend into
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Threads used for reading metadata
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Date sources in order of preference (repeatable)
    #[arg(long = "date-source", value_enum)]
    date_sources: Vec<DateSource>,

    /// Write the final report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Print every metadata tag of each file instead of copying
    #[arg(long, conflicts_with_all = ["destination", "report_json"])]
    dump_metadata: bool,
}

fn print_event(event: &Event<'_>) {
    if event.is_error() {
        eprintln!("{}", event);
    } else {
        println!("{}", event);
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        log::warn!("interrupt received, finishing current file");
        handler_token.cancel();
    })?;
    let control = ProcessControl::new().with_cancel_token(token);

    let Some(destination) = cli.destination else {
        let summary = organize_core::dump_metadata(&cli.source, cli.max_depth, &control, &print_event)?;
        if summary.interrupted {
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
        return Ok(ExitCode::SUCCESS);
    };

    let mut options = OrganizeOptions::new(cli.source, destination);
    options.cutoff_year = cli.cutoff_year;
    options.include_cutoff = !cli.exclusive_cutoff;
    options.max_depth = cli.max_depth;
    options.jobs = cli.jobs;
    options.report_json = cli.report_json;
    if !cli.date_sources.is_empty() {
        options.date_sources = cli.date_sources;
    }

    let report = organize_core::organize_with_control(&options, &control, &print_event)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report.write_summary(&mut out)?;
    out.flush()?;

    if report.interrupted {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_metadata_needs_no_destination() {
        let cli = Cli::try_parse_from(["organize", "--dump-metadata", "/photos"]).unwrap();
        assert!(cli.dump_metadata);
        assert_eq!(cli.destination, None);

        assert!(Cli::try_parse_from(["organize", "/photos"]).is_err());
        assert!(Cli::try_parse_from(["organize", "--dump-metadata", "/photos", "/out"]).is_err());
    }
}
