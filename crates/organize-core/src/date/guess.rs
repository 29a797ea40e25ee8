use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

struct FilenamePattern {
    regex: &'static LazyLock<Regex>,
    format: &'static str,
    /// Characters of the match handed to the parser.
    take: Option<usize>,
}

const MONTH: &str = "(?:01|02|03|04|05|06|07|08|09|10|11|12)";

fn pattern(body: &str) -> Regex {
    let expanded = body.replace("MM", MONTH);
    Regex::new(&format!(r"(?P<date>(?:20|19|18)\d{{2}}{})", expanded)).unwrap()
}

static DASHED_COMPACT: LazyLock<Regex> = LazyLock::new(|| pattern(r"MM[0-3]\d-\d{6}"));
static UNDERSCORE_COMPACT: LazyLock<Regex> = LazyLock::new(|| pattern(r"MM[0-3]\d_\d{6}"));
static ALL_DASHES: LazyLock<Regex> = LazyLock::new(|| pattern(r"-MM-[0-3]\d-\d{2}-\d{2}-\d{2}"));
static DASHED_DATE: LazyLock<Regex> = LazyLock::new(|| pattern(r"-MM-[0-3]\d-\d{6}"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| pattern(r"MM[0-3]\d{7}"));
static ALL_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| pattern(r"_MM_[0-3]\d_\d{2}_\d{2}_\d{2}"));

static PATTERNS: &[FilenamePattern] = &[
    FilenamePattern { regex: &DASHED_COMPACT, format: "%Y%m%d-%H%M%S", take: None },
    FilenamePattern { regex: &UNDERSCORE_COMPACT, format: "%Y%m%d_%H%M%S", take: None },
    FilenamePattern { regex: &ALL_DASHES, format: "%Y-%m-%d-%H-%M-%S", take: None },
    FilenamePattern { regex: &DASHED_DATE, format: "%Y-%m-%d-%H%M%S", take: None },
    FilenamePattern { regex: &DIGITS, format: "%Y%m%d%H%M%S", take: Some(14) },
    FilenamePattern { regex: &ALL_UNDERSCORES, format: "%Y_%m_%d_%H_%M_%S", take: None },
];

/// Guess a capture date from patterns cameras and apps embed in file names.
pub fn guess_date_from_filename(filename: &str) -> Option<NaiveDateTime> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    for pat in PATTERNS {
        let Some(date) = pat.regex.captures(basename).and_then(|c| c.name("date")) else {
            continue;
        };
        let s = date.as_str();
        let s = match pat.take {
            Some(n) => &s[..n.min(s.len())],
            None => s,
        };
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pat.format) {
            return Some(dt);
        }
    }

    None
}
