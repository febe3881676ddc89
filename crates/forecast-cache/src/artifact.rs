//! Naming of rendered spectrum artifacts.
//!
//! Each record of a forecast run is rendered to `YYYYMMDDHH.spec.png` in the
//! run directory, stamped with the record's local time at hour resolution.

use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};

pub const ARTIFACT_SUFFIX: &str = ".spec.png";
pub const ARTIFACT_TIME_FORMAT: &str = "%Y%m%d%H";

/// File name of the artifact for a record time.
pub fn artifact_file_name<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", time.format(ARTIFACT_TIME_FORMAT), ARTIFACT_SUFFIX)
}

/// Artifact path in `dir` for a POSIX record time, stamped in local time.
///
/// Returns `None` for timestamps outside chrono's range.
pub fn artifact_path(dir: &Path, record_time: i64) -> Option<PathBuf> {
    let local = Local.timestamp_opt(record_time, 0).earliest()?;
    Some(dir.join(artifact_file_name(&local)))
}

/// The `YYYYMMDDHH` stamp embedded in an artifact path.
pub fn artifact_time(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.strip_suffix(ARTIFACT_SUFFIX)
}

pub fn is_artifact(path: &Path) -> bool {
    artifact_time(path).is_some_and(|stamp| !stamp.is_empty())
}
