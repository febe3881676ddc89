//! Calendar time conversion for record timestamps.
//!
//! Text spectrum files carry wall-clock times with no zone. They are read as
//! local time, the way the files have always been interpreted by the
//! forecast tooling, and stored as POSIX seconds.

use chrono::{Duration, Local, LocalResult, NaiveDateTime, TimeZone};

/// Timestamp layout of a text record's time line.
pub const RECORD_TIME_FORMAT: &str = "%Y%m%d %H%M%S";

/// Parse a record time line (`YYYYMMDD HHMMSS`).
pub fn parse_record_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), RECORD_TIME_FORMAT).ok()
}

/// Convert a local wall-clock time to POSIX seconds.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times
/// inside a DST gap are shifted forward by the gap, so `02:30` on a
/// spring-forward night lands on the same instant as `03:30`.
pub fn local_timestamp(naive: &NaiveDateTime) -> Option<i64> {
    match Local.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt.timestamp()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp()),
        LocalResult::None => {
            let before = *naive - Duration::hours(1);
            Local
                .from_local_datetime(&before)
                .earliest()
                .map(|dt| dt.timestamp() + 3600)
        }
    }
}
