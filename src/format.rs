use chrono::{DateTime, Local, TimeZone};

const SIZE_SUFFIXES: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Human readable size with 1024-based units, rounded to two decimals.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut suffix = "bytes";

    for next in SIZE_SUFFIXES {
        if value > 1024.0 {
            value /= 1024.0;
            suffix = next;
        } else {
            break;
        }
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {suffix}")
}

/// Same as [`format_size`] for values the server reports as signed
/// (e.g. `-1` for "unknown"). Negative values render as `-`.
pub fn format_size_signed(bytes: i64) -> String {
    if bytes < 0 {
        "-".to_string()
    } else {
        format_size(bytes as u64)
    }
}

/// `YYYY-MM-DD HH:MM` in local time.
pub fn format_local_datetime(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

/// Render a unix timestamp (seconds) as `YYYY-MM-DD HH:MM` in local time.
pub fn format_unix_seconds(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(time) => format_local_datetime(&time),
        None => format!("@{secs}"),
    }
}
