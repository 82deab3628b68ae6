use chrono::Local;

use crate::identity::Identity;

/// `ctime` layout. Contains no `-`, so it stays a single CSV field.
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Current local time, e.g. `Mon Oct 19 09:05:03 2026`.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Builds the line written to sinks: `[time] - [identity]\t- payload`.
pub fn format_line(time: &str, identity: &Identity, payload: &str) -> String {
    format!("[{time}] - [{identity}]\t- {payload}")
}

#[test]
fn test_format_line() {
    let line = format_line("Mon Oct 19 09:05:03 2026", &Identity::named("7"), "hello");
    assert_eq!(line, "[Mon Oct 19 09:05:03 2026] - [7]\t- hello");
}

#[test]
fn test_timestamp_layout() {
    let time = timestamp();
    assert!(!time.contains('-'));
    assert_eq!(time.len(), 24);
    assert!(chrono::NaiveDateTime::parse_from_str(&time, TIMESTAMP_FORMAT).is_ok());
}
