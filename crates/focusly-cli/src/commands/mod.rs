pub mod activity;
pub mod calendar;
pub mod config;
pub mod journal;
pub mod preset;
pub mod stats;
pub mod task;
pub mod timer;

use std::error::Error;
use std::rc::Rc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use focusly_core::storage::Database;
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn Error>>;

/// Open the user's database, shared between managers.
pub fn open_db() -> Result<Rc<Database>, Box<dyn Error>> {
    Ok(Rc::new(Database::open()?))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (end of that local day).
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d")?;
    let end = day
        .and_hms_opt(23, 59, 0)
        .ok_or_else(|| format!("invalid date: {input}"))?;
    Local
        .from_local_datetime(&end)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| format!("date does not exist locally: {input}").into())
}

pub fn parse_date(input: &str) -> Result<NaiveDate, Box<dyn Error>> {
    Ok(NaiveDate::parse_from_str(input, "%Y-%m-%d")?)
}

pub fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// `1h 05m`, `25m`, `40s`.
pub fn format_secs(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m:02}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_secs(40), "40s");
        assert_eq!(format_secs(25 * 60), "25m");
        assert_eq!(format_secs(3900), "1h 05m");
    }

    #[test]
    fn parses_both_date_forms() {
        let exact = parse_datetime("2024-05-06T10:00:00Z").unwrap();
        assert_eq!(exact.to_rfc3339(), "2024-05-06T10:00:00+00:00");
        let day = parse_datetime("2024-05-06").unwrap();
        assert_eq!(day.with_timezone(&Local).date_naive(), parse_date("2024-05-06").unwrap());
        assert!(parse_datetime("tomorrow").is_err());
    }
}
