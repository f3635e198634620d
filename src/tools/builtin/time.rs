use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::AppError;

pub fn current_time(timezone: &str) -> Result<String, AppError> {
    format_time_in(timezone, Utc::now())
}

pub fn format_time_in(timezone: &str, now: DateTime<Utc>) -> Result<String, AppError> {
    let tz: Tz = timezone
        .trim()
        .parse()
        .map_err(|e| AppError::ToolExecutionFailed(format!("Unknown timezone '{timezone}': {e}")))?;
    let local = now.with_timezone(&tz);
    Ok(format!(
        "Current time in {timezone}: {}",
        local.format("%Y-%m-%d %H:%M:%S %Z")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_in_named_zone() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap();
        let out = format_time_in("UTC", now).unwrap();
        assert_eq!(out, "Current time in UTC: 2024-01-15 12:30:00 UTC");

        let out = format_time_in("Asia/Tokyo", now).unwrap();
        assert_eq!(out, "Current time in Asia/Tokyo: 2024-01-15 21:30:00 JST");
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let err = current_time("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, AppError::ToolExecutionFailed(_)));
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }
}
