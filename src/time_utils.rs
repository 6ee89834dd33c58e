// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as an RFC3339 string (profile row timestamps).
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Current time in seconds since the Unix epoch (JWT `iat`/`exp`).
pub fn now_unix_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_z_suffix() {
        let date = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2026-03-01T12:30:05Z");
    }
}
