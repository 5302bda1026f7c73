//! Conversions between the wire representation of a confirmation time and
//! the structured time kept on a [`Subscriber`](super::subscriber::Subscriber).
//!
//! On the wire a confirmation time is a signed count of seconds since the Unix
//! epoch, and `0` stands for "not confirmed".
use chrono::{DateTime, TimeZone, Utc};

pub const UNCONFIRMED: i64 = 0;

/// Accepts `0` and any second chrono can represent, roughly
/// +/-8.2e12 (about 262,000 years either side of 1970). Larger magnitudes are
/// rejected.
pub fn from_seconds(seconds: i64) -> Result<Option<DateTime<Utc>>, String> {
    if seconds == UNCONFIRMED {
        return Ok(None);
    }

    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(Some)
        .ok_or_else(|| format!("{} is not a valid confirmation timestamp", seconds))
}

pub fn to_seconds(confirmed_at: Option<DateTime<Utc>>) -> i64 {
    confirmed_at
        .map(|confirmed_at| confirmed_at.timestamp())
        .unwrap_or(UNCONFIRMED)
}
