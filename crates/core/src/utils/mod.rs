//! Utility functions for GameForge
//!
//! Time arithmetic shared by the scheduler and the rulebook.

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse an IANA zone name such as `America/New_York`
pub fn parse_time_zone(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}

/// The first local midnight strictly after `now`, expressed in UTC.
///
/// Follows the zone's daylight-saving rules, so the reset stays at local
/// midnight all year.
pub fn next_local_midnight(now: DateTime<Utc>, zone: Tz) -> DateTime<Utc> {
    let local_date = now.with_timezone(&zone).date_naive();
    let next_date = local_date.checked_add_days(Days::new(1)).unwrap_or(local_date);
    let midnight = next_date.and_time(NaiveTime::MIN);

    // A zone that skips midnight on a transition day lands on the earliest valid time
    match zone.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => now + chrono::Duration::days(1),
    }
}
