use chrono::{DateTime, TimeDelta, Utc};

/// Width of the trailing newsflash window, in seconds.
pub const NEWSFLASH_WINDOW_SECS: i64 = 10 * 60;

/// Whether an article published at `published` counts as breaking news at `now`.
///
/// True when `published` falls in the 10 minutes ending at `now`, edges
/// included. Timestamps ahead of `now` (publisher clock skew) are treated as
/// fresh.
pub fn is_newsflash(published: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(published) <= TimeDelta::seconds(NEWSFLASH_WINDOW_SECS)
}
