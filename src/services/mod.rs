pub mod placement;
pub mod session;
pub mod sync;

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time in epoch milliseconds, the unit the engine works in.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
