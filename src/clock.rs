/// Source of the current time, in seconds.
pub trait TimeSource {
    fn now_seconds(&self) -> u64;
}

pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_seconds(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock pinned to a given second.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl TimeSource for FixedClock {
    fn now_seconds(&self) -> u64 {
        self.0
    }
}
