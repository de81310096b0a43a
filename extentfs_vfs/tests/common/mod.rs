use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use extentfs_vfs::SystemHal;

/// 固定时间的时钟
pub struct FixedClock;

impl SystemHal for FixedClock {
    fn now() -> Option<Duration> {
        Some(Duration::from_secs(1_000))
    }
}

static TICKS: AtomicU64 = AtomicU64::new(1_000);

/// 每次调用前进一秒的时钟
pub struct TickClock;

impl SystemHal for TickClock {
    fn now() -> Option<Duration> {
        Some(Duration::from_secs(TICKS.fetch_add(1, Ordering::Relaxed) + 1))
    }
}
