//! Inter epoch pacing and session time references
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::{constants::Pacing, prelude::Epoch};

/// Delay [ms] between two consecutive epochs.
/// Non positive intervals are replaced by [Pacing::MIN_DELAY_MS],
/// so the stream always moves forward.
pub fn inter_epoch_delay_ms(current: Epoch, next: Epoch) -> u32 {
    let dt = (next - current).to_seconds();
    if dt <= 0.0 {
        Pacing::MIN_DELAY_MS
    } else {
        (dt * 1.0E3).round().min(u32::MAX as f64) as u32
    }
}

/// Synthetic millisecond counter, used in place of the wall clock
/// when generating data faster than real time.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct VirtualClock {
    tick: u32,
}

impl VirtualClock {
    /// Current tick [ms]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Moves forward by given amount of milliseconds
    pub fn advance(&mut self, ms: u32) {
        self.tick = self.tick.saturating_add(ms);
    }
}

/// Time references captured when a session opens
#[derive(Debug, Copy, Clone)]
pub struct SessionClock {
    /// Wall clock millisecond tick at opening
    pub reference_tick: u32,
    /// Opening instant
    pub start: Epoch,
    opened: Instant,
}

impl SessionClock {
    /// Captures the current time
    pub fn now() -> Self {
        let since_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            reference_tick: (since_unix.as_millis() & 0xFFFF_FFFF) as u32,
            start: Epoch::from_unix_seconds(since_unix.as_secs_f64()),
            opened: Instant::now(),
        }
    }

    /// Milliseconds elapsed since opening
    pub fn elapsed_ms(&self) -> u32 {
        self.opened.elapsed().as_millis().min(u32::MAX as u128) as u32
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::Duration;

    #[test]
    fn delays() {
        let t = Epoch::from_gpst_seconds(100.0);
        assert_eq!(inter_epoch_delay_ms(t, t + Duration::from_seconds(1.0)), 1000);
        assert_eq!(inter_epoch_delay_ms(t, t + Duration::from_milliseconds(200.0)), 200);
        assert_eq!(inter_epoch_delay_ms(t, t + Duration::from_seconds(30.0)), 30_000);
        assert_eq!(inter_epoch_delay_ms(t, t + Duration::from_seconds(0.0004)), 0);
    }

    #[test]
    fn identical_timestamps_are_clamped() {
        let t = Epoch::from_gpst_seconds(100.0);
        assert_eq!(inter_epoch_delay_ms(t, t), 1000);
        assert_eq!(inter_epoch_delay_ms(t, t - Duration::from_seconds(5.0)), 1000);
    }

    #[test]
    fn virtual_clock() {
        let mut clock = VirtualClock::default();
        assert_eq!(clock.tick(), 0);
        clock.advance(1000);
        clock.advance(30_000);
        assert_eq!(clock.tick(), 31_000);
        clock.advance(u32::MAX);
        assert_eq!(clock.tick(), u32::MAX);
    }
}
