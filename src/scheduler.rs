//! Notification scheduler - a polled periodic trigger that only runs
//! while the link is up.
//!
//! The reference point is set when a connection starts and after every
//! tick.  Time spent disconnected is never accumulated, so reconnecting
//! does not produce a burst of catch-up notifications.

pub struct NotificationScheduler {
    interval_ms: u64,
    last_tick: Option<u64>,
}

impl NotificationScheduler {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_tick: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Restart the period at `now` (connection established).
    pub fn on_connect(&mut self, now: u64) {
        self.last_tick = Some(now);
    }

    /// Forget the reference point (connection lost).
    pub fn on_disconnect(&mut self) {
        self.last_tick = None;
    }

    /// Returns `true` if a tick is due at `now` while `active` holds, and
    /// moves the reference point to `now` when it is.
    pub fn poll(&mut self, now: u64, active: bool) -> bool {
        if !active {
            self.last_tick = None;
            return false;
        }
        match self.last_tick {
            None => {
                self.last_tick = Some(now);
                false
            }
            Some(last) if now.saturating_sub(last) >= self.interval_ms => {
                trace!("tick due after {} ms", now.saturating_sub(last));
                self.last_tick = Some(now);
                true
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_interval_while_active() {
        let mut s = NotificationScheduler::new(2000);
        s.on_connect(0);
        assert!(!s.poll(1999, true));
        assert!(s.poll(2000, true));
        assert!(!s.poll(2001, true));
        assert!(!s.poll(3999, true));
        assert!(s.poll(4000, true));
    }

    #[test]
    fn late_poll_resets_reference_to_now() {
        let mut s = NotificationScheduler::new(2000);
        s.on_connect(0);
        assert!(s.poll(2600, true));
        // Next one is measured from 2600, not 2000.
        assert!(!s.poll(4000, true));
        assert!(s.poll(4600, true));
    }

    #[test]
    fn inactive_never_fires_and_builds_no_backlog() {
        let mut s = NotificationScheduler::new(2000);
        s.on_connect(0);
        for t in (0..20_000).step_by(50) {
            assert!(!s.poll(t, false));
        }
        // Becoming active again starts a fresh period.
        assert!(!s.poll(20_000, true));
        assert!(!s.poll(21_999, true));
        assert!(s.poll(22_000, true));
    }

    #[test]
    fn active_without_reference_starts_period() {
        let mut s = NotificationScheduler::new(100);
        assert!(!s.poll(500, true));
        assert!(s.poll(600, true));
    }

    #[test]
    fn disconnect_clears_reference() {
        let mut s = NotificationScheduler::new(100);
        s.on_connect(0);
        s.on_disconnect();
        assert!(!s.poll(1_000, true));
        assert!(s.poll(1_100, true));
    }

    #[test]
    fn zero_interval_with_clock_going_backwards() {
        let mut s = NotificationScheduler::new(0);
        s.on_connect(1_000);
        assert!(s.poll(500, true));
        assert!(s.poll(500, true));
    }
}
