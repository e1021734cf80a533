use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Interval,
    FollowUp,
}

// Polled from the UI loop; owned by the mounted dashboard.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    grace: Duration,
    next_tick: Option<Instant>,
    follow_up_at: Option<Instant>,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, grace: Duration, auto_refresh: bool, now: Instant) -> Self {
        Self {
            interval,
            grace,
            next_tick: auto_refresh.then(|| now + interval),
            follow_up_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn auto_refresh(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn set_auto_refresh(&mut self, enabled: bool, now: Instant) {
        if enabled == self.auto_refresh() {
            return;
        }
        self.next_tick = enabled.then(|| now + self.interval);
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn follow_up_pending(&self) -> bool {
        self.follow_up_at.is_some()
    }

    pub fn arm_follow_up(&mut self, now: Instant) {
        self.follow_up_at = Some(now + self.grace);
    }

    // One due fetch per call; callers loop until `None`.
    pub fn poll(&mut self, now: Instant) -> Option<RefreshReason> {
        if self.follow_up_at.is_some_and(|at| now >= at) {
            self.follow_up_at = None;
            return Some(RefreshReason::FollowUp);
        }

        let due = self.next_tick?;
        if now < due {
            return None;
        }
        let next = due + self.interval;
        // A stalled loop (suspended terminal, slow draw) must not replay every missed tick.
        self.next_tick = Some(if next <= now { now + self.interval } else { next });
        Some(RefreshReason::Interval)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{RefreshReason, RefreshScheduler};

    #[test]
    fn missed_ticks_collapse_into_one() {
        let start = Instant::now();
        let mut sched =
            RefreshScheduler::new(Duration::from_secs(10), Duration::from_secs(3), true, start);
        let late = start + Duration::from_secs(55);
        assert_eq!(sched.poll(late), Some(RefreshReason::Interval));
        assert_eq!(sched.poll(late), None);
        assert_eq!(sched.next_tick(), Some(late + Duration::from_secs(10)));
    }

    #[test]
    fn setting_same_flag_keeps_phase() {
        let start = Instant::now();
        let mut sched =
            RefreshScheduler::new(Duration::from_secs(10), Duration::from_secs(3), true, start);
        sched.set_auto_refresh(true, start + Duration::from_secs(7));
        assert_eq!(sched.next_tick(), Some(start + Duration::from_secs(10)));
    }
}
