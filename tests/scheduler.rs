use std::time::{Duration, Instant};

use pl_stats_terminal::scheduler::{RefreshReason, RefreshScheduler};

const INTERVAL: Duration = Duration::from_secs(300);
const GRACE: Duration = Duration::from_secs(3);

fn drain(sched: &mut RefreshScheduler, now: Instant) -> Vec<RefreshReason> {
    let mut out = Vec::new();
    while let Some(reason) = sched.poll(now) {
        out.push(reason);
    }
    out
}

#[test]
fn disabled_scheduler_never_ticks() {
    let start = Instant::now();
    let mut sched = RefreshScheduler::new(INTERVAL, GRACE, false, start);
    assert!(!sched.auto_refresh());
    assert!(drain(&mut sched, start + INTERVAL * 10).is_empty());
}

#[test]
fn ticks_at_fixed_interval() {
    let start = Instant::now();
    let mut sched = RefreshScheduler::new(INTERVAL, GRACE, true, start);
    assert!(drain(&mut sched, start + INTERVAL / 2).is_empty());
    assert_eq!(drain(&mut sched, start + INTERVAL), [RefreshReason::Interval]);
    assert!(drain(&mut sched, start + INTERVAL + Duration::from_secs(1)).is_empty());
    assert_eq!(drain(&mut sched, start + INTERVAL * 2), [RefreshReason::Interval]);
}

#[test]
fn toggling_off_then_on_restarts_period() {
    let start = Instant::now();
    let mut sched = RefreshScheduler::new(INTERVAL, GRACE, true, start);
    sched.set_auto_refresh(false, start + Duration::from_secs(100));
    assert!(drain(&mut sched, start + INTERVAL * 3).is_empty());

    let on_at = start + INTERVAL * 3;
    sched.set_auto_refresh(true, on_at);
    assert_eq!(sched.next_tick(), Some(on_at + INTERVAL));
    assert!(drain(&mut sched, on_at + INTERVAL - Duration::from_millis(1)).is_empty());
    assert_eq!(drain(&mut sched, on_at + INTERVAL), [RefreshReason::Interval]);
}

#[test]
fn follow_up_fires_once_after_grace() {
    let start = Instant::now();
    let mut sched = RefreshScheduler::new(INTERVAL, GRACE, false, start);
    sched.arm_follow_up(start);
    assert!(sched.follow_up_pending());
    assert!(drain(&mut sched, start + GRACE - Duration::from_millis(1)).is_empty());
    assert_eq!(drain(&mut sched, start + GRACE), [RefreshReason::FollowUp]);
    assert!(!sched.follow_up_pending());
    assert!(drain(&mut sched, start + GRACE * 10).is_empty());
}

#[test]
fn follow_up_and_tick_due_together_both_fire() {
    let start = Instant::now();
    let mut sched = RefreshScheduler::new(INTERVAL, GRACE, true, start);
    sched.arm_follow_up(start + INTERVAL - GRACE);
    assert_eq!(
        drain(&mut sched, start + INTERVAL),
        [RefreshReason::FollowUp, RefreshReason::Interval]
    );
}
