use std::time::{Duration, Instant};

use termsession::timer::{format_remaining, CountdownTimer, TimerEvent};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn zero_start_expires_immediately() {
    let mut timer = CountdownTimer::new();
    let t0 = Instant::now();
    let events = timer.start(0, t0);
    assert_eq!(events, vec![TimerEvent::TimeExpired]);
    assert!(timer.is_expired());
    assert_eq!(timer.display(), "00:00");
    assert!(timer.poll(t0 + secs(5)).is_empty());
}

#[test]
fn counts_down_and_expires_once() {
    let mut timer = CountdownTimer::new();
    let t0 = Instant::now();
    // Under the warning threshold from the start.
    assert_eq!(timer.start(2, t0), vec![TimerEvent::TwoMinuteWarning]);
    assert_eq!(timer.display(), "00:02");

    assert!(timer.poll(t0 + Duration::from_millis(900)).is_empty());
    assert_eq!(timer.poll(t0 + secs(1)), vec![TimerEvent::Tick(1)]);
    assert_eq!(timer.display(), "00:01");

    assert_eq!(
        timer.poll(t0 + secs(2)),
        vec![TimerEvent::Tick(0), TimerEvent::TimeExpired]
    );
    assert_eq!(timer.display(), "00:00");
    assert!(timer.is_expired());
    assert!(!timer.is_running());

    assert!(timer.poll(t0 + secs(10)).is_empty());
}

#[test]
fn warning_fires_once_when_crossing_two_minutes() {
    let mut timer = CountdownTimer::new();
    let t0 = Instant::now();
    assert!(timer.start(122, t0).is_empty());

    assert_eq!(timer.poll(t0 + secs(1)), vec![TimerEvent::Tick(121)]);
    assert_eq!(
        timer.poll(t0 + secs(2)),
        vec![TimerEvent::Tick(120), TimerEvent::TwoMinuteWarning]
    );
    assert_eq!(timer.poll(t0 + secs(3)), vec![TimerEvent::Tick(119)]);
}

#[test]
fn late_poll_catches_up_one_tick_per_second() {
    let mut timer = CountdownTimer::new();
    let t0 = Instant::now();
    timer.start(600, t0);

    let events = timer.poll(t0 + Duration::from_millis(3500));
    assert_eq!(
        events,
        vec![TimerEvent::Tick(599), TimerEvent::Tick(598), TimerEvent::Tick(597)]
    );
    assert_eq!(timer.next_deadline(), Some(t0 + secs(4)));
}

#[test]
fn late_poll_past_zero_stops_at_expiry() {
    let mut timer = CountdownTimer::new();
    let t0 = Instant::now();
    timer.start(3, t0);

    let events = timer.poll(t0 + secs(30));
    assert_eq!(events.last(), Some(&TimerEvent::TimeExpired));
    let expiries = events
        .iter()
        .filter(|e| **e == TimerEvent::TimeExpired)
        .count();
    assert_eq!(expiries, 1);
    assert_eq!(timer.remaining_seconds(), 0);
}

#[test]
fn stopped_timer_never_expires() {
    let mut timer = CountdownTimer::new();
    let t0 = Instant::now();
    timer.start(5, t0);
    timer.stop();
    assert!(timer.poll(t0 + secs(60)).is_empty());
    assert!(!timer.is_expired());
    assert_eq!(timer.remaining_seconds(), 5);
}

#[test]
fn display_formats() {
    assert_eq!(format_remaining(3661), "1:01:01");
    assert_eq!(format_remaining(1500), "25:00");
    assert_eq!(format_remaining(59), "00:59");
}
