use std::time::{Duration, Instant};

use tracing::{debug, info};

pub const TICK: Duration = Duration::from_secs(1);
pub const WARNING_THRESHOLD_SECS: u64 = 120;

/// Shown where no countdown is running (e.g. the result view).
pub const PLACEHOLDER: &str = "--:--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Tick(u64),
    TwoMinuteWarning,
    TimeExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running { next_tick: Instant },
    Stopped,
    Expired,
}

/// One-second countdown with a terminal expiry that fires exactly once.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    remaining: u64,
    state: TimerState,
    warned: bool,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            remaining: 0,
            state: TimerState::Idle,
            warned: false,
        }
    }

    /// Starts the countdown. A zero start expires immediately.
    ///
    /// A timer starts at most once; later calls return no events.
    pub fn start(&mut self, initial_seconds: u64, now: Instant) -> Vec<TimerEvent> {
        if self.state != TimerState::Idle {
            return Vec::new();
        }
        self.remaining = initial_seconds;
        info!(remaining = initial_seconds, "countdown started");

        if initial_seconds == 0 {
            return self.expire().into_iter().collect();
        }

        self.state = TimerState::Running {
            next_tick: now + TICK,
        };
        let mut events = Vec::new();
        self.check_warning(&mut events);
        events
    }

    /// Emits one tick per whole second elapsed since the last poll.
    pub fn poll(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();

        while let TimerState::Running { next_tick } = self.state {
            if now < next_tick {
                break;
            }
            self.remaining = self.remaining.saturating_sub(1);
            events.push(TimerEvent::Tick(self.remaining));

            if self.remaining == 0 {
                events.extend(self.expire());
                break;
            }
            self.check_warning(&mut events);
            self.state = TimerState::Running {
                next_tick: next_tick + TICK,
            };
        }

        if events.len() > 1 {
            debug!(ticks = events.len(), "countdown caught up after a late poll");
        }
        events
    }

    /// Discards the timer handle. No further ticks or expiry are produced.
    pub fn stop(&mut self) {
        if matches!(self.state, TimerState::Idle | TimerState::Running { .. }) {
            self.state = TimerState::Stopped;
        }
    }

    fn expire(&mut self) -> Option<TimerEvent> {
        if self.state == TimerState::Expired {
            return None;
        }
        self.state = TimerState::Expired;
        info!("countdown expired");
        Some(TimerEvent::TimeExpired)
    }

    fn check_warning(&mut self, events: &mut Vec<TimerEvent>) {
        if !self.warned && self.remaining > 0 && self.remaining <= WARNING_THRESHOLD_SECS {
            self.warned = true;
            events.push(TimerEvent::TwoMinuteWarning);
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            TimerState::Running { next_tick } => Some(next_tick),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        format_remaining(self.remaining)
    }
}

/// `mm:ss`, or `h:mm:ss` once there are hours left.
pub fn format_remaining(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Elapsed time on the result view: `m:ss`, or `h:mm:ss`.
pub fn format_elapsed(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
