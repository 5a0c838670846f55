//! Debounced, coalescing autosave.
//!
//! Edits only mark the state dirty and re-arm a quiet-window deadline; the
//! write happens when the deadline passes, so a burst of edits produces a
//! single request. A periodic flush fires regardless of edits, and a final
//! flush is started on teardown. Every write carries the whole answer state
//! plus the integrity counters, which makes any write a valid replacement for
//! an earlier one still in flight.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::gateway::{FinalSubmission, Gateway};
use crate::model::{AnswerState, FieldId, OptionId, QuestionId, SessionKind, ViolationCounters};

pub const CHOICE_DEBOUNCE: Duration = Duration::from_millis(200);
pub const FREE_TEXT_DEBOUNCE: Duration = Duration::from_millis(400);
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveTiming {
    pub debounce: Duration,
    pub flush_interval: Duration,
}

impl AutosaveTiming {
    pub fn for_kind(kind: SessionKind) -> Self {
        let debounce = match kind {
            SessionKind::Choice => CHOICE_DEBOUNCE,
            SessionKind::FreeText => FREE_TEXT_DEBOUNCE,
        };
        Self {
            debounce,
            flush_interval: FLUSH_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Debounce,
    Periodic,
    Teardown,
}

/// One self-contained autosave write.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub sequence: u64,
    pub trigger: FlushTrigger,
    pub payload: Payload,
}

/// JSON body of an autosave request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Choice(ChoicePayload),
    FreeText(FreeTextPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoicePayload {
    pub question_id: Option<QuestionId>,
    pub answer_id: Option<OptionId>,
    pub answers: BTreeMap<QuestionId, OptionId>,
    pub keypress_count: u64,
    pub paste_event: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeTextPayload {
    /// Keyed as `<field>_text`.
    #[serde(flatten)]
    pub texts: BTreeMap<String, String>,
    pub keypress_count: u64,
    pub paste_event: u64,
}

impl Payload {
    pub fn counters(&self) -> ViolationCounters {
        let (keypress_count, paste_event_count) = match self {
            Payload::Choice(p) => (p.keypress_count, p.paste_event),
            Payload::FreeText(p) => (p.keypress_count, p.paste_event),
        };
        ViolationCounters {
            keypress_count,
            paste_event_count,
        }
    }
}

/// Owned, cancellable debounce deadline. Replacing it cancels the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DebounceHandle {
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct AutosavePipeline {
    answers: AnswerState,
    counters: ViolationCounters,
    last_selection: Option<(QuestionId, OptionId)>,
    timing: AutosaveTiming,
    debounce: Option<DebounceHandle>,
    next_periodic: Option<Instant>,
    dirty: bool,
    sequence: u64,
    stopped: bool,
}

impl AutosavePipeline {
    pub fn new(answers: AnswerState, timing: AutosaveTiming) -> Self {
        Self {
            answers,
            counters: ViolationCounters::default(),
            last_selection: None,
            timing,
            debounce: None,
            next_periodic: None,
            dirty: false,
            sequence: 0,
            stopped: false,
        }
    }

    /// Arms the periodic flush.
    pub fn start(&mut self, now: Instant) {
        if !self.stopped {
            self.next_periodic = Some(now + self.timing.flush_interval);
        }
    }

    pub fn answers(&self) -> &AnswerState {
        &self.answers
    }

    pub fn counters(&self) -> ViolationCounters {
        self.counters
    }

    pub(crate) fn counters_mut(&mut self) -> &mut ViolationCounters {
        &mut self.counters
    }

    pub fn timing(&self) -> AutosaveTiming {
        self.timing
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Sequence number of the most recent snapshot; 0 before the first.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce.map(|h| h.deadline)
    }

    pub fn next_periodic_flush(&self) -> Option<Instant> {
        self.next_periodic
    }

    pub fn select(&mut self, question: QuestionId, option: OptionId) -> bool {
        if self.stopped || !self.answers.select(question, option) {
            return false;
        }
        self.last_selection = Some((question, option));
        true
    }

    pub fn set_text(&mut self, field: &FieldId, text: &str) -> bool {
        !self.stopped && self.answers.set_text(field, text)
    }

    /// Marks the state dirty and restarts the quiet window.
    pub fn record_change(&mut self, now: Instant) {
        if self.stopped {
            return;
        }
        self.dirty = true;
        let replaced = self.debounce.replace(DebounceHandle {
            deadline: now + self.timing.debounce,
        });
        if replaced.is_some() {
            debug!("debounce re-armed; previous pending save cancelled");
        }
    }

    /// Sends at most one snapshot if the debounce or periodic deadline has
    /// passed. Returns what triggered the write.
    pub fn poll(&mut self, now: Instant, gateway: &dyn Gateway) -> Option<FlushTrigger> {
        if self.stopped {
            return None;
        }

        let mut trigger = None;
        if let Some(handle) = self.debounce {
            if now >= handle.deadline {
                trigger = Some(FlushTrigger::Debounce);
            }
        }
        if let Some(at) = self.next_periodic {
            if now >= at {
                let next = at + self.timing.flush_interval;
                self.next_periodic = Some(if next > now {
                    next
                } else {
                    now + self.timing.flush_interval
                });
                trigger.get_or_insert(FlushTrigger::Periodic);
            }
        }

        let trigger = trigger?;
        self.send(trigger, gateway);
        Some(trigger)
    }

    /// Starts the final best-effort write and stops all scheduling.
    pub fn flush_on_teardown(&mut self, gateway: &dyn Gateway) {
        if self.stopped {
            return;
        }
        self.send(FlushTrigger::Teardown, gateway);
        self.stop();
    }

    /// Cancels pending timers; nothing is written afterwards.
    pub fn stop(&mut self) {
        self.debounce = None;
        self.next_periodic = None;
        self.stopped = true;
    }

    fn send(&mut self, trigger: FlushTrigger, gateway: &dyn Gateway) {
        // The snapshot carries the full state, so a pending debounce is moot.
        self.debounce = None;
        self.dirty = false;
        let snapshot = self.snapshot(trigger);
        debug!(
            sequence = snapshot.sequence,
            ?trigger,
            "autosave snapshot dispatched"
        );
        gateway.autosave(snapshot);
    }

    pub fn snapshot(&mut self, trigger: FlushTrigger) -> Snapshot {
        self.sequence += 1;
        let payload = match &self.answers {
            AnswerState::Choice(answers) => Payload::Choice(ChoicePayload {
                question_id: self.last_selection.map(|(q, _)| q),
                answer_id: self.last_selection.map(|(_, o)| o),
                answers: answers.clone(),
                keypress_count: self.counters.keypress_count,
                paste_event: self.counters.paste_event_count,
            }),
            AnswerState::FreeText(texts) => Payload::FreeText(FreeTextPayload {
                texts: texts
                    .iter()
                    .map(|(field, text)| (format!("{}_text", field), text.clone()))
                    .collect(),
                keypress_count: self.counters.keypress_count,
                paste_event: self.counters.paste_event_count,
            }),
        };
        Snapshot {
            sequence: self.sequence,
            trigger,
            payload,
        }
    }

    /// Form fields for the finish request.
    pub fn final_submission(&self) -> FinalSubmission {
        let mut fields: Vec<(String, String)> = match &self.answers {
            AnswerState::Choice(answers) => answers
                .iter()
                .map(|(q, o)| (format!("answer_{}", q), o.to_string()))
                .collect(),
            AnswerState::FreeText(texts) => texts
                .iter()
                .map(|(field, text)| (field.to_string(), text.clone()))
                .collect(),
        };
        if self.answers.kind() == SessionKind::Choice {
            fields.push(("finish_now".to_string(), "1".to_string()));
        }
        FinalSubmission { fields }
    }
}
