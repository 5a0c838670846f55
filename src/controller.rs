//! The timed session: countdown, integrity monitor, autosave, progress and
//! slides, wired together behind a single finish choke point.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::autosave::{AutosavePipeline, FlushTrigger};
use crate::clock::Clock;
use crate::config::SessionDocument;
use crate::evaluate::EvaluateControl;
use crate::gateway::{Evaluation, Gateway, GatewayEvent};
use crate::integrity::{InputEvent, IntegrityMonitor, PastePolicy, Verdict};
use crate::model::{
    AnswerState, FieldId, OptionId, Question, QuestionId, SessionKind, TextField,
    ViolationCounters,
};
use crate::navigator::SlideNavigator;
use crate::progress::{Progress, ProgressTracker};
use crate::timer::{CountdownTimer, TimerEvent, PLACEHOLDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    /// Finish request sent, waiting for the server.
    Finishing,
    Finished { accepted: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishTrigger {
    TimeExpired,
    UserSubmit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveStatus {
    Idle,
    Sending { sequence: u64 },
    Saved { sequence: u64 },
    Failed { sequence: u64, reason: String },
}

/// What the front-end should react to after a poll or a gateway completion.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Tick(u64),
    TwoMinuteWarning,
    FinishStarted(FinishTrigger),
    Finished { accepted: bool },
    AutosaveSaved { sequence: u64 },
    AutosaveFailed { sequence: u64 },
    ProgressRefreshed(Progress),
    EvaluationRefreshed(Evaluation),
    EvaluationFailed(String),
}

pub struct SessionController {
    id: String,
    title: String,
    kind: SessionKind,
    clock: Clock,
    gateway: Box<dyn Gateway>,
    timer: CountdownTimer,
    initial_seconds: u64,
    monitor: IntegrityMonitor,
    pipeline: AutosavePipeline,
    progress: ProgressTracker,
    navigator: SlideNavigator,
    questions: Vec<Question>,
    fields: Vec<TextField>,
    phase: SessionPhase,
    finish_trigger: Option<FinishTrigger>,
    finished_at: Option<DateTime<Utc>>,
    evaluate: EvaluateControl,
    autosave_status: AutosaveStatus,
    torn_down: bool,
    notices: Vec<SessionNotice>,
}

impl SessionController {
    /// Wires a session from the document. Returns `None` when the document
    /// carries no session block.
    pub fn mount(doc: &SessionDocument, clock: Clock, gateway: Box<dyn Gateway>) -> Option<Self> {
        let Some(config) = doc.session.as_ref() else {
            debug!("no session block; controller not mounted");
            return None;
        };

        let answers = config.restored_answers();
        let mut pipeline = AutosavePipeline::new(answers, config.timing());
        let monitor = IntegrityMonitor::new(config.monitored_surfaces(), config.bypass_allowed());
        let required = config.fields.iter().map(|f| f.id.clone()).collect();
        let mut progress = ProgressTracker::new(config.total_units(), required);
        progress.recompute(pipeline.answers());

        let slides = match config.kind {
            SessionKind::Choice => config.questions.len(),
            SessionKind::FreeText => 1,
        };

        let now = clock.now();
        pipeline.start(now);

        let mut controller = Self {
            id: config.id.clone(),
            title: doc.title().to_string(),
            kind: config.kind,
            clock,
            gateway,
            timer: CountdownTimer::new(),
            initial_seconds: config.remaining_seconds,
            monitor,
            pipeline,
            progress,
            navigator: SlideNavigator::new(slides),
            questions: config.questions.clone(),
            fields: config.fields.clone(),
            phase: SessionPhase::Active,
            finish_trigger: None,
            finished_at: None,
            evaluate: EvaluateControl::new(config.eval_url.is_some()),
            autosave_status: AutosaveStatus::Idle,
            torn_down: false,
            notices: Vec::new(),
        };

        info!(
            session = %controller.id,
            kind = ?controller.kind,
            remaining = config.remaining_seconds,
            total_units = controller.progress.current().total,
            "session mounted"
        );

        let events = controller.timer.start(config.remaining_seconds, now);
        controller.apply_timer_events(events);
        Some(controller)
    }

    /// Advances the timer and autosave deadlines to the current clock time.
    pub fn poll(&mut self) -> Vec<SessionNotice> {
        let now = self.clock.now();
        if self.phase == SessionPhase::Active {
            if let Some(trigger) = self.pipeline.poll(now, self.gateway.as_ref()) {
                self.note_dispatch(trigger);
            }
            let events = self.timer.poll(now);
            self.apply_timer_events(events);
        }
        std::mem::take(&mut self.notices)
    }

    fn apply_timer_events(&mut self, events: Vec<TimerEvent>) {
        for event in events {
            match event {
                TimerEvent::Tick(remaining) => self.notices.push(SessionNotice::Tick(remaining)),
                TimerEvent::TwoMinuteWarning => self.notices.push(SessionNotice::TwoMinuteWarning),
                TimerEvent::TimeExpired => {
                    self.finish(FinishTrigger::TimeExpired);
                }
            }
        }
    }

    fn note_dispatch(&mut self, trigger: FlushTrigger) {
        let sequence = self.pipeline.sequence();
        debug!(sequence, ?trigger, "autosave in flight");
        self.autosave_status = AutosaveStatus::Sending { sequence };
    }

    /// Runs a raw input event through the integrity monitor.
    ///
    /// Once the session is no longer active every event is cancelled and
    /// nothing is counted.
    pub fn handle_input(&mut self, surface: &FieldId, event: &InputEvent) -> Verdict {
        if self.phase != SessionPhase::Active {
            return Verdict::Cancelled;
        }
        self.monitor
            .inspect(surface, event, self.pipeline.counters_mut())
    }

    /// Stores the new text of a field after an approved edit.
    pub fn edit_text(&mut self, field: &FieldId, text: &str) -> bool {
        if self.phase != SessionPhase::Active || !self.pipeline.set_text(field, text) {
            return false;
        }
        self.after_change();
        true
    }

    pub fn select_answer(&mut self, question: QuestionId, option: OptionId) -> bool {
        if self.phase != SessionPhase::Active {
            return false;
        }
        let known = self
            .questions
            .iter()
            .any(|q| q.id == question && q.has_option(option));
        if !known {
            warn!(%question, %option, "selection for unknown question or option ignored");
            return false;
        }
        if !self.pipeline.select(question, option) {
            return false;
        }
        self.after_change();
        true
    }

    fn after_change(&mut self) {
        self.progress.recompute(self.pipeline.answers());
        self.pipeline.record_change(self.clock.now());
    }

    pub fn next_slide(&mut self) -> usize {
        self.navigator.next()
    }

    pub fn prev_slide(&mut self) -> usize {
        self.navigator.prev()
    }

    pub fn show_slide(&mut self, index: usize) -> usize {
        self.navigator.show(index)
    }

    /// User-initiated finish. Returns false when the session already ended.
    pub fn submit(&mut self) -> bool {
        self.finish(FinishTrigger::UserSubmit)
    }

    fn finish(&mut self, trigger: FinishTrigger) -> bool {
        if self.phase != SessionPhase::Active {
            debug!(?trigger, phase = ?self.phase, "finish ignored");
            return false;
        }
        self.phase = SessionPhase::Finishing;
        self.finish_trigger = Some(trigger);
        self.timer.stop();

        let submission = self.pipeline.final_submission();
        self.pipeline.stop();
        info!(session = %self.id, ?trigger, "finishing session");
        self.gateway.finish(submission);
        self.notices.push(SessionNotice::FinishStarted(trigger));
        true
    }

    pub fn handle_gateway_event(&mut self, event: GatewayEvent) -> Option<SessionNotice> {
        match event {
            GatewayEvent::AutosaveAcked { sequence, ok } => {
                if self.is_latest(sequence) {
                    self.autosave_status = AutosaveStatus::Saved { sequence };
                }
                if self.kind == SessionKind::Choice && ok == Some(true) {
                    let progress = self.progress.recompute(self.pipeline.answers());
                    debug!(sequence, answered = progress.answered, "progress refreshed after save");
                    return Some(SessionNotice::ProgressRefreshed(progress));
                }
                Some(SessionNotice::AutosaveSaved { sequence })
            }
            GatewayEvent::AutosaveFailed { sequence, reason } => {
                warn!(sequence, %reason, "autosave failed; next flush will retry");
                if self.is_latest(sequence) {
                    self.autosave_status = AutosaveStatus::Failed { sequence, reason };
                }
                Some(SessionNotice::AutosaveFailed { sequence })
            }
            GatewayEvent::FinishCompleted(result) => {
                if self.phase != SessionPhase::Finishing {
                    return None;
                }
                let accepted = match result {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "finish request failed");
                        false
                    }
                };
                let at = Utc::now();
                self.phase = SessionPhase::Finished { accepted };
                self.finished_at = Some(at);
                info!(session = %self.id, accepted, finished_at = %at.to_rfc3339(), "session finished");
                Some(SessionNotice::Finished { accepted })
            }
            GatewayEvent::EvaluateCompleted(result) => Some(self.evaluate.complete(result)),
        }
    }

    fn is_latest(&self, sequence: u64) -> bool {
        match &self.autosave_status {
            AutosaveStatus::Idle => true,
            AutosaveStatus::Sending { sequence: s }
            | AutosaveStatus::Saved { sequence: s }
            | AutosaveStatus::Failed { sequence: s, .. } => sequence >= *s,
        }
    }

    /// Starts an evaluation request. The trigger stays disabled until the
    /// outcome arrives.
    pub fn evaluate_now(&mut self) -> bool {
        let started = self.evaluate.start(self.gateway.as_ref());
        if started {
            info!(session = %self.id, "evaluation requested");
        }
        started
    }

    pub fn can_evaluate(&self) -> bool {
        self.evaluate.can_start()
    }

    /// Sends a last best-effort autosave and stops all scheduling. No write
    /// happens once the session has finished.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.timer.stop();
        if self.phase == SessionPhase::Active {
            self.pipeline.flush_on_teardown(self.gateway.as_ref());
            self.note_dispatch(FlushTrigger::Teardown);
        }
    }

    pub fn in_flight_requests(&self) -> usize {
        self.gateway.in_flight()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn finish_trigger(&self) -> Option<FinishTrigger> {
        self.finish_trigger
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.timer.remaining_seconds()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.initial_seconds
            .saturating_sub(self.timer.remaining_seconds())
    }

    /// Countdown text. The last value stays visible while the finish request
    /// runs; the result view gets the placeholder.
    pub fn timer_display(&self) -> String {
        match self.phase {
            SessionPhase::Active | SessionPhase::Finishing => self.timer.display(),
            SessionPhase::Finished { .. } => PLACEHOLDER.to_string(),
        }
    }

    pub fn progress(&self) -> Progress {
        self.progress.current()
    }

    pub fn navigator(&self) -> &SlideNavigator {
        &self.navigator
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.navigator.position())
    }

    pub fn fields(&self) -> &[TextField] {
        &self.fields
    }

    pub fn answers(&self) -> &AnswerState {
        self.pipeline.answers()
    }

    pub fn counters(&self) -> ViolationCounters {
        self.pipeline.counters()
    }

    pub fn paste_policy(&self) -> PastePolicy {
        self.monitor.policy()
    }

    pub fn autosave_status(&self) -> &AutosaveStatus {
        &self.autosave_status
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.pipeline.is_dirty()
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluate.last()
    }

    pub fn evaluation_error(&self) -> Option<&str> {
        self.evaluate.last_error()
    }

    pub fn evaluation_available(&self) -> bool {
        self.evaluate.is_available()
    }

    pub fn evaluation_in_flight(&self) -> bool {
        self.evaluate.in_flight()
    }
}
