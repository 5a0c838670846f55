//! "Evaluate now": at most one request in flight, and the trigger stays
//! disabled until its outcome arrives.

use tracing::{debug, info, warn};

use crate::config::{ResultConfig, SessionDocument};
use crate::controller::SessionNotice;
use crate::error::GatewayError;
use crate::gateway::{Evaluation, Gateway, GatewayEvent};

#[derive(Debug, Clone, Default)]
pub struct EvaluateControl {
    available: bool,
    in_flight: bool,
    last: Option<Evaluation>,
    last_error: Option<String>,
}

impl EvaluateControl {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }

    pub fn can_start(&self) -> bool {
        self.available && !self.in_flight
    }

    /// Issues one request. Returns false while disabled.
    pub fn start(&mut self, gateway: &dyn Gateway) -> bool {
        if !self.can_start() {
            return false;
        }
        self.in_flight = true;
        gateway.evaluate();
        true
    }

    /// Re-enables the trigger and keeps the outcome for display.
    pub fn complete(&mut self, result: Result<Evaluation, GatewayError>) -> SessionNotice {
        self.in_flight = false;
        match result {
            Ok(evaluation) => {
                info!(status = ?evaluation.status, total = ?evaluation.total, "evaluation refreshed");
                self.last = Some(evaluation.clone());
                self.last_error = None;
                SessionNotice::EvaluationRefreshed(evaluation)
            }
            Err(e) => {
                warn!(error = %e, "evaluation failed");
                let reason = e.to_string();
                self.last_error = Some(reason.clone());
                SessionNotice::EvaluationFailed(reason)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last(&self) -> Option<&Evaluation> {
        self.last.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// A session that already ended: the summary plus the evaluate action.
pub struct ResultSession {
    result: ResultConfig,
    gateway: Box<dyn Gateway>,
    control: EvaluateControl,
}

impl ResultSession {
    /// Mounts only for documents that carry a result and no live session.
    pub fn mount(doc: &SessionDocument, gateway: Box<dyn Gateway>) -> Option<Self> {
        if doc.session.is_some() {
            return None;
        }
        let result = doc.result.clone()?;
        let control = EvaluateControl::new(result.eval_url.is_some());
        Some(Self {
            result,
            gateway,
            control,
        })
    }

    pub fn result(&self) -> &ResultConfig {
        &self.result
    }

    pub fn evaluate_now(&mut self) -> bool {
        let started = self.control.start(self.gateway.as_ref());
        if started {
            info!("evaluation requested for finished session");
        }
        started
    }

    pub fn can_evaluate(&self) -> bool {
        self.control.can_start()
    }

    pub fn handle_gateway_event(&mut self, event: GatewayEvent) -> Option<SessionNotice> {
        match event {
            GatewayEvent::EvaluateCompleted(result) => Some(self.control.complete(result)),
            other => {
                debug!(event = ?other, "ignored by finished session");
                None
            }
        }
    }

    pub fn is_evaluating(&self) -> bool {
        self.control.in_flight()
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.control.last()
    }

    pub fn evaluation_error(&self) -> Option<&str> {
        self.control.last_error()
    }

    pub fn in_flight_requests(&self) -> usize {
        self.gateway.in_flight()
    }
}
