//! Remote collaborators: autosave, finish and evaluate endpoints.
//!
//! Every method returns immediately. Outcomes arrive later as
//! [`GatewayEvent`]s on the channel handed to the gateway, and the front-end
//! loop feeds them back into the controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::autosave::Snapshot;
use crate::error::GatewayError;

pub const CSRF_HEADER: &str = "X-CSRFToken";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Form fields of the finish request, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalSubmission {
    pub fields: Vec<(String, String)>,
}

impl FinalSubmission {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parsed evaluate response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
}

#[derive(Debug)]
pub enum GatewayEvent {
    /// 2xx autosave response. `ok` is the `ok` flag of the JSON body, if any.
    AutosaveAcked { sequence: u64, ok: Option<bool> },
    AutosaveFailed { sequence: u64, reason: String },
    FinishCompleted(Result<(), GatewayError>),
    EvaluateCompleted(Result<Evaluation, GatewayError>),
}

pub trait Gateway {
    /// Best-effort write. Failures are reported but never retried here.
    fn autosave(&self, snapshot: Snapshot);

    fn finish(&self, submission: FinalSubmission);

    fn evaluate(&self);

    /// Requests started but not yet reported back.
    fn in_flight(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub autosave: Option<Url>,
    pub finish: Option<Url>,
    pub evaluate: Option<Url>,
    pub csrf_token: String,
}

/// Sends each request from its own short-lived thread with a blocking client.
pub struct HttpGateway {
    client: Client,
    endpoints: Arc<Endpoints>,
    tx: mpsc::Sender<GatewayEvent>,
    pending: Arc<AtomicUsize>,
}

impl HttpGateway {
    pub fn new(endpoints: Endpoints, tx: mpsc::Sender<GatewayEvent>) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoints: Arc::new(endpoints),
            tx,
            pending: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn spawn<F>(&self, name: &'static str, job: F)
    where
        F: FnOnce(&Client, &Endpoints) -> GatewayEvent + Send + 'static,
    {
        let client = self.client.clone();
        let endpoints = Arc::clone(&self.endpoints);
        let tx = self.tx.clone();
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("gateway-{}", name))
            .spawn(move || {
                let event = job(&client, &endpoints);
                pending.fetch_sub(1, Ordering::SeqCst);
                deliver(&tx, event);
            });
        if let Err(e) = spawned {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(request = name, error = %e, "cannot spawn request thread");
        }
    }
}

impl Gateway for HttpGateway {
    fn autosave(&self, snapshot: Snapshot) {
        let Some(url) = self.endpoints.autosave.clone() else {
            deliver(
                &self.tx,
                GatewayEvent::AutosaveFailed {
                    sequence: snapshot.sequence,
                    reason: GatewayError::NotConfigured("autosave").to_string(),
                },
            );
            return;
        };
        self.spawn("autosave", move |client, endpoints| {
            let sequence = snapshot.sequence;
            let sent = client
                .post(url)
                .header(CSRF_HEADER, &endpoints.csrf_token)
                .json(&snapshot.payload)
                .send();
            match sent.map_err(GatewayError::from).and_then(|r| ensure_success("autosave", r)) {
                Ok(response) => {
                    let ok = response
                        .json::<serde_json::Value>()
                        .ok()
                        .and_then(|body| body.get("ok").and_then(serde_json::Value::as_bool));
                    GatewayEvent::AutosaveAcked { sequence, ok }
                }
                Err(e) => GatewayEvent::AutosaveFailed {
                    sequence,
                    reason: e.to_string(),
                },
            }
        });
    }

    fn finish(&self, submission: FinalSubmission) {
        let Some(url) = self.endpoints.finish.clone() else {
            deliver(
                &self.tx,
                GatewayEvent::FinishCompleted(Err(GatewayError::NotConfigured("finish"))),
            );
            return;
        };
        info!(fields = submission.fields.len(), "posting finish form");
        self.spawn("finish", move |client, endpoints| {
            let result = client
                .post(url)
                .header(CSRF_HEADER, &endpoints.csrf_token)
                .form(&submission.fields)
                .send()
                .map_err(GatewayError::from)
                .and_then(|r| ensure_success("finish", r))
                .map(|_| ());
            GatewayEvent::FinishCompleted(result)
        });
    }

    fn evaluate(&self) {
        let Some(url) = self.endpoints.evaluate.clone() else {
            deliver(
                &self.tx,
                GatewayEvent::EvaluateCompleted(Err(GatewayError::NotConfigured("evaluate"))),
            );
            return;
        };
        self.spawn("evaluate", move |client, endpoints| {
            let result = client
                .post(url)
                .header(CSRF_HEADER, &endpoints.csrf_token)
                .send()
                .map_err(GatewayError::from)
                .and_then(|r| ensure_success("evaluate", r))
                .and_then(|r| {
                    r.json::<Evaluation>()
                        .map_err(|_| GatewayError::InvalidBody { endpoint: "evaluate" })
                });
            GatewayEvent::EvaluateCompleted(result)
        });
    }

    fn in_flight(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

fn ensure_success(endpoint: &'static str, response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GatewayError::HttpStatus { endpoint, status })
    }
}

/// Hands a completion to the front-end loop. Once the loop is gone there is
/// nobody left to tell, so the event is only logged.
fn deliver(tx: &mpsc::Sender<GatewayEvent>, event: GatewayEvent) {
    if let Err(mpsc::SendError(event)) = tx.send(event) {
        debug!(?event, "receiver gone; completion dropped");
    }
}

/// Logs every request and acknowledges it without touching the network.
pub struct DryRunGateway {
    tx: mpsc::Sender<GatewayEvent>,
}

impl DryRunGateway {
    pub fn new(tx: mpsc::Sender<GatewayEvent>) -> Self {
        Self { tx }
    }
}

impl Gateway for DryRunGateway {
    fn autosave(&self, snapshot: Snapshot) {
        match serde_json::to_string(&snapshot.payload) {
            Ok(body) => debug!(sequence = snapshot.sequence, %body, "dry-run autosave"),
            Err(e) => warn!(error = %e, "cannot encode autosave payload"),
        }
        deliver(
            &self.tx,
            GatewayEvent::AutosaveAcked {
                sequence: snapshot.sequence,
                ok: Some(true),
            },
        );
    }

    fn finish(&self, submission: FinalSubmission) {
        info!(fields = ?submission.fields, "dry-run finish");
        deliver(&self.tx, GatewayEvent::FinishCompleted(Ok(())));
    }

    fn evaluate(&self) {
        info!("dry-run evaluate");
        let evaluation = Evaluation {
            ok: Some(true),
            status: Some("dry run".to_string()),
            total: None,
        };
        deliver(&self.tx, GatewayEvent::EvaluateCompleted(Ok(evaluation)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::{AutosavePipeline, AutosaveTiming, FlushTrigger};
    use crate::model::{AnswerState, SessionKind};

    #[test]
    fn dry_run_acknowledges_every_request() {
        let (tx, rx) = mpsc::channel();
        let gateway = DryRunGateway::new(tx);
        let mut pipeline = AutosavePipeline::new(
            AnswerState::empty(SessionKind::Choice),
            AutosaveTiming::for_kind(SessionKind::Choice),
        );

        gateway.autosave(pipeline.snapshot(FlushTrigger::Periodic));
        gateway.finish(pipeline.final_submission());
        gateway.evaluate();

        assert!(matches!(
            rx.try_recv(),
            Ok(GatewayEvent::AutosaveAcked { sequence: 1, ok: Some(true) })
        ));
        assert!(matches!(rx.try_recv(), Ok(GatewayEvent::FinishCompleted(Ok(())))));
        assert!(matches!(rx.try_recv(), Ok(GatewayEvent::EvaluateCompleted(Ok(_)))));
        assert_eq!(gateway.in_flight(), 0);
    }

    #[test]
    fn dry_run_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let gateway = DryRunGateway::new(tx);

        gateway.evaluate();
        gateway.finish(FinalSubmission { fields: Vec::new() });
        assert_eq!(gateway.in_flight(), 0);
    }

    #[test]
    fn result_only_endpoints_refuse_session_writes() {
        let (tx, rx) = mpsc::channel();
        let endpoints = Endpoints {
            autosave: None,
            finish: None,
            evaluate: None,
            csrf_token: String::new(),
        };
        let gateway = HttpGateway::new(endpoints, tx).unwrap();
        let mut pipeline = AutosavePipeline::new(
            AnswerState::empty(SessionKind::Choice),
            AutosaveTiming::for_kind(SessionKind::Choice),
        );

        gateway.autosave(pipeline.snapshot(FlushTrigger::Teardown));
        gateway.finish(pipeline.final_submission());
        gateway.evaluate();

        match rx.try_recv() {
            Ok(GatewayEvent::AutosaveFailed { sequence, reason }) => {
                assert_eq!(sequence, 1);
                assert_eq!(reason, "autosave endpoint is not configured");
            }
            other => panic!("expected autosave failure, got {:?}", other),
        }
        assert!(matches!(
            rx.try_recv(),
            Ok(GatewayEvent::FinishCompleted(Err(GatewayError::NotConfigured("finish"))))
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(GatewayEvent::EvaluateCompleted(Err(GatewayError::NotConfigured("evaluate"))))
        ));
        assert_eq!(gateway.in_flight(), 0);
    }

    #[test]
    fn submission_lookup_by_name() {
        let submission = FinalSubmission {
            fields: vec![
                ("answer_3".to_string(), "31".to_string()),
                ("finish_now".to_string(), "1".to_string()),
            ],
        };
        assert_eq!(submission.get("answer_3"), Some("31"));
        assert_eq!(submission.get("answer_4"), None);
    }

    #[test]
    fn evaluation_ignores_unknown_fields() {
        let parsed: Evaluation =
            serde_json::from_str(r#"{"ok": true, "status": "graded", "total": 41.5, "extra": 1}"#)
                .unwrap();
        assert_eq!(parsed.status.as_deref(), Some("graded"));
        assert_eq!(parsed.total, Some(41.5));
    }
}
