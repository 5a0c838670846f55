mod common;

use common::{load_fixture, RecordingGateway};
use termsession::config::SessionDocument;
use termsession::controller::SessionNotice;
use termsession::error::GatewayError;
use termsession::evaluate::ResultSession;
use termsession::gateway::{Evaluation, GatewayEvent};

const FINISHED: &str = r#"result:
  elapsed_seconds: 754
  answered: 28
  total: 30
  eval_url: "https://tests.example.org/evaluate/"
"#;

fn mount_result(yaml: &str) -> (ResultSession, RecordingGateway) {
    let doc = SessionDocument::from_yaml(yaml).unwrap();
    let gateway = RecordingGateway::new();
    let session = ResultSession::mount(&doc, Box::new(gateway.clone()))
        .expect("document only carries a result");
    (session, gateway)
}

fn graded(total: f64) -> Evaluation {
    Evaluation {
        ok: Some(true),
        status: Some("graded".to_string()),
        total: Some(total),
    }
}

#[test]
fn live_session_does_not_mount_as_result() {
    let doc = load_fixture("iq_session.yaml");
    assert!(ResultSession::mount(&doc, Box::new(RecordingGateway::new())).is_none());
}

#[test]
fn document_without_result_does_not_mount() {
    let doc = SessionDocument::from_yaml("{}").unwrap();
    assert!(ResultSession::mount(&doc, Box::new(RecordingGateway::new())).is_none());
}

#[test]
fn evaluate_unavailable_without_url() {
    let doc = load_fixture("result_only.yaml");
    let gateway = RecordingGateway::new();
    let mut session = ResultSession::mount(&doc, Box::new(gateway.clone())).unwrap();

    assert!(!session.can_evaluate());
    assert!(!session.evaluate_now());
    assert_eq!(gateway.evaluations(), 0);
    assert_eq!(session.result().answered, 28);
}

#[test]
fn evaluate_is_gated_while_in_flight() {
    let (mut session, gateway) = mount_result(FINISHED);

    assert!(session.evaluate_now());
    assert!(session.is_evaluating());
    assert!(!session.can_evaluate());
    assert!(!session.evaluate_now());
    assert_eq!(gateway.evaluations(), 1);

    let notice = session.handle_gateway_event(GatewayEvent::EvaluateCompleted(Ok(graded(27.0))));
    assert_eq!(notice, Some(SessionNotice::EvaluationRefreshed(graded(27.0))));
    assert!(session.can_evaluate());
    assert_eq!(session.evaluation(), Some(&graded(27.0)));
    assert_eq!(session.evaluation_error(), None);
}

#[test]
fn evaluate_reenables_after_failure() {
    let (mut session, gateway) = mount_result(FINISHED);

    session.evaluate_now();
    let notice = session.handle_gateway_event(GatewayEvent::EvaluateCompleted(Err(
        GatewayError::InvalidBody {
            endpoint: "evaluate",
        },
    )));
    assert_eq!(
        notice,
        Some(SessionNotice::EvaluationFailed(
            "evaluate response is not valid JSON".to_string()
        ))
    );
    assert!(session.can_evaluate());
    assert_eq!(
        session.evaluation_error(),
        Some("evaluate response is not valid JSON")
    );

    assert!(session.evaluate_now());
    session.handle_gateway_event(GatewayEvent::EvaluateCompleted(Ok(graded(41.5))));
    assert_eq!(gateway.evaluations(), 2);
    assert_eq!(session.evaluation_error(), None);
    assert_eq!(session.evaluation().and_then(|e| e.total), Some(41.5));
}

#[test]
fn session_events_are_ignored_after_the_end() {
    let (mut session, gateway) = mount_result(FINISHED);

    let notice = session.handle_gateway_event(GatewayEvent::FinishCompleted(Ok(())));
    assert_eq!(notice, None);
    assert!(session.can_evaluate());
    assert!(gateway.calls().is_empty());
}
