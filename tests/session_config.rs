mod common;

use std::path::Path;
use std::time::Duration;

use common::load_fixture;
use termsession::config::SessionDocument;
use termsession::error::ConfigError;
use termsession::model::{FieldId, QuestionId, SessionKind};
use termsession::gateway::Evaluation;
use termsession::report::{evaluation_line, summary_lines};

const ENDPOINTS: &str = r#"
  autosave_url: "https://tests.example.org/save/"
  finish_url: "https://tests.example.org/finish/"
"#;

fn choice_doc(extra: &str, questions: &str) -> String {
    format!(
        "session:\n  id: s1\n  kind: choice\n  remaining_seconds: 60\n{}{}{}",
        ENDPOINTS.trim_start_matches('\n'),
        extra,
        questions
    )
}

const TWO_QUESTIONS: &str = r#"  questions:
    - id: 1
      text: "first"
      options:
        - id: 1
          text: "yes"
    - id: 2
      text: "second"
      options:
        - id: 2
          text: "no"
"#;

#[test]
fn iq_fixture_loads() {
    let doc = SessionDocument::load(Path::new("fixtures/iq_session.yaml")).unwrap();
    let session = doc.session.as_ref().unwrap();
    assert_eq!(doc.title(), "Numerical Reasoning, Part 1");
    assert_eq!(session.kind, SessionKind::Choice);
    assert_eq!(session.questions.len(), 30);
    assert_eq!(session.total_units(), 30);
    assert!(!session.bypass_allowed());

    let endpoints = session.endpoints().unwrap();
    assert_eq!(endpoints.csrf_token, "k3Jd9aQ0");
    assert!(endpoints.evaluate.is_some());
}

#[test]
fn missing_file_is_reported() {
    let err = SessionDocument::load(Path::new("fixtures/does_not_exist.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn timing_defaults_follow_session_kind() {
    let iq = load_fixture("iq_session.yaml");
    let practice = load_fixture("practice_session.yaml");
    let iq_timing = iq.session.unwrap().timing();
    let practice_timing = practice.session.unwrap().timing();

    assert_eq!(iq_timing.debounce, Duration::from_millis(200));
    assert_eq!(practice_timing.debounce, Duration::from_millis(400));
    assert_eq!(iq_timing.flush_interval, Duration::from_secs(8));
}

#[test]
fn timing_overrides_apply() {
    let yaml = choice_doc(
        "  timing:\n    debounce_ms: 50\n    flush_interval_secs: 0\n",
        TWO_QUESTIONS,
    );
    let doc = SessionDocument::from_yaml(&yaml).unwrap();
    let timing = doc.session.unwrap().timing();
    assert_eq!(timing.debounce, Duration::from_millis(50));
    // A zero interval would flush in a busy loop, so it is ignored.
    assert_eq!(timing.flush_interval, Duration::from_secs(8));
}

#[test]
fn debug_flag_allows_paste() {
    let yaml = choice_doc("  debug: true\n", TWO_QUESTIONS);
    let doc = SessionDocument::from_yaml(&yaml).unwrap();
    assert!(doc.session.unwrap().bypass_allowed());
}

#[test]
fn choice_session_without_questions_is_rejected() {
    let yaml = choice_doc("", "");
    let err = SessionDocument::from_yaml(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::NoQuestions));
}

#[test]
fn duplicate_question_is_rejected() {
    let questions = r#"  questions:
    - id: 4
      text: "a"
    - id: 4
      text: "b"
"#;
    let err = SessionDocument::from_yaml(&choice_doc("", questions)).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateQuestion(QuestionId(4))));
}

#[test]
fn restored_answer_must_reference_known_option() {
    let yaml = choice_doc("  answers:\n    1: 2\n", TWO_QUESTIONS);
    let err = SessionDocument::from_yaml(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownOption { .. }));

    let yaml = choice_doc("  answers:\n    7: 1\n", TWO_QUESTIONS);
    let err = SessionDocument::from_yaml(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownQuestion(QuestionId(7))));
}

#[test]
fn restored_answers_are_loaded() {
    let yaml = choice_doc("  answers:\n    1: 1\n", TWO_QUESTIONS);
    let doc = SessionDocument::from_yaml(&yaml).unwrap();
    let answers = doc.session.unwrap().restored_answers();
    assert_eq!(answers.selected(QuestionId(1)).map(|o| o.0), Some(1));
    assert_eq!(answers.selected(QuestionId(2)), None);
}

#[test]
fn free_text_session_needs_fields() {
    let yaml = format!(
        "session:\n  id: s2\n  kind: free_text\n  remaining_seconds: 60\n{}",
        ENDPOINTS.trim_start_matches('\n')
    );
    let err = SessionDocument::from_yaml(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::NoFields));
}

#[test]
fn endpoints_must_be_http() {
    let yaml = TWO_QUESTIONS.to_string();
    let doc = format!(
        "session:\n  id: s1\n  kind: choice\n  remaining_seconds: 60\n  autosave_url: \"ftp://tests.example.org/save/\"\n  finish_url: \"https://tests.example.org/finish/\"\n{}",
        yaml
    );
    let err = SessionDocument::from_yaml(&doc).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnsupportedScheme {
            field: "autosave_url",
            ..
        }
    ));

    let doc = format!(
        "session:\n  id: s1\n  kind: choice\n  remaining_seconds: 60\n  autosave_url: \"not a url\"\n  finish_url: \"https://tests.example.org/finish/\"\n{}",
        yaml
    );
    let err = SessionDocument::from_yaml(&doc).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { .. }));
}

#[test]
fn malformed_yaml_is_reported() {
    let err = SessionDocument::from_yaml("session: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn free_text_fixture_restores_field_text() {
    let doc = load_fixture("practice_session.yaml");
    let session = doc.session.as_ref().unwrap();
    let answers = session.restored_answers();
    assert_eq!(
        answers.text(&FieldId::new("resolution")),
        Some("I would start earlier.")
    );
    assert_eq!(answers.text(&FieldId::new("motivation")), Some(""));
    assert_eq!(session.monitored_surfaces().len(), 2);
    assert_eq!(session.fields[0].label(), "What motivated your approach?");
}

#[test]
fn summary_for_live_session() {
    let doc = load_fixture("iq_session.yaml");
    let lines = summary_lines(&doc);
    assert_eq!(
        lines,
        vec![
            "Session: Numerical Reasoning, Part 1",
            "Id: iq-2031",
            "Kind: multiple choice",
            "Time left: 25:00",
            "Questions: 30",
            "Progress: 0 / 30 (0%)",
            "Evaluation: available",
        ]
    );
}

#[test]
fn summary_for_finished_session() {
    let doc = load_fixture("result_only.yaml");
    assert!(doc.session.is_none());
    let lines = summary_lines(&doc);
    assert_eq!(
        lines,
        vec![
            "Session: Numerical Reasoning, Part 1",
            "Finished in: 12:34",
            "Answered: 28 / 30 (93%)",
            "Timer: --:--",
        ]
    );
}

#[test]
fn summary_percent_follows_answered_count() {
    let doc = SessionDocument::from_yaml("result:\n  elapsed_seconds: 61\n  answered: 12\n  total: 30\n").unwrap();
    let lines = summary_lines(&doc);
    assert!(lines.contains(&"Answered: 12 / 30 (40%)".to_string()));
    assert!(lines.contains(&"Finished in: 1:01".to_string()));
}

const RESULT_WITH_EVAL: &str = r#"result:
  elapsed_seconds: 754
  answered: 28
  total: 30
  eval_url: "https://tests.example.org/evaluate/"
  csrf_token: "k3Jd9aQ0"
"#;

#[test]
fn result_endpoints_only_reach_evaluate() {
    let doc = SessionDocument::from_yaml(RESULT_WITH_EVAL).unwrap();
    let endpoints = doc.result.as_ref().unwrap().endpoints().unwrap();
    assert!(endpoints.autosave.is_none());
    assert!(endpoints.finish.is_none());
    assert_eq!(
        endpoints.evaluate.map(|u| u.to_string()),
        Some("https://tests.example.org/evaluate/".to_string())
    );
    assert_eq!(endpoints.csrf_token, "k3Jd9aQ0");

    let lines = summary_lines(&doc);
    assert_eq!(lines.last().map(String::as_str), Some("Evaluation: available (--evaluate)"));
}

#[test]
fn result_eval_url_is_validated() {
    let yaml = RESULT_WITH_EVAL.replace("https://tests.example.org/evaluate/", "file:///tmp/eval");
    let err = SessionDocument::from_yaml(&yaml).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnsupportedScheme {
            field: "result.eval_url",
            ..
        }
    ));
}

#[test]
fn evaluation_lines() {
    let graded = Evaluation {
        ok: Some(true),
        status: Some("graded".to_string()),
        total: Some(41.5),
    };
    assert_eq!(evaluation_line(Ok(&graded)), "Evaluation: graded (total 41.5)");
    assert_eq!(evaluation_line(Ok(&Evaluation::default())), "Evaluation: received");
    assert_eq!(
        evaluation_line(Err("evaluate returned 502 Bad Gateway")),
        "Evaluation failed: evaluate returned 502 Bad Gateway"
    );
}
