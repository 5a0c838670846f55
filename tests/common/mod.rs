#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use termsession::autosave::Snapshot;
use termsession::clock::Clock;
use termsession::config::SessionDocument;
use termsession::controller::SessionController;
use termsession::gateway::{FinalSubmission, Gateway};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Autosave(Snapshot),
    Finish(FinalSubmission),
    Evaluate,
}

/// Gateway that records every request and never answers on its own.
#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn autosaves(&self) -> Vec<Snapshot> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Autosave(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn finishes(&self) -> Vec<FinalSubmission> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Finish(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn evaluations(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| **c == Call::Evaluate)
            .count()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl Gateway for RecordingGateway {
    fn autosave(&self, snapshot: Snapshot) {
        self.calls.borrow_mut().push(Call::Autosave(snapshot));
    }

    fn finish(&self, submission: FinalSubmission) {
        self.calls.borrow_mut().push(Call::Finish(submission));
    }

    fn evaluate(&self) {
        self.calls.borrow_mut().push(Call::Evaluate);
    }
}

pub fn load_fixture(name: &str) -> SessionDocument {
    let content = fs::read_to_string(format!("fixtures/{}", name)).expect("Cannot read fixture");
    SessionDocument::from_yaml(&content).expect("fixture should be a valid session document")
}

pub fn mount(doc: &SessionDocument) -> (SessionController, Clock, RecordingGateway) {
    let clock = Clock::manual();
    let gateway = RecordingGateway::new();
    let controller = SessionController::mount(doc, clock.clone(), Box::new(gateway.clone()))
        .expect("document has a session block");
    (controller, clock, gateway)
}
