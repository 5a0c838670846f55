mod cli;

use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};

use termsession::clock::Clock;
use termsession::config::SessionDocument;
use termsession::controller::SessionController;
use termsession::error::AppError;
use termsession::evaluate::ResultSession;
use termsession::gateway::{DryRunGateway, Gateway, GatewayEvent, HttpGateway};
use termsession::state::AppState;
use termsession::{logging, report, tui};

use crate::cli::Cli;

/// How long requests started at teardown may still complete.
const TEARDOWN_GRACE: Duration = Duration::from_secs(3);

/// Upper bound on waiting for an evaluation of a finished session.
const EVALUATE_WAIT: Duration = Duration::from_secs(20);

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_path);
    logging::init(&log_path)?;

    let doc = SessionDocument::load(&cli.config)?;
    info!(path = %cli.config.display(), "session document loaded");

    if cli.check {
        report::print_summary(&doc);
        return Ok(());
    }

    let Some(session) = doc.session.as_ref() else {
        if let Some(result) = doc.result.as_ref() {
            report::print_summary(&doc);
            if cli.evaluate {
                let (tx, rx) = mpsc::channel::<GatewayEvent>();
                let gateway: Box<dyn Gateway> = if cli.dry_run {
                    Box::new(DryRunGateway::new(tx))
                } else {
                    Box::new(HttpGateway::new(result.endpoints()?, tx)?)
                };
                if let Some(mut finished) = ResultSession::mount(&doc, gateway) {
                    evaluate_result(&mut finished, &rx);
                }
            }
            return Ok(());
        }
        return Err(AppError::NothingToShow(cli.config));
    };

    let (tx, rx) = mpsc::channel::<GatewayEvent>();
    let gateway: Box<dyn Gateway> = if cli.dry_run {
        Box::new(DryRunGateway::new(tx))
    } else {
        Box::new(HttpGateway::new(session.endpoints()?, tx)?)
    };

    let controller = SessionController::mount(&doc, Clock::system(), gateway)
        .ok_or_else(|| AppError::NothingToShow(cli.config.clone()))?;
    let mut state = AppState::new(controller);

    let result = tui::run_tui(&mut state, &rx);

    state.session.teardown();
    drain_in_flight(&mut state, &rx);
    info!(phase = ?state.session.phase(), "exiting");

    result
}

/// Waits briefly for requests that are still running, such as the teardown
/// autosave, so they are not cut off when the process exits.
fn drain_in_flight(state: &mut AppState, rx: &mpsc::Receiver<GatewayEvent>) {
    let deadline = Instant::now() + TEARDOWN_GRACE;
    while state.session.in_flight_requests() > 0 {
        let now = Instant::now();
        if now >= deadline {
            warn!(
                pending = state.session.in_flight_requests(),
                "leaving with requests still in flight"
            );
            break;
        }
        match rx.recv_timeout(deadline - now) {
            Ok(event) => {
                state.session.handle_gateway_event(event);
            }
            Err(_) => break,
        }
    }
}

/// Runs one evaluate request for a finished session and prints its outcome.
fn evaluate_result(finished: &mut ResultSession, rx: &mpsc::Receiver<GatewayEvent>) {
    if !finished.evaluate_now() {
        println!("Evaluation: not available");
        return;
    }
    let deadline = Instant::now() + EVALUATE_WAIT;
    while finished.is_evaluating() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(event) => {
                finished.handle_gateway_event(event);
            }
            Err(_) => {
                warn!("evaluation did not complete in time");
                println!("{}", report::evaluation_line(Err("no response")));
                return;
            }
        }
    }
    if let Some(evaluation) = finished.evaluation() {
        println!("{}", report::evaluation_line(Ok(evaluation)));
    } else if let Some(reason) = finished.evaluation_error() {
        println!("{}", report::evaluation_line(Err(reason)));
    }
}
