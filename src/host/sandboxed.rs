use super::{select_problem_mode, ExecutionMode};
use crate::base::{Problem, ProgressSink, RunFailure, RunOutcome, SolverError};
use crate::fem::run;
use std::sync::atomic::AtomicBool;

/// Runs a problem in-process if it is routed to the sandboxed mode
///
/// Returns an error (without running) if the problem must run natively.
pub fn run_sandboxed(
    problem: &Problem,
    sink: &mut dyn ProgressSink,
    cancel: &AtomicBool,
) -> Result<RunOutcome, RunFailure> {
    match select_problem_mode(problem)? {
        ExecutionMode::Sandboxed => run(problem, sink, cancel),
        ExecutionMode::Native => Err(SolverError::InvalidInput(
            "the problem is too large (or a fiber draw) and must run natively".to_string(),
        )
        .into()),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
