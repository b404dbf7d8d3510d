use crate::base::{PlanTier, Problem, ProcessType, SolverError, SANDBOX_MAX_DOF};
use crate::fem::PressureMap;
use crate::mesh::generate_structured;
use serde::{Deserialize, Serialize};

/// Defines where a run executes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// In-process, size-limited run
    Sandboxed,

    /// Run on a dedicated worker thread
    Native,
}

/// Selects the execution mode of a run
///
/// Returns `Sandboxed` for small problems that are not fiber draws, otherwise `Native`.
/// The plan tier does not affect the rule.
pub fn select_mode(dof_count: usize, process_type: ProcessType, _plan_tier: PlanTier) -> ExecutionMode {
    if dof_count <= SANDBOX_MAX_DOF && process_type != ProcessType::FiberDraw {
        ExecutionMode::Sandboxed
    } else {
        ExecutionMode::Native
    }
}

/// Returns the number of DOFs of a problem
///
/// ```text
/// n_dof = n_point + (if the flow is solved) 2 n_point + n_pressure
/// ```
pub fn problem_dof_count(problem: &Problem) -> Result<usize, SolverError> {
    let mesh = generate_structured(&problem.geometry)?;
    let npoint = mesh.points.len();
    if problem.process.solves_flow() {
        Ok(3 * npoint + PressureMap::new(&mesh).len())
    } else {
        Ok(npoint)
    }
}

/// Selects the execution mode of a problem
pub fn select_problem_mode(problem: &Problem) -> Result<ExecutionMode, SolverError> {
    let dof_count = problem_dof_count(problem)?;
    Ok(select_mode(
        dof_count,
        problem.process.process_type,
        problem.process.plan_tier,
    ))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
