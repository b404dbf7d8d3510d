use super::{fictive_temperatures_from_history, fictive_temperatures_from_schedule, residual_stress, solve_coupled};
use super::{summary_metrics, ControlConvergence, FieldState, PressureMap, ThermalSolver};
use crate::base::{ConvergenceEntry, ConvergenceRecord, Problem, ProgressSink, RunFailure, RunOutcome};
use crate::base::{SimulationResult, SimulationType, SolverError};
use crate::mesh::generate_structured;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs a simulation
///
/// The problem is validated and the mesh is generated (or checked, if given explicitly); then the
/// thermal, coupled or transient solver runs, followed by the structural relaxation and the
/// post-processing. Every convergence entry is forwarded to the progress sink as soon as it is produced.
///
/// Returns [RunOutcome::Cancelled] if the cancellation flag was raised. Errors never leave partial
/// results behind, but every failure carries the convergence record accumulated up to that point.
pub fn run(problem: &Problem, sink: &mut dyn ProgressSink, cancel: &AtomicBool) -> Result<RunOutcome, RunFailure> {
    let mut record = ConvergenceRecord::new();
    match run_stages(problem, sink, cancel, &mut record) {
        Ok(Some(result)) => Ok(RunOutcome::Completed { result, record }),
        Ok(None) => Ok(RunOutcome::Cancelled { record }),
        Err(error) => {
            log::warn!("run failed after {} convergence entries: {}", record.len(), error);
            Err(RunFailure { error, record })
        }
    }
}

/// Performs all stages of a run and returns None if cancelled
fn run_stages(
    problem: &Problem,
    sink: &mut dyn ProgressSink,
    cancel: &AtomicBool,
    record: &mut ConvergenceRecord,
) -> Result<Option<SimulationResult>, SolverError> {
    // check input
    if let Some(message) = problem.validate() {
        return Err(SolverError::InvalidInput(message));
    }
    let mesh = generate_structured(&problem.geometry)?;
    for (tag, _) in &problem.process.thermal_bcs {
        mesh.check_tag(*tag)?;
    }
    for (tag, _) in &problem.process.flow_bcs {
        mesh.check_tag(*tag)?;
    }

    // auxiliary
    let material = &problem.material;
    let process = &problem.process;
    let options = &problem.solver_options;
    let room = process.room_temperature;
    let npoint = mesh.points.len();
    let initial = FieldState::new(npoint, PressureMap::new(&mesh).len(), process.initial_temperature);
    let mut control = ControlConvergence::new(options, sink);
    control.print_header();
    log::info!(
        "running {:?} with {} points and {} cells",
        problem.simulation_type,
        npoint,
        mesh.cells.len()
    );

    // solve
    let (mesh, mut fields, outer_iterations, fictive) = match problem.simulation_type {
        SimulationType::SteadyThermal => {
            if cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }
            let thermal = ThermalSolver::new(&mesh, material, process, options)?;
            let temperature = thermal.solve_steady(&initial.temperature, None, record, &mut control)?;
            let fictive = fictive_temperatures_from_schedule(material, &process.cooling, &temperature, room, options)?;
            let mut fields = initial;
            fields.temperature = temperature;
            (mesh, fields, 0, fictive)
        }
        SimulationType::Coupled => {
            if !process.solves_flow() {
                return Err(SolverError::InvalidInput(
                    "a coupled run requires flow boundary conditions".to_string(),
                ));
            }
            match solve_coupled(mesh, material, process, options, initial, record, &mut control, cancel)? {
                Some(state) => {
                    let fictive = fictive_temperatures_from_schedule(
                        material,
                        &process.cooling,
                        &state.fields.temperature,
                        room,
                        options,
                    )?;
                    (state.mesh, state.fields, state.outer_iterations, fictive)
                }
                None => return Ok(None),
            }
        }
        SimulationType::Transient { t_final } => {
            let thermal = ThermalSolver::new(&mesh, material, process, options)?;
            let history = match thermal.solve_transient(&initial.temperature, t_final, None, record, &mut control, cancel)? {
                Some(history) => history,
                None => return Ok(None),
            };
            let fictive = fictive_temperatures_from_history(material, &history, options);
            let mut fields = initial;
            if let Some(last) = history.temperatures.last() {
                fields.temperature = last.clone();
            }
            (mesh, fields, 0, fictive)
        }
    };

    // post-processing
    fields.fictive_temperature = fictive;
    fields.update_viscosity(material);
    let stress = residual_stress(material, &fields.fictive_temperature, room);
    let summary = summary_metrics(&mesh, material, process, &fields, &stress, outer_iterations)?;
    control.print_footer();
    log::info!(
        "finished with T_max = {:.3} K and σ_vm,max = {:e} Pa",
        summary.max_temperature,
        summary.max_von_mises
    );
    Ok(Some(SimulationResult {
        mesh,
        fields,
        residual_stress: stress,
        summary,
    }))
}

/// Runs a simulation without progress reporting or cancellation
pub fn run_simple(problem: &Problem) -> Result<RunOutcome, RunFailure> {
    let mut sink = |_: &ConvergenceEntry| {};
    let cancel = AtomicBool::new(false);
    run(problem, &mut sink, &cancel)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
