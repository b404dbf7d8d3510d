use super::{ale_update, ControlConvergence, FieldState, FlowSolver, ThermalSolver};
use crate::base::{ConvergenceRecord, MaterialParameters, ProcessParameters, SolverError, SolverOptions, Stage};
use crate::mesh::Mesh;
use std::sync::atomic::{AtomicBool, Ordering};

const SOLVER: &str = "Picard coupling";

/// Holds the converged state of the coupled thermal-flow problem
#[derive(Clone, Debug)]
pub struct CoupledState {
    /// Final mesh (moved by the ALE update if a free surface exists)
    pub mesh: Mesh,

    /// Final fields
    pub fields: FieldState,

    /// Number of outer iterations
    pub outer_iterations: usize,
}

/// Solves the coupled thermal-flow problem with functional (Picard) iterations
///
/// Each outer iteration consumes the previous snapshot and produces a new one:
///
/// 1. thermal solve with the previous velocity (advection)
/// 2. flow solve with the viscosity of the new temperature
/// 3. outer norm, reported to the record
/// 4. ALE update of the free surface (if any)
///
/// The iterations stop when `max(‖ΔT‖∞ / tol_T, ‖Δv‖∞ / (‖v‖∞ tol_v)) < 1`.
/// The cancellation flag is checked at the top of each iteration; None is returned if raised.
pub fn solve_coupled(
    mesh: Mesh,
    material: &MaterialParameters,
    process: &ProcessParameters,
    options: &SolverOptions,
    initial: FieldState,
    record: &mut ConvergenceRecord,
    control: &mut ControlConvergence,
    cancel: &AtomicBool,
) -> Result<Option<CoupledState>, SolverError> {
    let mut mesh = mesh;
    let mut state = initial;
    for iteration in 0..options.picard_max_iterations {
        if cancel.load(Ordering::Relaxed) {
            return Ok(None);
        }

        // thermal then flow
        let thermal = ThermalSolver::new(&mesh, material, process, options)?;
        let velocity = Some((state.velocity_r.as_slice(), state.velocity_z.as_slice()));
        let temperature = thermal.solve_steady(&state.temperature, velocity, record, control)?;
        let flow = FlowSolver::new(&mesh, material, process)?;
        let solution = flow.solve(&temperature)?;
        let next = FieldState {
            temperature,
            velocity_r: solution.velocity_r,
            velocity_z: solution.velocity_z,
            pressure: solution.pressure,
            fictive_temperature: state.fictive_temperature.clone(),
            viscosity: solution.viscosity,
        };

        // outer norm
        let v_scale = f64::max(next.max_speed(), f64::MIN_POSITIVE);
        let norm_t = next.temperature_change(&state) / options.picard_tol_temperature;
        let norm_v = next.velocity_change(&state) / (v_scale * options.picard_tol_velocity);
        let norm = if norm_t.is_nan() || norm_v.is_nan() {
            f64::NAN
        } else {
            f64::max(norm_t, norm_v)
        };

        control.report(record, Stage::Coupling, iteration, norm);
        log::debug!(
            "Picard iteration {}: ‖ΔT‖/tol = {:e}, ‖Δv‖/(‖v‖ tol) = {:e}",
            iteration,
            norm_t,
            norm_v
        );
        if !norm.is_finite() {
            return Err(SolverError::SingularSystem {
                solver: SOLVER,
                reason: "found NaN or Inf in the outer norm".to_string(),
            });
        }

        // free surface (the entry above is already recorded if the update fails)
        if process.has_free_surface() {
            ale_update(&mut mesh, process, &next.velocity_r, &next.velocity_z, options)?;
        }
        state = next;
        if norm < 1.0 {
            return Ok(Some(CoupledState {
                mesh,
                fields: state,
                outer_iterations: iteration + 1,
            }));
        }
    }
    Err(SolverError::Convergence {
        solver: SOLVER,
        iterations: options.picard_max_iterations,
        record: record.clone(),
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::solve_coupled;
    use crate::base::{ConvergenceEntry, ConvergenceRecord, FlowBc, ProcessParameters, ProcessType, Samples};
    use crate::base::{SolverError, SolverOptions, Stage, ThermalBc};
    use crate::fem::{ControlConvergence, FieldState, PressureMap};
    use crate::mesh::{generate_structured, BoundaryTag, GeometrySpec};
    use russell_lab::approx_eq;
    use std::sync::atomic::AtomicBool;

    fn setup() -> (crate::mesh::Mesh, ProcessParameters) {
        let mesh = generate_structured(&GeometrySpec::Rectangle {
            r_min: 0.0,
            r_max: 0.01,
            z_min: 0.0,
            z_max: 0.02,
            nr: 2,
            nz: 2,
        })
        .unwrap();
        let mut process = ProcessParameters::new(ProcessType::Forming, 1500.0);
        process.thermal_bcs = vec![(BoundaryTag::Outer, ThermalBc::Temperature(1500.0))];
        process.flow_bcs = vec![
            (BoundaryTag::Axis, FlowBc::Axis),
            (
                BoundaryTag::Bottom,
                FlowBc::Velocity {
                    vr: Some(0.0),
                    vz: Some(1e-3),
                },
            ),
            (BoundaryTag::Outer, FlowBc::Velocity { vr: Some(0.0), vz: None }),
        ];
        (mesh, process)
    }

    #[test]
    fn isothermal_plug_flow_converges() {
        let (mesh, process) = setup();
        let material = Samples::soda_lime();
        let options = SolverOptions::new();
        let initial = FieldState::new(mesh.points.len(), PressureMap::new(&mesh).len(), 1500.0);
        let mut sink = |_: &ConvergenceEntry| {};
        let mut control = ControlConvergence::new(&options, &mut sink);
        let mut record = ConvergenceRecord::new();
        let cancel = AtomicBool::new(false);
        let state = solve_coupled(mesh, &material, &process, &options, initial, &mut record, &mut control, &cancel)
            .unwrap()
            .unwrap();
        // first iteration: the velocity appears; second: nothing changes
        assert_eq!(state.outer_iterations, 2);
        assert_eq!(record.of_stage(Stage::Coupling).count(), 2);
        for v in &state.fields.velocity_z {
            approx_eq(*v, 1e-3, 1e-12);
        }
    }

    #[test]
    fn cancellation_and_iteration_cap_work() {
        let (mesh, process) = setup();
        let material = Samples::soda_lime();
        let mut options = SolverOptions::new();
        let initial = FieldState::new(mesh.points.len(), PressureMap::new(&mesh).len(), 1500.0);
        let mut record = ConvergenceRecord::new();
        let cancel = AtomicBool::new(true);
        {
            let mut sink = |_: &ConvergenceEntry| {};
            let mut control = ControlConvergence::new(&options, &mut sink);
            let res = solve_coupled(
                mesh.clone(),
                &material,
                &process,
                &options,
                initial.clone(),
                &mut record,
                &mut control,
                &cancel,
            );
            assert!(res.unwrap().is_none());
            assert!(record.is_empty());
        }

        options.picard_max_iterations = 1;
        let cancel = AtomicBool::new(false);
        let mut sink = |_: &ConvergenceEntry| {};
        let mut control = ControlConvergence::new(&options, &mut sink);
        match solve_coupled(mesh, &material, &process, &options, initial, &mut record, &mut control, &cancel) {
            Err(SolverError::Convergence { iterations, record, .. }) => {
                assert_eq!(iterations, 1);
                assert_eq!(record.of_stage(Stage::Coupling).count(), 1);
            }
            _ => panic!("should have failed"),
        }
    }
}
