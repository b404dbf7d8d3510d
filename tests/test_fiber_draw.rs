use gfsim::fem::{boundary_flux, residual_stress, summary_metrics, PressureMap};
use gfsim::host::{select_problem_mode, NativeJob};
use gfsim::prelude::*;
use russell_lab::approx_eq;

#[test]
fn test_fiber_draw() -> Result<(), SolverError> {
    // isothermal neck-down at 1900 K drawn at 1 m/s; 10 mm preform and 125 µm fiber
    let problem = Samples::fiber_draw(3, 8);
    assert_eq!(select_problem_mode(&problem)?, ExecutionMode::Native);

    // run on a worker thread
    let job = NativeJob::spawn(problem.clone());
    let mut n_entry = 0;
    while let Some(entry) = job.progress() {
        assert!(entry.residual_norm.is_finite());
        n_entry += 1;
    }
    let outcome = job.join()?;
    assert_eq!(n_entry, outcome.record().len());
    let result = outcome.result().ok_or(SolverError::InvalidInput("cancelled".to_string()))?;
    let summary = &result.summary;
    println!("{:#?}", summary);

    // mass conservation: nothing leaves or enters through the free surface
    let inflow = summary.inflow_flux.unwrap_or(0.0);
    let outflow = summary.outflow_flux.unwrap_or(0.0);
    let free = summary.free_surface_flux.unwrap_or(f64::NAN);
    assert!(inflow > 0.0);
    assert!(f64::abs(free) < 1e-6 * inflow);
    let lateral = boundary_flux(
        &result.mesh,
        &result.fields.velocity_r,
        &result.fields.velocity_z,
        BoundaryTag::Outer,
    )?;
    assert!(f64::abs(lateral - free) <= 1e-12 * inflow);
    assert!(f64::abs(inflow - outflow) < 1e-6 * inflow);

    // feed speed from the outflow: v_feed = v_draw (d_fiber / d_preform)²
    let feed = summary.feed_speed.ok_or(SolverError::InvalidInput("no feed speed".to_string()))?;
    let correct = 1.0 * f64::powi(0.125 / 10.0, 2);
    assert!(f64::abs(feed - correct) < 1e-6 * correct);

    // the fiber is pulled
    let tension = summary.fiber_tension.unwrap_or(0.0);
    assert!(tension > 0.0);

    // the coupling converged with the default tolerances
    assert_eq!(problem.solver_options.picard_tol_velocity, SolverOptions::default().picard_tol_velocity);
    assert!(summary.outer_iterations >= 2);
    assert!(summary.outer_iterations <= problem.solver_options.picard_max_iterations);
    assert!(outcome.record().of_stage(Stage::Coupling).count() == summary.outer_iterations);
    Ok(())
}

#[test]
fn test_fiber_draw_mismatched_speed() -> Result<(), SolverError> {
    // pulling at 2 m/s with the feed of 1 m/s: the excess enters through the free surface
    let mut problem = Samples::fiber_draw(3, 8);
    problem.process.set_flow_bc(
        BoundaryTag::Top,
        FlowBc::Velocity {
            vr: Some(0.0),
            vz: Some(2.0),
        },
    )?;
    let mesh = generate_structured(&problem.geometry)?;
    let solver = FlowSolver::new(&mesh, &problem.material, &problem.process)?;
    let temperature = vec![1900.0; mesh.points.len()];
    let solution = solver.solve(&temperature)?;
    let mut fields = FieldState::new(mesh.points.len(), PressureMap::new(&mesh).len(), 1900.0);
    fields.velocity_r = solution.velocity_r;
    fields.velocity_z = solution.velocity_z;
    fields.pressure = solution.pressure;
    let stress = residual_stress(&problem.material, &fields.temperature, 1900.0);
    let summary = summary_metrics(&mesh, &problem.material, &problem.process, &fields, &stress, 1)?;

    let inflow = summary.inflow_flux.unwrap_or(0.0);
    let outflow = summary.outflow_flux.unwrap_or(0.0);
    let free = summary.free_surface_flux.unwrap_or(f64::NAN);
    approx_eq(outflow, 2.0 * inflow, 1e-12 * inflow);
    // continuity: inflow + (inward free-surface flux) = outflow
    assert!(f64::abs(free - (inflow - outflow)) < 1e-6 * inflow);

    // the feed speed follows the outflow, not the prescribed feed
    let feed = summary.feed_speed.ok_or(SolverError::InvalidInput("no feed speed".to_string()))?;
    let correct = 2.0 * f64::powi(0.125 / 10.0, 2);
    assert!(f64::abs(feed - correct) < 1e-6 * correct);
    Ok(())
}
