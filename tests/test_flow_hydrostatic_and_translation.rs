use gfsim::prelude::*;
use russell_lab::approx_eq;

fn box_mesh() -> Result<Mesh, SolverError> {
    let mesh = generate_structured(&GeometrySpec::Rectangle {
        r_min: 0.0,
        r_max: 0.1,
        z_min: 0.0,
        z_max: 0.2,
        nr: 4,
        nz: 4,
    })?;
    Ok(mesh)
}

#[test]
fn test_flow_hydrostatic() -> Result<(), SolverError> {
    // closed container under gravity: v = 0 and p = -ρ g z (pinned at the origin)
    let mesh = box_mesh()?;
    let material = Samples::soda_lime();
    let mut process = ProcessParameters::new(ProcessType::Forming, 1400.0);
    process.gravity = [0.0, -9.81];
    process
        .set_flow_bc(BoundaryTag::Axis, FlowBc::Axis)?
        .set_flow_bc(BoundaryTag::Bottom, FlowBc::NoSlip)?
        .set_flow_bc(BoundaryTag::Outer, FlowBc::NoSlip)?
        .set_flow_bc(BoundaryTag::Top, FlowBc::NoSlip)?;
    let solver = FlowSolver::new(&mesh, &material, &process)?;
    assert!(solver.pressure_pinned());

    // a temperature gradient changes the viscosity but not the hydrostatic state
    let temperature: Vec<f64> = mesh.points.iter().map(|p| 1300.0 + 1000.0 * p.coords[1]).collect();
    let sol = solver.solve(&temperature)?;
    let rho_g = material.density * 9.81;
    for p in 0..mesh.points.len() {
        approx_eq(sol.velocity_r[p], 0.0, 1e-8);
        approx_eq(sol.velocity_z[p], 0.0, 1e-8);
    }
    for (i, p) in solver.pressure_map().nodes.iter().enumerate() {
        let z = mesh.points[*p].coords[1];
        approx_eq(sol.pressure[i], -rho_g * z, 1e-6 * rho_g);
    }
    Ok(())
}

#[test]
fn test_flow_rigid_translation() -> Result<(), SolverError> {
    // prescribed axial translation on the whole boundary: uniform velocity and zero (pinned) pressure
    let mesh = box_mesh()?;
    let material = Samples::soda_lime();
    let translation = FlowBc::Velocity {
        vr: Some(0.0),
        vz: Some(-0.02),
    };
    let mut process = ProcessParameters::new(ProcessType::Forming, 1400.0);
    process
        .set_flow_bc(BoundaryTag::Axis, FlowBc::Axis)?
        .set_flow_bc(BoundaryTag::Bottom, translation)?
        .set_flow_bc(BoundaryTag::Outer, translation)?
        .set_flow_bc(BoundaryTag::Top, translation)?;
    let solver = FlowSolver::new(&mesh, &material, &process)?;
    assert!(solver.pressure_pinned());
    let temperature = vec![1400.0; mesh.points.len()];
    let sol = solver.solve(&temperature)?;
    for p in 0..mesh.points.len() {
        approx_eq(sol.velocity_r[p], 0.0, 1e-12);
        approx_eq(sol.velocity_z[p], -0.02, 1e-12);
    }
    for p in &sol.pressure {
        approx_eq(*p, 0.0, 1e-6);
    }
    Ok(())
}

#[test]
fn test_flow_nan_temperature() -> Result<(), SolverError> {
    // NaN temperatures never reach the linear solver as garbage
    let mesh = box_mesh()?;
    let material = Samples::soda_lime();
    let mut process = ProcessParameters::new(ProcessType::Forming, 1400.0);
    process.set_flow_bc(BoundaryTag::Bottom, FlowBc::NoSlip)?;
    let solver = FlowSolver::new(&mesh, &material, &process)?;
    let mut temperature = vec![1400.0; mesh.points.len()];
    temperature[7] = f64::NAN;
    match solver.solve(&temperature) {
        Err(SolverError::SingularSystem { .. }) => (),
        _ => panic!("NaN should give a singular system"),
    }

    // same for the thermal solver (the prescribed values replace only the bottom entries)
    let temperature = vec![f64::NAN; mesh.points.len()];
    let options = SolverOptions::new();
    process.set_thermal_bc(BoundaryTag::Bottom, ThermalBc::Temperature(1400.0))?;
    let thermal = ThermalSolver::new(&mesh, &material, &process, &options)?;
    let mut sink = |_: &ConvergenceEntry| {};
    let mut control = gfsim::fem::ControlConvergence::new(&options, &mut sink);
    let mut record = ConvergenceRecord::new();
    match thermal.solve_steady(&temperature, None, &mut record, &mut control) {
        Err(SolverError::SingularSystem { .. }) => (),
        _ => panic!("NaN should give a singular system"),
    }
    Ok(())
}
