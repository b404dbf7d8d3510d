use gfsim::prelude::*;

fn radiative_cylinder(newton: bool) -> Problem {
    // hollow cylinder with a strong radiative conductivity, k_eff ∝ T³
    let mut problem = Samples::radial_conduction(8, 1);
    problem.material = Samples::soda_lime();
    problem.process.initial_temperature = 1000.0;
    problem.process.thermal_bcs = vec![
        (BoundaryTag::Inner, ThermalBc::Temperature(1400.0)),
        (BoundaryTag::Outer, ThermalBc::Temperature(600.0)),
    ];
    problem.solver_options.thermal_newton = newton;
    problem.solver_options.thermal_max_iterations = 100;
    problem
}

#[test]
fn test_heat_newton_vs_picard() -> Result<(), SolverError> {
    let newton = run_simple(&radiative_cylinder(true))?;
    let picard = run_simple(&radiative_cylinder(false))?;
    let n_newton = newton.record().len();
    let n_picard = picard.record().len();
    println!("Newton iterations = {}, Picard iterations = {}", n_newton, n_picard);
    assert!(n_newton < n_picard);

    // same solution
    let (a, b) = match (newton.result(), picard.result()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(SolverError::InvalidInput("cancelled".to_string())),
    };
    for (ta, tb) in a.fields.temperature.iter().zip(&b.fields.temperature) {
        assert!(f64::abs(ta - tb) < 1e-4);
    }

    // the radiative profile is not logarithmic: the hot side is flatter
    let t_mid = a
        .mesh
        .points
        .iter()
        .find(|p| f64::abs(p.coords[0] - 0.03) < 1e-12 && p.coords[1] == 0.0)
        .map(|p| a.fields.temperature[p.id])
        .ok_or(SolverError::InvalidInput("point not found".to_string()))?;
    let t_log = 1400.0 - 800.0 * f64::ln(3.0) / f64::ln(5.0);
    assert!(t_mid > t_log);
    Ok(())
}
