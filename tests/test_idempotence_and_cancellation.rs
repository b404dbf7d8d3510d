use gfsim::prelude::*;
use std::sync::atomic::AtomicBool;

#[test]
fn test_idempotence() -> Result<(), SolverError> {
    // two runs of the same problem give identical results (the record holds the wall times)
    let mut problem = Samples::annealing_cylinder(3, 4);
    problem.simulation_type = SimulationType::Transient { t_final: 50.0 };
    let first = run_simple(&problem)?;
    let second = run_simple(&problem)?;
    assert_eq!(first.result(), second.result());
    assert!(first.result().is_some());
    assert_eq!(first.record().len(), second.record().len());

    // the result survives a JSON round trip
    let path = format!("{}/idempotence.json", DEFAULT_TEST_DIR);
    let result = first.result().ok_or(SolverError::InvalidInput("cancelled".to_string()))?;
    result.write_json(&path)?;
    let read = SimulationResult::read_json(&path)?;
    assert_eq!(&read, result);
    Ok(())
}

#[test]
fn test_cancellation() -> Result<(), SolverError> {
    let cancel = AtomicBool::new(true);
    for problem in [Samples::radial_conduction(2, 1), Samples::fiber_draw(2, 2)] {
        let mut sink = |_: &ConvergenceEntry| {};
        let outcome = run(&problem, &mut sink, &cancel)?;
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.result(), None);
        assert!(outcome.record().is_empty());
    }
    Ok(())
}
