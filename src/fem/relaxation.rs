use super::TransientHistory;
use crate::base::{CoolingSchedule, MaterialParameters, ResidualStress, SolverError, SolverOptions};
use crate::material::RelaxationModel;
use russell_tensor::{Mandel, Tensor2};

/// Integrates the fictive temperature along a (time, temperature) history
///
/// Solves `dT_f/dt = (T - T_f) / τ(T, T_f)` with T varying linearly within each interval and
/// `T_f(0) = T(0)`. The sub-step is at most `τ / relaxation_substep_ratio` (explicit Euler). If an
/// interval would need more than `relaxation_max_substeps` sub-steps, the glass is in equilibrium
/// and T_f jumps to the temperature at the end of the interval.
pub fn fictive_temperature(
    model: &RelaxationModel,
    times: &[f64],
    temperatures: &[f64],
    options: &SolverOptions,
) -> f64 {
    if temperatures.is_empty() {
        return f64::NAN;
    }
    let ratio = options.relaxation_substep_ratio;
    let max_substeps = options.relaxation_max_substeps;
    let mut tf = temperatures[0];
    for i in 1..usize::min(times.len(), temperatures.len()) {
        let dt = times[i] - times[i - 1];
        if !(dt > 0.0) {
            continue;
        }
        let (t_start, t_end) = (temperatures[i - 1], temperatures[i]);
        let tau_start = model.relaxation_time(t_start, tf);
        if dt * ratio / tau_start > max_substeps as f64 {
            tf = t_end;
            continue;
        }
        let mut s = 0.0;
        let mut count = 0;
        while s < dt {
            count += 1;
            if count > max_substeps {
                tf = t_end;
                break;
            }
            let temperature = t_start + (t_end - t_start) * s / dt;
            let tau = model.relaxation_time(temperature, tf);
            let h = f64::min(dt - s, tau / ratio);
            tf += h * (temperature - tf) / tau;
            s += h;
        }
    }
    tf
}

/// Maximum number of intervals of a constant-rate cooling history
///
/// Longer histories are resampled with a coarser time step ending at the same time.
pub const COOLING_MAX_INTERVALS: usize = 100_000;

/// Returns the (times, temperatures) history given by a cooling schedule
///
/// A constant rate starts at the given temperature and stops at the room temperature (a single flat
/// interval is returned if the start is not above the room temperature). A table is returned as is.
///
/// Returns an error if the start temperature is not finite or if the temperature drop per step
/// `rate · dt` is not a positive normal number.
pub fn cooling_history(
    schedule: &CoolingSchedule,
    start: f64,
    room_temperature: f64,
) -> Result<(Vec<f64>, Vec<f64>), SolverError> {
    match schedule {
        CoolingSchedule::ConstantRate { rate, dt } => {
            if !start.is_finite() {
                return Err(SolverError::InvalidInput(format!(
                    "cannot cool from the temperature {:?}",
                    start
                )));
            }
            let decrement = rate * dt;
            if !(decrement.is_normal() && decrement > 0.0) {
                return Err(SolverError::InvalidInput(format!(
                    "cooling drop per step rate·dt = {:?} is incorrect; it must be a positive normal number",
                    decrement
                )));
            }
            if !(start > room_temperature) {
                return Ok((vec![0.0, *dt], vec![start, start]));
            }
            let exact = (start - room_temperature) / decrement;
            let (n, step) = if exact > COOLING_MAX_INTERVALS as f64 {
                let n = COOLING_MAX_INTERVALS;
                let step = (start - room_temperature) / (rate * n as f64);
                log::debug!("cooling from {} K resampled with Δt = {:e} s", start, step);
                (n, step)
            } else {
                (f64::ceil(exact) as usize, *dt)
            };
            let times: Vec<f64> = (0..=n).map(|i| (i as f64) * step).collect();
            let temperatures = times
                .iter()
                .map(|t| f64::max(start - rate * t, room_temperature))
                .collect();
            Ok((times, temperatures))
        }
        CoolingSchedule::Table { times, temperatures } => Ok((times.clone(), temperatures.clone())),
    }
}

/// Computes the nodal fictive temperatures after cooling each node from its temperature
pub fn fictive_temperatures_from_schedule(
    material: &MaterialParameters,
    schedule: &CoolingSchedule,
    temperature: &[f64],
    room_temperature: f64,
    options: &SolverOptions,
) -> Result<Vec<f64>, SolverError> {
    let model = RelaxationModel::new(material);
    temperature
        .iter()
        .map(|t| {
            let (times, temperatures) = cooling_history(schedule, *t, room_temperature)?;
            Ok(fictive_temperature(&model, &times, &temperatures, options))
        })
        .collect()
}

/// Computes the nodal fictive temperatures along a transient history
pub fn fictive_temperatures_from_history(
    material: &MaterialParameters,
    history: &TransientHistory,
    options: &SolverOptions,
) -> Vec<f64> {
    let model = RelaxationModel::new(material);
    let npoint = history.temperatures.first().map(|t| t.len()).unwrap_or(0);
    (0..npoint)
        .map(|p| fictive_temperature(&model, &history.times, &history.of_point(p), options))
        .collect()
}

/// Computes the residual stress from the fictive temperatures
///
/// ```text
/// σ = E / (1 - ν) · α · (T_room - T_f)
/// ```
///
/// The stress is equibiaxial (σ_zz = σ_θθ = σ), thus the von Mises stress equals |σ|.
pub fn residual_stress(material: &MaterialParameters, fictive: &[f64], room_temperature: f64) -> ResidualStress {
    let factor = material.young / (1.0 - material.poisson) * material.thermal_expansion;
    let stress: Vec<f64> = fictive.iter().map(|tf| factor * (room_temperature - tf)).collect();
    let mut sigma = Tensor2::new(Mandel::Symmetric2D);
    let von_mises = stress
        .iter()
        .map(|s| {
            sigma.clear();
            sigma.sym_set(1, 1, *s);
            sigma.sym_set(2, 2, *s);
            sigma.invariant_sigma_d()
        })
        .collect();
    ResidualStress { stress, von_mises }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{cooling_history, fictive_temperature, fictive_temperatures_from_schedule, residual_stress};
    use super::COOLING_MAX_INTERVALS;
    use crate::base::{CoolingSchedule, Samples, SolverError, SolverOptions};
    use crate::material::RelaxationModel;
    use russell_lab::approx_eq;

    #[test]
    fn cooling_history_works() {
        let schedule = CoolingSchedule::ConstantRate { rate: 2.0, dt: 1.0 };
        let (times, temperatures) = cooling_history(&schedule, 305.0, 300.0).unwrap();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(temperatures, vec![305.0, 303.0, 301.0, 300.0]);
        let (times, temperatures) = cooling_history(&schedule, 290.0, 300.0).unwrap();
        assert_eq!(times, vec![0.0, 1.0]);
        assert_eq!(temperatures, vec![290.0, 290.0]);
    }

    #[test]
    fn equilibrium_and_frozen_limits_work() {
        let material = Samples::soda_lime();
        let model = RelaxationModel::new(&material);
        let options = SolverOptions::new();
        // far above the glass transition: the glass follows T
        let tf = fictive_temperature(&model, &[0.0, 1.0, 2.0], &[1200.0, 1150.0, 1100.0], &options);
        approx_eq(tf, 1100.0, 1e-12);
        // far below: the structure is frozen
        let tf = fictive_temperature(&model, &[0.0, 1.0, 2.0], &[600.0, 500.0, 400.0], &options);
        approx_eq(tf, 600.0, 1e-6);
    }

    #[test]
    fn faster_cooling_freezes_a_higher_fictive_temperature() {
        let material = Samples::soda_lime();
        let options = SolverOptions::new();
        let slow = CoolingSchedule::ConstantRate { rate: 1.0, dt: 1.0 };
        let fast = CoolingSchedule::ConstantRate { rate: 100.0, dt: 0.01 };
        let tf_slow = fictive_temperatures_from_schedule(&material, &slow, &[900.0], 293.15, &options).unwrap()[0];
        let tf_fast = fictive_temperatures_from_schedule(&material, &fast, &[900.0], 293.15, &options).unwrap()[0];
        assert!(tf_fast > tf_slow + 1.0);
        assert!(tf_slow > 293.15 && tf_fast < 900.0);

        let stress = residual_stress(&material, &[tf_slow, tf_fast], 293.15);
        assert!(stress.stress[0] < 0.0);
        assert!(stress.von_mises[1] > stress.von_mises[0]);
        let factor = 70e9 / (1.0 - 0.22) * 9e-6;
        approx_eq(stress.stress[0], factor * (293.15 - tf_slow), 1e-3);
    }

    #[test]
    fn long_cooling_history_is_resampled() {
        // 7e14 steps of 1e-12 K each
        let schedule = CoolingSchedule::ConstantRate { rate: 1e-6, dt: 1e-6 };
        let (times, temperatures) = cooling_history(&schedule, 1000.0, 300.0).unwrap();
        assert_eq!(times.len(), COOLING_MAX_INTERVALS + 1);
        approx_eq(*times.last().unwrap(), 7e8, 1e-6);
        approx_eq(*temperatures.last().unwrap(), 300.0, 1e-9);
        assert!(temperatures.windows(2).all(|w| w[1] <= w[0]));

        // the relaxation along the resampled history still completes
        let material = Samples::soda_lime();
        let options = SolverOptions::new();
        let tf = fictive_temperatures_from_schedule(&material, &schedule, &[1000.0], 300.0, &options).unwrap();
        assert!(tf[0].is_finite() && tf[0] < 1000.0);
    }

    #[test]
    fn degenerate_cooling_steps_are_rejected() {
        // rate·dt underflows to zero
        let schedule = CoolingSchedule::ConstantRate { rate: 1e-200, dt: 1e-200 };
        assert!(matches!(
            cooling_history(&schedule, 1000.0, 300.0),
            Err(SolverError::InvalidInput(..))
        ));
        // rate·dt overflows
        let schedule = CoolingSchedule::ConstantRate { rate: 1e200, dt: 1e200 };
        assert!(cooling_history(&schedule, 1000.0, 300.0).is_err());
        // infinite start
        let schedule = CoolingSchedule::ConstantRate { rate: 1.0, dt: 1.0 };
        assert!(cooling_history(&schedule, f64::INFINITY, 300.0).is_err());
        assert!(cooling_history(&schedule, f64::NAN, 300.0).is_err());
        let material = Samples::soda_lime();
        let options = SolverOptions::new();
        let res = fictive_temperatures_from_schedule(&material, &schedule, &[900.0, f64::NAN], 293.15, &options);
        assert!(res.is_err());
    }

    #[test]
    fn von_mises_of_the_equibiaxial_stress_works() {
        let material = Samples::soda_lime();
        let stress = residual_stress(&material, &[800.0, 293.15, 200.0], 293.15);
        for (s, vm) in stress.stress.iter().zip(&stress.von_mises) {
            approx_eq(*vm, f64::abs(*s), 1e-12 * f64::max(1.0, f64::abs(*s)));
        }
        assert_eq!(stress.von_mises[1], 0.0);
    }
}
