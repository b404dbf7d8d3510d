use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the smallest allowed tolerance
pub const OPTIONS_MIN_TOL: f64 = 1e-15;

/// Defines the smallest allowed dt_min
pub const OPTIONS_MIN_DT_MIN: f64 = 1e-12;

/// Holds the tolerances, caps and switches of the solvers
///
/// All fields have defaults, thus a JSON problem file may omit any of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Tolerance on ‖ΔT‖∞ for the thermal Newton iterations (K)
    pub thermal_tol: f64,

    /// Maximum number of thermal Newton iterations
    pub thermal_max_iterations: usize,

    /// Include the dk/dT term in the thermal Jacobian (false gives a Picard-only tangent)
    pub thermal_newton: bool,

    /// Tolerance on ‖ΔT‖∞ between outer (Picard) iterations (K)
    pub picard_tol_temperature: f64,

    /// Tolerance on ‖Δv‖∞/‖v‖∞ between outer (Picard) iterations
    pub picard_tol_velocity: f64,

    /// Maximum number of outer (Picard) iterations
    pub picard_max_iterations: usize,

    /// Initial time increment of the transient thermal solver (s)
    pub dt_initial: f64,

    /// Maximum time increment of the transient thermal solver (s)
    pub dt_max: f64,

    /// Minimum time increment; the transient solver fails below it (s)
    pub dt_min: f64,

    /// Sub-stepping ratio: the relaxation sub-step is at most τ/ratio
    pub relaxation_substep_ratio: f64,

    /// Maximum number of sub-steps per interval before the equilibrium shortcut is taken
    pub relaxation_max_substeps: usize,

    /// Pseudo time step used to move the free surface (s)
    pub ale_time_step: f64,

    /// Maximum free-surface displacement as a fraction of the smallest adjacent edge length
    pub ale_max_displacement_fraction: f64,

    /// Number of Jacobi sweeps smoothing the interior mesh displacement
    pub ale_smoothing_sweeps: usize,

    /// Prints the iteration tables
    pub verbose_iterations: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            thermal_tol: 1e-6,
            thermal_max_iterations: 30,
            thermal_newton: true,
            picard_tol_temperature: 1e-3,
            picard_tol_velocity: 1e-4,
            picard_max_iterations: 20,
            dt_initial: 1.0,
            dt_max: 100.0,
            dt_min: 1e-6,
            relaxation_substep_ratio: 5.0,
            relaxation_max_substeps: 1000,
            ale_time_step: 1e-3,
            ale_max_displacement_fraction: 0.1,
            ale_smoothing_sweeps: 20,
            verbose_iterations: false,
        }
    }
}

impl SolverOptions {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        SolverOptions::default()
    }

    /// Sets the tolerance of the thermal Newton iterations
    pub fn set_thermal_tol(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < OPTIONS_MIN_TOL {
            return Err("thermal_tol must be ≥ 1e-15");
        }
        self.thermal_tol = value;
        Ok(self)
    }

    /// Sets the maximum number of thermal Newton iterations
    pub fn set_thermal_max_iterations(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("thermal_max_iterations must be ≥ 1");
        }
        self.thermal_max_iterations = value;
        Ok(self)
    }

    /// Enables or disables the dk/dT term of the thermal Jacobian
    pub fn set_thermal_newton(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.thermal_newton = flag;
        Ok(self)
    }

    /// Sets the tolerances of the outer (Picard) iterations
    pub fn set_picard_tolerances(&mut self, tol_temperature: f64, tol_velocity: f64) -> Result<&mut Self, StrError> {
        if tol_temperature < OPTIONS_MIN_TOL || tol_velocity < OPTIONS_MIN_TOL {
            return Err("Picard tolerances must be ≥ 1e-15");
        }
        self.picard_tol_temperature = tol_temperature;
        self.picard_tol_velocity = tol_velocity;
        Ok(self)
    }

    /// Sets the maximum number of outer (Picard) iterations
    pub fn set_picard_max_iterations(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("picard_max_iterations must be ≥ 1");
        }
        self.picard_max_iterations = value;
        Ok(self)
    }

    /// Sets the time increments of the transient thermal solver
    pub fn set_time_increments(&mut self, dt_initial: f64, dt_min: f64, dt_max: f64) -> Result<&mut Self, StrError> {
        if dt_min < OPTIONS_MIN_DT_MIN {
            return Err("dt_min must be ≥ 1e-12");
        }
        if dt_initial < dt_min || dt_initial > dt_max {
            return Err("dt_initial must satisfy dt_min ≤ dt_initial ≤ dt_max");
        }
        self.dt_initial = dt_initial;
        self.dt_min = dt_min;
        self.dt_max = dt_max;
        Ok(self)
    }

    /// Sets the sub-stepping controls of the structural relaxation integrator
    pub fn set_relaxation_substeps(&mut self, ratio: f64, max_substeps: usize) -> Result<&mut Self, StrError> {
        if ratio < 1.0 {
            return Err("relaxation_substep_ratio must be ≥ 1.0");
        }
        if max_substeps < 1 {
            return Err("relaxation_max_substeps must be ≥ 1");
        }
        self.relaxation_substep_ratio = ratio;
        self.relaxation_max_substeps = max_substeps;
        Ok(self)
    }

    /// Sets the pseudo time step of the free-surface update
    pub fn set_ale_time_step(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("ale_time_step must be ≥ 0.0");
        }
        self.ale_time_step = value;
        Ok(self)
    }

    /// Sets the maximum free-surface displacement fraction
    pub fn set_ale_max_displacement_fraction(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 || value > 0.5 {
            return Err("ale_max_displacement_fraction must satisfy 0 < fraction ≤ 0.5");
        }
        self.ale_max_displacement_fraction = value;
        Ok(self)
    }

    /// Sets the number of Jacobi sweeps smoothing the interior displacement
    pub fn set_ale_smoothing_sweeps(&mut self, value: usize) -> Result<&mut Self, StrError> {
        self.ale_smoothing_sweeps = value;
        Ok(self)
    }

    /// Sets verbose mode during iterations
    pub fn set_verbose_iterations(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.verbose_iterations = flag;
        Ok(self)
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if !(self.thermal_tol >= OPTIONS_MIN_TOL) {
            return Some(format!(
                "thermal_tol = {:?} is incorrect; it must be ≥ {:e}",
                self.thermal_tol, OPTIONS_MIN_TOL
            ));
        }
        if self.thermal_max_iterations < 1 {
            return Some("thermal_max_iterations = 0 is incorrect; it must be ≥ 1".to_string());
        }
        if !(self.picard_tol_temperature >= OPTIONS_MIN_TOL) {
            return Some(format!(
                "picard_tol_temperature = {:?} is incorrect; it must be ≥ {:e}",
                self.picard_tol_temperature, OPTIONS_MIN_TOL
            ));
        }
        if !(self.picard_tol_velocity >= OPTIONS_MIN_TOL) {
            return Some(format!(
                "picard_tol_velocity = {:?} is incorrect; it must be ≥ {:e}",
                self.picard_tol_velocity, OPTIONS_MIN_TOL
            ));
        }
        if self.picard_max_iterations < 1 {
            return Some("picard_max_iterations = 0 is incorrect; it must be ≥ 1".to_string());
        }
        if !(self.dt_min >= OPTIONS_MIN_DT_MIN) {
            return Some(format!(
                "dt_min = {:?} is incorrect; it must be ≥ {:e}",
                self.dt_min, OPTIONS_MIN_DT_MIN
            ));
        }
        if !(self.dt_max >= self.dt_min) {
            return Some(format!(
                "dt_max = {:?} is incorrect; it must be ≥ dt_min = {:?}",
                self.dt_max, self.dt_min
            ));
        }
        if !(self.dt_initial >= self.dt_min && self.dt_initial <= self.dt_max) {
            return Some(format!(
                "dt_initial = {:?} is incorrect; it must be in [dt_min, dt_max] = [{:?}, {:?}]",
                self.dt_initial, self.dt_min, self.dt_max
            ));
        }
        if !(self.relaxation_substep_ratio >= 1.0) {
            return Some(format!(
                "relaxation_substep_ratio = {:?} is incorrect; it must be ≥ 1.0",
                self.relaxation_substep_ratio
            ));
        }
        if self.relaxation_max_substeps < 1 {
            return Some("relaxation_max_substeps = 0 is incorrect; it must be ≥ 1".to_string());
        }
        if !(self.ale_time_step >= 0.0) {
            return Some(format!(
                "ale_time_step = {:?} is incorrect; it must be ≥ 0.0",
                self.ale_time_step
            ));
        }
        if !(self.ale_max_displacement_fraction > 0.0 && self.ale_max_displacement_fraction <= 0.5) {
            return Some(format!(
                "ale_max_displacement_fraction = {:?} is incorrect; it must be in (0.0, 0.5]",
                self.ale_max_displacement_fraction
            ));
        }
        None // all good
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SolverOptions;

    #[test]
    fn default_works() {
        let opt = SolverOptions::new();
        assert_eq!(opt.thermal_tol, 1e-6);
        assert_eq!(opt.thermal_max_iterations, 30);
        assert_eq!(opt.thermal_newton, true);
        assert_eq!(opt.picard_tol_temperature, 1e-3);
        assert_eq!(opt.picard_tol_velocity, 1e-4);
        assert_eq!(opt.picard_max_iterations, 20);
        assert_eq!(opt.relaxation_substep_ratio, 5.0);
        assert_eq!(opt.relaxation_max_substeps, 1000);
        assert_eq!(opt.ale_max_displacement_fraction, 0.1);
        assert_eq!(opt.ale_smoothing_sweeps, 20);
        assert_eq!(opt.verbose_iterations, false);
        assert_eq!(opt.validate(), None);
    }

    #[test]
    fn setters_work() {
        let mut opt = SolverOptions::new();
        assert_eq!(opt.set_thermal_tol(0.0).err(), Some("thermal_tol must be ≥ 1e-15"));
        assert_eq!(
            opt.set_picard_max_iterations(0).err(),
            Some("picard_max_iterations must be ≥ 1")
        );
        assert_eq!(
            opt.set_time_increments(10.0, 1e-3, 1.0).err(),
            Some("dt_initial must satisfy dt_min ≤ dt_initial ≤ dt_max")
        );
        assert_eq!(
            opt.set_ale_max_displacement_fraction(0.9).err(),
            Some("ale_max_displacement_fraction must satisfy 0 < fraction ≤ 0.5")
        );
        opt.set_thermal_tol(1e-8)
            .unwrap()
            .set_thermal_newton(false)
            .unwrap()
            .set_picard_tolerances(1e-2, 1e-3)
            .unwrap()
            .set_time_increments(0.5, 1e-3, 50.0)
            .unwrap()
            .set_relaxation_substeps(10.0, 50)
            .unwrap();
        assert_eq!(opt.thermal_tol, 1e-8);
        assert_eq!(opt.thermal_newton, false);
        assert_eq!(opt.picard_tol_temperature, 1e-2);
        assert_eq!(opt.picard_tol_velocity, 1e-3);
        assert_eq!(opt.dt_initial, 0.5);
        assert_eq!(opt.dt_max, 50.0);
        assert_eq!(opt.relaxation_max_substeps, 50);
        assert_eq!(opt.validate(), None);
    }

    #[test]
    fn validate_works() {
        let mut opt = SolverOptions::new();
        opt.thermal_tol = 0.0;
        assert_eq!(
            opt.validate(),
            Some("thermal_tol = 0.0 is incorrect; it must be ≥ 1e-15".to_string())
        );
        opt.thermal_tol = 1e-6;
        opt.dt_max = 1e-9;
        assert_eq!(
            opt.validate(),
            Some("dt_max = 1e-9 is incorrect; it must be ≥ dt_min = 1e-6".to_string())
        );
        opt.dt_max = 100.0;
        opt.relaxation_substep_ratio = 0.5;
        assert_eq!(
            opt.validate(),
            Some("relaxation_substep_ratio = 0.5 is incorrect; it must be ≥ 1.0".to_string())
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let opt: SolverOptions = serde_json::from_str(r#"{"thermal_tol":1e-4}"#).unwrap();
        assert_eq!(opt.thermal_tol, 1e-4);
        assert_eq!(opt.picard_max_iterations, 20);
    }
}
