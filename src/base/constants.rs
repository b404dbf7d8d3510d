/// Stefan-Boltzmann constant σ in W/(m² K⁴)
pub const STEFAN_BOLTZMANN: f64 = 5.670374419e-8;

/// Ceiling returned by the viscosity model in the solidified regime (Pa·s)
pub const VISCOSITY_CEILING: f64 = 1e20;

/// Ceiling returned by the structural relaxation model in the solidified regime (s)
pub const RELAXATION_TIME_CEILING: f64 = 1e20;

/// Temperature margin ε above T0 below which the VFT expressions are clamped (K)
pub const VFT_CLAMP_MARGIN: f64 = 1.0;

/// Maximum number of degrees of freedom allowed in the sandboxed execution placement
pub const SANDBOX_MAX_DOF: usize = 5000;

/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/gfsim/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/gfsim/test";
