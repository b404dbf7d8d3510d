//! Makes available common structures needed to run a simulation
//!
//! You may write `use gfsim::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{ConvergenceEntry, ConvergenceRecord, GeometryError, ProgressSink, SolverError, Stage};
pub use crate::base::{CoolingSchedule, DrawParameters, FlowBc, PlanTier, Problem, ProcessParameters, ProcessType};
pub use crate::base::{MaterialParameters, RunFailure, RunOutcome, SimulationResult, SimulationType, SolverOptions};
pub use crate::base::ThermalBc;
pub use crate::base::{Samples, VftBase, DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::fem::{run, run_simple, FieldState, FlowSolver, ThermalSolver};
pub use crate::host::{select_mode, ExecutionMode};
pub use crate::mesh::{generate_structured, refine, BoundaryTag, GeometrySpec, Mesh};
