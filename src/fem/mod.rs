//! Implements the finite element solvers and the simulation driver

mod ale;
mod control_convergence;
mod coupling;
mod dofs;
mod field_state;
mod linear_system;
mod post_processing;
mod relaxation;
mod simulation;
mod solver_flow;
mod solver_thermal;
pub use crate::fem::ale::*;
pub use crate::fem::control_convergence::*;
pub use crate::fem::coupling::*;
pub use crate::fem::dofs::*;
pub use crate::fem::field_state::*;
pub use crate::fem::linear_system::*;
pub use crate::fem::post_processing::*;
pub use crate::fem::relaxation::*;
pub use crate::fem::simulation::*;
pub use crate::fem::solver_flow::*;
pub use crate::fem::solver_thermal::*;
