//! Implements the temperature-dependent material models of glass

mod conductivity;
mod relaxation_time;
mod viscosity;
pub use crate::material::conductivity::*;
pub use crate::material::relaxation_time::*;
pub use crate::material::viscosity::*;
