//! Implements the base structures for a glass forming simulation

mod constants;
mod convergence;
mod errors;
mod material_parameters;
mod options;
mod problem;
mod result;
mod samples;
pub use crate::base::constants::*;
pub use crate::base::convergence::*;
pub use crate::base::errors::*;
pub use crate::base::material_parameters::*;
pub use crate::base::options::*;
pub use crate::base::problem::*;
pub use crate::base::result::*;
pub use crate::base::samples::*;
