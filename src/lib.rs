//! Glass forming simulator
//!
//! Implements a coupled thermal, radiative, viscous and structural-relaxation solver for
//! axisymmetric glass forming processes such as fiber drawing and annealing.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod fem;
pub mod host;
pub mod material;
pub mod mesh;
pub mod prelude;
