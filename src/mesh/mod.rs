//! Implements the axisymmetric mesh, shape functions, quadrature, generation and refinement

mod generation;
mod mesh;
mod quadrature;
mod refine;
mod shapes;
pub use crate::mesh::generation::*;
pub use crate::mesh::mesh::*;
pub use crate::mesh::quadrature::*;
pub use crate::mesh::refine::*;
pub use crate::mesh::shapes::*;
