use super::ConvergenceRecord;
use crate::mesh::BoundaryTag;
use crate::StrError;
use thiserror::Error;

/// Defines errors caused by an invalid geometry or mesh
///
/// Geometry errors are always fatal and never retried.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum GeometryError {
    /// Degenerate or inverted element (non-positive Jacobian determinant)
    #[error("element {element} is inverted or degenerate (det(J) = {det:e})")]
    InvertedElement { element: usize, det: f64 },

    /// Element referencing a node that does not exist
    #[error("element {element} references the non-existent node {node}")]
    InvalidNode { element: usize, node: usize },

    /// Boundary condition given on a tag that has no boundary edges
    #[error("boundary tag {0:?} does not match any boundary edge")]
    InvalidBoundaryTag(BoundaryTag),

    /// Mesh without elements
    #[error("the mesh has no elements")]
    EmptyMesh,

    /// Inconsistent geometry specification
    #[error("invalid geometry: {0}")]
    InvalidSpec(&'static str),
}

/// Defines the error taxonomy of the solver core
///
/// All errors are returned as values so that parametric campaigns can carry on after a failed run.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum SolverError {
    /// Invalid geometry (fatal)
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Iteration cap exceeded; carries the accumulated convergence record
    #[error("{solver} did not converge after {iterations} iterations")]
    Convergence {
        solver: &'static str,
        iterations: usize,
        record: ConvergenceRecord,
    },

    /// Degenerate linear system (e.g. viscosity overflow from an unclamped temperature)
    #[error("{solver}: singular linear system ({reason})")]
    SingularSystem { solver: &'static str, reason: String },

    /// Invalid parameters or options
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SolverError {
    /// Returns the convergence record carried by this error, if any
    pub fn record(&self) -> Option<&ConvergenceRecord> {
        match self {
            SolverError::Convergence { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Wraps an error message from the linear solver
    pub(crate) fn singular(solver: &'static str, reason: StrError) -> Self {
        SolverError::SingularSystem {
            solver,
            reason: reason.to_string(),
        }
    }
}

impl From<StrError> for SolverError {
    fn from(message: StrError) -> Self {
        SolverError::InvalidInput(message.to_string())
    }
}

/// Holds a failed run together with the convergence record accumulated before the failure
///
/// The record is empty if the run failed before any iteration (e.g. invalid input or an inverted mesh).
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{error}")]
pub struct RunFailure {
    /// Cause of the failure
    pub error: SolverError,

    /// Entries produced before the failure
    pub record: ConvergenceRecord,
}

impl From<RunFailure> for SolverError {
    fn from(failure: RunFailure) -> Self {
        failure.error
    }
}

impl From<SolverError> for RunFailure {
    fn from(error: SolverError) -> Self {
        let record = error.record().cloned().unwrap_or_default();
        RunFailure { error, record }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{GeometryError, RunFailure, SolverError};
    use crate::base::{ConvergenceRecord, Stage};
    use crate::mesh::BoundaryTag;

    #[test]
    fn display_works() {
        let err = GeometryError::InvertedElement { element: 3, det: -0.5 };
        assert_eq!(format!("{}", err), "element 3 is inverted or degenerate (det(J) = -5e-1)");
        let err = GeometryError::InvalidBoundaryTag(BoundaryTag::Outer);
        assert_eq!(format!("{}", err), "boundary tag Outer does not match any boundary edge");
        let err: SolverError = GeometryError::EmptyMesh.into();
        assert_eq!(format!("{}", err), "geometry error: the mesh has no elements");
    }

    #[test]
    fn record_is_carried() {
        let mut record = ConvergenceRecord::new();
        record.push(Stage::Coupling, 0, 10.0);
        let err = SolverError::Convergence {
            solver: "Picard",
            iterations: 1,
            record,
        };
        assert_eq!(err.record().unwrap().len(), 1);
        assert_eq!(format!("{}", err), "Picard did not converge after 1 iterations");
        let err: SolverError = "bad option".into();
        assert_eq!(err, SolverError::InvalidInput("bad option".to_string()));
        assert_eq!(err.record(), None);
    }

    #[test]
    fn run_failure_keeps_the_record() {
        let mut record = ConvergenceRecord::new();
        record.push(Stage::Thermal, 0, 1.0);
        record.push(Stage::Coupling, 0, 5.0);
        let failure = RunFailure {
            error: GeometryError::InvertedElement { element: 1, det: -1.0 }.into(),
            record,
        };
        assert_eq!(failure.record.of_stage(Stage::Coupling).count(), 1);
        assert_eq!(
            format!("{}", failure),
            "geometry error: element 1 is inverted or degenerate (det(J) = -1e0)"
        );
        let failure: RunFailure = SolverError::InvalidInput("bad".to_string()).into();
        assert!(failure.record.is_empty());
    }
}
