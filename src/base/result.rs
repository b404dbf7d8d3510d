use super::ConvergenceRecord;
use crate::fem::FieldState;
use crate::mesh::Mesh;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the nodal residual stress after cooling to room temperature
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResidualStress {
    /// Equibiaxial stress σ = E/(1-ν)·α·(T_room - T_f) (Pa; negative means compression)
    pub stress: Vec<f64>,

    /// von Mises equivalent stress (Pa)
    pub von_mises: Vec<f64>,
}

/// Holds the scalar summary of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Maximum nodal temperature (K)
    pub max_temperature: f64,

    /// Maximum nodal von Mises stress (Pa)
    pub max_von_mises: f64,

    /// Axial force on the downstream boundary (N), when requested
    pub fiber_tension: Option<f64>,

    /// Feed speed that sustains the computed flow (m/s), when the flow is solved
    ///
    /// This is the outflow through the Top boundary (or the inflow through the Bottom boundary if
    /// there is no Top) divided by the area π R² of the Bottom face.
    pub feed_speed: Option<f64>,

    /// Volumetric flow rate entering through the Bottom boundary (m³/s)
    pub inflow_flux: Option<f64>,

    /// Volumetric flow rate leaving through the Top boundary (m³/s)
    pub outflow_flux: Option<f64>,

    /// Net volumetric flow rate leaving through the free surfaces (m³/s); zero for a steady surface
    pub free_surface_flux: Option<f64>,

    /// Number of outer (Picard) iterations
    pub outer_iterations: usize,
}

/// Holds the immutable result of a successful run
///
/// The convergence record is kept outside so that two runs of the same problem produce identical results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Final mesh (deformed by the ALE update when a free surface exists)
    pub mesh: Mesh,

    /// Final fields
    pub fields: FieldState,

    /// Residual stress
    pub residual_stress: ResidualStress,

    /// Scalar summary
    pub summary: SummaryMetrics,
}

impl SimulationResult {
    /// Writes a JSON file with the result
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<std::ffi::OsStr> + ?Sized,
    {
        let path = std::path::Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            std::fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = std::fs::File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }

    /// Reads a JSON file containing a result
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<std::ffi::OsStr> + ?Sized,
    {
        let path = std::path::Path::new(full_path).to_path_buf();
        let input = std::fs::File::open(path).map_err(|_| "cannot open file")?;
        let buffered = std::io::BufReader::new(input);
        let result = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(result)
    }
}

/// Defines the outcome of a run that did not fail
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// The run finished; the record holds the full convergence history
    Completed {
        result: SimulationResult,
        record: ConvergenceRecord,
    },

    /// The cancellation flag was raised; the record holds the history so far
    Cancelled { record: ConvergenceRecord },
}

impl RunOutcome {
    /// Returns the result if the run was completed
    pub fn result(&self) -> Option<&SimulationResult> {
        match self {
            RunOutcome::Completed { result, .. } => Some(result),
            RunOutcome::Cancelled { .. } => None,
        }
    }

    /// Returns the convergence record
    pub fn record(&self) -> &ConvergenceRecord {
        match self {
            RunOutcome::Completed { record, .. } => record,
            RunOutcome::Cancelled { record } => record,
        }
    }

    /// Returns true if the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }
}
