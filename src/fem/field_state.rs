use crate::base::MaterialParameters;
use crate::material::ViscosityModel;
use russell_lab::{vec_norm, Norm, Vector};
use serde::{Deserialize, Serialize};

/// Holds the nodal fields of a simulation
///
/// Each Picard iteration consumes one snapshot and produces a new one. The viscosity is a derived
/// field: it is recomputed from the temperature and never used as state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    /// Temperature at each point (K)
    pub temperature: Vec<f64>,

    /// Radial velocity at each point (m/s)
    pub velocity_r: Vec<f64>,

    /// Axial velocity at each point (m/s)
    pub velocity_z: Vec<f64>,

    /// Pressure at each corner node, in the order of the sorted corner list (Pa)
    pub pressure: Vec<f64>,

    /// Fictive temperature at each point (K)
    pub fictive_temperature: Vec<f64>,

    /// Viscosity at each point (Pa·s)
    pub viscosity: Vec<f64>,
}

impl FieldState {
    /// Allocates a new instance with uniform temperature and zero velocity and pressure
    pub fn new(n_point: usize, n_pressure: usize, temperature: f64) -> Self {
        FieldState {
            temperature: vec![temperature; n_point],
            velocity_r: vec![0.0; n_point],
            velocity_z: vec![0.0; n_point],
            pressure: vec![0.0; n_pressure],
            fictive_temperature: vec![temperature; n_point],
            viscosity: vec![0.0; n_point],
        }
    }

    /// Recomputes the nodal viscosity from the temperature
    pub fn update_viscosity(&mut self, material: &MaterialParameters) {
        let model = ViscosityModel::new(material);
        self.viscosity = self.temperature.iter().map(|t| model.viscosity(*t)).collect();
    }

    /// Returns the maximum temperature
    pub fn max_temperature(&self) -> f64 {
        self.temperature.iter().fold(f64::MIN, |acc, t| f64::max(acc, *t))
    }

    /// Returns the maximum nodal speed ‖v‖∞ (over both components)
    pub fn max_speed(&self) -> f64 {
        let vr = Vector::from(&self.velocity_r);
        let vz = Vector::from(&self.velocity_z);
        f64::max(vec_norm(&vr, Norm::Max), vec_norm(&vz, Norm::Max))
    }

    /// Returns ‖T - T_other‖∞
    pub fn temperature_change(&self, other: &FieldState) -> f64 {
        max_abs_difference(&self.temperature, &other.temperature)
    }

    /// Returns ‖v - v_other‖∞ (over both components)
    pub fn velocity_change(&self, other: &FieldState) -> f64 {
        f64::max(
            max_abs_difference(&self.velocity_r, &other.velocity_r),
            max_abs_difference(&self.velocity_z, &other.velocity_z),
        )
    }
}

/// Returns max |a - b|; NaN if any difference is NaN
fn max_abs_difference(a: &[f64], b: &[f64]) -> f64 {
    let mut max = 0.0;
    for (x, y) in a.iter().zip(b) {
        let d = f64::abs(x - y);
        if d.is_nan() {
            return f64::NAN;
        }
        if d > max {
            max = d;
        }
    }
    max
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
