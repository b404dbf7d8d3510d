use serde::{Deserialize, Serialize};

/// Defines the exponential base of the Vogel-Fulcher-Tammann equation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VftBase {
    /// η = η∞ · exp(A / (T - T0))
    Natural,

    /// η = η∞ · 10^(A / (T - T0)) (Fulcher form used by glass catalogs)
    Decadic,
}

impl Default for VftBase {
    fn default() -> Self {
        VftBase::Natural
    }
}

impl VftBase {
    /// Returns the factor converting A/(T-T0) into a natural exponent
    #[inline]
    pub fn ln_factor(&self) -> f64 {
        match self {
            VftBase::Natural => 1.0,
            VftBase::Decadic => std::f64::consts::LN_10,
        }
    }
}

/// Holds the parameters of one glass composition (SI units)
///
/// The parameters are immutable during a run and shared by reference.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialParameters {
    /// VFT pre-exponential viscosity η∞ (Pa·s)
    pub eta_inf: f64,

    /// VFT activation parameter A (K)
    pub vft_a: f64,

    /// VFT reference temperature T0 (K)
    pub vft_t0: f64,

    /// VFT exponential base
    #[serde(default)]
    pub vft_base: VftBase,

    /// Density ρ (kg/m³)
    pub density: f64,

    /// Base (phonon) thermal conductivity (W/(m·K))
    pub conductivity: f64,

    /// Specific heat c_p (J/(kg·K))
    pub specific_heat: f64,

    /// Linear thermal expansion coefficient α (1/K)
    pub thermal_expansion: f64,

    /// Young's modulus E (Pa)
    pub young: f64,

    /// Poisson's coefficient ν
    pub poisson: f64,

    /// Absorption coefficient (1/m); None means opaque (no radiative conduction)
    pub absorption: Option<f64>,

    /// Refractive index n
    pub refractive_index: f64,

    /// TNM pre-exponential relaxation time τ0 (s)
    pub tau0: f64,

    /// TNM non-linearity parameter x (0 < x ≤ 1)
    pub tnm_x: f64,
}

impl MaterialParameters {
    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if !(self.eta_inf > 0.0) || !self.eta_inf.is_finite() {
            return Some(format!("eta_inf = {:?} is incorrect; it must be > 0.0", self.eta_inf));
        }
        if !(self.vft_a > 0.0) || !self.vft_a.is_finite() {
            return Some(format!("vft_a = {:?} is incorrect; it must be > 0.0", self.vft_a));
        }
        if !(self.vft_t0 >= 0.0) || !self.vft_t0.is_finite() {
            return Some(format!("vft_t0 = {:?} is incorrect; it must be ≥ 0.0", self.vft_t0));
        }
        if !(self.density > 0.0) {
            return Some(format!("density = {:?} is incorrect; it must be > 0.0", self.density));
        }
        if !(self.conductivity > 0.0) {
            return Some(format!(
                "conductivity = {:?} is incorrect; it must be > 0.0",
                self.conductivity
            ));
        }
        if !(self.specific_heat > 0.0) {
            return Some(format!(
                "specific_heat = {:?} is incorrect; it must be > 0.0",
                self.specific_heat
            ));
        }
        if !(self.thermal_expansion >= 0.0) {
            return Some(format!(
                "thermal_expansion = {:?} is incorrect; it must be ≥ 0.0",
                self.thermal_expansion
            ));
        }
        if !(self.young > 0.0) {
            return Some(format!("young = {:?} is incorrect; it must be > 0.0", self.young));
        }
        if !(self.poisson >= 0.0 && self.poisson < 0.5) {
            return Some(format!(
                "poisson = {:?} is incorrect; it must be 0.0 ≤ ν < 0.5",
                self.poisson
            ));
        }
        if let Some(alpha) = self.absorption {
            if !(alpha > 0.0) {
                return Some(format!("absorption = {:?} is incorrect; it must be > 0.0", alpha));
            }
        }
        if !(self.refractive_index >= 1.0) {
            return Some(format!(
                "refractive_index = {:?} is incorrect; it must be ≥ 1.0",
                self.refractive_index
            ));
        }
        if !(self.tau0 > 0.0) {
            return Some(format!("tau0 = {:?} is incorrect; it must be > 0.0", self.tau0));
        }
        if !(self.tnm_x > 0.0 && self.tnm_x <= 1.0) {
            return Some(format!(
                "tnm_x = {:?} is incorrect; it must be 0.0 < x ≤ 1.0",
                self.tnm_x
            ));
        }
        None // all good
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
