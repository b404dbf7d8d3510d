use crate::base::{MaterialParameters, STEFAN_BOLTZMANN};

/// Implements the radiation-enhanced (Rosseland) conductivity model
///
/// ```text
/// k_eff(T) = k + k_rad(T)
/// k_rad(T) = 16 σ n² T³ / (3 α)
/// ```
///
/// An opaque material (no absorption coefficient) has no radiative contribution.
pub struct ConductivityModel<'a> {
    param: &'a MaterialParameters,
}

impl<'a> ConductivityModel<'a> {
    /// Allocates a new instance
    pub fn new(param: &'a MaterialParameters) -> Self {
        ConductivityModel { param }
    }

    /// Returns the coefficient c such that k_rad = c T³
    #[inline]
    fn radiative_coefficient(&self) -> f64 {
        match self.param.absorption {
            Some(alpha) => {
                let n = self.param.refractive_index;
                16.0 * STEFAN_BOLTZMANN * n * n / (3.0 * alpha)
            }
            None => 0.0,
        }
    }

    /// Calculates the radiative conductivity k_rad(T)
    pub fn radiative_conductivity(&self, temperature: f64) -> f64 {
        self.radiative_coefficient() * temperature * temperature * temperature
    }

    /// Calculates the derivative dk_rad/dT = 48 σ n² T² / (3 α)
    pub fn d_radiative_conductivity_dt(&self, temperature: f64) -> f64 {
        3.0 * self.radiative_coefficient() * temperature * temperature
    }

    /// Calculates the effective conductivity k_eff(T)
    pub fn effective_conductivity(&self, temperature: f64) -> f64 {
        self.param.conductivity + self.radiative_conductivity(temperature)
    }

    /// Calculates the effective conductivity and its derivative (k_eff, dk_eff/dT)
    ///
    /// This pair is what the thermal Newton step consumes.
    pub fn conductivity_and_derivative(&self, temperature: f64) -> (f64, f64) {
        let c = self.radiative_coefficient();
        let t2 = temperature * temperature;
        (self.param.conductivity + c * t2 * temperature, 3.0 * c * t2)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ConductivityModel;
    use crate::base::{Samples, STEFAN_BOLTZMANN};
    use russell_lab::approx_eq;

    #[test]
    fn opaque_material_has_constant_conductivity() {
        let param = Samples::soda_lime_opaque();
        let model = ConductivityModel::new(&param);
        assert_eq!(model.radiative_conductivity(1500.0), 0.0);
        assert_eq!(model.conductivity_and_derivative(1500.0), (1.0, 0.0));
    }

    #[test]
    fn rosseland_conductivity_works() {
        let param = Samples::soda_lime();
        let model = ConductivityModel::new(&param);
        let t = 1200.0;
        let correct = 16.0 * STEFAN_BOLTZMANN * 2.25 * t * t * t / 900.0;
        approx_eq(model.radiative_conductivity(t), correct, 1e-12);
        approx_eq(model.effective_conductivity(t), 1.0 + correct, 1e-12);
        let (k, dk) = model.conductivity_and_derivative(t);
        approx_eq(k, 1.0 + correct, 1e-12);
        approx_eq(dk, 48.0 * STEFAN_BOLTZMANN * 2.25 * t * t / 900.0, 1e-14);
        approx_eq(model.d_radiative_conductivity_dt(t), dk, 1e-15);
    }
}
