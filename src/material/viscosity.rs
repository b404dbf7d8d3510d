use crate::base::{MaterialParameters, VFT_CLAMP_MARGIN, VISCOSITY_CEILING};

/// Implements the Vogel-Fulcher-Tammann (VFT) viscosity model
///
/// ```text
/// η(T) = η∞ · exp(A / (T - T0))      (natural base)
/// η(T) = η∞ · 10^(A / (T - T0))      (decadic base)
/// ```
///
/// For T ≤ T0 + ε the model returns the ceiling [VISCOSITY_CEILING] (solidified glass); values above
/// the ceiling are clamped. Thus, for any finite T ≥ 0, the results are finite and positive.
pub struct ViscosityModel<'a> {
    param: &'a MaterialParameters,
}

impl<'a> ViscosityModel<'a> {
    /// Allocates a new instance
    pub fn new(param: &'a MaterialParameters) -> Self {
        ViscosityModel { param }
    }

    /// Returns the natural logarithm of the unclamped viscosity, or None in the clamped regime
    ///
    /// NaN temperatures propagate (they are never clamped).
    fn ln_unclamped(&self, temperature: f64) -> Option<f64> {
        let s = temperature - self.param.vft_t0;
        if s <= VFT_CLAMP_MARGIN {
            return None;
        }
        let ln_eta = f64::ln(self.param.eta_inf) + self.param.vft_base.ln_factor() * self.param.vft_a / s;
        if ln_eta >= f64::ln(VISCOSITY_CEILING) {
            None
        } else {
            Some(ln_eta)
        }
    }

    /// Calculates the viscosity η(T) in Pa·s
    pub fn viscosity(&self, temperature: f64) -> f64 {
        match self.ln_unclamped(temperature) {
            Some(ln_eta) => f64::exp(ln_eta),
            None => VISCOSITY_CEILING,
        }
    }

    /// Calculates log₁₀ η(T) directly (without forming η)
    ///
    /// The result is clamped at log₁₀ of the ceiling, consistently with [ViscosityModel::viscosity].
    pub fn log10_viscosity(&self, temperature: f64) -> f64 {
        let s = temperature - self.param.vft_t0;
        let ceiling = f64::log10(VISCOSITY_CEILING);
        if s <= VFT_CLAMP_MARGIN {
            return ceiling;
        }
        let value = f64::log10(self.param.eta_inf)
            + self.param.vft_base.ln_factor() * self.param.vft_a / (s * std::f64::consts::LN_10);
        if value >= ceiling {
            ceiling
        } else {
            value
        }
    }

    /// Calculates the derivative dη/dT
    ///
    /// ```text
    /// dη/dT = -η · f · A / (T - T0)²    (f = 1 or ln 10)
    /// ```
    ///
    /// The derivative is zero in the clamped regime.
    pub fn d_viscosity_dt(&self, temperature: f64) -> f64 {
        match self.ln_unclamped(temperature) {
            Some(ln_eta) => {
                let s = temperature - self.param.vft_t0;
                -f64::exp(ln_eta) * self.param.vft_base.ln_factor() * self.param.vft_a / (s * s)
            }
            None => 0.0,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ViscosityModel;
    use crate::base::{Samples, VftBase, VISCOSITY_CEILING};
    use russell_lab::approx_eq;

    #[test]
    fn natural_base_works() {
        let mut param = Samples::soda_lime();
        param.vft_base = VftBase::Natural;
        param.eta_inf = 1e-2;
        param.vft_a = 5000.0;
        param.vft_t0 = 500.0;
        let model = ViscosityModel::new(&param);
        approx_eq(model.viscosity(1500.0), 1e-2 * f64::exp(5.0), 1e-12);
        approx_eq(model.log10_viscosity(1500.0), f64::log10(1e-2 * f64::exp(5.0)), 1e-14);
        approx_eq(model.d_viscosity_dt(1500.0), -1e-2 * f64::exp(5.0) * 5000.0 / 1e6, 1e-14);
    }

    #[test]
    fn clamping_works() {
        let param = Samples::soda_lime();
        let model = ViscosityModel::new(&param);
        for t in [0.0, 300.0, 520.0, 521.0] {
            assert_eq!(model.viscosity(t), VISCOSITY_CEILING);
            assert_eq!(model.log10_viscosity(t), 20.0);
            assert_eq!(model.d_viscosity_dt(t), 0.0);
        }
        // just above the margin the unclamped value overflows the ceiling
        assert_eq!(model.viscosity(521.5), VISCOSITY_CEILING);
        assert!(model.viscosity(1000.0) < VISCOSITY_CEILING);
        assert!(model.viscosity(f64::NAN).is_nan());
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let param = Samples::soda_lime();
        let model = ViscosityModel::new(&param);
        for t in [900.0, 1200.0, 1600.0] {
            let h = 1e-4;
            let num = (model.viscosity(t + h) - model.viscosity(t - h)) / (2.0 * h);
            let ana = model.d_viscosity_dt(t);
            assert!(f64::abs(num - ana) <= 1e-6 * f64::abs(ana));
        }
    }

    /// Returns temperatures in [0, 3000] K, denser around T0 and through the ceiling band
    fn sweep(t0: f64) -> Vec<f64> {
        let mut list: Vec<f64> = (0..=30_000).map(|i| 0.1 * i as f64).collect();
        list.extend((0..=300_000).map(|i| t0 - 1.0 + 1e-3 * i as f64));
        list.extend((0..=16).map(|k| t0 + 1.0 + f64::powi(10.0, -k)));
        list.extend([t0, t0 + 1.0, f64::MAX, f64::INFINITY]);
        list.retain(|t| *t >= 0.0);
        list.sort_by(|a, b| a.partial_cmp(b).unwrap());
        list
    }

    #[test]
    fn log10_viscosity_matches_the_viscosity() {
        for base in [VftBase::Natural, VftBase::Decadic] {
            let mut param = Samples::soda_lime();
            param.vft_base = base;
            let model = ViscosityModel::new(&param);
            let t0 = param.vft_t0;
            let n = 50_000;
            for i in 0..=n {
                let t = t0 + 1.0 + (3000.0 - t0 - 1.0) * (i as f64) / (n as f64);
                let direct = model.log10_viscosity(t);
                let formed = f64::log10(model.viscosity(t));
                assert!(
                    f64::abs(direct - formed) <= 1e-6 * f64::max(1.0, f64::abs(formed)),
                    "{:?} base at T = {}: {} vs {}",
                    base,
                    t,
                    direct,
                    formed
                );
            }
        }
    }

    #[test]
    fn viscosity_is_finite_and_positive_for_all_temperatures() {
        for base in [VftBase::Natural, VftBase::Decadic] {
            let mut param = Samples::soda_lime();
            param.vft_base = base;
            let model = ViscosityModel::new(&param);
            let mut previous = VISCOSITY_CEILING;
            for t in sweep(param.vft_t0) {
                let eta = model.viscosity(t);
                assert!(eta.is_finite() && eta > 0.0, "{:?} base at T = {}: η = {}", base, t, eta);
                assert!(eta <= VISCOSITY_CEILING);
                let log_eta = model.log10_viscosity(t);
                assert!(log_eta.is_finite() && log_eta <= 20.0);
                assert!(model.d_viscosity_dt(t) <= 0.0);
                if t > param.vft_t0 - 1.0 && t < 3000.0 {
                    // non-increasing through the clamp
                    assert!(eta <= previous * (1.0 + 1e-12), "{:?} base at T = {}", base, t);
                    previous = eta;
                }
            }
        }
    }
}
