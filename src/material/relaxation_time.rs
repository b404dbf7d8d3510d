use crate::base::{MaterialParameters, RELAXATION_TIME_CEILING, VFT_CLAMP_MARGIN};

/// Implements the Tool-Narayanaswamy-Moynihan (TNM) structural relaxation time
///
/// ```text
/// τ(T, T_f) = τ0 · exp(f·x·A / (T_f - T0) + f·(1 - x)·A / (T - T0))
/// ```
///
/// where f = 1 for the natural VFT base and f = ln 10 for the decadic one, so that τ follows the
/// viscosity at equilibrium (T_f = T). Clamped at [RELAXATION_TIME_CEILING] like the viscosity.
pub struct RelaxationModel<'a> {
    param: &'a MaterialParameters,
}

impl<'a> RelaxationModel<'a> {
    /// Allocates a new instance
    pub fn new(param: &'a MaterialParameters) -> Self {
        RelaxationModel { param }
    }

    /// Calculates the relaxation time τ(T, T_f) in seconds
    pub fn relaxation_time(&self, temperature: f64, fictive_temperature: f64) -> f64 {
        let s = temperature - self.param.vft_t0;
        let sf = fictive_temperature - self.param.vft_t0;
        if s <= VFT_CLAMP_MARGIN || sf <= VFT_CLAMP_MARGIN {
            return RELAXATION_TIME_CEILING;
        }
        let fa = self.param.vft_base.ln_factor() * self.param.vft_a;
        let x = self.param.tnm_x;
        let ln_tau = f64::ln(self.param.tau0) + x * fa / sf + (1.0 - x) * fa / s;
        if ln_tau >= f64::ln(RELAXATION_TIME_CEILING) {
            RELAXATION_TIME_CEILING
        } else {
            f64::exp(ln_tau)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
