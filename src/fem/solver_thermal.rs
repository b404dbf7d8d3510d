use super::{ControlConvergence, LinearSystem, ERR_NON_FINITE_RESIDUAL, ERR_NON_FINITE_SOLUTION};
use crate::base::{
    ConvergenceRecord, MaterialParameters, ProcessParameters, SolverError, SolverOptions, Stage, ThermalBc,
    STEFAN_BOLTZMANN,
};
use crate::material::ConductivityModel;
use crate::mesh::{cell_gauss, edge_gauss, EdgePad, Mesh, ShapePad};
use russell_lab::{vec_norm, Matrix, Norm, Vector};
use std::sync::atomic::{AtomicBool, Ordering};

const SOLVER: &str = "thermal Newton";

const SOLVER_TRANSIENT: &str = "transient thermal";

/// Holds the nodal temperature histories produced by the transient solver
#[derive(Clone, Debug, PartialEq)]
pub struct TransientHistory {
    /// Accepted times, starting at zero
    pub times: Vec<f64>,

    /// Temperatures at each accepted time: `temperatures[step][point]`
    pub temperatures: Vec<Vec<f64>>,
}

impl TransientHistory {
    /// Returns the (times, temperatures) history of one point
    pub fn of_point(&self, point: usize) -> Vec<f64> {
        self.temperatures.iter().map(|t| t[point]).collect()
    }
}

/// Implements the (nonlinear) thermal-radiation solver
///
/// The weak form, per radian, is:
///
/// ```text
/// ∫ k_eff(T) ∇T·∇φ r dΩ + ∫ ρ c_p (v·∇T) φ r dΩ + ∫ ρ c_p (T - T_old)/Δt φ r dΩ
///     = ∫ q φ r dS - ∫ h (T - T∞) φ r dS - ∫ ε σ (T⁴ - T∞⁴) φ r dS
/// ```
///
/// solved with Newton iterations (or with a Picard-only tangent when `thermal_newton` is false).
pub struct ThermalSolver<'a> {
    mesh: &'a Mesh,
    material: &'a MaterialParameters,
    process: &'a ProcessParameters,
    options: &'a SolverOptions,
    prescribed: Vec<bool>,
    prescribed_values: Vec<f64>,
    nnz_local: usize,
}

impl<'a> ThermalSolver<'a> {
    /// Allocates a new instance
    ///
    /// Returns an error if a boundary condition refers to a tag without edges.
    pub fn new(
        mesh: &'a Mesh,
        material: &'a MaterialParameters,
        process: &'a ProcessParameters,
        options: &'a SolverOptions,
    ) -> Result<Self, SolverError> {
        let npoint = mesh.points.len();
        let mut prescribed = vec![false; npoint];
        let mut prescribed_values = vec![0.0; npoint];
        let mut nnz_local = 36 * mesh.cells.len();
        for (tag, bc) in &process.thermal_bcs {
            mesh.check_tag(*tag)?;
            match bc {
                ThermalBc::Temperature(value) => {
                    for p in mesh.nodes_with_tag(*tag) {
                        prescribed[p] = true;
                        prescribed_values[p] = *value;
                    }
                }
                _ => nnz_local += 9 * mesh.edges_with_tag(*tag).count(),
            }
        }
        Ok(ThermalSolver {
            mesh,
            material,
            process,
            options,
            prescribed,
            prescribed_values,
            nnz_local,
        })
    }

    /// Returns a copy of the temperature with the prescribed values applied
    pub fn apply_prescribed(&self, temperature: &[f64]) -> Vec<f64> {
        temperature
            .iter()
            .enumerate()
            .map(|(p, t)| if self.prescribed[p] { self.prescribed_values[p] } else { *t })
            .collect()
    }

    /// Solves the steady problem starting from a guess
    ///
    /// The velocity (v_r, v_z), if given, adds heat advection.
    pub fn solve_steady(
        &self,
        guess: &[f64],
        velocity: Option<(&[f64], &[f64])>,
        record: &mut ConvergenceRecord,
        control: &mut ControlConvergence,
    ) -> Result<Vec<f64>, SolverError> {
        let (temperature, _) = self.newton(guess, None, velocity, Stage::Thermal, record, control)?;
        Ok(temperature)
    }

    /// Solves the transient problem with backward Euler and an adaptive time increment
    ///
    /// The increment is halved whenever the Newton iterations fail and enlarged by 1.5 (up to `dt_max`)
    /// after three consecutive steps converged with a single correction. Returns None if the
    /// cancellation flag was raised (checked once per time step).
    pub fn solve_transient(
        &self,
        initial: &[f64],
        t_final: f64,
        velocity: Option<(&[f64], &[f64])>,
        record: &mut ConvergenceRecord,
        control: &mut ControlConvergence,
        cancel: &AtomicBool,
    ) -> Result<Option<TransientHistory>, SolverError> {
        let mut temperature = self.apply_prescribed(initial);
        let mut history = TransientHistory {
            times: vec![0.0],
            temperatures: vec![temperature.clone()],
        };
        let mut t = 0.0;
        let mut dt = self.options.dt_initial;
        let mut n_easy = 0;
        while t < t_final * (1.0 - 1e-12) {
            if cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }
            let dt_step = f64::min(dt, t_final - t);
            let old = Some((temperature.as_slice(), dt_step));
            match self.newton(&temperature, old, velocity, Stage::TransientThermal, record, control) {
                Ok((updated, n_solves)) => {
                    t += dt_step;
                    temperature = updated;
                    history.times.push(t);
                    history.temperatures.push(temperature.clone());
                    // a single correction plus the verifying solve
                    if n_solves <= 2 {
                        n_easy += 1;
                    } else {
                        n_easy = 0;
                    }
                    if n_easy == 3 {
                        dt = f64::min(1.5 * dt, self.options.dt_max);
                        n_easy = 0;
                        log::debug!("t = {:e}: increasing Δt to {:e}", t, dt);
                    }
                }
                Err(SolverError::Convergence { .. }) => {
                    dt *= 0.5;
                    n_easy = 0;
                    log::warn!("t = {:e}: thermal iterations failed; cutting Δt to {:e}", t, dt);
                    if dt < self.options.dt_min {
                        return Err(SolverError::Convergence {
                            solver: SOLVER_TRANSIENT,
                            iterations: self.options.thermal_max_iterations,
                            record: record.clone(),
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Some(history))
    }

    /// Runs the Newton iterations and returns the temperature and the number of linear solves
    ///
    /// NaN or Inf appearing from finite data (e.g. the overflow of the radiation term) is a divergence
    /// and gives a convergence error, so the transient solver can cut the time increment. NaN or Inf
    /// already present in the given temperature or velocity gives a singular-system error.
    fn newton(
        &self,
        start: &[f64],
        old: Option<(&[f64], f64)>,
        velocity: Option<(&[f64], &[f64])>,
        stage: Stage,
        record: &mut ConvergenceRecord,
        control: &mut ControlConvergence,
    ) -> Result<(Vec<f64>, usize), SolverError> {
        let mut temperature = self.apply_prescribed(start);
        let finite = |x: &[f64]| x.iter().all(|v| v.is_finite());
        let bad_input = !finite(&temperature)
            || old.map_or(false, |(t_old, _)| !finite(t_old))
            || velocity.map_or(false, |(vr, vz)| !finite(vr) || !finite(vz));
        let mut lin_sys = LinearSystem::new(self.prescribed.clone(), self.nnz_local)
            .map_err(|e| SolverError::singular(SOLVER, e))?;
        for iteration in 0..self.options.thermal_max_iterations {
            lin_sys.reset().map_err(|e| SolverError::singular(SOLVER, e))?;
            self.assemble(&mut lin_sys, &temperature, old, velocity)?;
            if let Err(e) = lin_sys.solve() {
                if bad_input || (e != ERR_NON_FINITE_RESIDUAL && e != ERR_NON_FINITE_SOLUTION) {
                    return Err(SolverError::singular(SOLVER, e));
                }
                control.report(record, stage, iteration, f64::NAN);
                log::warn!("{}: {} at iteration {}", SOLVER, e, iteration);
                return Err(SolverError::Convergence {
                    solver: SOLVER,
                    iterations: iteration + 1,
                    record: record.clone(),
                });
            }
            for p in 0..temperature.len() {
                temperature[p] -= lin_sys.mdu[p];
            }
            let norm = vec_norm(&lin_sys.mdu, Norm::Max);
            control.report(record, stage, iteration, norm);
            if norm < self.options.thermal_tol {
                return Ok((temperature, iteration + 1));
            }
        }
        Err(SolverError::Convergence {
            solver: SOLVER,
            iterations: self.options.thermal_max_iterations,
            record: record.clone(),
        })
    }

    /// Assembles the residual vector and the Jacobian matrix
    fn assemble(
        &self,
        lin_sys: &mut LinearSystem,
        temperature: &[f64],
        old: Option<(&[f64], f64)>,
        velocity: Option<(&[f64], &[f64])>,
    ) -> Result<(), SolverError> {
        let model = ConductivityModel::new(self.material);
        let rho_c = self.material.density * self.material.specific_heat;

        // cells
        let gauss = cell_gauss()?;
        for cell in &self.mesh.cells {
            let mut pad = ShapePad::new(&self.mesh.cell_coords(cell.id), cell.id)?;
            let mut kk = Matrix::new(6, 6);
            let mut rr = Vector::new(6);
            for k in 0..gauss.npoint() {
                pad.calc(gauss.coords(k))?;
                let coef = pad.r * pad.det * gauss.weight(k);

                // interpolate
                let mut t = 0.0;
                let mut grad_t = [0.0; 2];
                let mut v = [0.0; 2];
                let mut t_rate = 0.0;
                let mut beta = 0.0;
                for m in 0..6 {
                    let p = cell.points[m];
                    t += pad.nn(m) * temperature[p];
                    grad_t[0] += pad.grad(m, 0) * temperature[p];
                    grad_t[1] += pad.grad(m, 1) * temperature[p];
                    if let Some((vr, vz)) = velocity {
                        v[0] += pad.nn(m) * vr[p];
                        v[1] += pad.nn(m) * vz[p];
                    }
                }
                if let Some((t_old, dt)) = old {
                    let mut t_prev = 0.0;
                    for m in 0..6 {
                        t_prev += pad.nn(m) * t_old[cell.points[m]];
                    }
                    beta = rho_c / dt;
                    t_rate = (t - t_prev) / dt;
                }
                let (k, dk) = model.conductivity_and_derivative(t);
                let dk = if self.options.thermal_newton { dk } else { 0.0 };
                let advection = rho_c * (v[0] * grad_t[0] + v[1] * grad_t[1]);

                // residual and Jacobian
                for a in 0..6 {
                    let ga = [pad.grad(a, 0), pad.grad(a, 1)];
                    let grad_t_dot_ga = grad_t[0] * ga[0] + grad_t[1] * ga[1];
                    rr[a] += (k * grad_t_dot_ga + (advection + rho_c * t_rate) * pad.nn(a)) * coef;
                    for b in 0..6 {
                        let gb = [pad.grad(b, 0), pad.grad(b, 1)];
                        let value = k * (ga[0] * gb[0] + ga[1] * gb[1])
                            + dk * pad.nn(b) * grad_t_dot_ga
                            + rho_c * (v[0] * gb[0] + v[1] * gb[1]) * pad.nn(a)
                            + beta * pad.nn(a) * pad.nn(b);
                        kk.set(a, b, kk.get(a, b) + value * coef);
                    }
                }
            }
            lin_sys
                .assemble(&cell.points, &kk, &rr)
                .map_err(|e| SolverError::singular(SOLVER, e))?;
        }

        // boundaries (the flux is positive when leaving the domain)
        let edge_gauss = edge_gauss()?;
        for (tag, bc) in &self.process.thermal_bcs {
            if let ThermalBc::Temperature(..) = bc {
                continue;
            }
            for edge in self.mesh.edges_with_tag(*tag) {
                let mut pad = EdgePad::new(&self.mesh.edge_coords(edge))?;
                let mut kk = Matrix::new(3, 3);
                let mut rr = Vector::new(3);
                for q in 0..edge_gauss.npoint() {
                    pad.calc(edge_gauss.coords(q))?;
                    let coef = pad.r * pad.ds * edge_gauss.weight(q);
                    let mut t = 0.0;
                    for m in 0..3 {
                        t += pad.nn(m) * temperature[edge.points[m]];
                    }
                    let (flux, d_flux) = match bc {
                        ThermalBc::Flux(q_in) => (-q_in, 0.0),
                        ThermalBc::Convection { h, t_ambient } => (h * (t - t_ambient), *h),
                        ThermalBc::Radiation { emissivity, t_ambient } => {
                            let c = emissivity * STEFAN_BOLTZMANN;
                            (c * (t * t * t * t - f64::powi(*t_ambient, 4)), 4.0 * c * t * t * t)
                        }
                        ThermalBc::Temperature(..) => (0.0, 0.0),
                    };
                    for a in 0..3 {
                        rr[a] += flux * pad.nn(a) * coef;
                        for b in 0..3 {
                            kk.set(a, b, kk.get(a, b) + d_flux * pad.nn(a) * pad.nn(b) * coef);
                        }
                    }
                }
                lin_sys
                    .assemble(&edge.points, &kk, &rr)
                    .map_err(|e| SolverError::singular(SOLVER, e))?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
