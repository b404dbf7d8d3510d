use super::{FlowEquations, LinearSystem, PressureMap, FLOW_LOCAL_EQUATIONS};
use crate::base::{FlowBc, MaterialParameters, ProcessParameters, SolverError};
use crate::material::ViscosityModel;
use crate::mesh::{cell_gauss, edge_gauss, BoundaryTag, EdgePad, Mesh, ShapePad, CELL_NGAUSS};
use russell_lab::{Matrix, Vector};
use russell_tensor::{t2_ddot_t2, Mandel, Tensor2};

const SOLVER: &str = "flow";

/// Holds the solution of the creeping-flow problem
#[derive(Clone, Debug)]
pub struct FlowSolution {
    /// Radial velocity at each point (m/s)
    pub velocity_r: Vec<f64>,

    /// Axial velocity at each point (m/s)
    pub velocity_z: Vec<f64>,

    /// Pressure at each corner node, in the order of the pressure map (Pa)
    pub pressure: Vec<f64>,

    /// Viscosity at each point (Pa·s)
    pub viscosity: Vec<f64>,

    /// Reference viscosity used to scale the system (Pa·s)
    pub eta_ref: f64,
}

/// Implements the incompressible Stokes (creeping flow) solver with Taylor-Hood P2-P1 elements
///
/// The weak form, per radian, is:
///
/// ```text
/// ∫ 2η D(v):D(w) r dΩ - ∫ p div(w) r dΩ = ∫ ρ g·w r dΩ + ∫ t·w r dS
///                       - ∫ q div(v) r dΩ = 0
/// ```
///
/// with `div(v) = tr D(v) = ∂v_r/∂r + v_r/r + ∂v_z/∂z`. The rate of deformation D is a symmetric
/// [Tensor2] with the hoop component D_θθ = v_r/r in the out-of-plane slot. The viscosity comes from the temperature field and
/// spans many decades; thus, the momentum equations are divided by the reference viscosity
/// `η_ref = 10^mean(log10 η)` and the unknown pressure is `p̃ = p / η_ref`.
pub struct FlowSolver<'a> {
    mesh: &'a Mesh,
    material: &'a MaterialParameters,
    process: &'a ProcessParameters,
    pmap: PressureMap,
    equations: FlowEquations,
    prescribed: Vec<bool>,
    values: Vec<f64>,
    pinned: bool,
}

impl<'a> FlowSolver<'a> {
    /// Allocates a new instance
    ///
    /// The pressure of the first corner node is pinned to zero if the velocity is prescribed on the
    /// whole boundary (except the symmetry axis).
    pub fn new(
        mesh: &'a Mesh,
        material: &'a MaterialParameters,
        process: &'a ProcessParameters,
    ) -> Result<Self, SolverError> {
        let pmap = PressureMap::new(mesh);
        let equations = FlowEquations::new(mesh, &pmap);
        let mut prescribed = vec![false; equations.n_equation];
        let mut values = vec![0.0; equations.n_equation];
        for (tag, bc) in &process.flow_bcs {
            mesh.check_tag(*tag)?;
            let (vr, vz) = bc.prescribed();
            for p in mesh.nodes_with_tag(*tag) {
                if let Some(value) = vr {
                    prescribed[equations.vr(p)] = true;
                    values[equations.vr(p)] = value;
                }
                if let Some(value) = vz {
                    prescribed[equations.vz(p)] = true;
                    values[equations.vz(p)] = value;
                }
            }
        }
        let closed = mesh.boundary.iter().all(|edge| {
            if edge.tag == BoundaryTag::Axis {
                return true; // r = 0
            }
            match process.flow_bcs.iter().find(|(tag, _)| *tag == edge.tag) {
                Some((_, FlowBc::Axis)) => true,
                Some((_, bc)) => {
                    let (vr, vz) = bc.prescribed();
                    vr.is_some() && vz.is_some()
                }
                None => false,
            }
        });
        let pinned = closed && !pmap.is_empty();
        if pinned {
            prescribed[equations.p(0)] = true;
            values[equations.p(0)] = 0.0;
        }
        Ok(FlowSolver {
            mesh,
            material,
            process,
            pmap,
            equations,
            prescribed,
            values,
            pinned,
        })
    }

    /// Returns true if the pressure level had to be pinned
    pub fn pressure_pinned(&self) -> bool {
        self.pinned
    }

    /// Returns the pressure map
    pub fn pressure_map(&self) -> &PressureMap {
        &self.pmap
    }

    /// Returns the total number of equations
    pub fn n_equation(&self) -> usize {
        self.equations.n_equation
    }

    /// Solves the flow with the viscosity computed from a temperature field
    pub fn solve(&self, temperature: &[f64]) -> Result<FlowSolution, SolverError> {
        let model = ViscosityModel::new(self.material);
        let ncell = self.mesh.cells.len();

        // viscosity at integration points
        let gauss = cell_gauss()?;
        let mut log_eta = vec![[0.0; CELL_NGAUSS]; ncell];
        let mut sum = 0.0;
        for cell in &self.mesh.cells {
            let mut pad = ShapePad::new(&self.mesh.cell_coords(cell.id), cell.id)?;
            for k in 0..gauss.npoint() {
                pad.calc(gauss.coords(k))?;
                let mut t = 0.0;
                for m in 0..6 {
                    t += pad.nn(m) * temperature[cell.points[m]];
                }
                let value = model.log10_viscosity(t);
                if !value.is_finite() {
                    return Err(SolverError::SingularSystem {
                        solver: SOLVER,
                        reason: format!("non-finite viscosity in cell {}", cell.id),
                    });
                }
                log_eta[cell.id][k] = value;
                sum += value;
            }
        }
        let log_ref = sum / ((gauss.npoint() * ncell) as f64);
        let eta_ref = f64::powf(10.0, log_ref);

        // unknowns with the prescribed values
        let mut x = Vector::new(self.equations.n_equation);
        for eq in 0..self.equations.n_equation {
            if self.prescribed[eq] {
                x[eq] = self.values[eq];
            }
        }

        // cells
        let mut lin_sys = LinearSystem::new(self.prescribed.clone(), FLOW_LOCAL_EQUATIONS * FLOW_LOCAL_EQUATIONS * ncell)
            .map_err(|e| SolverError::singular(SOLVER, e))?;
        let rho = self.material.density;
        let g = self.process.gravity;
        let mut dd: Vec<Tensor2> = (0..12).map(|_| Tensor2::new(Mandel::Symmetric2D)).collect();
        for cell in &self.mesh.cells {
            let mut pad = ShapePad::new(&self.mesh.cell_coords(cell.id), cell.id)?;
            let l2g = self.equations.local_to_global(cell, &self.pmap);
            let mut kk = Matrix::new(FLOW_LOCAL_EQUATIONS, FLOW_LOCAL_EQUATIONS);
            let mut ff = Vector::new(FLOW_LOCAL_EQUATIONS);
            for k in 0..gauss.npoint() {
                pad.calc(gauss.coords(k))?;
                let coef = pad.r * pad.det * gauss.weight(k);
                let eta_s = f64::powf(10.0, log_eta[cell.id][k] - log_ref);

                // rate of deformation of each velocity basis function (rr, zz, θθ, rz)
                for m in 0..6 {
                    let (gr, gz) = (pad.grad(m, 0), pad.grad(m, 1));
                    let d_r = &mut dd[2 * m];
                    d_r.clear();
                    d_r.sym_set(0, 0, gr);
                    d_r.sym_set(2, 2, pad.nn(m) / pad.r);
                    d_r.sym_set(0, 1, gz / 2.0);
                    let d_z = &mut dd[2 * m + 1];
                    d_z.clear();
                    d_z.sym_set(1, 1, gz);
                    d_z.sym_set(0, 1, gr / 2.0);
                }

                // viscous block 2η D(wᵢ) : D(wⱼ)
                for i in 0..12 {
                    for j in 0..12 {
                        let value = 2.0 * eta_s * t2_ddot_t2(&dd[i], &dd[j]);
                        kk.set(i, j, kk.get(i, j) + value * coef);
                    }
                }

                // pressure-divergence blocks
                for i in 0..12 {
                    let div = dd[i].get(0, 0) + dd[i].get(1, 1) + dd[i].get(2, 2);
                    for c in 0..3 {
                        let value = -pad.nn_p(c) * div * coef;
                        kk.set(i, 12 + c, kk.get(i, 12 + c) + value);
                        kk.set(12 + c, i, kk.get(12 + c, i) + value);
                    }
                }

                // body force
                for m in 0..6 {
                    ff[2 * m] += rho * g[0] * pad.nn(m) * coef / eta_ref;
                    ff[2 * m + 1] += rho * g[1] * pad.nn(m) * coef / eta_ref;
                }
            }

            // residual R = K x - F
            let mut rr = Vector::new(FLOW_LOCAL_EQUATIONS);
            for i in 0..FLOW_LOCAL_EQUATIONS {
                let mut value = -ff[i];
                for j in 0..FLOW_LOCAL_EQUATIONS {
                    value += kk.get(i, j) * x[l2g[j]];
                }
                rr[i] = value;
            }
            lin_sys
                .assemble(&l2g, &kk, &rr)
                .map_err(|e| SolverError::singular(SOLVER, e))?;
        }

        // boundary loads
        let edge_gauss = edge_gauss()?;
        for (tag, bc) in &self.process.flow_bcs {
            match bc {
                FlowBc::Traction { .. } | FlowBc::Pressure(..) => (),
                FlowBc::FreeSurface { surface_tension } if *surface_tension > 0.0 => (),
                _ => continue,
            }
            for edge in self.mesh.edges_with_tag(*tag) {
                let mut pad = EdgePad::new(&self.mesh.edge_coords(edge))?;
                for q in 0..edge_gauss.npoint() {
                    pad.calc(edge_gauss.coords(q))?;
                    let n = pad.normal;
                    let weight = edge_gauss.weight(q);
                    let (tr, tz, coef) = match bc {
                        FlowBc::Traction { tr, tz } => (*tr, *tz, pad.r * pad.ds * weight),
                        FlowBc::Pressure(p) => (-p * n[0], -p * n[1], pad.r * pad.ds * weight),
                        // hoop curvature 1/r of the surface of revolution
                        FlowBc::FreeSurface { surface_tension } => {
                            (-surface_tension * n[0], -surface_tension * n[1], pad.ds * weight)
                        }
                        _ => (0.0, 0.0, 0.0),
                    };
                    for m in 0..3 {
                        let p = edge.points[m];
                        let eq_r = self.equations.vr(p);
                        let eq_z = self.equations.vz(p);
                        if !lin_sys.prescribed[eq_r] {
                            lin_sys.rr[eq_r] -= tr * pad.nn(m) * coef / eta_ref;
                        }
                        if !lin_sys.prescribed[eq_z] {
                            lin_sys.rr[eq_z] -= tz * pad.nn(m) * coef / eta_ref;
                        }
                    }
                }
            }
        }

        // solve
        lin_sys.solve().map_err(|e| SolverError::singular(SOLVER, e))?;
        for eq in 0..self.equations.n_equation {
            x[eq] -= lin_sys.mdu[eq];
        }

        // results
        let n_point = self.equations.n_point;
        let velocity_r = (0..n_point).map(|p| x[self.equations.vr(p)]).collect();
        let velocity_z = (0..n_point).map(|p| x[self.equations.vz(p)]).collect();
        let pressure = (0..self.pmap.len())
            .map(|i| x[self.equations.p(i)] * eta_ref)
            .collect();
        let viscosity = temperature.iter().map(|t| model.viscosity(*t)).collect();
        log::debug!("flow solved with η_ref = {:e} Pa·s", eta_ref);
        Ok(FlowSolution {
            velocity_r,
            velocity_z,
            pressure,
            viscosity,
            eta_ref,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
