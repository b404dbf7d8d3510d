use super::{FieldState, PressureMap};
use crate::base::{FlowBc, MaterialParameters, ProcessParameters, ResidualStress, SolverError, SummaryMetrics};
use crate::material::ViscosityModel;
use crate::mesh::{edge_gauss, edge_reference_point, BoundaryTag, EdgePad, Mesh, ShapePad};
use russell_tensor::{Mandel, Tensor2};
use std::f64::consts::PI;

/// Computes the volumetric flow rate through the edges of a tag (positive when leaving the domain)
///
/// ```text
/// Q = 2π ∫ v·n r ds
/// ```
pub fn boundary_flux(
    mesh: &Mesh,
    velocity_r: &[f64],
    velocity_z: &[f64],
    tag: BoundaryTag,
) -> Result<f64, SolverError> {
    let gauss = edge_gauss()?;
    let mut sum = 0.0;
    for edge in mesh.edges_with_tag(tag) {
        let mut pad = EdgePad::new(&mesh.edge_coords(edge))?;
        for q in 0..gauss.npoint() {
            pad.calc(gauss.coords(q))?;
            let mut v = [0.0; 2];
            for m in 0..3 {
                v[0] += pad.nn(m) * velocity_r[edge.points[m]];
                v[1] += pad.nn(m) * velocity_z[edge.points[m]];
            }
            sum += (v[0] * pad.normal[0] + v[1] * pad.normal[1]) * pad.r * pad.ds * gauss.weight(q);
        }
    }
    Ok(2.0 * PI * sum)
}

/// Computes the axial force acting on the edges of a tag
///
/// ```text
/// F = 2π ∫ (σ_zr n_r + σ_zz n_z) r ds
///
/// σ = -p I + 2 η D
/// ```
///
/// The rate of deformation D comes from the owner cell of each edge.
pub fn axial_force(
    mesh: &Mesh,
    material: &MaterialParameters,
    fields: &FieldState,
    tag: BoundaryTag,
) -> Result<f64, SolverError> {
    let model = ViscosityModel::new(material);
    let pmap = PressureMap::new(mesh);
    let gauss = edge_gauss()?;
    let mut sigma = Tensor2::new(Mandel::Symmetric2D);
    let mut sum = 0.0;
    for edge in mesh.edges_with_tag(tag) {
        let local = mesh.local_edge(edge)?;
        let cell = &mesh.cells[edge.cell];
        let mut pad = ShapePad::new(&mesh.cell_coords(cell.id), cell.id)?;
        let mut epad = EdgePad::new(&mesh.edge_coords(edge))?;
        for q in 0..gauss.npoint() {
            let xi_edge = gauss.coords(q)[0];
            epad.calc(&[xi_edge])?;
            pad.calc(&edge_reference_point(local, xi_edge))?;
            let mut t = 0.0;
            for m in 0..6 {
                t += pad.nn(m) * fields.temperature[cell.points[m]];
            }
            let mut pressure = 0.0;
            for c in 0..3 {
                if let Some(i) = pmap.get(cell.points[c]) {
                    pressure += pad.nn_p(c) * fields.pressure[i];
                }
            }
            rate_of_deformation(&mut sigma, &pad, &cell.points, &fields.velocity_r, &fields.velocity_z);
            let two_eta = 2.0 * model.viscosity(t);
            for (i, j) in [(0, 0), (1, 1), (2, 2), (0, 1)] {
                let value = two_eta * sigma.get(i, j) - if i == j { pressure } else { 0.0 };
                sigma.sym_set(i, j, value);
            }
            let traction_z = sigma.get(1, 0) * epad.normal[0] + sigma.get(1, 1) * epad.normal[1];
            sum += traction_z * epad.r * epad.ds * gauss.weight(q);
        }
    }
    Ok(2.0 * PI * sum)
}

/// Calculates the axisymmetric rate of deformation D = sym(∇v) with D_θθ = v_r / r
///
/// The components are (0, 0) = rr, (1, 1) = zz, (2, 2) = θθ, and (0, 1) = rz. The hoop component
/// is skipped on the axis, where v_r vanishes.
pub(crate) fn rate_of_deformation(
    dd: &mut Tensor2,
    pad: &ShapePad,
    points: &[usize],
    velocity_r: &[f64],
    velocity_z: &[f64],
) {
    dd.clear();
    for m in 0..points.len() {
        let (vr, vz) = (velocity_r[points[m]], velocity_z[points[m]]);
        dd.sym_add(0, 0, 1.0, pad.grad(m, 0) * vr);
        dd.sym_add(1, 1, 1.0, pad.grad(m, 1) * vz);
        dd.sym_add(0, 1, 1.0, (pad.grad(m, 1) * vr + pad.grad(m, 0) * vz) / 2.0);
        if pad.r > 0.0 {
            dd.sym_add(2, 2, 1.0, pad.nn(m) * vr / pad.r);
        }
    }
}

/// Computes the scalar summary of a run
pub fn summary_metrics(
    mesh: &Mesh,
    material: &MaterialParameters,
    process: &ProcessParameters,
    fields: &FieldState,
    residual_stress: &ResidualStress,
    outer_iterations: usize,
) -> Result<SummaryMetrics, SolverError> {
    let has = |tag: BoundaryTag| mesh.boundary.iter().any(|e| e.tag == tag);
    let flux = |tag: BoundaryTag| boundary_flux(mesh, &fields.velocity_r, &fields.velocity_z, tag);
    let mut summary = SummaryMetrics {
        max_temperature: fields.max_temperature(),
        max_von_mises: residual_stress.von_mises.iter().fold(0.0, |acc, s| f64::max(acc, *s)),
        fiber_tension: None,
        feed_speed: None,
        inflow_flux: None,
        outflow_flux: None,
        free_surface_flux: None,
        outer_iterations,
    };
    if !process.solves_flow() {
        return Ok(summary);
    }
    if has(BoundaryTag::Bottom) {
        summary.inflow_flux = Some(-flux(BoundaryTag::Bottom)?);
    }
    if has(BoundaryTag::Top) {
        summary.outflow_flux = Some(flux(BoundaryTag::Top)?);
        if process.fiber_tension {
            summary.fiber_tension = Some(axial_force(mesh, material, fields, BoundaryTag::Top)?);
        }
    }
    if process.has_free_surface() {
        let mut sum = 0.0;
        for (tag, bc) in &process.flow_bcs {
            if let FlowBc::FreeSurface { .. } = bc {
                sum += flux(*tag)?;
            }
        }
        summary.free_surface_flux = Some(sum);
    }
    let radius = mesh
        .nodes_with_tag(BoundaryTag::Bottom)
        .iter()
        .fold(0.0, |acc, p| f64::max(acc, mesh.point_coords(*p)[0]));
    if radius > 0.0 {
        if let Some(rate) = summary.outflow_flux.or(summary.inflow_flux) {
            summary.feed_speed = Some(rate / (PI * radius * radius));
        }
    }
    Ok(summary)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
