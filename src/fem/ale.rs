use crate::base::{FlowBc, GeometryError, ProcessParameters, SolverError, SolverOptions};
use crate::mesh::{BoundaryTag, Mesh, EDGE_LOCAL_NODES};

/// Defines how a corner node moves during the ALE update
#[derive(Clone, Copy, Debug, PartialEq)]
enum Motion {
    /// Not on the boundary: follows the smoothed displacement
    Interior,

    /// On a non-free boundary (or where a free surface meets one)
    Fixed,

    /// On a free surface: moves along the vertex normal
    Free,

    /// Where a free surface meets the symmetry axis: moves along z only
    SlideZ,
}

/// Moves the free surface with the normal velocity and smooths the interior mesh
///
/// Each free-surface corner moves by `Δt_eff · (v·n) n`, where n is the length-weighted vertex normal
/// and `Δt_eff = min(ale_time_step, fraction · h / |v·n|)` over all free corners. The interior corner
/// displacements follow from Jacobi sweeps of a Laplace smoother; mid-nodes are recentered afterwards.
///
/// Returns the effective pseudo time step. Returns a geometry error if an element is inverted by the update.
pub fn ale_update(
    mesh: &mut Mesh,
    process: &ProcessParameters,
    velocity_r: &[f64],
    velocity_z: &[f64],
    options: &SolverOptions,
) -> Result<f64, SolverError> {
    let bc_of = |tag: BoundaryTag| process.flow_bcs.iter().find(|(t, _)| *t == tag).map(|(_, bc)| *bc);
    let npoint = mesh.points.len();

    // classify the boundary corners
    let mut on_free = vec![false; npoint];
    let mut on_axis = vec![false; npoint];
    let mut on_other = vec![false; npoint];
    let mut normal = vec![[0.0; 2]; npoint];
    let mut h_min = vec![f64::MAX; npoint];
    for edge in &mesh.boundary {
        let (a, b) = (edge.points[0], edge.points[1]);
        match bc_of(edge.tag) {
            Some(FlowBc::FreeSurface { .. }) => {
                let xa = mesh.point_coords(a);
                let xb = mesh.point_coords(b);
                let t = [xb[0] - xa[0], xb[1] - xa[1]];
                let length = f64::hypot(t[0], t[1]);
                for p in [a, b] {
                    on_free[p] = true;
                    normal[p][0] += t[1]; // length-weighted (t_z, -t_r)
                    normal[p][1] -= t[0];
                    h_min[p] = f64::min(h_min[p], length);
                }
            }
            Some(FlowBc::Axis) => {
                on_axis[a] = true;
                on_axis[b] = true;
            }
            _ if edge.tag == BoundaryTag::Axis => {
                on_axis[a] = true;
                on_axis[b] = true;
            }
            _ => {
                on_other[a] = true;
                on_other[b] = true;
            }
        }
    }
    if !on_free.iter().any(|f| *f) {
        return Ok(0.0);
    }
    let corners = mesh.pressure_nodes();
    let mut motion = vec![Motion::Fixed; npoint];
    for p in &corners {
        motion[*p] = if on_free[*p] {
            if on_other[*p] {
                Motion::Fixed
            } else if on_axis[*p] {
                Motion::SlideZ
            } else {
                Motion::Free
            }
        } else if on_axis[*p] || on_other[*p] {
            Motion::Fixed
        } else {
            Motion::Interior
        };
    }

    // normal speeds and the effective time step
    let mut speed = vec![0.0; npoint];
    let mut dt = options.ale_time_step;
    for p in &corners {
        let p = *p;
        if motion[p] != Motion::Free && motion[p] != Motion::SlideZ {
            continue;
        }
        let norm = f64::hypot(normal[p][0], normal[p][1]);
        if norm > 0.0 {
            normal[p] = [normal[p][0] / norm, normal[p][1] / norm];
        }
        speed[p] = velocity_r[p] * normal[p][0] + velocity_z[p] * normal[p][1];
        if f64::abs(speed[p]) > 0.0 {
            dt = f64::min(dt, options.ale_max_displacement_fraction * h_min[p] / f64::abs(speed[p]));
        }
    }

    // boundary displacements
    let mut displacement = vec![[0.0; 2]; npoint];
    for p in &corners {
        let p = *p;
        match motion[p] {
            Motion::Free => {
                displacement[p] = [dt * speed[p] * normal[p][0], dt * speed[p] * normal[p][1]];
            }
            Motion::SlideZ => displacement[p] = [0.0, dt * speed[p] * normal[p][1]],
            _ => (),
        }
    }

    // interior displacements
    let mut neighbors = vec![Vec::new(); npoint];
    for cell in &mesh.cells {
        for local in &EDGE_LOCAL_NODES {
            let (a, b) = (cell.points[local[0]], cell.points[local[1]]);
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
    }
    for list in neighbors.iter_mut() {
        list.sort();
        list.dedup();
    }
    for _ in 0..options.ale_smoothing_sweeps {
        let previous = displacement.clone();
        for p in &corners {
            let p = *p;
            if motion[p] != Motion::Interior || neighbors[p].is_empty() {
                continue;
            }
            let mut sum = [0.0; 2];
            for q in &neighbors[p] {
                sum[0] += previous[*q][0];
                sum[1] += previous[*q][1];
            }
            let n = neighbors[p].len() as f64;
            displacement[p] = [sum[0] / n, sum[1] / n];
        }
    }

    // move
    for p in &corners {
        let x = mesh.point_coords(*p);
        let moved = [x[0] + displacement[*p][0], x[1] + displacement[*p][1]];
        if moved[0] < 0.0 {
            return Err(GeometryError::InvalidSpec("the free surface crossed the symmetry axis").into());
        }
        mesh.set_point_coords(*p, moved);
    }
    mesh.recenter_mid_nodes();
    mesh.check_jacobians()?;
    log::debug!("ALE update with Δt_eff = {:e}", dt);
    Ok(dt)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
