use super::{BoundaryEdge, BoundaryTag, Mesh};
use crate::base::GeometryError;
use serde::{Deserialize, Serialize};

/// Defines the geometry of a simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeometrySpec {
    /// Rectangular (r, z) cross-section; the left side is tagged Axis if r_min = 0, otherwise Inner
    Rectangle {
        r_min: f64,
        r_max: f64,
        z_min: f64,
        z_max: f64,
        nr: usize,
        nz: usize,
    },

    /// Solid (inner_radius = 0) or hollow cylinder standing on z = 0
    Cylinder {
        inner_radius: f64,
        outer_radius: f64,
        height: f64,
        nr: usize,
        nz: usize,
    },

    /// Neck-down region of a fiber draw along +z with the profile R(z) = R_p (R_f / R_p)^(z / L)
    NeckDown {
        preform_radius: f64,
        fiber_radius: f64,
        length: f64,
        nr: usize,
        nz: usize,
    },

    /// Mesh given by the caller
    Mesh(Mesh),
}

/// Generates a structured mesh of straight-edged 6-node (Tri6) triangles
///
/// Each (r, z) quadrilateral is split along its diagonal into two triangles. The nodes lie on a
/// `(2 nr + 1) × (2 nz + 1)` grid so that the mid-nodes are shared among neighbors.
///
/// A caller-given mesh is validated and returned as is.
pub fn generate_structured(spec: &GeometrySpec) -> Result<Mesh, GeometryError> {
    let mesh = match spec {
        GeometrySpec::Rectangle {
            r_min,
            r_max,
            z_min,
            z_max,
            nr,
            nz,
        } => rectangle(*r_min, *r_max, *z_min, *z_max, *nr, *nz)?,
        GeometrySpec::Cylinder {
            inner_radius,
            outer_radius,
            height,
            nr,
            nz,
        } => rectangle(*inner_radius, *outer_radius, 0.0, *height, *nr, *nz)?,
        GeometrySpec::NeckDown {
            preform_radius,
            fiber_radius,
            length,
            nr,
            nz,
        } => {
            if !(*fiber_radius > 0.0 && fiber_radius <= preform_radius) {
                return Err(GeometryError::InvalidSpec("fiber radius must be in (0, preform radius]"));
            }
            let mut mesh = rectangle(0.0, 1.0, 0.0, *length, *nr, *nz)?;
            let ratio = fiber_radius / preform_radius;
            for point in mesh.points.iter_mut() {
                let radius = preform_radius * f64::powf(ratio, point.coords[1] / length);
                point.coords[0] *= radius;
            }
            mesh.recenter_mid_nodes();
            mesh
        }
        GeometrySpec::Mesh(mesh) => mesh.clone(),
    };
    mesh.validate()?;
    Ok(mesh)
}

/// Generates a rectangular region
fn rectangle(r_min: f64, r_max: f64, z_min: f64, z_max: f64, nr: usize, nz: usize) -> Result<Mesh, GeometryError> {
    // check
    if nr < 1 || nz < 1 {
        return Err(GeometryError::InvalidSpec("the number of divisions must be ≥ 1"));
    }
    if !(r_min >= 0.0) || !(r_max > r_min) || !r_max.is_finite() {
        return Err(GeometryError::InvalidSpec("radii must satisfy 0 ≤ r_min < r_max"));
    }
    if !(z_max > z_min) || !z_min.is_finite() || !z_max.is_finite() {
        return Err(GeometryError::InvalidSpec("heights must satisfy z_min < z_max"));
    }

    // points
    let ni = 2 * nr + 1;
    let nj = 2 * nz + 1;
    let idx = |i: usize, j: usize| j * ni + i;
    let mut coords = Vec::with_capacity(ni * nj);
    for j in 0..nj {
        let z = z_min + (z_max - z_min) * (j as f64) / ((nj - 1) as f64);
        for i in 0..ni {
            let r = r_min + (r_max - r_min) * (i as f64) / ((ni - 1) as f64);
            coords.push([r, z]);
        }
    }

    // cells
    let mut connectivity = Vec::with_capacity(2 * nr * nz);
    for b in 0..nz {
        for a in 0..nr {
            let (i0, i1, i2) = (2 * a, 2 * a + 1, 2 * a + 2);
            let (j0, j1, j2) = (2 * b, 2 * b + 1, 2 * b + 2);
            connectivity.push([
                idx(i0, j0),
                idx(i2, j0),
                idx(i2, j2),
                idx(i1, j0),
                idx(i2, j1),
                idx(i1, j1),
            ]);
            connectivity.push([
                idx(i0, j0),
                idx(i2, j2),
                idx(i0, j2),
                idx(i1, j1),
                idx(i1, j2),
                idx(i0, j1),
            ]);
        }
    }

    // boundary (cell 2 (b nr + a) is the lower-right triangle of quad (a, b))
    let left = if r_min == 0.0 { BoundaryTag::Axis } else { BoundaryTag::Inner };
    let mut boundary = Vec::with_capacity(2 * (nr + nz));
    for a in 0..nr {
        boundary.push(BoundaryEdge {
            points: [idx(2 * a, 0), idx(2 * a + 2, 0), idx(2 * a + 1, 0)],
            tag: BoundaryTag::Bottom,
            cell: 2 * a,
        });
    }
    for b in 0..nz {
        boundary.push(BoundaryEdge {
            points: [idx(ni - 1, 2 * b), idx(ni - 1, 2 * b + 2), idx(ni - 1, 2 * b + 1)],
            tag: BoundaryTag::Outer,
            cell: 2 * (b * nr + nr - 1),
        });
    }
    for a in 0..nr {
        boundary.push(BoundaryEdge {
            points: [idx(2 * a + 2, nj - 1), idx(2 * a, nj - 1), idx(2 * a + 1, nj - 1)],
            tag: BoundaryTag::Top,
            cell: 2 * ((nz - 1) * nr + a) + 1,
        });
    }
    for b in 0..nz {
        boundary.push(BoundaryEdge {
            points: [idx(0, 2 * b + 2), idx(0, 2 * b), idx(0, 2 * b + 1)],
            tag: left,
            cell: 2 * (b * nr) + 1,
        });
    }
    Ok(Mesh::new(coords, connectivity, boundary))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
