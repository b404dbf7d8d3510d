use super::{BoundaryEdge, Mesh, ShapePad, EDGE_LOCAL_NODES};
use crate::base::GeometryError;
use std::collections::{HashMap, HashSet};

/// Returns the key of an edge given by two corner ids
#[inline]
fn key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Assists in creating the mid-nodes of the refined mesh
struct MidNodes<'a> {
    old: &'a Mesh,
    coords: Vec<[f64; 2]>,
    old_mid: HashMap<(usize, usize), usize>,
    split_of: HashMap<usize, (usize, usize)>,
    marked: HashSet<(usize, usize)>,
    created: HashMap<(usize, usize), usize>,
}

impl<'a> MidNodes<'a> {
    /// Returns the mid-node of the child edge (p, q), creating it if needed
    fn get(&mut self, p: usize, q: usize) -> usize {
        let k = key(p, q);
        if !self.marked.contains(&k) {
            if let Some(m) = self.old_mid.get(&k) {
                return *m;
            }
        }
        if let Some(m) = self.created.get(&k) {
            return *m;
        }
        // half of a split edge: quarter point of the quadratic edge (exact for curved edges)
        let coords = match (self.split_of.get(&p), self.split_of.get(&q)) {
            (Some((a, b)), _) if q == *a || q == *b => {
                let other = if q == *a { *b } else { *a };
                self.quarter_point(q, p, other)
            }
            (_, Some((a, b))) if p == *a || p == *b => {
                let other = if p == *a { *b } else { *a };
                self.quarter_point(p, q, other)
            }
            _ => {
                let x = self.coords[p];
                let y = self.coords[q];
                [0.5 * (x[0] + y[0]), 0.5 * (x[1] + y[1])]
            }
        };
        let id = self.coords.len();
        self.coords.push(coords);
        self.created.insert(k, id);
        id
    }

    /// Returns the point at s = 1/4 of the quadratic edge (near, far) with mid-node m
    fn quarter_point(&self, near: usize, m: usize, far: usize) -> [f64; 2] {
        let a = self.old.point_coords(near);
        let c = self.old.point_coords(m);
        let b = self.old.point_coords(far);
        [
            0.375 * a[0] + 0.75 * c[0] - 0.125 * b[0],
            0.375 * a[1] + 0.75 * c[1] - 0.125 * b[1],
        ]
    }
}

/// Refines a mesh by splitting the cells whose indicator exceeds a threshold
///
/// Flagged cells are split into four (red refinement). A closure pass then turns every cell with
/// two or more split edges into a red one; cells with a single split edge are bisected (green
/// refinement), thus the result is conforming. Boundary tags propagate to the child edges and the
/// new mid-nodes of split edges follow the quadratic edge geometry.
///
/// The result does not depend on hash ordering: cells and new nodes are created in a fixed order.
pub fn refine(mesh: &Mesh, indicator: &[f64], threshold: f64) -> Result<Mesh, GeometryError> {
    if indicator.len() != mesh.cells.len() {
        return Err(GeometryError::InvalidSpec("the indicator must have one value per cell"));
    }
    mesh.validate()?;

    // mark the edges of flagged cells
    let mut marked: HashSet<(usize, usize)> = HashSet::new();
    for (cell, value) in mesh.cells.iter().zip(indicator) {
        if *value > threshold {
            for local in &EDGE_LOCAL_NODES {
                marked.insert(key(cell.points[local[0]], cell.points[local[1]]));
            }
        }
    }

    // red-green closure
    loop {
        let mut changed = false;
        for cell in &mesh.cells {
            let keys: Vec<_> = EDGE_LOCAL_NODES
                .iter()
                .map(|l| key(cell.points[l[0]], cell.points[l[1]]))
                .collect();
            let count = keys.iter().filter(|k| marked.contains(k)).count();
            if count == 2 {
                for k in keys {
                    marked.insert(k);
                }
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // edge maps
    let mut old_mid = HashMap::new();
    let mut split_of = HashMap::new();
    for cell in &mesh.cells {
        for local in &EDGE_LOCAL_NODES {
            let (a, b, m) = (cell.points[local[0]], cell.points[local[1]], cell.points[local[2]]);
            old_mid.insert(key(a, b), m);
            if marked.contains(&key(a, b)) {
                split_of.insert(m, (a, b));
            }
        }
    }
    let mut mids = MidNodes {
        old: mesh,
        coords: (0..mesh.points.len()).map(|p| mesh.point_coords(p)).collect(),
        old_mid,
        split_of,
        marked,
        created: HashMap::new(),
    };

    // children
    let mut corners: Vec<[usize; 3]> = Vec::new();
    for cell in &mesh.cells {
        let p = &cell.points;
        let split: Vec<bool> = EDGE_LOCAL_NODES
            .iter()
            .map(|l| mids.marked.contains(&key(p[l[0]], p[l[1]])))
            .collect();
        match split.iter().filter(|s| **s).count() {
            0 => corners.push([p[0], p[1], p[2]]),
            1 => {
                let k = split.iter().position(|s| *s).unwrap_or(0);
                let (a, b, c, m) = (p[k], p[(k + 1) % 3], p[(k + 2) % 3], p[k + 3]);
                corners.push([a, m, c]);
                corners.push([m, b, c]);
            }
            _ => {
                corners.push([p[0], p[3], p[5]]);
                corners.push([p[3], p[1], p[4]]);
                corners.push([p[5], p[4], p[2]]);
                corners.push([p[3], p[4], p[5]]);
            }
        }
    }
    let mut connectivity = Vec::with_capacity(corners.len());
    for c in &corners {
        let m01 = mids.get(c[0], c[1]);
        let m12 = mids.get(c[1], c[2]);
        let m20 = mids.get(c[2], c[0]);
        connectivity.push([c[0], c[1], c[2], m01, m12, m20]);
    }

    // boundary
    let mut owner = HashMap::new();
    for (e, points) in connectivity.iter().enumerate() {
        for local in &EDGE_LOCAL_NODES {
            owner.insert((points[local[0]], points[local[1]]), e);
        }
    }
    let mut boundary = Vec::new();
    for edge in &mesh.boundary {
        let (a, b, m) = (edge.points[0], edge.points[1], edge.points[2]);
        let pieces = if mids.marked.contains(&key(a, b)) {
            vec![(a, m), (m, b)]
        } else {
            vec![(a, b)]
        };
        for (p, q) in pieces {
            let cell = match owner.get(&(p, q)) {
                Some(e) => *e,
                None => return Err(GeometryError::InvalidSpec("boundary edge without owner after refinement")),
            };
            boundary.push(BoundaryEdge {
                points: [p, q, mids.get(p, q)],
                tag: edge.tag,
                cell,
            });
        }
    }

    let refined = Mesh::new(mids.coords, connectivity, boundary);
    refined.validate()?;
    Ok(refined)
}

/// Calculates a refinement indicator from the temperature gradient
///
/// The indicator of a cell is |∇T| h at the centroid, with h = √(2 A): the temperature variation
/// across the cell.
pub fn temperature_gradient_indicator(mesh: &Mesh, temperature: &[f64]) -> Result<Vec<f64>, GeometryError> {
    if temperature.len() != mesh.points.len() {
        return Err(GeometryError::InvalidSpec("the temperature must have one value per point"));
    }
    let mut indicator = Vec::with_capacity(mesh.cells.len());
    for cell in &mesh.cells {
        let mut pad = ShapePad::new(&mesh.cell_coords(cell.id), cell.id)?;
        pad.calc(&[1.0 / 3.0, 1.0 / 3.0])?;
        let mut grad = [0.0; 2];
        for m in 0..6 {
            let t = temperature[cell.points[m]];
            grad[0] += pad.grad(m, 0) * t;
            grad[1] += pad.grad(m, 1) * t;
        }
        let h = f64::sqrt(2.0 * f64::abs(mesh.cell_area(cell.id)));
        indicator.push(f64::hypot(grad[0], grad[1]) * h);
    }
    Ok(indicator)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{refine, temperature_gradient_indicator};
    use crate::base::GeometryError;
    use crate::mesh::{generate_structured, BoundaryTag, GeometrySpec, Mesh};
    use russell_lab::approx_eq;

    fn square(n: usize) -> Mesh {
        generate_structured(&GeometrySpec::Rectangle {
            r_min: 0.0,
            r_max: 1.0,
            z_min: 0.0,
            z_max: 1.0,
            nr: n,
            nz: n,
        })
        .unwrap()
    }

    #[test]
    fn red_green_refinement_works() {
        let mesh = square(1);
        let refined = refine(&mesh, &[1.0, 0.0], 0.5).unwrap();
        // cell 0 splits into four (red); cell 1 shares the diagonal and is bisected (green)
        assert_eq!(refined.cells.len(), 6);
        approx_eq(refined.area(), 1.0, 1e-15);
        assert_eq!(refined.boundary.len(), 6);
        assert_eq!(refined.edges_with_tag(BoundaryTag::Bottom).count(), 2);
        assert_eq!(refined.edges_with_tag(BoundaryTag::Outer).count(), 2);
        assert_eq!(refined.edges_with_tag(BoundaryTag::Top).count(), 1);
        assert_eq!(refined.edges_with_tag(BoundaryTag::Axis).count(), 1);
        // 9 old nodes + 2×2 on split boundary edges + 2 on the split diagonal + 3 interior + 1 green
        assert_eq!(refined.points.len(), 19);
        for cell in &refined.cells {
            assert!(refined.cell_area(cell.id) > 0.0);
        }
    }

    #[test]
    fn closure_keeps_the_mesh_conforming() {
        let mesh = square(3);
        let mut indicator = vec![0.0; mesh.cells.len()];
        indicator[7] = 1.0;
        indicator[10] = 1.0;
        let refined = refine(&mesh, &indicator, 0.5).unwrap();
        approx_eq(refined.area(), 1.0, 1e-14);
        // every interior edge is shared by exactly two cells
        let mut count = std::collections::HashMap::new();
        for cell in &refined.cells {
            for k in 0..3 {
                let (a, b) = (cell.points[k], cell.points[(k + 1) % 3]);
                *count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        let n_boundary = count.values().filter(|c| **c == 1).count();
        assert_eq!(n_boundary, refined.boundary.len());
        assert!(count.values().all(|c| *c <= 2));
        // refining is deterministic
        assert_eq!(refine(&mesh, &indicator, 0.5).unwrap(), refined);
    }

    #[test]
    fn refine_captures_errors() {
        let mesh = square(1);
        assert_eq!(
            refine(&mesh, &[1.0], 0.5).err(),
            Some(GeometryError::InvalidSpec("the indicator must have one value per cell"))
        );
        let refined = refine(&mesh, &[0.0, 0.0], 0.5).unwrap();
        assert_eq!(refined, mesh);
    }

    #[test]
    fn temperature_gradient_indicator_works() {
        let mesh = square(2);
        let temperature: Vec<f64> = mesh.points.iter().map(|p| 300.0 + 100.0 * p.coords[0]).collect();
        let indicator = temperature_gradient_indicator(&mesh, &temperature).unwrap();
        for value in indicator {
            approx_eq(value, 100.0 * 0.5, 1e-10);
        }
    }
}
