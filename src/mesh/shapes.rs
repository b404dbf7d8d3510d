use crate::base::GeometryError;
use gemlab::shapes::{GeoKind, Scratchpad};

/// Allocates a scratchpad in the (r, z) plane and sets the coordinates of its nodes
fn new_pad(kind: GeoKind, coords: &[[f64; 2]]) -> Result<Scratchpad, GeometryError> {
    let mut pad = Scratchpad::new(2, kind).map_err(GeometryError::InvalidSpec)?;
    for (m, x) in coords.iter().enumerate() {
        pad.set_xx(m, 0, x[0]);
        pad.set_xx(m, 1, x[1]);
    }
    Ok(pad)
}

/// Holds the shape functions and gradients of a cell evaluated at one integration point
///
/// The velocity and temperature use the quadratic Tri6 pad; the pressure uses the lower-order
/// (Tri3) pad built on the corner nodes.
pub struct ShapePad {
    /// Index of the cell (for error messages)
    cell_id: usize,

    /// Quadratic scratchpad
    pad: Scratchpad,

    /// Linear scratchpad of the corners
    pad_p: Scratchpad,

    /// Radial coordinate of the point
    pub r: f64,

    /// Axial coordinate of the point
    pub z: f64,

    /// Jacobian determinant
    pub det: f64,
}

impl ShapePad {
    /// Allocates a new instance with the coordinates of the six nodes of a cell
    pub fn new(coords: &[[f64; 2]; 6], cell_id: usize) -> Result<Self, GeometryError> {
        let kind = GeoKind::Tri6;
        let low_order = kind
            .lower_order()
            .ok_or(GeometryError::InvalidSpec("the cell kind has no lower-order counterpart"))?;
        let pad = new_pad(kind, coords)?;
        let pad_p = new_pad(low_order, &coords[0..low_order.nnode()])?;
        Ok(ShapePad {
            cell_id,
            pad,
            pad_p,
            r: 0.0,
            z: 0.0,
            det: 0.0,
        })
    }

    /// Evaluates the shape functions and gradients at the reference point ksi = (ξ, η)
    ///
    /// Returns [GeometryError::InvertedElement] if det(J) is not positive.
    pub fn calc(&mut self, ksi: &[f64]) -> Result<(), GeometryError> {
        // the inverse of a singular Jacobian fails
        let det = self.pad.calc_gradient(ksi).unwrap_or(0.0);
        if !(det > 0.0) || !det.is_finite() {
            return Err(GeometryError::InvertedElement {
                element: self.cell_id,
                det,
            });
        }
        (self.pad.fn_interp)(&mut self.pad.interp, ksi);
        (self.pad_p.fn_interp)(&mut self.pad_p.interp, ksi);
        self.r = 0.0;
        self.z = 0.0;
        for m in 0..self.pad.kind.nnode() {
            self.r += self.pad.interp[m] * self.pad.xxt.get(0, m);
            self.z += self.pad.interp[m] * self.pad.xxt.get(1, m);
        }
        self.det = det;
        Ok(())
    }

    /// Returns the quadratic shape function of node m
    #[inline]
    pub fn nn(&self, m: usize) -> f64 {
        self.pad.interp[m]
    }

    /// Returns the physical gradient ∂Nm/∂x_i (i = 0 for r, 1 for z)
    #[inline]
    pub fn grad(&self, m: usize, i: usize) -> f64 {
        self.pad.gradient.get(m, i)
    }

    /// Returns the linear (pressure) shape function of corner c
    #[inline]
    pub fn nn_p(&self, c: usize) -> f64 {
        self.pad_p.interp[c]
    }
}

/// Evaluates the quadratic shape functions N and their physical gradients ∇N of a cell at ksi = (ξ, η)
pub fn shape_functions_p2(coords: &[[f64; 2]; 6], ksi: &[f64]) -> Result<(Vec<f64>, Vec<[f64; 2]>), GeometryError> {
    let mut pad = ShapePad::new(coords, 0)?;
    pad.calc(ksi)?;
    let nn = (0..6).map(|m| pad.nn(m)).collect();
    let gg = (0..6).map(|m| [pad.grad(m, 0), pad.grad(m, 1)]).collect();
    Ok((nn, gg))
}

/// Evaluates the linear (pressure) shape functions at ksi = (ξ, η)
pub fn shape_functions_p1(ksi: &[f64]) -> Result<Vec<f64>, GeometryError> {
    let mut pad = Scratchpad::new(2, GeoKind::Tri3).map_err(GeometryError::InvalidSpec)?;
    (pad.fn_interp)(&mut pad.interp, ksi);
    Ok((0..3).map(|c| pad.interp[c]).collect())
}

/// Returns the (signed) Jacobian determinant of a cell at ksi = (ξ, η)
///
/// Unlike [ShapePad::calc], a non-positive value is returned rather than rejected.
pub fn jacobian_determinant(coords: &[[f64; 2]; 6], ksi: &[f64]) -> Result<f64, GeometryError> {
    let mut pad = new_pad(GeoKind::Tri6, coords)?;
    pad.calc_jacobian(ksi).map_err(GeometryError::InvalidSpec)
}

/// Holds the shape functions and geometry of a 3-node boundary edge evaluated at one point
pub struct EdgePad {
    /// Lin3 scratchpad with nodes (a, b, mid)
    pad: Scratchpad,

    /// Radial coordinate of the point
    pub r: f64,

    /// Axial coordinate of the point
    pub z: f64,

    /// Length scale ds/dξ of the parametrization
    pub ds: f64,

    /// Unit outward normal (n_r, n_z)
    pub normal: [f64; 2],
}

impl EdgePad {
    /// Allocates a new instance with the coordinates of the nodes (a, b, mid)
    pub fn new(coords: &[[f64; 2]; 3]) -> Result<Self, GeometryError> {
        Ok(EdgePad {
            pad: new_pad(GeoKind::Lin3, coords)?,
            r: 0.0,
            z: 0.0,
            ds: 0.0,
            normal: [0.0, 0.0],
        })
    }

    /// Evaluates the edge quantities at ξ ∈ [-1, 1]
    ///
    /// The edge nodes must follow the counter-clockwise orientation of the owner cell, thus the
    /// outward normal is the tangent rotated clockwise.
    pub fn calc(&mut self, ksi: &[f64]) -> Result<(), GeometryError> {
        let ds = self.pad.calc_jacobian(ksi).map_err(GeometryError::InvalidSpec)?;
        (self.pad.fn_interp)(&mut self.pad.interp, ksi);
        self.r = 0.0;
        self.z = 0.0;
        for m in 0..3 {
            self.r += self.pad.interp[m] * self.pad.xxt.get(0, m);
            self.z += self.pad.interp[m] * self.pad.xxt.get(1, m);
        }
        let t = [self.pad.jacobian.get(0, 0), self.pad.jacobian.get(1, 0)];
        self.ds = ds;
        self.normal = if ds > 0.0 { [t[1] / ds, -t[0] / ds] } else { [0.0, 0.0] };
        Ok(())
    }

    /// Returns the shape function of edge node m
    #[inline]
    pub fn nn(&self, m: usize) -> f64 {
        self.pad.interp[m]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{jacobian_determinant, shape_functions_p1, shape_functions_p2, EdgePad, ShapePad};
    use crate::base::GeometryError;
    use crate::mesh::cell_gauss;
    use russell_lab::approx_eq;

    // right triangle with legs 2 (along r) and 1 (along z), shifted by r = 1
    const COORDS: [[f64; 2]; 6] = [
        [1.0, 0.0],
        [3.0, 0.0],
        [1.0, 1.0],
        [2.0, 0.0],
        [2.0, 0.5],
        [1.0, 0.5],
    ];

    #[test]
    fn shape_functions_are_a_partition_of_unity() {
        let mut pad = ShapePad::new(&COORDS, 0).unwrap();
        for ksi in [[0.2, 0.3], [0.0, 0.0], [0.5, 0.5], [1.0 / 3.0, 1.0 / 3.0]] {
            pad.calc(&ksi).unwrap();
            approx_eq((0..6).map(|m| pad.nn(m)).sum(), 1.0, 1e-15);
            approx_eq((0..6).map(|m| pad.grad(m, 0)).sum(), 0.0, 1e-14);
            approx_eq((0..6).map(|m| pad.grad(m, 1)).sum(), 0.0, 1e-14);
            approx_eq((0..3).map(|c| pad.nn_p(c)).sum(), 1.0, 1e-15);
        }
        // mid-node of edge 0-1
        pad.calc(&[0.5, 0.0]).unwrap();
        for m in 0..6 {
            approx_eq(pad.nn(m), if m == 3 { 1.0 } else { 0.0 }, 1e-15);
        }
        approx_eq(pad.nn_p(0), 0.5, 1e-15);
        approx_eq(pad.nn_p(1), 0.5, 1e-15);
    }

    #[test]
    fn shape_pad_works() {
        let mut pad = ShapePad::new(&COORDS, 0).unwrap();
        pad.calc(&[0.25, 0.25]).unwrap();
        approx_eq(pad.det, 2.0, 1e-14);
        approx_eq(pad.r, 1.5, 1e-15);
        approx_eq(pad.z, 0.25, 1e-15);
        // gradient of the quadratic field f = r² - z at the same point
        let f: Vec<f64> = COORDS.iter().map(|x| x[0] * x[0] - x[1]).collect();
        let dfdr: f64 = (0..6).map(|m| pad.grad(m, 0) * f[m]).sum();
        let dfdz: f64 = (0..6).map(|m| pad.grad(m, 1) * f[m]).sum();
        approx_eq(dfdr, 3.0, 1e-13);
        approx_eq(dfdz, -1.0, 1e-13);
        // the area of the triangle is recovered by integration
        let gauss = cell_gauss().unwrap();
        let mut area = 0.0;
        for p in 0..gauss.npoint() {
            pad.calc(gauss.coords(p)).unwrap();
            area += pad.det * gauss.weight(p);
        }
        approx_eq(area, 1.0, 1e-14);
    }

    #[test]
    fn shape_pad_detects_inverted_elements() {
        let mut coords = COORDS;
        coords.swap(1, 2);
        coords.swap(3, 5);
        let mut pad = ShapePad::new(&coords, 7).unwrap();
        match pad.calc(&[0.25, 0.25]) {
            Err(GeometryError::InvertedElement { element, det }) => {
                assert_eq!(element, 7);
                approx_eq(det, -2.0, 1e-14);
            }
            _ => panic!("inverted element should be detected"),
        }
        // collapsed triangle
        let mut coords = COORDS;
        coords[2] = [2.0, 0.0];
        coords[4] = [2.5, 0.0];
        coords[5] = [1.5, 0.0];
        let mut pad = ShapePad::new(&coords, 3).unwrap();
        assert!(pad.calc(&[0.25, 0.25]).is_err());
    }

    #[test]
    fn edge_pad_works() {
        // bottom edge of COORDS, from (1,0) to (3,0): outward normal is -z
        let coords = [[1.0, 0.0], [3.0, 0.0], [2.0, 0.0]];
        let mut pad = EdgePad::new(&coords).unwrap();
        pad.calc(&[-0.5]).unwrap();
        approx_eq(pad.r, 1.5, 1e-15);
        approx_eq(pad.ds, 1.0, 1e-15);
        approx_eq(pad.normal[0], 0.0, 1e-15);
        approx_eq(pad.normal[1], -1.0, 1e-15);
        approx_eq(pad.nn(0) + pad.nn(1) + pad.nn(2), 1.0, 1e-15);
        approx_eq(pad.nn(2), 0.75, 1e-15);
    }

    #[test]
    fn shape_functions_and_determinant_work() {
        let (nn, gg) = shape_functions_p2(&COORDS, &[0.25, 0.25]).unwrap();
        approx_eq(nn.iter().sum(), 1.0, 1e-15);
        // gradient of r along the cell
        let dr: f64 = (0..6).map(|m| gg[m][0] * COORDS[m][0]).sum();
        let dz: f64 = (0..6).map(|m| gg[m][1] * COORDS[m][0]).sum();
        approx_eq(dr, 1.0, 1e-14);
        approx_eq(dz, 0.0, 1e-14);
        let nn_p = shape_functions_p1(&[0.2, 0.3]).unwrap();
        approx_eq(nn_p[0], 0.5, 1e-15);
        approx_eq(nn_p[1], 0.2, 1e-15);
        approx_eq(nn_p[2], 0.3, 1e-15);
        approx_eq(jacobian_determinant(&COORDS, &[0.1, 0.7]).unwrap(), 2.0, 1e-14);
        let mut flipped = COORDS;
        flipped.swap(1, 2);
        flipped.swap(3, 5);
        approx_eq(jacobian_determinant(&flipped, &[0.1, 0.7]).unwrap(), -2.0, 1e-14);
        assert!(shape_functions_p2(&flipped, &[0.1, 0.7]).is_err());
    }
}
