use crate::base::GeometryError;
use gemlab::integ::Gauss;
use gemlab::shapes::GeoKind;

/// Number of integration points per cell (degree 5 on the reference triangle)
pub const CELL_NGAUSS: usize = 7;

/// Number of integration points per boundary edge
pub const EDGE_NGAUSS: usize = 3;

/// Allocates the integration points of the 6-node triangles
///
/// The weights sum to 1/2, the area of the reference triangle.
pub fn cell_gauss() -> Result<Gauss, GeometryError> {
    Gauss::new_or_sized(GeoKind::Tri6, Some(CELL_NGAUSS)).map_err(GeometryError::InvalidSpec)
}

/// Allocates the integration points of the 3-node boundary edges
///
/// The reference coordinate ξ runs over [-1, 1], thus the weights sum to 2.
pub fn edge_gauss() -> Result<Gauss, GeometryError> {
    Gauss::new_or_sized(GeoKind::Lin3, Some(EDGE_NGAUSS)).map_err(GeometryError::InvalidSpec)
}

/// Returns the reference coordinates (ξ, η) of the cell point at ξ_edge ∈ [-1, 1] along a local edge
///
/// The edge coordinate runs from the first to the second corner of the edge (counter-clockwise).
#[inline]
pub fn edge_reference_point(local_edge: usize, xi_edge: f64) -> [f64; 2] {
    let s = 0.5 * (xi_edge + 1.0);
    match local_edge {
        0 => [s, 0.0],
        1 => [1.0 - s, s],
        _ => [0.0, 1.0 - s],
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{cell_gauss, edge_gauss, edge_reference_point, CELL_NGAUSS, EDGE_NGAUSS};
    use russell_lab::approx_eq;

    #[test]
    fn cell_rule_integrates_quintic_polynomials() {
        let gauss = cell_gauss().unwrap();
        assert_eq!(gauss.npoint(), CELL_NGAUSS);
        let sum: f64 = (0..gauss.npoint()).map(|p| gauss.weight(p)).sum();
        approx_eq(sum, 0.5, 1e-14);
        // ∫ ξ² η³ dA = 2! 3! / 7! = 12 / 5040
        let integral: f64 = (0..gauss.npoint())
            .map(|p| {
                let x = gauss.coords(p);
                x[0] * x[0] * x[1] * x[1] * x[1] * gauss.weight(p)
            })
            .sum();
        approx_eq(integral, 12.0 / 5040.0, 1e-13);
    }

    #[test]
    fn edge_rule_works() {
        let gauss = edge_gauss().unwrap();
        assert_eq!(gauss.npoint(), EDGE_NGAUSS);
        // ∫ ξ⁴ dξ over [-1, 1] = 2/5
        let integral: f64 = (0..gauss.npoint())
            .map(|p| f64::powi(gauss.coords(p)[0], 4) * gauss.weight(p))
            .sum();
        approx_eq(integral, 0.4, 1e-13);
        assert_eq!(edge_reference_point(0, 0.0), [0.5, 0.0]);
        assert_eq!(edge_reference_point(1, -1.0), [1.0, 0.0]);
        assert_eq!(edge_reference_point(2, 1.0), [0.0, 0.0]);
    }
}
