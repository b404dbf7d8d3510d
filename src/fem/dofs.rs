use crate::mesh::Mesh;
use gemlab::mesh::Cell;

/// Maps mesh points to pressure indices (only the corner nodes carry pressure)
#[derive(Clone, Debug)]
pub struct PressureMap {
    /// Sorted list of corner nodes; the position in this list is the pressure index
    pub nodes: Vec<usize>,

    /// Pressure index of each point (None for mid-nodes)
    index: Vec<Option<usize>>,
}

impl PressureMap {
    /// Allocates a new instance
    pub fn new(mesh: &Mesh) -> Self {
        let nodes = mesh.pressure_nodes();
        let mut index = vec![None; mesh.points.len()];
        for (i, p) in nodes.iter().enumerate() {
            index[*p] = Some(i);
        }
        PressureMap { nodes, index }
    }

    /// Returns the number of pressure nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if there are no pressure nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the pressure index of a point
    pub fn get(&self, point: usize) -> Option<usize> {
        self.index.get(point).copied().flatten()
    }
}

/// Holds the equation numbers of the mixed velocity-pressure problem
///
/// ```text
/// v_r(n) → 2 n
/// v_z(n) → 2 n + 1
/// p(i)   → 2 n_point + i     (i is the pressure index)
/// ```
#[derive(Clone, Debug)]
pub struct FlowEquations {
    /// Number of points (velocity nodes)
    pub n_point: usize,

    /// Number of pressure nodes
    pub n_pressure: usize,

    /// Total number of equations
    pub n_equation: usize,
}

/// Number of local equations of a Taylor-Hood element: 6 × (v_r, v_z) + 3 × p
pub const FLOW_LOCAL_EQUATIONS: usize = 15;

impl FlowEquations {
    /// Allocates a new instance
    pub fn new(mesh: &Mesh, pmap: &PressureMap) -> Self {
        let n_point = mesh.points.len();
        FlowEquations {
            n_point,
            n_pressure: pmap.len(),
            n_equation: 2 * n_point + pmap.len(),
        }
    }

    /// Returns the equation of v_r at a point
    #[inline]
    pub fn vr(&self, point: usize) -> usize {
        2 * point
    }

    /// Returns the equation of v_z at a point
    #[inline]
    pub fn vz(&self, point: usize) -> usize {
        2 * point + 1
    }

    /// Returns the equation of a pressure index
    #[inline]
    pub fn p(&self, pressure_index: usize) -> usize {
        2 * self.n_point + pressure_index
    }

    /// Computes the local-to-global map of a cell: [v_r0, v_z0, ..., v_r5, v_z5, p0, p1, p2]
    pub fn local_to_global(&self, cell: &Cell, pmap: &PressureMap) -> [usize; FLOW_LOCAL_EQUATIONS] {
        let mut l2g = [0; FLOW_LOCAL_EQUATIONS];
        for m in 0..6 {
            l2g[2 * m] = self.vr(cell.points[m]);
            l2g[2 * m + 1] = self.vz(cell.points[m]);
        }
        for m in 0..3 {
            // corners always have a pressure index
            l2g[12 + m] = self.p(pmap.get(cell.points[m]).unwrap_or(0));
        }
        l2g
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
