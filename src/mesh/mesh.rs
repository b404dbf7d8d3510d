use super::{cell_gauss, ShapePad};
use crate::base::GeometryError;
use crate::StrError;
use gemlab::mesh::{Cell, Point};
use gemlab::shapes::GeoKind;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// Defines the tag of a boundary edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoundaryTag {
    /// Symmetry axis (r = 0)
    Axis,

    /// Inner wall of a hollow domain
    Inner,

    /// Outer (lateral) wall
    Outer,

    /// Bottom (upstream) face
    Bottom,

    /// Top (downstream) face
    Top,
}

/// Holds a 3-node boundary edge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryEdge {
    /// Point ids (a, b, mid) with a → b following the counter-clockwise orientation of the owner cell
    pub points: [usize; 3],

    /// Boundary tag
    pub tag: BoundaryTag,

    /// Owner cell
    pub cell: usize,
}

/// Holds an axisymmetric (r, z) mesh of 6-node triangles
///
/// The points and cells are stored in a [gemlab::mesh::Mesh] whose cells are all [GeoKind::Tri6]
/// with the local numbering:
///
/// ```text
///  2
///  |`.
///  5  `4
///  |    `.
///  0---3--1
/// ```
///
/// Nodes 0, 1, 2 are the corners (counter-clockwise) and carry the linear pressure. The
/// connectivity never changes during a run; only the coordinates are moved by the ALE update.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mesh {
    /// Points (r, z) and cells
    pub grid: gemlab::mesh::Mesh,

    /// All boundary edges
    pub boundary: Vec<BoundaryEdge>,
}

impl Deref for Mesh {
    type Target = gemlab::mesh::Mesh;
    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

impl DerefMut for Mesh {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.grid
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        self.ndim == other.ndim
            && self.points.len() == other.points.len()
            && self.cells.len() == other.cells.len()
            && self.points.iter().zip(&other.points).all(|(a, b)| {
                a.id == b.id && a.marker == b.marker && a.coords == b.coords
            })
            && self.cells.iter().zip(&other.cells).all(|(a, b)| {
                a.id == b.id && a.attribute == b.attribute && a.kind == b.kind && a.points == b.points
            })
            && self.boundary == other.boundary
    }
}

/// Maps the local edge index to the local (corner, corner, mid) node indices
pub const EDGE_LOCAL_NODES: [[usize; 3]; 3] = [[0, 1, 3], [1, 2, 4], [2, 0, 5]];

impl Mesh {
    /// Allocates a new instance from (r, z) coordinates, Tri6 connectivities and boundary edges
    pub fn new(coords: Vec<[f64; 2]>, connectivity: Vec<[usize; 6]>, boundary: Vec<BoundaryEdge>) -> Self {
        let points = coords
            .into_iter()
            .enumerate()
            .map(|(id, x)| Point {
                id,
                marker: 0,
                coords: x.to_vec(),
            })
            .collect();
        let cells = connectivity
            .into_iter()
            .enumerate()
            .map(|(id, points)| Cell {
                id,
                attribute: 1,
                kind: GeoKind::Tri6,
                points: points.to_vec(),
            })
            .collect();
        Mesh {
            grid: gemlab::mesh::Mesh {
                ndim: 2,
                points,
                cells,
            },
            boundary,
        }
    }

    /// Checks that the mesh is non-empty, that all indices exist, and that all Jacobians are positive
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.cells.is_empty() {
            return Err(GeometryError::EmptyMesh);
        }
        if self.ndim != 2 {
            return Err(GeometryError::InvalidSpec("the mesh must be two-dimensional (r, z)"));
        }
        let npoint = self.points.len();
        for (i, point) in self.points.iter().enumerate() {
            if point.id != i {
                return Err(GeometryError::InvalidSpec("point ids must equal their index"));
            }
            if point.coords.len() != 2 {
                return Err(GeometryError::InvalidSpec("points must have two coordinates"));
            }
            if !point.coords[0].is_finite() || !point.coords[1].is_finite() {
                return Err(GeometryError::InvalidSpec("point coordinates must be finite"));
            }
            if point.coords[0] < 0.0 {
                return Err(GeometryError::InvalidSpec("radial coordinates must be ≥ 0"));
            }
        }
        for (e, cell) in self.cells.iter().enumerate() {
            if cell.id != e {
                return Err(GeometryError::InvalidSpec("cell ids must equal their index"));
            }
            if cell.kind != GeoKind::Tri6 || cell.points.len() != 6 {
                return Err(GeometryError::InvalidSpec("all cells must be Tri6"));
            }
            for p in &cell.points {
                if *p >= npoint {
                    return Err(GeometryError::InvalidNode { element: e, node: *p });
                }
            }
        }
        for edge in &self.boundary {
            if edge.cell >= self.cells.len() {
                return Err(GeometryError::InvalidSpec("boundary edge references a non-existent cell"));
            }
            for p in &edge.points {
                if *p >= npoint {
                    return Err(GeometryError::InvalidNode {
                        element: edge.cell,
                        node: *p,
                    });
                }
            }
            self.local_edge(edge)?;
        }
        self.check_jacobians()
    }

    /// Checks that the Jacobian determinant is positive at every integration point of every cell
    pub fn check_jacobians(&self) -> Result<(), GeometryError> {
        let gauss = cell_gauss()?;
        for cell in &self.cells {
            let mut pad = ShapePad::new(&self.cell_coords(cell.id), cell.id)?;
            for p in 0..gauss.npoint() {
                pad.calc(gauss.coords(p))?;
            }
        }
        Ok(())
    }

    /// Returns the coordinates of the six nodes of a cell
    pub fn cell_coords(&self, cell_id: usize) -> [[f64; 2]; 6] {
        let mut coords = [[0.0; 2]; 6];
        for (m, p) in self.cells[cell_id].points.iter().enumerate() {
            coords[m] = self.point_coords(*p);
        }
        coords
    }

    /// Returns the coordinates (r, z) of a point
    #[inline]
    pub fn point_coords(&self, point_id: usize) -> [f64; 2] {
        let x = &self.points[point_id].coords;
        [x[0], x[1]]
    }

    /// Sets the coordinates (r, z) of a point
    #[inline]
    pub fn set_point_coords(&mut self, point_id: usize, x: [f64; 2]) {
        let coords = &mut self.grid.points[point_id].coords;
        coords[0] = x[0];
        coords[1] = x[1];
    }

    /// Returns the coordinates of the three nodes (a, b, mid) of a boundary edge
    pub fn edge_coords(&self, edge: &BoundaryEdge) -> [[f64; 2]; 3] {
        [
            self.point_coords(edge.points[0]),
            self.point_coords(edge.points[1]),
            self.point_coords(edge.points[2]),
        ]
    }

    /// Returns the local index (0, 1, 2) of a boundary edge within its owner cell
    pub fn local_edge(&self, edge: &BoundaryEdge) -> Result<usize, GeometryError> {
        let cell = &self.cells[edge.cell];
        for (k, local) in EDGE_LOCAL_NODES.iter().enumerate() {
            if cell.points[local[0]] == edge.points[0]
                && cell.points[local[1]] == edge.points[1]
                && cell.points[local[2]] == edge.points[2]
            {
                return Ok(k);
            }
        }
        Err(GeometryError::InvalidSpec("boundary edge does not match an edge of its cell"))
    }

    /// Returns the sorted list of corner (pressure) nodes
    pub fn pressure_nodes(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self.cells.iter().flat_map(|c| c.points[0..3].to_vec()).collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Returns the boundary edges with a given tag
    pub fn edges_with_tag(&self, tag: BoundaryTag) -> impl Iterator<Item = &BoundaryEdge> {
        self.boundary.iter().filter(move |e| e.tag == tag)
    }

    /// Returns the sorted list of nodes on boundary edges with a given tag
    pub fn nodes_with_tag(&self, tag: BoundaryTag) -> Vec<usize> {
        let mut nodes: Vec<usize> = self.edges_with_tag(tag).flat_map(|e| e.points.to_vec()).collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Returns an error if no boundary edge carries the given tag
    pub fn check_tag(&self, tag: BoundaryTag) -> Result<(), GeometryError> {
        if self.boundary.iter().any(|e| e.tag == tag) {
            Ok(())
        } else {
            Err(GeometryError::InvalidBoundaryTag(tag))
        }
    }

    /// Moves all mid-nodes to the middle of their corners (straight edges)
    pub fn recenter_mid_nodes(&mut self) {
        for e in 0..self.cells.len() {
            let ids = self.cells[e].points.clone();
            for local in &EDGE_LOCAL_NODES {
                let a = self.point_coords(ids[local[0]]);
                let b = self.point_coords(ids[local[1]]);
                self.set_point_coords(ids[local[2]], [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1])]);
            }
        }
    }

    /// Returns the (signed) area of the triangle formed by the corners of a cell
    pub fn cell_area(&self, cell_id: usize) -> f64 {
        let c = self.cell_coords(cell_id);
        0.5 * ((c[1][0] - c[0][0]) * (c[2][1] - c[0][1]) - (c[2][0] - c[0][0]) * (c[1][1] - c[0][1]))
    }

    /// Returns the total area of the (r, z) cross-section
    pub fn area(&self) -> f64 {
        (0..self.cells.len()).map(|e| self.cell_area(e)).sum()
    }

    /// Returns the volume of the solid of revolution (2π ∫ r dA) assuming straight edges
    pub fn volume(&self) -> f64 {
        let mut sum = 0.0;
        for e in 0..self.cells.len() {
            let c = self.cell_coords(e);
            sum += self.cell_area(e) * (c[0][0] + c[1][0] + c[2][0]) / 3.0;
        }
        2.0 * std::f64::consts::PI * sum
    }

    /// Returns the length of the shortest corner-to-corner edge
    pub fn min_edge_length(&self) -> f64 {
        let mut h_min = f64::MAX;
        for e in 0..self.cells.len() {
            let c = self.cell_coords(e);
            for local in &EDGE_LOCAL_NODES {
                let a = c[local[0]];
                let b = c[local[1]];
                h_min = f64::min(h_min, f64::hypot(b[0] - a[0], b[1] - a[1]));
            }
        }
        h_min
    }

    /// Reads a JSON file containing a mesh
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(&path).map_err(|_| "file not found")?;
        let reader = BufReader::new(file);
        let mesh = serde_json::from_reader(reader).map_err(|_| "deserialize failed")?;
        Ok(mesh)
    }

    /// Writes a JSON file with the mesh
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
