//! Core unstructured mesh library
//!
//! # Overview
//!
//! Module for storing and manipulating unstructured meshes on their way into
//! the simulator. A [Mesh] owns an ordered point sequence, cells grouped by
//! [CellType] block, and named point/cell data arrays. Geometric properties
//! (centers, volumes, qualities, connections) are always derived on demand
//! and never cached, so callers recompute after any mutation.
//!
//! ```rust
//! use toughprep::mesh::{Axis, CellBlock, CellType, Mesh};
//!
//! let points = vec![
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [1.0, 1.0, 0.0],
//!     [0.0, 1.0, 0.0],
//! ];
//! let cells = vec![CellBlock::new(CellType::Quad, vec![vec![0, 1, 2, 3]])];
//! let mut mesh = Mesh::new(points, cells).unwrap();
//!
//! // one hexahedron per layer after extrusion
//! mesh.extrude_to_3d(&[1.0, 1.0], Axis::Z).unwrap();
//! assert_eq!(mesh.n_cells(), 2);
//! ```
//!
//! # Data arrays
//!
//! Point data are sized `n_points`, cell data `n_cells`, and both are kept
//! aligned by the topology operations (extrusion replicates them across
//! levels/layers, pruning filters them down to the survivors). A handful of
//! cell-data names have meaning to the simulator file writer:
//!
//! | Key                   | Interpretation                                  |
//! | --------------------- | ----------------------------------------------- |
//! | `boundary_condition`  | non-zero marks a Dirichlet (large-volume) cell  |
//! | `initial_condition`   | rows of primary variables for the INCON block   |
//! | `porosity`            | per-cell porosity override                      |
//! | `permeability`        | per-cell permeability modifier                  |

// Split into subfiles for development, but anything important is re-exported
mod cell;
mod connection;
mod ops;

// standard library
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// internal modules
use crate::utils::*;

// external crates
use anyhow::{bail, Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

// inline important the mesh-related types for a nice public API
#[doc(inline)]
pub use cell::{CellBlock, CellType};

#[doc(inline)]
pub use connection::Connection;

#[doc(inline)]
pub use ops::uniform_layers;

/// Default material assigned to every cell until told otherwise
pub const DEFAULT_MATERIAL: &str = "dfalt";

/// Coordinate axis selector for extrusion and bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Index of the axis into a coordinate triple
    pub const fn index(&self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// A named data array attached to points or cells
///
/// Scalar arrays hold one value per entity, row arrays hold a fixed-width
/// tuple per entity (such as the primary variables of an initial condition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataArray {
    Scalar(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

impl DataArray {
    /// Number of entities the array covers
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(v) => v.len(),
            Self::Rows(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar values, if this is a scalar array
    pub fn as_scalar(&self) -> Option<&[f64]> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Rows(_) => None,
        }
    }

    /// Row values, if this is a row array
    pub fn as_rows(&self) -> Option<&[Vec<f64>]> {
        match self {
            Self::Rows(v) => Some(v),
            Self::Scalar(_) => None,
        }
    }

    /// New array keeping only the entities listed in `keep`, in order
    pub(crate) fn filtered(&self, keep: &[usize]) -> Self {
        match self {
            Self::Scalar(v) => Self::Scalar(keep.iter().map(|&i| v[i]).collect()),
            Self::Rows(v) => Self::Rows(keep.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// New array with the whole sequence repeated `n` times
    pub(crate) fn tiled(&self, n: usize) -> Self {
        match self {
            Self::Scalar(v) => {
                Self::Scalar(std::iter::repeat(v.iter().copied()).take(n).flatten().collect())
            }
            Self::Rows(v) => {
                Self::Rows(std::iter::repeat(v.iter().cloned()).take(n).flatten().collect())
            }
        }
    }
}

/// An unstructured mesh with named point and cell data
///
/// Points are unique by identity, not value; duplicate coordinates are only
/// merged by an explicit [prune_duplicates](Mesh::prune_duplicates). The
/// caller owns the mesh exclusively, and mutating operations never touch
/// files or shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Ordered 3D point coordinates
    pub points: Vec<[f64; 3]>,
    /// Cells grouped into per-type blocks
    pub cells: Vec<CellBlock>,
    /// Named arrays sized `n_points`
    pub point_data: HashMap<String, DataArray>,
    /// Named arrays sized `n_cells`
    pub cell_data: HashMap<String, DataArray>,
    /// Material name per cell
    pub materials: Vec<String>,
}

/// Construction and bookkeeping
impl Mesh {
    /// Build a mesh from canonical point/cell arrays
    ///
    /// Every cell must reference valid point indices and carry the point
    /// count of its block's type; anything else is a validation error.
    pub fn new(points: Vec<[f64; 3]>, cells: Vec<CellBlock>) -> Result<Self> {
        let mesh = Self {
            points,
            cells,
            point_data: HashMap::new(),
            cell_data: HashMap::new(),
            materials: Vec::new(),
        };
        mesh.check_connectivity()?;

        let n_cells = mesh.n_cells();
        Ok(Self {
            materials: vec![DEFAULT_MATERIAL.to_string(); n_cells],
            ..mesh
        })
    }

    /// Total number of points
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Total number of cells over all blocks
    pub fn n_cells(&self) -> usize {
        self.cells.iter().map(CellBlock::len).sum()
    }

    /// Iterate all cells in global order as `(cell_type, point indices)`
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellType, &[usize])> {
        self.cells.iter().flat_map(|block| {
            block
                .connectivity
                .iter()
                .map(move |cell| (block.cell_type, cell.as_slice()))
        })
    }

    /// Attach a named point data array, sized `n_points`
    pub fn add_point_data<S: Into<String>>(&mut self, name: S, data: DataArray) -> Result<()> {
        if data.len() != self.n_points() {
            bail!(
                "Point data length {} does not match {} points",
                data.len(),
                self.n_points()
            );
        }
        self.point_data.insert(name.into(), data);
        Ok(())
    }

    /// Attach a named cell data array, sized `n_cells`
    pub fn add_cell_data<S: Into<String>>(&mut self, name: S, data: DataArray) -> Result<()> {
        if data.len() != self.n_cells() {
            bail!(
                "Cell data length {} does not match {} cells",
                data.len(),
                self.n_cells()
            );
        }
        self.cell_data.insert(name.into(), data);
        Ok(())
    }

    /// Make sure every cell references valid points with the right count
    pub fn check_connectivity(&self) -> Result<()> {
        let n_points = self.n_points();
        for block in &self.cells {
            for (i, cell) in block.connectivity.iter().enumerate() {
                if cell.len() != block.cell_type.n_points() {
                    bail!(
                        "{} cell {} has {} points, expected {}",
                        block.cell_type,
                        i,
                        cell.len(),
                        block.cell_type.n_points()
                    );
                }
                if let Some(&bad) = cell.iter().find(|&&p| p >= n_points) {
                    bail!(
                        "{} cell {} references point {} out of {}",
                        block.cell_type,
                        i,
                        bad,
                        n_points
                    );
                }
            }
        }
        Ok(())
    }
}

/// Derived geometric properties
impl Mesh {
    /// Geometric center of every cell, in global cell order
    pub fn centers(&self) -> Vec<[f64; 3]> {
        self.iter_cells()
            .map(|(_, cell)| {
                let mut c = [0.0; 3];
                for &p in cell {
                    c = add(c, self.points[p]);
                }
                scale(c, 1.0 / cell.len() as f64)
            })
            .collect()
    }

    /// Volume of every cell, in global cell order
    ///
    /// 3D cells are decomposed into tetrahedra, 2D cells report their area
    /// and lines their length.
    pub fn volumes(&self) -> Vec<f64> {
        self.iter_cells()
            .map(|(cell_type, cell)| {
                let p = |i: usize| self.points[cell[i]];
                match cell_type {
                    CellType::Line => norm(sub(p(1), p(0))),
                    CellType::Triangle => 0.5 * norm(cross(sub(p(1), p(0)), sub(p(2), p(0)))),
                    CellType::Quad => {
                        0.5 * norm(cross(sub(p(1), p(0)), sub(p(2), p(0))))
                            + 0.5 * norm(cross(sub(p(2), p(0)), sub(p(3), p(0))))
                    }
                    CellType::Tetra => tetra_volume(p(0), p(1), p(2), p(3)),
                    CellType::Pyramid => {
                        tetra_volume(p(0), p(1), p(2), p(4)) + tetra_volume(p(0), p(2), p(3), p(4))
                    }
                    CellType::Wedge => {
                        tetra_volume(p(0), p(1), p(2), p(3))
                            + tetra_volume(p(1), p(2), p(3), p(4))
                            + tetra_volume(p(2), p(3), p(4), p(5))
                    }
                    CellType::Hexahedron => {
                        tetra_volume(p(0), p(1), p(2), p(5))
                            + tetra_volume(p(0), p(2), p(7), p(5))
                            + tetra_volume(p(0), p(2), p(3), p(7))
                            + tetra_volume(p(0), p(5), p(7), p(4))
                            + tetra_volume(p(2), p(7), p(5), p(6))
                    }
                }
            })
            .collect()
    }

    /// Index of the cell whose center is nearest to `point`
    ///
    /// Ties break to the lowest cell index. `None` only for an empty mesh.
    pub fn near(&self, point: [f64; 3]) -> Option<usize> {
        self.centers()
            .iter()
            .map(|c| norm(sub(*c, point)))
            .position_min_by(|a, b| a.total_cmp(b))
    }

    /// Assign a material to every cell whose center lies in the given box
    ///
    /// Bounds are inclusive on both sides; cells outside the box keep their
    /// previous assignment.
    pub fn set_material(
        &mut self,
        name: &str,
        xlim: (f64, f64),
        ylim: (f64, f64),
        zlim: (f64, f64),
    ) {
        let within = |v: f64, lim: (f64, f64)| lim.0 <= v && v <= lim.1;
        for (i, center) in self.centers().iter().enumerate() {
            if within(center[0], xlim) && within(center[1], ylim) && within(center[2], zlim) {
                self.materials[i] = name.to_string();
            }
        }
    }
}

/// Fast binary save/load for processed meshes
///
/// Re-reading a generator format and redoing the topology operations is
/// slow for large meshes, so a finished mesh can be dumped to disk and
/// loaded back in milliseconds.
impl Mesh {
    /// Serialise the mesh to a binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| f!("Could not create {}", path.display()))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .with_context(|| f!("Could not serialise mesh to {}", path.display()))
    }

    /// Load a mesh previously written by [save](Mesh::save)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
        bincode::deserialize_from(BufReader::new(file))
            .with_context(|| f!("Could not deserialise mesh from {}", path.display()))
    }
}

// Small geometry helpers shared by the mesh modules
pub(crate) fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn tetra_volume(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    (dot(sub(b, a), cross(sub(c, a), sub(d, a))) / 6.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Structured grid of unit cubes, the workhorse fixture
    pub(super) fn unit_cube_grid(nx: usize, ny: usize, nz: usize) -> Mesh {
        let mut points = Vec::new();
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    points.push([i as f64, j as f64, k as f64]);
                }
            }
        }

        let np_x = nx + 1;
        let np_xy = (nx + 1) * (ny + 1);
        let mut connectivity = Vec::new();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let o = i + j * np_x + k * np_xy;
                    connectivity.push(vec![
                        o,
                        o + 1,
                        o + 1 + np_x,
                        o + np_x,
                        o + np_xy,
                        o + 1 + np_xy,
                        o + 1 + np_x + np_xy,
                        o + np_x + np_xy,
                    ]);
                }
            }
        }

        let cells = vec![CellBlock::new(CellType::Hexahedron, connectivity)];
        Mesh::new(points, cells).unwrap()
    }

    #[test]
    fn connectivity_validation_catches_bad_index() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let cells = vec![CellBlock::new(CellType::Triangle, vec![vec![0, 1, 7]])];
        assert!(Mesh::new(points, cells).is_err());
    }

    #[test]
    fn connectivity_validation_catches_wrong_point_count() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let cells = vec![CellBlock::new(CellType::Quad, vec![vec![0, 1, 2]])];
        assert!(Mesh::new(points, cells).is_err());
    }

    #[test]
    fn data_arrays_must_match_counts() {
        let mut mesh = unit_cube_grid(2, 2, 2);
        assert!(mesh
            .add_cell_data("porosity", DataArray::Scalar(vec![0.1; 8]))
            .is_ok());
        assert!(mesh
            .add_cell_data("porosity", DataArray::Scalar(vec![0.1; 3]))
            .is_err());
        assert!(mesh
            .add_point_data("head", DataArray::Scalar(vec![0.0; 27]))
            .is_ok());
    }

    #[test]
    fn unit_cube_volumes_and_centers() {
        let mesh = unit_cube_grid(2, 1, 1);
        let volumes = mesh.volumes();
        assert!(volumes.iter().all(|v| (v - 1.0).abs() < 1e-12));

        let centers = mesh.centers();
        assert_eq!(centers[0], [0.5, 0.5, 0.5]);
        assert_eq!(centers[1], [1.5, 0.5, 0.5]);
    }

    #[test]
    fn near_finds_exact_center() {
        let mesh = unit_cube_grid(3, 3, 3);
        let index = mesh.near([1.5, 1.5, 1.5]).unwrap();
        assert_eq!(mesh.centers()[index], [1.5, 1.5, 1.5]);
    }

    #[test]
    fn near_breaks_ties_to_lowest_index() {
        let mesh = unit_cube_grid(2, 1, 1);
        // equidistant from both cell centers
        assert_eq!(mesh.near([1.0, 0.5, 0.5]), Some(0));
    }

    #[test]
    fn set_material_inclusive_box() {
        let mut mesh = unit_cube_grid(10, 10, 10);
        mesh.set_material("SHALE", (4.0, 6.0), (4.0, 6.0), (4.0, 6.0));
        let tagged = mesh.materials.iter().filter(|m| *m == "SHALE").count();
        assert_eq!(tagged, 8);
        assert_eq!(mesh.materials[0], DEFAULT_MATERIAL);
    }

    #[test]
    fn wedge_and_tetra_volumes() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let cells = vec![CellBlock::new(
            CellType::Wedge,
            vec![vec![0, 1, 2, 3, 4, 5]],
        )];
        let mesh = Mesh::new(points.clone(), cells).unwrap();
        assert!((mesh.volumes()[0] - 0.5).abs() < 1e-12);

        let cells = vec![CellBlock::new(CellType::Tetra, vec![vec![0, 1, 2, 3]])];
        let mesh = Mesh::new(points, cells).unwrap();
        assert!((mesh.volumes()[0] - 1.0 / 6.0).abs() < 1e-12);
    }
}
