//! Cell types and their canonical topology tables
//!
//! Every cell type carries its point count, dimension, face-to-local-point
//! table, and the prismatic type it becomes when a 2D mesh is extruded.
//! The face tables are the single source of truth for deriving inter-cell
//! connections, so their winding is chosen to keep face normals outward
//! for positively oriented cells.

// standard library
use std::fmt;

// external crates
use serde::{Deserialize, Serialize};

/// The supported cell types
///
/// Vertex ordering follows the usual unstructured-mesh convention: 2D cells
/// are counter-clockwise cycles, wedges and hexahedra list the bottom face
/// first then the top face, and pyramids list the quad base then the apex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Line,
    Triangle,
    Quad,
    Tetra,
    Pyramid,
    Wedge,
    Hexahedron,
}

impl CellType {
    /// Number of points defining one cell of this type
    pub const fn n_points(&self) -> usize {
        match self {
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad => 4,
            Self::Tetra => 4,
            Self::Pyramid => 5,
            Self::Wedge => 6,
            Self::Hexahedron => 8,
        }
    }

    /// Topological dimension of the cell
    pub const fn dimension(&self) -> usize {
        match self {
            Self::Line => 1,
            Self::Triangle | Self::Quad => 2,
            _ => 3,
        }
    }

    /// Face-to-local-point topology table
    ///
    /// Only 3D cells have polygonal faces; lower-dimensional types return
    /// an empty table and cannot take part in connection derivation.
    pub fn faces(&self) -> &'static [&'static [usize]] {
        match self {
            Self::Tetra => &[&[0, 1, 2], &[0, 1, 3], &[1, 2, 3], &[0, 2, 3]],
            Self::Pyramid => &[
                &[0, 1, 2, 3],
                &[0, 1, 4],
                &[1, 2, 4],
                &[2, 3, 4],
                &[0, 3, 4],
            ],
            Self::Wedge => &[
                &[0, 1, 2],
                &[3, 4, 5],
                &[0, 1, 4, 3],
                &[1, 2, 5, 4],
                &[0, 2, 5, 3],
            ],
            Self::Hexahedron => &[
                &[0, 1, 2, 3],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[0, 3, 7, 4],
            ],
            _ => &[],
        }
    }

    /// The prismatic type this cell becomes when extruded by one layer
    pub const fn extruded(&self) -> Option<CellType> {
        match self {
            Self::Line => Some(Self::Quad),
            Self::Triangle => Some(Self::Wedge),
            Self::Quad => Some(Self::Hexahedron),
            _ => None,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Line => "line",
            Self::Triangle => "triangle",
            Self::Quad => "quad",
            Self::Tetra => "tetra",
            Self::Pyramid => "pyramid",
            Self::Wedge => "wedge",
            Self::Hexahedron => "hexahedron",
        };
        write!(f, "{name}")
    }
}

/// One group of cells sharing a type
///
/// Blocks preserve an implicit global cell ordering, block by block, which
/// every cell-data array and every derived connection cross-references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellBlock {
    pub cell_type: CellType,
    pub connectivity: Vec<Vec<usize>>,
}

impl CellBlock {
    pub fn new(cell_type: CellType, connectivity: Vec<Vec<usize>>) -> Self {
        Self {
            cell_type,
            connectivity,
        }
    }

    /// Number of cells in the block
    pub fn len(&self) -> usize {
        self.connectivity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectivity.is_empty()
    }
}
