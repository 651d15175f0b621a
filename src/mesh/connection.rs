//! Derived inter-cell connections
//!
//! The simulator describes flow between control volumes through their
//! shared interfaces, so the writer needs one connection record per pair
//! of cells sharing a face. Connections are never stored on the mesh;
//! they are recomputed from topology whenever needed, via a face-to-cell
//! adjacency built from the canonical face tables.

// standard library
use std::collections::HashMap;

// internal modules
use super::{add, cross, dot, norm, scale, sub, Mesh};

// external crates
use anyhow::{bail, Result};

/// A shared interface between two adjacent cells
///
/// Geometric attributes are the ones the simulator's connection records
/// need: the dominant axis of the line between cell centers, the distance
/// from each center to the interface, the interface area, and the cosine
/// of the angle the connection line makes with the vertical.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Indices of the two adjacent cells, lower first
    pub cells: (usize, usize),
    /// Dominant axis of the inter-center line, 1-based (1 = x, 2 = y, 3 = z)
    pub direction: usize,
    /// Distance from each cell center to the interface plane
    pub distances: (f64, f64),
    /// Interface area
    pub area: f64,
    /// Cosine of the angle between the connection line and gravity
    pub gravity_cosine: f64,
}

/// A face shared by exactly two cells, with its geometry
struct SharedFace {
    cells: (usize, usize),
    centroid: [f64; 3],
    /// Unit normal of the face plane
    normal: [f64; 3],
    area: f64,
}

impl Mesh {
    /// Derive the connection list from mesh topology
    ///
    /// Only meshes made entirely of volumetric cells have well-defined
    /// interfaces; planar meshes must be extruded first. The list is
    /// ordered by cell pair for reproducible output.
    pub fn connections(&self) -> Result<Vec<Connection>> {
        let centers = self.centers();

        Ok(self
            .shared_faces()?
            .iter()
            .map(|face| {
                let (i, j) = face.cells;
                let line = sub(centers[j], centers[i]);
                let length = norm(line);

                // dominant axis of the inter-center line
                let direction = line
                    .iter()
                    .map(|v| v.abs())
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map(|(axis, _)| axis + 1)
                    .unwrap();

                Connection {
                    cells: (i, j),
                    direction,
                    distances: (
                        dot(sub(centers[i], face.centroid), face.normal).abs(),
                        dot(sub(centers[j], face.centroid), face.normal).abs(),
                    ),
                    area: face.area,
                    // gravity acts along -z; positive when j sits below i
                    gravity_cosine: (centers[i][2] - centers[j][2]) / length,
                }
            })
            .collect())
    }

    /// Face-to-face quality score of every cell
    ///
    /// The score of a cell is the mean over its interior faces of the
    /// absolute cosine between the center-to-neighbor line and the face
    /// normal; 1.0 means perfectly orthogonal interfaces. Faces without a
    /// neighbor do not contribute, so cells with no interior face at all
    /// report NaN and should be read as a diagnostic only.
    pub fn qualities(&self) -> Result<Vec<f64>> {
        let centers = self.centers();
        let mut sums = vec![0.0; self.n_cells()];
        let mut counts = vec![0usize; self.n_cells()];

        for face in self.shared_faces()? {
            let (i, j) = face.cells;
            let line = sub(centers[j], centers[i]);
            let cosine = (dot(line, face.normal) / norm(line)).abs();
            sums[i] += cosine;
            counts[i] += 1;
            sums[j] += cosine;
            counts[j] += 1;
        }

        Ok(sums
            .iter()
            .zip(&counts)
            .map(|(sum, &count)| sum / count as f64)
            .collect())
    }

    /// Build the face-to-cell adjacency and keep the interior faces
    ///
    /// Faces are keyed by their sorted point set, so the winding a
    /// neighboring cell uses for the same face does not matter.
    fn shared_faces(&self) -> Result<Vec<SharedFace>> {
        let mut adjacency: HashMap<Vec<usize>, Vec<(usize, Vec<usize>)>> = HashMap::new();

        for (index, (cell_type, cell)) in self.iter_cells().enumerate() {
            if cell_type.dimension() != 3 {
                bail!("Cannot derive connections for {} cells, extrude the mesh first", cell_type);
            }
            for face in cell_type.faces() {
                let points: Vec<usize> = face.iter().map(|&local| cell[local]).collect();
                let mut key = points.clone();
                key.sort_unstable();
                adjacency.entry(key).or_default().push((index, points));
            }
        }

        let mut faces: Vec<SharedFace> = adjacency
            .into_values()
            .filter(|owners| owners.len() == 2)
            .map(|owners| {
                let (a, b) = (owners[0].0, owners[1].0);
                let (centroid, normal, area) = self.face_geometry(&owners[0].1);
                SharedFace {
                    cells: (a.min(b), a.max(b)),
                    centroid,
                    normal,
                    area,
                }
            })
            .collect();

        // adjacency iteration order is arbitrary
        faces.sort_by_key(|face| face.cells);
        Ok(faces)
    }

    /// Centroid, unit normal, and area of a polygonal face
    fn face_geometry(&self, face: &[usize]) -> ([f64; 3], [f64; 3], f64) {
        let mut centroid = [0.0; 3];
        for &p in face {
            centroid = add(centroid, self.points[p]);
        }
        let centroid = scale(centroid, 1.0 / face.len() as f64);

        // vector area of the polygon fan around the first vertex
        let origin = self.points[face[0]];
        let mut area_vector = [0.0; 3];
        for pair in face[1..].windows(2) {
            let v = cross(sub(self.points[pair[0]], origin), sub(self.points[pair[1]], origin));
            area_vector = add(area_vector, v);
        }
        let area_vector = scale(area_vector, 0.5);

        let area = norm(area_vector);
        let normal = if area > 0.0 {
            scale(area_vector, 1.0 / area)
        } else {
            [0.0; 3]
        };

        (centroid, normal, area)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::unit_cube_grid;
    use super::*;

    #[test]
    fn two_cube_connection() {
        let mesh = unit_cube_grid(2, 1, 1);
        let connections = mesh.connections().unwrap();
        assert_eq!(connections.len(), 1);

        let c = &connections[0];
        assert_eq!(c.cells, (0, 1));
        assert_eq!(c.direction, 1);
        assert!((c.distances.0 - 0.5).abs() < 1e-12);
        assert!((c.distances.1 - 0.5).abs() < 1e-12);
        assert!((c.area - 1.0).abs() < 1e-12);
        assert!(c.gravity_cosine.abs() < 1e-12);
    }

    #[test]
    fn vertical_connection_gravity_cosine() {
        let mesh = unit_cube_grid(1, 1, 2);
        let connections = mesh.connections().unwrap();
        assert_eq!(connections.len(), 1);

        let c = &connections[0];
        assert_eq!(c.direction, 3);
        // cell 1 sits above cell 0
        assert!((c.gravity_cosine - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn structured_grid_connection_count() {
        // interior faces of an n^3 grid: 3 * n^2 * (n - 1)
        let mesh = unit_cube_grid(3, 3, 3);
        let connections = mesh.connections().unwrap();
        assert_eq!(connections.len(), 3 * 9 * 2);
    }

    #[test]
    fn cube_grid_quality_is_perfect() {
        let mesh = unit_cube_grid(2, 2, 2);
        let qualities = mesh.qualities().unwrap();
        assert!(qualities.iter().all(|q| (q - 1.0).abs() < 1e-12));
    }

    #[test]
    fn planar_mesh_has_no_connections() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let cells = vec![super::super::CellBlock::new(
            super::super::CellType::Quad,
            vec![vec![0, 1, 2, 3]],
        )];
        let mesh = Mesh::new(points, cells).unwrap();
        assert!(mesh.connections().is_err());
    }
}
