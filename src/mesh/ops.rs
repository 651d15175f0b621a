//! Topology-transforming mesh operations
//!
//! Extrusion and pruning both run as a pure transform over a snapshot of
//! the mesh, with two entry points each: a copy-returning variant and an
//! in-place variant that swaps the result into the caller's mesh. Data
//! arrays and materials are carried through both transforms so they stay
//! aligned with the surviving points and cells.

// standard library
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

// internal modules
use super::{Axis, CellBlock, CellType, Mesh};

// external crates
use anyhow::{bail, Result};
use log::debug;

/// Split a total height into `n` equal layer thicknesses
///
/// Convenience for the common "extrude by total height" call:
///
/// ```rust
/// # use toughprep::mesh::uniform_layers;
/// assert_eq!(uniform_layers(10.0, 4), vec![2.5; 4]);
/// ```
pub fn uniform_layers(height: f64, n: usize) -> Vec<f64> {
    vec![height / n as f64; n]
}

/// Extrusion and pruning entry points
impl Mesh {
    /// Copy-returning extrusion of a planar mesh into 3D
    ///
    /// The point set is replicated once per level along `axis`, offset by
    /// the cumulative layer thickness, and every planar cell is stitched
    /// into its prismatic counterpart between consecutive levels. Point
    /// data are replicated per level, cell data and materials per layer.
    ///
    /// The result has `(k + 1) * n_points` points and `k * n_cells` cells
    /// for `k` layers.
    pub fn extruded(&self, thicknesses: &[f64], axis: Axis) -> Result<Mesh> {
        extrude_core(self, thicknesses, axis)
    }

    /// In-place variant of [extruded](Mesh::extruded)
    pub fn extrude_to_3d(&mut self, thicknesses: &[f64], axis: Axis) -> Result<()> {
        *self = extrude_core(self, thicknesses, axis)?;
        Ok(())
    }

    /// Copy-returning merge of duplicate points and cells
    ///
    /// Points with bit-identical coordinates collapse onto their first
    /// occurrence and every cell is remapped; cells that then share the
    /// same point set (in any rotation or reflection) within a type keep
    /// only the first occurrence. Data arrays are filtered down to the
    /// survivors. The operation is idempotent.
    pub fn pruned(&self) -> Mesh {
        prune_core(self)
    }

    /// In-place variant of [pruned](Mesh::pruned)
    pub fn prune_duplicates(&mut self) {
        *self = prune_core(self);
    }
}

/// Pure extrusion transform over a mesh snapshot
fn extrude_core(mesh: &Mesh, thicknesses: &[f64], axis: Axis) -> Result<Mesh> {
    if thicknesses.is_empty() {
        bail!("Extrusion requires at least one layer thickness");
    }
    for block in &mesh.cells {
        if block.cell_type.extruded().is_none() {
            bail!("Cannot extrude {} cells", block.cell_type);
        }
    }

    let n_layers = thicknesses.len();
    let n_points = mesh.n_points();
    let axis = axis.index();

    // points replicated per level, offset by cumulative thickness
    let mut points = Vec::with_capacity(n_points * (n_layers + 1));
    let mut offset = 0.0;
    for level in 0..=n_layers {
        if level > 0 {
            offset += thicknesses[level - 1];
        }
        for p in &mesh.points {
            let mut p = *p;
            p[axis] += offset;
            points.push(p);
        }
    }

    // each planar cell is stitched between consecutive levels
    let cells = mesh
        .cells
        .iter()
        .map(|block| {
            let cell_type = block.cell_type.extruded().unwrap();
            let mut connectivity = Vec::with_capacity(block.len() * n_layers);
            for layer in 0..n_layers {
                let (bottom, top) = (layer * n_points, (layer + 1) * n_points);
                for cell in &block.connectivity {
                    let stitched: Vec<usize> = match block.cell_type {
                        // lines close into a quad cycle rather than stacking
                        CellType::Line => vec![
                            cell[0] + bottom,
                            cell[1] + bottom,
                            cell[1] + top,
                            cell[0] + top,
                        ],
                        _ => cell
                            .iter()
                            .map(|&p| p + bottom)
                            .chain(cell.iter().map(|&p| p + top))
                            .collect(),
                    };
                    connectivity.push(stitched);
                }
            }
            CellBlock::new(cell_type, connectivity)
        })
        .collect();

    debug!(
        "Extruded {} cells over {} layers along axis {}",
        mesh.n_cells(),
        n_layers,
        axis
    );

    let point_data = mesh
        .point_data
        .iter()
        .map(|(k, v)| (k.clone(), v.tiled(n_layers + 1)))
        .collect();
    let cell_data = mesh
        .cell_data
        .iter()
        .map(|(k, v)| (k.clone(), v.tiled(n_layers)))
        .collect();
    let materials = mesh
        .materials
        .iter()
        .cycle()
        .take(mesh.materials.len() * n_layers)
        .cloned()
        .collect();

    Ok(Mesh {
        points,
        cells,
        point_data,
        cell_data,
        materials,
    })
}

/// Pure duplicate-merging transform over a mesh snapshot
///
/// Duplicate detection hashes bit-exact coordinates and sorted point sets,
/// so the cost stays near-linear in the mesh size.
fn prune_core(mesh: &Mesh) -> Mesh {
    // first occurrence wins; every later duplicate maps onto it
    let mut seen: HashMap<[u64; 3], usize> = HashMap::new();
    let mut remap = vec![0usize; mesh.n_points()];
    let mut kept_points = Vec::new();

    for (i, p) in mesh.points.iter().enumerate() {
        let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
        match seen.entry(key) {
            Entry::Occupied(entry) => remap[i] = *entry.get(),
            Entry::Vacant(entry) => {
                let new_index = kept_points.len();
                entry.insert(new_index);
                remap[i] = new_index;
                kept_points.push(i);
            }
        }
    }

    // remap connectivity, then drop cells that collapse onto an earlier one
    let mut seen_cells: HashSet<(CellType, Vec<usize>)> = HashSet::new();
    let mut kept_cells = Vec::new();
    let mut cells = Vec::new();
    let mut global = 0;

    for block in &mesh.cells {
        let mut connectivity = Vec::new();
        for cell in &block.connectivity {
            let remapped: Vec<usize> = cell.iter().map(|&p| remap[p]).collect();
            let mut key = remapped.clone();
            key.sort_unstable();

            if seen_cells.insert((block.cell_type, key)) {
                kept_cells.push(global);
                connectivity.push(remapped);
            }
            global += 1;
        }
        if !connectivity.is_empty() {
            cells.push(CellBlock::new(block.cell_type, connectivity));
        }
    }

    debug!(
        "Pruned {} duplicate points and {} duplicate cells",
        mesh.n_points() - kept_points.len(),
        mesh.n_cells() - kept_cells.len()
    );

    let points = kept_points.iter().map(|&i| mesh.points[i]).collect();
    let point_data = mesh
        .point_data
        .iter()
        .map(|(k, v)| (k.clone(), v.filtered(&kept_points)))
        .collect();
    let cell_data = mesh
        .cell_data
        .iter()
        .map(|(k, v)| (k.clone(), v.filtered(&kept_cells)))
        .collect();
    let materials = kept_cells.iter().map(|&i| mesh.materials[i].clone()).collect();

    Mesh {
        points,
        cells,
        point_data,
        cell_data,
        materials,
    }
}
