//! # The Toughprep crate
//!
//! A collection of pre- and post-processing tools for TOUGH-style reservoir
//! simulator input and output files
//!
//! ## Installation
//!
//! Direct install from github:
//!
//! ```shell
//! cargo install --git https://github.com/repositony/toughprep.git
//! ```
//!
//! ## Overview
//!
//! The crate covers the data structures and file formats that surround the
//! simulator itself: unstructured meshes, the legacy fixed-column-width input
//! deck, and the various tabulated result files.
//!
//! | Module    | Description                                             |
//! | --------- | ------------------------------------------------------- |
//! | [mesh]    | Unstructured mesh model, extrusion, pruning, tagging    |
//! | [tough]   | Read/write the fixed-width MESH/INCON/INFILE format     |
//! | [outputs] | Read element/connection result tables and history logs  |
//! | [schema]  | Per-block parameter tables and dictionary validation    |
//! | [record]  | Low-level fixed-width record codec and block framing    |
//! | [models]  | Calling contract for capillary pressure functions       |
//!
//! The `toughextract` command line tool reformats a main output file as a
//! per-element CSV table and is a thin layer over [outputs] and [tough].
//!
//! ### Supported output table layouts
//!
//! Result files are recognised from structural cues, so the caller never has
//! to declare which layout is in use.
//!
//! | Layout                                             | Description                              |
//! | -------------------------------------------------- | ---------------------------------------- |
//! | [FileLayout::Csv](crate::outputs::FileLayout)      | Delimited table, quoted two-row header   |
//! | [FileLayout::Listing](crate::outputs::FileLayout)  | Fixed-column tables from the main output |
//! | [FileLayout::History](crate::outputs::FileLayout)  | Per-element time history log             |
//!
//! ### Supported cell types
//!
//! | Cell type                                     | Extrudes to |
//! | --------------------------------------------- | ----------- |
//! | [CellType::Line](crate::mesh::CellType)       | Quad        |
//! | [CellType::Triangle](crate::mesh::CellType)   | Wedge       |
//! | [CellType::Quad](crate::mesh::CellType)       | Hexahedron  |
//! | [CellType::Tetra](crate::mesh::CellType)      | -           |
//! | [CellType::Pyramid](crate::mesh::CellType)    | -           |
//! | [CellType::Wedge](crate::mesh::CellType)      | -           |
//! | [CellType::Hexahedron](crate::mesh::CellType) | -           |
//!
//! ## Advanced use
//!
//! The typical workflow takes the canonical point/cell arrays of whatever
//! mesh generator was used, extrudes and tags the mesh, and writes the
//! simulator files:
//!
//! ```rust
//! use toughprep::mesh::{Axis, CellBlock, CellType, Mesh};
//!
//! // canonical point/cell arrays from any mesh generator
//! let points = vec![
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [1.0, 1.0, 0.0],
//!     [0.0, 1.0, 0.0],
//! ];
//! let cells = vec![CellBlock::new(CellType::Quad, vec![vec![0, 1, 2, 3]])];
//!
//! let mut mesh = Mesh::new(points, cells).unwrap();
//! mesh.extrude_to_3d(&[0.5, 0.5], Axis::Z).unwrap();
//! mesh.set_material("SAND1", (0.0, 1.0), (0.0, 1.0), (0.0, 1.0));
//! ```
//!
//! Simulator results are read back with a one-liner and indexed by time
//! step, with negative indices counting from the last step:
//!
//! ```rust,ignore
//! let steps = toughprep::read_output("OUTPUT_ELEME.csv")?;
//! let last = toughprep::outputs::time_step(&steps, -1)?;
//! ```
//!
//! In the background, the `nom` parser combinator library classifies output
//! lines, `clap` handles the command line interface, and `serde`/`bincode`
//! provide fast save/load of processed meshes.

// Public facing modules
pub mod mesh;
pub mod models;
pub mod outputs;
pub mod record;
pub mod schema;
pub mod tough;
pub mod utils;

// Re-exports of useful data structures
#[doc(inline)]
pub use crate::mesh::Mesh;

#[doc(inline)]
pub use crate::outputs::{read_output, read_output_history, Output};

#[doc(inline)]
pub use crate::tough::{read_input, write_input};
