//! Reader and writer for the simulator's fixed-width input deck
//!
//! # Overview
//!
//! The simulator consumes keyword-block-structured text files where every
//! record is column-positional: MESH files carry the element and connection
//! blocks, INCON files the initial conditions, and the full input deck adds
//! titles, rock properties, solver and time stepping controls, sources, and
//! output requests. Field widths are dictated by the [schema](crate::schema)
//! tables and reproduced byte-exactly, since the simulator reads by column.
//!
//! Run configuration travels as a [serde_json::Value] dictionary with the
//! two special sub-dictionaries `elements` and `connections` keyed by the
//! fixed-width element labels.
//!
//! ```rust,ignore
//! // mesh -> MESH/INCON files
//! toughprep::tough::write_mesh_file("MESH", &mesh, true)?;
//!
//! // full deck round trip
//! toughprep::tough::write_input_file("INFILE", &parameters)?;
//! let parameters = toughprep::read_input("INFILE")?;
//! ```

// files under the tough module
mod read;
mod write;

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// internal modules
use crate::utils::*;

// external crates
use anyhow::{Context, Result};
use serde_json::Value;

#[doc(inline)]
pub use read::{read_input, InputReader};

#[doc(inline)]
pub use write::{incon_parameters, mesh_parameters, write_incon, write_input, write_mesh};

/// Characters available to each of the three leading label positions
const LABEL_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ123456789";

/// Highest cell count the label space can address
pub const LABEL_CAPACITY: usize = 35 * 35 * 35 * 100;

/// Five-character element label for a cell index
///
/// Labels are three base-35 characters (`A`-`Z` then `1`-`9`) followed by
/// two decimal digits, so consecutive cell indices map to consecutive
/// labels and label order always matches cell order:
///
/// ```rust
/// # use toughprep::tough::label;
/// assert_eq!(label(0), "AAA00");
/// assert_eq!(label(101), "AAB01");
/// assert_eq!(label(35 * 35 * 100), "BAA00");
/// ```
pub fn label(index: usize) -> String {
    assert!(
        index < LABEL_CAPACITY,
        "Cell index {index} exceeds the label space of {LABEL_CAPACITY}"
    );

    let (rest, digits) = (index / 100, index % 100);
    let (rest, c3) = (rest / 35, rest % 35);
    let (rest, c2) = (rest / 35, rest % 35);
    let c1 = rest % 35;

    f!(
        "{}{}{}{digits:02}",
        LABEL_CHARS[c1] as char,
        LABEL_CHARS[c2] as char,
        LABEL_CHARS[c3] as char
    )
}

/// Read a full input deck or MESH/INCON file into a parameter dictionary
///
/// Blocks may appear in any order and absent blocks simply leave their
/// dictionary keys unset. A file containing no recognised block at all is
/// rejected.
///
/// - `path` - Path to the deck, can be [&str], [String], [Path], etc...
pub fn read_input_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
    let mut reader = InputReader::new();
    reader
        .parse(BufReader::new(file))
        .with_context(|| f!("Not a recognised input deck: {}", path.display()))
}

/// Write a full input deck from a parameter dictionary
pub fn write_input_file<P: AsRef<Path>>(path: P, parameters: &Value) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| f!("Could not create {}", path.display()))?;
    write_input(&mut BufWriter::new(file), parameters)
}

/// Write a mesh to a MESH file, and optionally an INCON file next to it
///
/// The MESH file holds the element and connection blocks derived from the
/// mesh topology. With `incon` set, the recognised `initial_condition` and
/// `porosity` cell data are written to an `INCON` file in the same
/// directory.
pub fn write_mesh_file<P: AsRef<Path>>(path: P, mesh: &crate::Mesh, incon: bool) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| f!("Could not create {}", path.display()))?;
    write_mesh(&mut BufWriter::new(file), mesh)?;

    if incon {
        let path = path.with_file_name("INCON");
        let file =
            File::create(&path).with_context(|| f!("Could not create {}", path.display()))?;
        write_incon(&mut BufWriter::new(file), mesh)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_deterministic_and_ordered() {
        assert_eq!(label(0), "AAA00");
        assert_eq!(label(99), "AAA99");
        assert_eq!(label(100), "AAB00");
        assert_eq!(label(35 * 100), "ABA00");
        assert_eq!(label(35 * 35 * 100), "BAA00");
        assert_eq!(label(LABEL_CAPACITY - 1), "99999");
    }

    #[test]
    fn labels_are_unique_over_a_block() {
        let labels: std::collections::HashSet<String> = (0..5000).map(label).collect();
        assert_eq!(labels.len(), 5000);
    }

    #[test]
    #[should_panic]
    fn label_space_is_bounded() {
        let _ = label(LABEL_CAPACITY);
    }
}
