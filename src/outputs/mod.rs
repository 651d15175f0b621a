//! Readers for the tabulated simulator result files
//!
//! # Overview
//!
//! Results come back from the simulator in three different layouts: the
//! delimited CSV export, the fixed-column tables of the main output
//! listing, and the per-element time history logs. All three are coerced
//! into the same sequence of [Output] time-step entries, and the layout is
//! recognised from structural cues so the caller never declares it.
//!
//! ```rust,ignore
//! // one reader for every layout
//! let steps = toughprep::read_output("OUTPUT_ELEME.csv")?;
//!
//! // negative indices count back from the last step
//! let last = toughprep::outputs::time_step(&steps, -1)?;
//! println!("t = {} s over {} elements", last.time, last.labels.len());
//! ```

// files under the outputs module
mod csv_file;
mod history;
mod listing;
pub mod parsers;

// standard library
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// internal modules
use crate::utils::*;

// external crates
use anyhow::{anyhow, bail, Context, Result};
use log::debug;

#[doc(inline)]
pub use csv_file::CsvReader;

#[doc(inline)]
pub use history::HistoryReader;

#[doc(inline)]
pub use listing::ListingReader;

/// Which entity a result table describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Element,
    Connection,
}

/// The recognised result file layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLayout {
    /// Delimited table with a quoted two-row header
    Csv,
    /// Fixed-column tables from the main output listing
    Listing,
    /// Repeating per-step rows of a time history log
    History,
}

/// Results of one time step, label-ordered
///
/// Immutable once parsed: consumers index into `data` by variable name and
/// into each array by label position. The label order is exactly the row
/// order of the file, which for generated meshes matches cell order.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub kind: OutputKind,
    /// Simulation time of the step in seconds
    pub time: f64,
    /// Element labels, or concatenated label pairs for connections
    pub labels: Vec<String>,
    /// Variable names in file column order
    pub variables: Vec<String>,
    /// Variable name to value-per-label array
    pub data: HashMap<String, Vec<f64>>,
}

impl Output {
    /// Mean of one variable over every label of the step
    pub fn mean(&self, variable: &str) -> Result<f64> {
        let values = self
            .data
            .get(variable)
            .ok_or_else(|| anyhow!("No variable '{variable}' in output table"))?;
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Entry of a time step sequence, with negative indices from the end
///
/// ```rust
/// # use toughprep::outputs::{time_step, Output, OutputKind};
/// # use std::collections::HashMap;
/// # let step = |t: f64| Output { kind: OutputKind::Element, time: t,
/// #     labels: Vec::new(), variables: Vec::new(), data: HashMap::new() };
/// let steps = vec![step(0.0), step(10.0), step(20.0)];
/// assert_eq!(time_step(&steps, -1).unwrap().time, 20.0);
/// assert_eq!(time_step(&steps, 0).unwrap().time, 0.0);
/// ```
pub fn time_step(outputs: &[Output], index: isize) -> Result<&Output> {
    let n = outputs.len() as isize;
    let position = if index < 0 { n + index } else { index };

    if position < 0 || position >= n {
        bail!("Time step index {index} out of range for {n} steps");
    }
    Ok(&outputs[position as usize])
}

/// Read any recognised result file into a sequence of time steps
///
/// The layout is sniffed from the first lines; a file matching none of the
/// structural signatures is rejected.
///
/// - `path` - Path to the result file, can be [&str], [String], [Path], etc...
pub fn read_output<P: AsRef<Path>>(path: P) -> Result<Vec<Output>> {
    let path = path.as_ref();
    let lines = read_lines(path)?;
    let layout = detect_layout(&lines)
        .with_context(|| f!("Unrecognised result file layout: {}", path.display()))?;
    debug!("Detected {:?} layout for {}", layout, path.display());

    match layout {
        FileLayout::Csv => CsvReader::new().parse(&lines),
        FileLayout::Listing => ListingReader::new().parse(&lines),
        FileLayout::History => HistoryReader::new().parse(&lines),
    }
    .with_context(|| f!("Could not parse {}", path.display()))
}

/// Read a time history log explicitly
///
/// Same as [read_output] but skips the sniffing, for logs whose header was
/// mangled by post-processing.
pub fn read_output_history<P: AsRef<Path>>(path: P) -> Result<Vec<Output>> {
    let path = path.as_ref();
    let lines = read_lines(path)?;
    HistoryReader::new()
        .parse(&lines)
        .with_context(|| f!("Could not parse {}", path.display()))
}

/// Pick the layout from structural signatures, in order of specificity
///
/// Each detector either commits to a layout or passes; there is no trial
/// parsing and no backtracking.
pub fn detect_layout(lines: &[String]) -> Result<FileLayout> {
    let detectors: [fn(&[String]) -> Option<FileLayout>; 3] =
        [csv_signature, listing_signature, history_signature];

    detectors
        .iter()
        .find_map(|detect| detect(lines))
        .ok_or_else(|| anyhow!("No structural signature matched"))
}

/// Quoted comma-separated header row
fn csv_signature(lines: &[String]) -> Option<FileLayout> {
    let first = lines.iter().find(|line| !line.trim().is_empty())?;
    let first = first.trim_start();
    (first.starts_with('"') && first.contains(',')).then_some(FileLayout::Csv)
}

/// Step banner somewhere near the top of the main output
fn listing_signature(lines: &[String]) -> Option<FileLayout> {
    lines
        .iter()
        .take(500)
        .any(|line| parsers::is_step_banner(line))
        .then_some(FileLayout::Listing)
}

/// Unquoted header row leading with a TIME column
fn history_signature(lines: &[String]) -> Option<FileLayout> {
    let first = lines.iter().find(|line| !line.trim().is_empty())?;
    parsers::is_history_header(first).then_some(FileLayout::History)
}

/// Slurp a result file, releasing the handle before parsing starts
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .collect::<std::io::Result<_>>()
        .with_context(|| f!("Could not read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn layouts_are_sniffed_from_structure() {
        let csv = to_lines("\"  ELEM\",\"   PRES\"\n\" AAA00\",  1.0e+05\n");
        assert_eq!(detect_layout(&csv).unwrap(), FileLayout::Csv);

        let listing = to_lines(
            "  problem: sample\n\n OUTPUT DATA AFTER (  5, 6)-2-TIME STEPS   THE TIME IS 0.1E+01 DAYS\n",
        );
        assert_eq!(detect_layout(&listing).unwrap(), FileLayout::Listing);

        let history = to_lines("TIME(S)        AAA00        AAA01\n 0.0 1.0 2.0\n");
        assert_eq!(detect_layout(&history).unwrap(), FileLayout::History);

        let garbage = to_lines("nothing to see here\n1 2 3\n");
        assert!(detect_layout(&garbage).is_err());
    }

    #[test]
    fn time_step_rejects_out_of_range() {
        let steps = vec![Output {
            kind: OutputKind::Element,
            time: 1.0,
            labels: Vec::new(),
            variables: Vec::new(),
            data: HashMap::new(),
        }];
        assert!(time_step(&steps, 1).is_err());
        assert!(time_step(&steps, -2).is_err());
        assert!(time_step(&steps, -1).is_ok());
    }
}
