//! Reader for the time history logs
//!
//! History logs track a handful of observation elements or connections
//! over every time step, one row per step:
//!
//! ```text
//! TIME(S)          AAA00          AAA12          ABC34
//!  0.00000E+00    0.10000E+06    0.10065E+06    0.99000E+05
//!  8.64000E+04    0.10100E+06    0.10165E+06    0.99100E+05
//! ```
//!
//! Every row becomes one [Output] entry whose labels are the observation
//! columns, so the sequence indexes exactly like the other layouts.

// internal modules
use crate::outputs::parsers;
use crate::outputs::{Output, OutputKind};

// standard library
use std::collections::{HashMap, HashSet};

// external crates
use anyhow::{anyhow, bail, Result};
use log::trace;

/// Variable name assigned to the single tracked quantity of a log
pub const HISTORY_VARIABLE: &str = "VALUE";

/// A reader for time history logs
#[derive(Debug, Default)]
pub struct HistoryReader;

impl HistoryReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse the full line sequence into one entry per time row
    pub fn parse(&mut self, lines: &[String]) -> Result<Vec<Output>> {
        let mut lines = lines.iter().filter(|line| !line.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| anyhow!("History log has no header row"))?;
        if !parsers::is_history_header(header) {
            bail!("History log must lead with a TIME column:\n \"{header}\"");
        }

        // observation labels follow the TIME column
        let labels: Vec<String> = header
            .split_whitespace()
            .skip(1)
            .map(String::from)
            .collect();
        if labels.is_empty() {
            bail!("History log header declares no observation columns");
        }

        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label) {
                bail!("Duplicate label '{label}' in history log header");
            }
        }

        let mut out = Vec::new();
        for line in lines {
            let (_, values) = parsers::double_list(line)
                .map_err(|_| anyhow!("Failed to parse history row:\n \"{line}\""))?;
            if values.len() != labels.len() + 1 {
                bail!(
                    "Row has {} values where the header declares {} columns:\n \"{line}\"",
                    values.len(),
                    labels.len() + 1
                );
            }
            trace!("[History row] t = {}", values[0]);

            let mut data = HashMap::new();
            data.insert(HISTORY_VARIABLE.to_string(), values[1..].to_vec());

            out.push(Output {
                kind: OutputKind::Element,
                time: values[0],
                labels: labels.clone(),
                variables: vec![HISTORY_VARIABLE.to_string()],
                data,
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn history_rows_become_time_steps() {
        let text = concat!(
            "TIME(S)          AAA00          AAA12\n",
            " 0.00000E+00    0.10000E+06    0.99000E+05\n",
            " 8.64000E+04    0.10100E+06    0.99100E+05\n",
        );
        let steps = HistoryReader::new().parse(&to_lines(text)).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].time, 0.0);
        assert_eq!(steps[1].time, 86400.0);
        assert_eq!(steps[0].labels, vec!["AAA00", "AAA12"]);
        assert_eq!(steps[1].data[HISTORY_VARIABLE], vec![1.01e5, 9.91e4]);
    }

    #[test]
    fn ragged_history_rows_are_rejected() {
        let text = concat!(
            "TIME(S)          AAA00          AAA12\n",
            " 0.00000E+00    0.10000E+06\n",
        );
        assert!(HistoryReader::new().parse(&to_lines(text)).is_err());
    }

    #[test]
    fn duplicate_history_columns_are_rejected() {
        let text = concat!(
            "TIME(S)          AAA00          AAA00\n",
            " 0.00000E+00    0.10000E+06    0.99000E+05\n",
        );
        assert!(HistoryReader::new().parse(&to_lines(text)).is_err());
    }
}
