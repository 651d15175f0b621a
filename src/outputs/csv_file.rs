//! Reader for the delimited CSV result tables
//!
//! One file holds either a single time step or several consecutive
//! blocks, each introduced by a one-line quoted time marker. Labels and
//! variable names come from the first header row; an optional second
//! header row carries units and is skipped.

// internal modules
use crate::outputs::parsers;
use crate::outputs::{Output, OutputKind};

// standard library
use std::collections::{HashMap, HashSet};

// external crates
use anyhow::{anyhow, bail, Result};
use log::trace;

/// A reader for delimited result tables
#[derive(Debug, Default)]
pub struct CsvReader;

impl CsvReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse the full line sequence into time-step entries
    pub fn parse(&mut self, lines: &[String]) -> Result<Vec<Output>> {
        let mut lines = lines.iter().filter(|line| !line.trim().is_empty());

        // first header row names the label and variable columns
        let header = lines
            .next()
            .ok_or_else(|| anyhow!("Delimited file has no header row"))?;
        let (_, names) = parsers::quoted_row(header.trim_start())
            .map_err(|_| anyhow!("Failed to parse header row:\n \"{header}\""))?;
        let names: Vec<String> = names.iter().map(|name| name.trim().to_string()).collect();

        let (kind, n_label_columns) = match names.get(1).map(String::as_str) {
            Some("ELEM2") => (OutputKind::Connection, 2),
            _ => (OutputKind::Element, 1),
        };
        let variables: Vec<String> = names[n_label_columns..].to_vec();
        let n_columns = names.len();

        let mut out: Vec<Output> = Vec::new();
        let mut current = Block::new(kind, &variables);

        for line in lines {
            // a quoted time marker opens the next block
            if let Ok((_, time)) = parsers::csv_time_marker(line) {
                trace!("[Time marker] {line}");
                if !current.labels.is_empty() {
                    out.push(current.finish(&variables));
                    current = Block::new(kind, &variables);
                }
                current.time = time;
                continue;
            }

            // a units row may follow the header once
            if out.is_empty() && current.labels.is_empty() && Self::is_units_row(line) {
                trace!("[Units] {line}");
                continue;
            }

            let fields = parsers::csv_fields(line);
            if fields.len() != n_columns {
                bail!(
                    "Row has {} fields where the header declares {}:\n \"{line}\"",
                    fields.len(),
                    n_columns
                );
            }

            let label = fields[..n_label_columns].concat();
            if !current.seen.insert(label.clone()) {
                bail!("Duplicate label '{label}' within one time step");
            }
            current.labels.push(label);

            for (variable, field) in variables.iter().zip(&fields[n_label_columns..]) {
                let value: f64 = field
                    .parse()
                    .map_err(|_| anyhow!("Could not parse '{field}' for variable {variable}"))?;
                current.columns.get_mut(variable).unwrap().push(value);
            }
        }

        if !current.labels.is_empty() {
            out.push(current.finish(&variables));
        }

        Ok(out)
    }

    /// Units rows quote nothing but parenthesised or blank entries
    fn is_units_row(line: &str) -> bool {
        match parsers::quoted_row(line.trim_start()) {
            Ok((_, fields)) => fields
                .iter()
                .all(|field| field.trim().is_empty() || field.trim().starts_with('(')),
            Err(_) => false,
        }
    }
}

/// Accumulator for the rows of one time step
#[derive(Debug)]
struct Block {
    kind: OutputKind,
    time: f64,
    labels: Vec<String>,
    seen: HashSet<String>,
    columns: HashMap<String, Vec<f64>>,
}

impl Block {
    fn new(kind: OutputKind, variables: &[String]) -> Self {
        Self {
            kind,
            time: 0.0,
            labels: Vec::new(),
            seen: HashSet::new(),
            columns: variables
                .iter()
                .map(|name| (name.clone(), Vec::new()))
                .collect(),
        }
    }

    fn finish(self, variables: &[String]) -> Output {
        Output {
            kind: self.kind,
            time: self.time,
            labels: self.labels,
            variables: variables.to_vec(),
            data: self.columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    const SAMPLE: &str = concat!(
        "\"              ELEM\",\"               PRES\",\"              TEMP\"\n",
        "\"                  \",\"               (PA)\",\"           (DEG-C)\"\n",
        "\"TIME [sec]  0.0000000e+00\"\n",
        "\"             AAA00\",  1.0000000000e+05,  2.5000000000e+01\n",
        "\"             AAA01\",  2.0000000000e+05,  2.6000000000e+01\n",
        "\"TIME [sec]  8.6400000e+04\"\n",
        "\"             AAA00\",  3.0000000000e+05,  2.7000000000e+01\n",
        "\"             AAA01\",  4.0000000000e+05,  2.8000000000e+01\n",
    );

    #[test]
    fn multi_step_file_parses() {
        let steps = CsvReader::new().parse(&to_lines(SAMPLE)).unwrap();
        assert_eq!(steps.len(), 2);

        assert_eq!(steps[0].time, 0.0);
        assert_eq!(steps[0].labels, vec!["AAA00", "AAA01"]);
        assert_eq!(steps[0].variables, vec!["PRES", "TEMP"]);
        assert_eq!(steps[0].data["PRES"], vec![1.0e5, 2.0e5]);

        assert_eq!(steps[1].time, 86400.0);
        assert_eq!(steps[1].data["TEMP"], vec![27.0, 28.0]);
    }

    #[test]
    fn single_step_without_marker() {
        let text = concat!(
            "\"  ELEM\",\"  PRES\"\n",
            "\" AAA00\",  1.0e+05\n",
            "\" AAA01\",  2.0e+05\n",
        );
        let steps = CsvReader::new().parse(&to_lines(text)).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].time, 0.0);
        assert_eq!(steps[0].labels.len(), 2);
    }

    #[test]
    fn connection_tables_join_label_pairs() {
        let text = concat!(
            "\" ELEM1\",\" ELEM2\",\"  FLOH\"\n",
            "\" AAA00\",\" AAA01\",  5.0e-02\n",
        );
        let steps = CsvReader::new().parse(&to_lines(text)).unwrap();
        assert_eq!(steps[0].kind, OutputKind::Connection);
        assert_eq!(steps[0].labels, vec!["AAA00AAA01"]);
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let text = concat!(
            "\"  ELEM\",\"  PRES\"\n",
            "\" AAA00\",  1.0e+05\n",
            "\" AAA00\",  2.0e+05\n",
        );
        let err = CsvReader::new().parse(&to_lines(text)).unwrap_err();
        assert!(err.to_string().contains("Duplicate label 'AAA00'"));
    }

    #[test]
    fn field_count_mismatch_is_rejected() {
        let text = concat!(
            "\"  ELEM\",\"  PRES\",\"  TEMP\"\n",
            "\" AAA00\",  1.0e+05\n",
        );
        assert!(CsvReader::new().parse(&to_lines(text)).is_err());
    }
}
