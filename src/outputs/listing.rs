//! Reader for the fixed-column tables of the main output listing
//!
//! The main output file interleaves element and connection tables with
//! iteration diagnostics, each time step introduced by a banner line. The
//! reader scans line by line, keeping only the table content:
//!
//! ```text
//!  OUTPUT DATA AFTER (    5,  6)-2-TIME STEPS      THE TIME IS 0.115741E-01 DAYS
//!
//!  TOTAL TIME    KCYC  ITER  ITERC  KON
//!  0.10000E+04      5     6     34    2
//!
//!  ELEM.  INDEX     PRES        TEMP
//!                   (PA)     (DEG-C)
//!  AAA00      1 0.10065E+06 0.25000E+02
//! ```
//!
//! Main output files grow large, so a progress bar tracks the scan unless
//! disabled (as the library entry points do).

// internal modules
use crate::outputs::parsers;
use crate::outputs::{Output, OutputKind};

// standard library
use std::collections::{HashMap, HashSet};

// external crates
use anyhow::{anyhow, bail, Result};
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, trace};

/// A reader for the main output listing tables
#[derive(Debug)]
pub struct ListingReader {
    /// Completed time-step entries
    out: Vec<Output>,
    /// Time of the step currently being scanned
    time: f64,
    /// Table currently being accumulated, if any
    table: Option<Table>,
    /// Waiting for the value row under a TOTAL TIME header
    expect_total_time: bool,
    /// Disable progress bar?
    disable_progress: bool,
}

impl Default for ListingReader {
    fn default() -> Self {
        Self {
            out: Vec::new(),
            time: 0.0,
            table: None,
            expect_total_time: false,
            disable_progress: true,
        }
    }
}

impl ListingReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Print a progress bar while scanning
    pub fn enable_progress(&mut self) {
        self.disable_progress = false;
    }

    /// Parse the full line sequence into time-step entries
    pub fn parse(&mut self, lines: &[String]) -> Result<Vec<Output>> {
        let mut progress_bar = self.init_progress_bar(lines.len());

        for line in lines {
            if !self.disable_progress {
                progress_bar.update(1).unwrap();
            }

            if parsers::is_step_banner(line) {
                trace!("[Banner] {line}");
                self.flush_table()?;
                // the banner time is only in days; the seconds value on the
                // TOTAL TIME row below overrides it
                if let Ok((_, days)) = parsers::banner_time(line) {
                    self.time = days * 86400.0;
                }
                continue;
            }

            if parsers::is_total_time_header(line) {
                trace!("[Total time] {line}");
                self.flush_table()?;
                self.expect_total_time = true;
                continue;
            }

            if self.expect_total_time {
                if let Ok((_, values)) = parsers::double_list(line) {
                    self.time = values[0];
                    self.expect_total_time = false;
                }
                continue;
            }

            if parsers::is_table_header(line) {
                trace!("[Table header] {line}");
                self.flush_table()?;
                self.table = Some(Table::from_header(line));
                continue;
            }

            if line.trim().is_empty() {
                self.flush_table()?;
                continue;
            }

            if let Some(table) = &mut self.table {
                if parsers::is_units_row(line) {
                    trace!("[Units] {line}");
                    continue;
                }
                table.push_row(line)?;
            }
        }
        self.flush_table()?;

        if !self.disable_progress {
            eprintln!()
        };

        if self.out.is_empty() {
            bail!("No result tables found in listing");
        }

        debug!("Read {} listing tables", self.out.len());
        Ok(std::mem::take(&mut self.out))
    }

    /// Close the accumulating table into a finished time-step entry
    fn flush_table(&mut self) -> Result<()> {
        if let Some(table) = self.table.take() {
            if !table.labels.is_empty() {
                self.out.push(table.finish(self.time));
            }
        }
        Ok(())
    }

    /// Initialise the progress bar, if wanted
    fn init_progress_bar(&self, total: usize) -> Bar {
        BarBuilder::default()
            .total(total)
            .unit(" lines")
            .unit_scale(true)
            .disable(self.disable_progress)
            .build()
            .unwrap()
    }
}

/// Accumulator for one element or connection table
#[derive(Debug)]
struct Table {
    kind: OutputKind,
    variables: Vec<String>,
    labels: Vec<String>,
    seen: HashSet<String>,
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// Start a table from its header row
    ///
    /// Connection tables lead with two label columns; the INDEX column is
    /// bookkeeping and never kept.
    fn from_header(line: &str) -> Self {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let kind = if tokens.get(1) == Some(&"ELEM2") {
            OutputKind::Connection
        } else {
            OutputKind::Element
        };

        let variables = tokens
            .iter()
            .skip(if kind == OutputKind::Connection { 2 } else { 1 })
            .skip_while(|token| **token == "INDEX")
            .map(|token| token.to_string())
            .collect();

        Self {
            kind,
            variables,
            labels: Vec::new(),
            seen: HashSet::new(),
            rows: Vec::new(),
        }
    }

    /// Append one data row, checking labels and the column count
    fn push_row(&mut self, line: &str) -> Result<()> {
        let n_labels = match self.kind {
            OutputKind::Element => 1,
            OutputKind::Connection => 2,
        };

        let mut tokens = line.split_whitespace();
        let label: String = tokens.by_ref().take(n_labels).collect();
        if label.is_empty() {
            return Ok(());
        }

        // the INDEX column precedes the values
        let values: Vec<f64> = tokens
            .skip(1)
            .map(|token| {
                parsers::fortran_double(token)
                    .map(|(_, v)| v)
                    .map_err(|_| anyhow!("Could not parse '{token}' in row:\n \"{line}\""))
            })
            .collect::<Result<_>>()?;

        if values.len() != self.variables.len() {
            bail!(
                "Row has {} values where the table header declares {}:\n \"{line}\"",
                values.len(),
                self.variables.len()
            );
        }
        if !self.seen.insert(label.clone()) {
            bail!("Duplicate label '{label}' within one time step");
        }

        self.labels.push(label);
        self.rows.push(values);
        Ok(())
    }

    /// Transpose the accumulated rows into per-variable columns
    fn finish(self, time: f64) -> Output {
        let mut data: HashMap<String, Vec<f64>> = self
            .variables
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(self.labels.len())))
            .collect();
        for row in &self.rows {
            for (variable, value) in self.variables.iter().zip(row) {
                data.get_mut(variable).unwrap().push(*value);
            }
        }

        Output {
            kind: self.kind,
            time,
            labels: self.labels,
            variables: self.variables,
            data,
        }
    }
}
