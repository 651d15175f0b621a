//! Command line tool to reformat simulator results as element tables
//!
//! Extracts results from a main output file (any recognised layout) and
//! reformats them as a per-element CSV table, with the element coordinates
//! pulled from the matching MESH file.
//!
//! # Usage
//!
//! ```text
//! Usage: toughextract <outfile> <mesh> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples,
//! default values, and any important behaviour.
//!
//! ## Options
//!
//! By default all time steps are written to a single file.
//!
//! ### > How to write one file per time step
//!
//! Use the `--split` flag to write each time step to its own numbered
//! file as `<output>_<step>.csv`.
//!
//! ```bash
//! # One csv file per time step
//! toughextract OUTPUT MESH --split
//! ```
//!
//! ### > How to change the file name
//!
//! Output defaults to `OUTPUT_ELEME.csv`, but this may be changed.
//!
//! ```bash
//! # Change the output file name
//! toughextract OUTPUT MESH --output results.csv
//! ```

// standard libraries
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// crate modules
use toughprep::outputs::Output;
use toughprep::utils::{f, NumberFmt};

// external crates
use anyhow::{anyhow, bail, Result};
use clap::Parser;
use log::*;
use serde_json::Value;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    info!("Extracting \"{}\"", cli.outfile);

    debug!("Reading element centers from \"{}\"", cli.mesh);
    let centers = read_centers(&cli.mesh)?;

    debug!("Reading result tables");
    let steps = toughprep::read_output(&cli.outfile)?;
    check_labels(&steps, &centers)?;

    debug!("Writing element tables");
    write_tables(&cli, &steps, &centers)
}

/// Reformat simulator results as a per-element csv table
///
/// The main output file may be in any recognised layout. Element
/// coordinates are taken from the MESH file, which must contain the
/// same element labels as the results.
///
/// Use --split to write each time step to its own numbered file, and
/// --output to change the output file name.
///
/// Examples
/// --------
///
///  Typical use
///     $ toughextract OUTPUT MESH
///
///  One file per time step
///     $ toughextract OUTPUT MESH --split
///
///  Change the output file name
///     $ toughextract OUTPUT MESH --output results.csv
///
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help("Typical use: toughextract OUTPUT MESH\n\nNOTE: --help shows more detail and examples"),
    term_width(70),
    hide_possible_values(true),
    override_usage("toughextract <outfile> <mesh> [options]")
)]
struct Cli {
    // * Positional
    /// Path to the simulator output file
    #[arg(name = "outfile")]
    outfile: String,

    /// Path to the matching MESH file (can be the full deck)
    #[arg(name = "mesh")]
    mesh: String,

    /// Path for the csv output ('OUTPUT_ELEME.csv' default)
    #[arg(help_heading("Extract options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    #[arg(default_value = "OUTPUT_ELEME.csv")]
    output: String,

    /// Write one file per time step
    #[arg(help_heading("Extract options"))]
    #[arg(short, long)]
    split: bool,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG
    /// (-v) or TRACE (-vv). Errors and Warnings are always logged unless
    /// in quiet (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

/// Sets up logging at runtime to allow for multiple verbosity levels
#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    stderrlog::new()
        .modules(vec![module_path!(), "toughprep"])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}

/// Creates a banner for the command line
#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "Toughprep :: ToughExtract");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
/// Helper function for cleaning up file IO boilerplate
fn get_writer(path: &str) -> Result<BufWriter<File>> {
    let file: File = File::create(path)?;
    trace!("New bufwriter for {path}");
    Ok(BufWriter::new(file))
}

#[doc(hidden)]
/// Element centers keyed by label, from the MESH file
fn read_centers(path: &str) -> Result<Vec<(String, [f64; 3])>> {
    let parameters = toughprep::tough::read_input_file(path)?;
    let elements = parameters
        .get("elements")
        .and_then(Value::as_object)
        .ok_or_else(|| anyhow!("Invalid MESH file '{path}': no element block"))?;

    elements
        .iter()
        .map(|(label, element)| {
            let center = element
                .get("center")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("Element '{label}' carries no center coordinates"))?;
            let mut coordinates = [0.0; 3];
            for (slot, value) in coordinates.iter_mut().zip(center) {
                *slot = value.as_f64().unwrap_or(0.0);
            }
            Ok((label.clone(), coordinates))
        })
        .collect()
}

#[doc(hidden)]
/// The result and mesh label sets must agree exactly
fn check_labels(steps: &[Output], centers: &[(String, [f64; 3])]) -> Result<()> {
    let first = match steps.first() {
        Some(step) => step,
        None => bail!("No time steps found in output file"),
    };

    let from_mesh: BTreeSet<&str> = centers.iter().map(|(label, _)| label.as_str()).collect();
    let from_output: BTreeSet<&str> = first.labels.iter().map(String::as_str).collect();
    if from_mesh != from_output {
        bail!("Elements in the output and MESH files are not consistent");
    }
    Ok(())
}

#[doc(hidden)]
/// Write all tables to one file, or one file per step with --split
fn write_tables(cli: &Cli, steps: &[Output], centers: &[(String, [f64; 3])]) -> Result<()> {
    if !cli.split || steps.len() == 1 {
        let mut writer = get_writer(&cli.output)?;
        write_header(&mut writer, &steps[0])?;
        for step in steps {
            write_table(&mut writer, step, centers)?;
        }
    } else {
        let path = Path::new(&cli.output);
        let extension = path
            .extension()
            .map(|e| f!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let head = path.with_extension("");

        for (i, step) in steps.iter().enumerate() {
            let output = f!("{}_{}{extension}", head.display(), i + 1);
            info!("  - {output}");
            let mut writer = get_writer(&output)?;
            write_header(&mut writer, step)?;
            write_table(&mut writer, step, centers)?;
        }
    }
    Ok(())
}

#[doc(hidden)]
/// Quoted name and unit header rows
fn write_header<W: Write>(writer: &mut W, step: &Output) -> Result<()> {
    let mut headers = vec!["ELEM".to_string(), "X".into(), "Y".into(), "Z".into()];
    headers.extend(step.variables.iter().cloned());

    let mut units = vec!["".to_string()];
    units.extend(vec!["(M)".to_string(); 3]);
    units.extend(vec!["(-)".to_string(); step.variables.len()]);

    for row in [headers, units] {
        let row: Vec<String> = row.iter().map(|text| f!("\"{text:>18}\"")).collect();
        writer.write_all(row.join(",").as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[doc(hidden)]
/// One time marker and one row per element
fn write_table<W: Write>(
    writer: &mut W,
    step: &Output,
    centers: &[(String, [f64; 3])],
) -> Result<()> {
    writer.write_all(f!("\"TIME [sec]  {}\"\n", step.time.sci(0, 8)).as_bytes())?;

    let lookup: std::collections::HashMap<&str, &[f64; 3]> = centers
        .iter()
        .map(|(label, center)| (label.as_str(), center))
        .collect();

    for (i, label) in step.labels.iter().enumerate() {
        let center = lookup[label.as_str()];
        let mut record = vec![f!("\"{label:>18}\"")];
        record.extend(center.iter().map(|v| f!("  {}", v.sci(0, 12))));
        for variable in &step.variables {
            record.push(f!("  {}", step.data[variable][i].sci(0, 12)));
        }
        writer.write_all(record.join(",").as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
