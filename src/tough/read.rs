//! Reader for the fixed-width input deck
//!
//! Rebuilds the nested parameter dictionary from a deck or MESH/INCON
//! file. Blocks are recognised by the keyword in the first five columns
//! and may appear in any order; absent blocks simply leave their keys
//! unset, and unrecognised content is skipped with a debug trace. Records
//! are sliced positionally with the same field layouts the writer uses.

// standard library
use std::io::BufRead;

// internal modules
use crate::record::{prune_trailing, read_record, RecordValue};
use crate::utils::*;

// external crates
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, trace};
use serde_json::{json, Map, Value};

/// Block keywords understood by the reader
const KEYWORDS: &[&str] = &[
    "ROCKS", "FLAC", "START", "PARAM", "MOMOP", "SELEC", "SOLVR", "TIMES", "GENER", "OUTPU",
    "ELEME", "CONNE", "INCON", "NOVER", "ENDCY", "ENDFI",
];

/// Read a parameter dictionary from any `BufRead` source
///
/// Convenience wrapper over [InputReader]; see
/// [read_input_file](crate::tough::read_input_file) for the path-level
/// entry point.
pub fn read_input<R: BufRead>(reader: R) -> Result<Value> {
    InputReader::new().parse(reader)
}

impl InputReader {
    /// Parse the whole deck into a parameter dictionary
    pub fn parse<R: BufRead>(&mut self, reader: R) -> Result<Value> {
        let lines: Vec<String> = reader
            .lines()
            .collect::<std::io::Result<_>>()
            .context("Could not read input deck")?;

        let mut current: Option<(&str, Vec<&str>)> = None;

        for line in &lines {
            let keyword = Self::block_keyword(line);

            match keyword {
                Some("ENDCY") | Some("ENDFI") => {
                    if let Some((keyword, chunk)) = current.take() {
                        self.read_block(keyword, &chunk)?;
                    }
                    break;
                }
                Some(keyword) => {
                    if let Some((previous, chunk)) = current.take() {
                        self.read_block(previous, &chunk)?;
                    }
                    self.blocks_found += 1;
                    current = Some((keyword, Vec::new()));
                }
                None => match &mut current {
                    Some((_, chunk)) => chunk.push(line),
                    // anything before the first keyword is the title
                    None => {
                        let title = line.trim();
                        if !title.is_empty() && !self.parameters.contains_key("title") {
                            self.parameters.insert("title".into(), json!(title));
                        }
                    }
                },
            }
        }

        if let Some((keyword, chunk)) = current.take() {
            self.read_block(keyword, &chunk)?;
        }

        if self.blocks_found == 0 {
            bail!("No recognised keyword block found");
        }

        // give the dictionary to the caller rather than cloning it
        Ok(Value::Object(std::mem::take(&mut self.parameters)))
    }
}

/// A reader for the keyword-block input deck
///
/// The reader scans line by line, carving the file into keyword-framed
/// chunks, and hands each chunk to the parser for its block. Everything
/// before the first keyword is the deck title.
#[derive(Debug, Default)]
pub struct InputReader {
    parameters: Map<String, Value>,
    /// At least one recognised block is required of a valid deck
    blocks_found: usize,
}

impl InputReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// The block keyword in the first five columns, if there is one
    fn block_keyword(line: &str) -> Option<&'static str> {
        let head = line.get(..5).unwrap_or(line).trim();
        KEYWORDS.iter().find(|&&k| k == head).copied()
    }

    /// Dispatch one framed chunk to the parser for its block
    fn read_block(&mut self, keyword: &str, chunk: &[&str]) -> Result<()> {
        trace!("[{keyword}] {} lines", chunk.len());
        match keyword {
            "ROCKS" => self.read_rocks(chunk).context("In block ROCKS"),
            "FLAC" => self.read_flac(chunk).context("In block FLAC"),
            "START" => {
                self.parameters.insert("start".into(), json!(true));
                Ok(())
            }
            "PARAM" => self.read_param(chunk).context("In block PARAM"),
            "MOMOP" => self.read_momop(chunk),
            "SELEC" => self.read_selec(chunk).context("In block SELEC"),
            "SOLVR" => self.read_solvr(chunk).context("In block SOLVR"),
            "TIMES" => self.read_times(chunk).context("In block TIMES"),
            "GENER" => self.read_gener(chunk).context("In block GENER"),
            "OUTPU" => self.read_outpu(chunk).context("In block OUTPU"),
            "ELEME" => self.read_eleme(chunk).context("In block ELEME"),
            "CONNE" => self.read_conne(chunk).context("In block CONNE"),
            "INCON" => self.read_incon(chunk).context("In block INCON"),
            "NOVER" => {
                self.parameters.insert("nover".into(), json!(true));
                Ok(())
            }
            _ => {
                debug!("Skipping unhandled block {keyword}");
                Ok(())
            }
        }
    }

    fn read_rocks(&mut self, chunk: &[&str]) -> Result<()> {
        let mut rocks = Map::new();
        let mut lines = chunk.iter();

        while let Some(line) = lines.next() {
            // a blank line ends the block, but an expected continuation
            // record below may itself be entirely blank
            if line.trim().is_empty() {
                break;
            }
            let values = read_record(line, "5s,5d,10e,10e,10e,10e,10e,10e,10e")?;
            let name = crate::record::require_str(&values, 0, "rock name")?.to_string();
            let nad = values[1].as_ref().and_then(RecordValue::as_i64).unwrap_or(0);

            let mut rock = Map::new();
            set_num(&mut rock, "density", &values, 2);
            set_num(&mut rock, "porosity", &values, 3);
            let k: Vec<Option<f64>> = (4..7)
                .map(|i| values[i].as_ref().and_then(RecordValue::as_f64))
                .collect();
            if k.iter().any(Option::is_some) {
                // isotropic permeability collapses back to a scalar
                if k[0].is_some() && k[0] == k[1] && k[1] == k[2] {
                    rock.insert("permeability".into(), json!(k[0]));
                } else {
                    rock.insert("permeability".into(), json!(k));
                }
            }
            set_num(&mut rock, "conductivity", &values, 7);
            set_num(&mut rock, "specific_heat", &values, 8);

            if nad >= 1 {
                let line = lines
                    .next()
                    .ok_or_else(|| anyhow!("Missing second record for rock '{name}'"))?;
                let values = read_record(line, "10e,10e,10e,10e,10e,10e,10e")?;
                for (i, key) in [
                    "compressibility",
                    "expansivity",
                    "conductivity_dry",
                    "tortuosity",
                    "klinkenberg_parameter",
                    "distribution_coefficient_3",
                    "distribution_coefficient_4",
                ]
                .iter()
                .enumerate()
                {
                    set_num(&mut rock, key, &values, i);
                }
            }
            if nad >= 2 {
                for key in ["relative_permeability", "capillarity"] {
                    let line = lines
                        .next()
                        .ok_or_else(|| anyhow!("Missing {key} record for rock '{name}'"))?;
                    let values =
                        read_record(line, "5d,5s,10e,10e,10e,10e,10e,10e,10e")?;
                    let parameters: Vec<f64> = values[2..]
                        .iter()
                        .filter_map(|v| v.as_ref().and_then(RecordValue::as_f64))
                        .collect();
                    let mut model = Map::new();
                    if let Some(id) = values[0].as_ref().and_then(RecordValue::as_i64) {
                        model.insert("id".into(), json!(id));
                    }
                    model.insert("parameters".into(), json!(parameters));
                    rock.insert(key.into(), Value::Object(model));
                }
            }

            rocks.insert(name, Value::Object(rock));
        }

        self.parameters.insert("rocks".into(), Value::Object(rocks));
        Ok(())
    }

    fn read_flac(&mut self, chunk: &[&str]) -> Result<()> {
        let line = first_record(chunk)?;
        let values = read_record(line, "5d,5d,5d")?;
        let mut flac = Map::new();
        if let Some(creep) = values[0].as_ref().and_then(RecordValue::as_i64) {
            flac.insert("creep".into(), json!(creep != 0));
        }
        if let Some(model) = values[1].as_ref().and_then(RecordValue::as_i64) {
            flac.insert("porosity_model".into(), json!(model));
        }
        if let Some(version) = values[2].as_ref().and_then(RecordValue::as_i64) {
            flac.insert("version".into(), json!(version));
        }
        self.parameters.insert("flac".into(), Value::Object(flac));
        Ok(())
    }

    fn read_param(&mut self, chunk: &[&str]) -> Result<()> {
        let mut lines = chunk.iter().filter(|line| !line.trim().is_empty());
        let mut options = Map::new();
        let mut extra = Map::new();

        if let Some(line) = lines.next() {
            let values = read_record(line, "2d,2d,4d,4d,4d,24S,10s,10e,10e")?;
            set_int(&mut options, "n_iteration", &values, 0);
            set_int(&mut options, "verbosity", &values, 1);
            set_int(&mut options, "n_cycle", &values, 2);
            set_int(&mut options, "n_second", &values, 3);
            set_int(&mut options, "n_cycle_print", &values, 4);

            if let Some(mop) = values[5].as_ref().and_then(RecordValue::as_str) {
                for (i, c) in mop.chars().enumerate() {
                    if let Some(digit) = c.to_digit(10) {
                        extra.insert((i + 1).to_string(), json!(digit));
                    }
                }
            }
            set_num(&mut options, "temperature_dependence_gas", &values, 7);
            set_num(&mut options, "effective_strength_vapor", &values, 8);
        }

        if let Some(line) = lines.next() {
            let values = read_record(line, "10e,10e,10e,10e,5s,5s,10e,10e,10e")?;
            set_num(&mut options, "t_ini", &values, 0);
            set_num(&mut options, "t_max", &values, 1);
            set_num(&mut options, "t_step_max", &values, 3);
            set_num(&mut options, "gravity", &values, 6);
            set_num(&mut options, "t_reduce_factor", &values, 7);
            set_num(&mut options, "mesh_scale_factor", &values, 8);

            // a negative step count announces a table of time step sizes
            match values[2].as_ref().and_then(RecordValue::as_f64) {
                Some(delten) if delten < 0.0 => {
                    let count = (-delten) as usize;
                    let mut steps = Vec::with_capacity(count);
                    while steps.len() < count {
                        let line = lines
                            .next()
                            .ok_or_else(|| anyhow!("Missing time step table records"))?;
                        let values = read_record(
                            line,
                            "10e,10e,10e,10e,10e,10e,10e,10e",
                        )?;
                        steps.extend(
                            values
                                .iter()
                                .filter_map(|v| v.as_ref().and_then(RecordValue::as_f64)),
                        );
                    }
                    steps.truncate(count);
                    options.insert("t_steps".into(), json!(steps));
                }
                Some(delten) => {
                    options.insert("t_steps".into(), json!(delten));
                }
                None => {}
            }
        }

        if let Some(line) = lines.next() {
            let values = read_record(line, "10e,10e,10e,10e,10e,10e")?;
            set_num(&mut options, "eps1", &values, 0);
            set_num(&mut options, "eps2", &values, 1);
            set_num(&mut options, "w_upstream", &values, 3);
            set_num(&mut options, "w_newton", &values, 4);
            set_num(&mut options, "derivative_factor", &values, 5);
        }

        if let Some(line) = lines.next() {
            let values = read_record(line, "20e,20e,20e,20e")?;
            let values = prune_trailing(values);
            if !values.is_empty() {
                let defaults: Vec<Value> = values
                    .iter()
                    .map(|v| match v.as_ref().and_then(RecordValue::as_f64) {
                        Some(v) => json!(v),
                        None => Value::Null,
                    })
                    .collect();
                self.parameters.insert(
                    "default".into(),
                    json!({ "initial_condition": defaults }),
                );
            }
        }

        if !options.is_empty() {
            self.parameters.insert("options".into(), Value::Object(options));
        }
        if !extra.is_empty() {
            self.parameters
                .insert("extra_options".into(), Value::Object(extra));
        }
        Ok(())
    }

    fn read_momop(&mut self, chunk: &[&str]) -> Result<()> {
        let line = first_record(chunk)?;
        let mut more = Map::new();
        for (i, c) in line.chars().take(40).enumerate() {
            if let Some(digit) = c.to_digit(10) {
                more.insert((i + 1).to_string(), json!(digit));
            }
        }
        self.parameters
            .insert("more_options".into(), Value::Object(more));
        Ok(())
    }

    fn read_selec(&mut self, chunk: &[&str]) -> Result<()> {
        let mut lines = chunk.iter().filter(|line| !line.trim().is_empty());
        let mut selections = Map::new();

        if let Some(line) = lines.next() {
            let spec = vec!["5d"; 16].join(",");
            let values = read_record(line, &spec)?;
            let mut integers = Map::new();
            for (i, value) in values.iter().enumerate() {
                if let Some(v) = value.as_ref().and_then(RecordValue::as_i64) {
                    integers.insert((i + 1).to_string(), json!(v));
                }
            }
            selections.insert("integers".into(), Value::Object(integers));
        }

        let mut floats = Vec::new();
        for line in lines {
            let values = read_record(line, "10e,10e,10e,10e,10e,10e,10e,10e")?;
            floats.extend(
                values
                    .iter()
                    .filter_map(|v| v.as_ref().and_then(RecordValue::as_f64)),
            );
        }
        if !floats.is_empty() {
            selections.insert("floats".into(), json!(floats));
        }

        self.parameters
            .insert("selections".into(), Value::Object(selections));
        Ok(())
    }

    fn read_solvr(&mut self, chunk: &[&str]) -> Result<()> {
        let line = first_record(chunk)?;
        let values = read_record(line, "1d,2s,2s,3s,2s,10e,10e")?;
        let mut solver = Map::new();
        set_int(&mut solver, "method", &values, 0);
        if let Some(z) = values[2].as_ref().and_then(RecordValue::as_str) {
            solver.insert("z_precond".into(), json!(z));
        }
        if let Some(o) = values[4].as_ref().and_then(RecordValue::as_str) {
            solver.insert("o_precond".into(), json!(o));
        }
        set_num(&mut solver, "rel_iter_max", &values, 5);
        set_num(&mut solver, "eps", &values, 6);
        self.parameters.insert("solver".into(), Value::Object(solver));
        Ok(())
    }

    fn read_times(&mut self, chunk: &[&str]) -> Result<()> {
        let mut lines = chunk.iter().filter(|line| !line.trim().is_empty());
        let count = match lines.next() {
            Some(line) => read_record(line, "5d")?[0]
                .as_ref()
                .and_then(RecordValue::as_i64)
                .unwrap_or(0) as usize,
            None => 0,
        };

        let mut times = Vec::with_capacity(count);
        for line in lines {
            let values = read_record(line, "10e,10e,10e,10e,10e,10e,10e,10e")?;
            times.extend(
                values
                    .iter()
                    .filter_map(|v| v.as_ref().and_then(RecordValue::as_f64)),
            );
        }
        if count > 0 {
            times.truncate(count);
        }
        self.parameters.insert("times".into(), json!(times));
        Ok(())
    }

    fn read_gener(&mut self, chunk: &[&str]) -> Result<()> {
        let mut generators = Map::new();
        let mut lines = chunk.iter().take_while(|line| !line.trim().is_empty());

        while let Some(line) = lines.next() {
            let values = read_record(line, "5s,5s,5d,5d,5d,5d,5s,4s,1s,10e,10e,10e")?;
            let element = crate::record::require_str(&values, 0, "generator element")?.to_string();

            let mut generator = Map::new();
            if let Some(name) = values[1].as_ref().and_then(RecordValue::as_str) {
                generator.insert("name".into(), json!(name));
            }
            if let Some(kind) = values[7].as_ref().and_then(RecordValue::as_str) {
                generator.insert("type".into(), json!(kind));
            }
            set_num(&mut generator, "specific_enthalpy", &values, 10);
            set_num(&mut generator, "layer_thickness", &values, 11);

            let table_length = values[5]
                .as_ref()
                .and_then(RecordValue::as_i64)
                .unwrap_or(0) as usize;
            if table_length > 1 {
                for key in ["times", "rates"] {
                    let mut table = Vec::with_capacity(table_length);
                    while table.len() < table_length {
                        let line = lines.next().ok_or_else(|| {
                            anyhow!("Missing {key} table for generator '{element}'")
                        })?;
                        let values = read_record(line, "14e,14e,14e,14e")?;
                        table.extend(
                            values
                                .iter()
                                .filter_map(|v| v.as_ref().and_then(RecordValue::as_f64)),
                        );
                    }
                    table.truncate(table_length);
                    generator.insert(key.into(), json!(table));
                }
            } else {
                set_num(&mut generator, "rates", &values, 9);
            }

            generators.insert(element, Value::Object(generator));
        }

        self.parameters
            .insert("generators".into(), Value::Object(generators));
        Ok(())
    }

    fn read_outpu(&mut self, chunk: &[&str]) -> Result<()> {
        let mut lines = chunk
            .iter()
            .filter(|line| !line.trim().is_empty())
            .peekable();
        let mut output = Map::new();

        // an optional format line precedes the variable count
        if let Some(line) = lines.peek() {
            if line.trim().parse::<i64>().is_err() {
                output.insert("format".into(), json!(line.trim().to_lowercase()));
                lines.next();
            }
        }
        lines.next(); // variable count, redundant with the records

        let mut variables = Map::new();
        for line in lines {
            let values = read_record(line, "20s,5d,5d")?;
            let name = crate::record::require_str(&values, 0, "output variable")?
                .to_lowercase();
            let options: Vec<i64> = values[1..]
                .iter()
                .filter_map(|v| v.as_ref().and_then(RecordValue::as_i64))
                .collect();
            let value = match options.len() {
                0 => Value::Null,
                1 => json!(options[0]),
                _ => json!(options),
            };
            variables.insert(name, value);
        }
        output.insert("variables".into(), Value::Object(variables));

        self.parameters.insert("output".into(), Value::Object(output));
        Ok(())
    }

    fn read_eleme(&mut self, chunk: &[&str]) -> Result<()> {
        let mut elements = Map::new();

        for line in chunk.iter().take_while(|line| !line.trim().is_empty()) {
            let values = read_record(line, "5s,5d,5d,5s,10e,10e,10e,10e,10e,10e")?;
            let label = crate::record::require_str(&values, 0, "element label")?.to_string();

            let mut element = Map::new();
            match values[3].as_ref() {
                Some(RecordValue::Str(material)) => {
                    // a bare number in the material column is a rock index
                    match material.parse::<i64>() {
                        Ok(index) => element.insert("material".into(), json!(index)),
                        Err(_) => element.insert("material".into(), json!(material)),
                    };
                }
                _ => {}
            }
            set_num(&mut element, "volume", &values, 4);
            set_num(&mut element, "heat_exchange_area", &values, 5);
            set_num(&mut element, "permeability_modifier", &values, 6);

            let center: Vec<Option<f64>> = (7..10)
                .map(|i| values[i].as_ref().and_then(RecordValue::as_f64))
                .collect();
            if center.iter().any(Option::is_some) {
                element.insert("center".into(), json!(center));
            }

            elements.insert(label, Value::Object(element));
        }

        self.parameters
            .insert("elements".into(), Value::Object(elements));
        Ok(())
    }

    fn read_conne(&mut self, chunk: &[&str]) -> Result<()> {
        let mut connections = Map::new();

        for line in chunk.iter().take_while(|line| !line.trim().is_empty()) {
            let values = read_record(line, "10s,5d,5d,5d,5d,10e,10e,10e,10e,10e")?;
            let pair = crate::record::require_str(&values, 0, "connection labels")?.to_string();

            let mut connection = Map::new();
            set_int(&mut connection, "permeability_direction", &values, 4);

            let distances: Vec<Option<f64>> = (5..7)
                .map(|i| values[i].as_ref().and_then(RecordValue::as_f64))
                .collect();
            if distances.iter().any(Option::is_some) {
                connection.insert("nodal_distances".into(), json!(distances));
            }
            set_num(&mut connection, "interface_area", &values, 7);
            set_num(&mut connection, "gravity_cosine_angle", &values, 8);
            set_num(&mut connection, "radiant_emittance_factor", &values, 9);

            connections.insert(pair, Value::Object(connection));
        }

        self.parameters
            .insert("connections".into(), Value::Object(connections));
        Ok(())
    }

    fn read_incon(&mut self, chunk: &[&str]) -> Result<()> {
        let mut incon = Map::new();
        let mut lines = chunk.iter();

        while let Some(line) = lines.next() {
            // the second record of an entry may be entirely blank, so only
            // a blank line in the first-record position ends the block
            if line.trim().is_empty() {
                break;
            }
            let values = read_record(line, "5s,5d,5d,15e")?;
            let label = crate::record::require_str(&values, 0, "initial condition label")?
                .to_string();

            let mut entry = Map::new();
            set_num(&mut entry, "porosity", &values, 3);

            if let Some(line) = lines.next() {
                let values = prune_trailing(read_record(line, "20e,20e,20e,20e")?);
                if !values.is_empty() {
                    let primary: Vec<Value> = values
                        .iter()
                        .map(|v| match v.as_ref().and_then(RecordValue::as_f64) {
                            Some(v) => json!(v),
                            None => Value::Null,
                        })
                        .collect();
                    entry.insert("values".into(), Value::Array(primary));
                }
            }

            incon.insert(label, Value::Object(entry));
        }

        self.parameters
            .insert("initial_conditions".into(), Value::Object(incon));
        Ok(())
    }
}

/// First non-blank line of a chunk, or a validation error
fn first_record<'a>(chunk: &[&'a str]) -> Result<&'a str> {
    chunk
        .iter()
        .find(|line| !line.trim().is_empty())
        .copied()
        .ok_or_else(|| anyhow!("Block has no records"))
}

/// Insert a parsed float into a dictionary when the slot is populated
fn set_num(map: &mut Map<String, Value>, key: &str, values: &[Option<RecordValue>], index: usize) {
    if let Some(v) = values.get(index).and_then(|v| v.as_ref()).and_then(RecordValue::as_f64) {
        map.insert(key.into(), json!(v));
    }
}

/// Insert a parsed integer into a dictionary when the slot is populated
fn set_int(map: &mut Map<String, Value>, key: &str, values: &[Option<RecordValue>], index: usize) {
    if let Some(v) = values.get(index).and_then(|v| v.as_ref()).and_then(RecordValue::as_i64) {
        map.insert(key.into(), json!(v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HEADER;
    use std::io::Cursor;

    /// Column-exact record line from abutting fixed-width fields
    fn record(fields: &[&str]) -> String {
        fields.concat()
    }

    #[test]
    fn blocks_parse_in_any_order() {
        // connections deliberately come before the elements they reference
        let deck = [
            "Sample deck".to_string(),
            f!("CONNE{HEADER}"),
            record(&[
                "AAA00AAA01",
                "               ",
                "    1",
                "5.0000e-01",
                "5.0000e-01",
                "1.0000e+00",
                "0.0000e+00",
            ]),
            String::new(),
            f!("ELEME{HEADER}"),
            record(&[
                "AAA00",
                "          ",
                "dfalt",
                "1.0000e+00",
                "          ",
                "          ",
                " 5.000e-01",
                " 5.000e-01",
                " 5.000e-01",
            ]),
            record(&[
                "AAA01",
                "          ",
                "SAND1",
                "1.0000e+00",
                "          ",
                "          ",
                " 1.500e+00",
                " 5.000e-01",
                " 5.000e-01",
            ]),
            String::new(),
            "ENDCY".to_string(),
        ]
        .join("\n");
        let parameters = read_input(Cursor::new(deck)).unwrap();

        assert_eq!(parameters["title"], "Sample deck");
        let elements = parameters["elements"].as_object().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements["AAA01"]["material"], "SAND1");
        assert_eq!(elements["AAA00"]["volume"], 1.0);
        assert_eq!(elements["AAA01"]["center"][0], 1.5);

        let connections = parameters["connections"].as_object().unwrap();
        assert_eq!(connections["AAA00AAA01"]["permeability_direction"], 1);
        assert_eq!(connections["AAA00AAA01"]["interface_area"], 1.0);
    }

    #[test]
    fn absent_blocks_leave_keys_unset() {
        let deck = [
            f!("ELEME{HEADER}"),
            record(&["AAA00", "          ", "dfalt", "1.0000e+00"]),
            String::new(),
            "ENDCY".to_string(),
        ]
        .join("\n");
        let parameters = read_input(Cursor::new(deck)).unwrap();
        assert!(parameters.get("connections").is_none());
        assert!(parameters.get("rocks").is_none());
    }

    #[test]
    fn unrecognised_file_is_rejected() {
        let garbage = "just some text\nthat is not a deck\n";
        assert!(read_input(Cursor::new(garbage)).is_err());
    }

    #[test]
    fn rocks_with_models_are_rebuilt() {
        let deck = [
            f!("ROCKS{HEADER}"),
            record(&[
                "SAND1",
                "    2",
                "2.6000e+03",
                "1.0000e-01",
                "1.0000e-13",
                "1.0000e-13",
                "1.0000e-13",
                "2.5000e+00",
                "8.0000e+02",
            ]),
            record(&["1.0000e-09"]),
            record(&["    3", "     ", " 3.000e-01", " 5.000e-02"]),
            record(&["    7", "     ", " 1.000e+04", " 3.000e-01", " 1.000e+00"]),
            String::new(),
            "ENDCY".to_string(),
        ]
        .join("\n");
        let parameters = read_input(Cursor::new(deck)).unwrap();
        let rock = &parameters["rocks"]["SAND1"];

        assert_eq!(rock["density"], 2600.0);
        assert_eq!(rock["permeability"], 1.0e-13);
        assert_eq!(rock["compressibility"], 1.0e-9);
        assert_eq!(rock["relative_permeability"]["id"], 3);
        assert_eq!(rock["capillarity"]["id"], 7);
        let cp = rock["capillarity"]["parameters"].as_array().unwrap();
        assert_eq!(cp.len(), 3);
        assert_eq!(cp[0], 1.0e4);
    }

    #[test]
    fn incon_records_keep_gaps() {
        let deck = [
            f!("INCON{HEADER}"),
            record(&["AAA00", "          ", "1.000000000e-01"]),
            record(&[
                " 1.0000000000000e+05",
                "                    ",
                " 0.0000000000000e+00",
            ]),
            String::new(),
            "ENDCY".to_string(),
        ]
        .join("\n");
        let parameters = read_input(Cursor::new(deck)).unwrap();
        let entry = &parameters["initial_conditions"]["AAA00"];
        assert_eq!(entry["porosity"], 0.1);

        let values = entry["values"].as_array().unwrap();
        assert_eq!(values.len(), 3);
        assert!(values[1].is_null());
        assert_eq!(values[0], 1.0e5);
    }

    #[test]
    fn param_block_time_step_table() {
        let deck = [
            f!("PARAM{HEADER}"),
            record(&[" 8", " 1", " 100", "    ", "  10", "                        "]),
            record(&["0.0000e+00", "8.6400e+04", "-3.000e+00", "3.6000e+03"]),
            // record 2 announced three tabulated steps, so their table follows
            record(&["1.0000e+02", "1.0000e+03", "1.0000e+04"]),
            record(&["1.0000e-05", "1.0000e+00"]),
            record(&[" 1.0000000000000e+05", " 1.0000000000000e+01"]),
            "ENDCY".to_string(),
        ]
        .join("\n");

        let parameters = read_input(Cursor::new(deck)).unwrap();
        let options = parameters["options"].as_object().unwrap();
        assert_eq!(options["n_iteration"], 8);
        assert_eq!(options["n_cycle"], 100);
        assert_eq!(options["t_max"], 86400.0);
        assert_eq!(options["t_steps"].as_array().unwrap().len(), 3);
        assert_eq!(options["eps1"], 1.0e-5);
    }
}
