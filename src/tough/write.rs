//! Block writers for the input deck
//!
//! Every block is assembled as a list of framed record lines and only
//! touches the writer once fully built, so a failed validation never
//! leaves a half-written file behind the caller's back. Field widths and
//! layouts follow the schema tables exactly; the simulator reads by
//! column and tolerates nothing else.

// standard library
use std::io::Write;

// internal modules
use crate::mesh::{DataArray, Mesh};
use crate::record::{frame_block, write_multi_record, write_record, Field};
use crate::schema;
use crate::tough::{label, LABEL_CAPACITY};
use crate::utils::*;

// external crates
use anyhow::{bail, Result};
use log::{debug, warn};
use serde_json::{json, Map, Value};

/// Initial condition values at or below this are treated as unset
pub const INCON_UNSET: f64 = -1.0e9;

/// Volume scaling applied to Dirichlet boundary cells
///
/// The simulator holds conditions fixed in cells whose volume dwarfs any
/// possible flux, which is how boundary conditions are imposed in this
/// format.
pub const BOUNDARY_VOLUME_FACTOR: f64 = 1.0e50;

/// Write a full input deck from a parameter dictionary
///
/// The dictionary is validated against the schema tables first: unknown
/// keys are dropped with a warning, known keys of the wrong shape abort
/// the write before any output is produced. Blocks are only emitted for
/// the keys actually present.
pub fn write_input<W: Write>(writer: &mut W, parameters: &Value) -> Result<()> {
    let root = match parameters.as_object() {
        Some(map) => map,
        None => bail!("Parameters must be a dictionary"),
    };
    validate(root)?;
    check_consistency(root);

    let mut lines: Vec<String> = Vec::new();

    if let Some(title) = root.get("title").and_then(Value::as_str) {
        lines.push(f!("{title}\n"));
    }

    if let Some(rocks) = root.get("rocks").and_then(Value::as_object) {
        let order = root.get("rocks_order").and_then(Value::as_array);
        lines.extend(rocks_block(rocks, order)?);
    }
    if let Some(flac) = root.get("flac").and_then(Value::as_object) {
        lines.extend(flac_block(flac)?);
    }
    if root.get("start").and_then(Value::as_bool).unwrap_or(false) {
        lines.extend(frame_block("START", false, false, || Ok(Vec::new()))?);
    }
    if root.contains_key("options") || root.contains_key("extra_options") {
        lines.extend(param_block(root)?);
    }
    if let Some(momop) = root.get("more_options").and_then(Value::as_object) {
        lines.extend(momop_block(momop)?);
    }
    if let Some(selections) = root.get("selections").and_then(Value::as_object) {
        lines.extend(selec_block(selections)?);
    }
    if let Some(solver) = root.get("solver").and_then(Value::as_object) {
        lines.extend(solvr_block(solver)?);
    }
    if let Some(times) = root.get("times") {
        lines.extend(times_block(times)?);
    }
    if let Some(generators) = root.get("generators").and_then(Value::as_object) {
        lines.extend(gener_block(generators)?);
    }
    if let Some(output) = root.get("output").and_then(Value::as_object) {
        lines.extend(outpu_block(output)?);
    }
    if let Some(elements) = root.get("elements").and_then(Value::as_object) {
        lines.extend(eleme_block(elements)?);
    }
    if let Some(connections) = root.get("connections").and_then(Value::as_object) {
        lines.extend(conne_block(connections)?);
    }
    if let Some(incon) = root.get("initial_conditions").and_then(Value::as_object) {
        lines.extend(incon_block(incon)?);
    }
    if root.get("nover").and_then(Value::as_bool).unwrap_or(false) {
        lines.extend(frame_block("NOVER", false, false, || Ok(Vec::new()))?);
    }
    lines.extend(frame_block("ENDCY", false, true, || Ok(Vec::new()))?);

    for line in &lines {
        writer.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Write a mesh as a MESH file, elements and connections only
pub fn write_mesh<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<()> {
    let parameters = mesh_parameters(mesh)?;
    let root = parameters.as_object().unwrap();

    let mut lines = eleme_block(root["elements"].as_object().unwrap())?;
    lines.extend(conne_block(root["connections"].as_object().unwrap())?);

    for line in &lines {
        writer.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Write the recognised initial-condition cell data as an INCON file
pub fn write_incon<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<()> {
    let incon = incon_parameters(mesh)?;
    for line in incon_block(incon.as_object().unwrap())? {
        writer.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Derive the `elements`/`connections` sub-dictionaries from a mesh
///
/// Element labels are generated from the cell index, so label order always
/// matches cell order. Cells flagged by a non-zero `boundary_condition`
/// are written with their volume scaled to hold Dirichlet conditions, and
/// a `permeability` cell data array becomes the per-element permeability
/// modifier.
pub fn mesh_parameters(mesh: &Mesh) -> Result<Value> {
    if mesh.n_cells() > LABEL_CAPACITY {
        bail!(
            "Mesh has {} cells, more than the label space can address",
            mesh.n_cells()
        );
    }

    let centers = mesh.centers();
    let volumes = mesh.volumes();
    let boundary = scalar_data(mesh, "boundary_condition");
    let permeability = scalar_data(mesh, "permeability");

    let mut elements = Map::new();
    for index in 0..mesh.n_cells() {
        let volume = match boundary {
            Some(flags) if flags[index] != 0.0 => volumes[index] * BOUNDARY_VOLUME_FACTOR,
            _ => volumes[index],
        };

        let mut element = Map::new();
        element.insert("material".into(), json!(mesh.materials[index]));
        element.insert("volume".into(), json!(volume));
        if let Some(pmx) = permeability {
            element.insert("permeability_modifier".into(), json!(pmx[index]));
        }
        element.insert("center".into(), json!(centers[index].to_vec()));
        elements.insert(label(index), Value::Object(element));
    }

    let mut connections = Map::new();
    for connection in mesh.connections()? {
        let (i, j) = connection.cells;
        let mut record = Map::new();
        record.insert(
            "permeability_direction".into(),
            json!(connection.direction),
        );
        record.insert(
            "nodal_distances".into(),
            json!([connection.distances.0, connection.distances.1]),
        );
        record.insert("interface_area".into(), json!(connection.area));
        record.insert(
            "gravity_cosine_angle".into(),
            json!(connection.gravity_cosine),
        );
        connections.insert(f!("{}{}", label(i), label(j)), Value::Object(record));
    }

    debug!(
        "Derived {} elements and {} connections",
        elements.len(),
        connections.len()
    );

    Ok(json!({ "elements": elements, "connections": connections }))
}

/// Derive the `initial_conditions` sub-dictionary from a mesh
///
/// Rows come from the `initial_condition` cell data, porosities from the
/// `porosity` cell data; entries at or below the unset threshold are
/// dropped so the writer leaves their columns blank.
pub fn incon_parameters(mesh: &Mesh) -> Result<Value> {
    let porosity = scalar_data(mesh, "porosity");
    let rows = match mesh.cell_data.get("initial_condition") {
        Some(DataArray::Rows(rows)) => Some(rows),
        Some(DataArray::Scalar(_)) => {
            bail!("Cell data 'initial_condition' must be a row array of primary variables")
        }
        None => None,
    };

    if rows.is_none() && porosity.is_none() {
        bail!("Mesh carries no 'initial_condition' or 'porosity' cell data to write");
    }

    let mut incon = Map::new();
    for index in 0..mesh.n_cells() {
        let mut entry = Map::new();
        if let Some(porosity) = porosity {
            entry.insert("porosity".into(), json!(porosity[index]));
        }
        if let Some(rows) = rows {
            let values: Vec<Value> = rows[index]
                .iter()
                .map(|&v| if v <= INCON_UNSET { Value::Null } else { json!(v) })
                .collect();
            entry.insert("values".into(), Value::Array(values));
        }
        incon.insert(label(index), Value::Object(entry));
    }

    Ok(Value::Object(incon))
}

/// Validate every sub-dictionary against its schema table
fn validate(root: &Map<String, Value>) -> Result<()> {
    schema::check_parameters(root, schema::PARAMETERS, "")?;

    if let Some(rocks) = root.get("rocks").and_then(Value::as_object) {
        schema::check_each(rocks, schema::ROCKS, "['rocks']")?;
        schema::check_each_nested(rocks, "relative_permeability", schema::MODEL, "['rocks']")?;
        schema::check_each_nested(rocks, "capillarity", schema::MODEL, "['rocks']")?;
    }
    if let Some(flac) = root.get("flac").and_then(Value::as_object) {
        schema::check_parameters(flac, schema::FLAC, "['flac']")?;
    }
    if let Some(options) = root.get("options").and_then(Value::as_object) {
        schema::check_parameters(options, schema::PARAM, "['options']")?;
    }
    if let Some(extra) = root.get("extra_options").and_then(Value::as_object) {
        schema::check_options(extra, 24, "['extra_options']")?;
    }
    if let Some(more) = root.get("more_options").and_then(Value::as_object) {
        schema::check_options(more, 40, "['more_options']")?;
    }
    if let Some(selections) = root.get("selections").and_then(Value::as_object) {
        schema::check_parameters(selections, schema::SELEC, "['selections']")?;
    }
    if let Some(solver) = root.get("solver").and_then(Value::as_object) {
        schema::check_parameters(solver, schema::SOLVR, "['solver']")?;
    }
    if let Some(generators) = root.get("generators").and_then(Value::as_object) {
        schema::check_each(generators, schema::GENER, "['generators']")?;
    }
    if let Some(output) = root.get("output").and_then(Value::as_object) {
        schema::check_parameters(output, schema::OUTPU, "['output']")?;
    }
    if let Some(elements) = root.get("elements").and_then(Value::as_object) {
        schema::check_each(elements, schema::ELEME, "['elements']")?;
    }
    if let Some(connections) = root.get("connections").and_then(Value::as_object) {
        schema::check_each(connections, schema::CONNE, "['connections']")?;
    }
    if let Some(incon) = root.get("initial_conditions").and_then(Value::as_object) {
        schema::check_each(incon, schema::INCON, "['initial_conditions']")?;
    }

    Ok(())
}

/// Warn about dangling label and material references
///
/// These stay warnings rather than errors so partially specified decks
/// can still be written and completed by hand.
fn check_consistency(root: &Map<String, Value>) {
    let elements = root.get("elements").and_then(Value::as_object);
    let rocks = root.get("rocks").and_then(Value::as_object);

    if let Some(connections) = root.get("connections").and_then(Value::as_object) {
        if let Some(elements) = elements {
            for key in connections.keys() {
                let (first, second) = key.split_at(key.len().min(5));
                for label in [first, second] {
                    if !label.is_empty() && !elements.contains_key(label) {
                        warn!("Connection '{key}' references unknown element '{label}'");
                    }
                }
            }
        }
    }

    if let (Some(elements), Some(rocks)) = (elements, rocks) {
        for (label, element) in elements {
            if let Some(material) = element.get("material").and_then(Value::as_str) {
                if !rocks.contains_key(material) {
                    warn!("Element '{label}' references undeclared rock type '{material}'");
                }
            }
        }
    }
}

fn rocks_block(rocks: &Map<String, Value>, order: Option<&Vec<Value>>) -> Result<Vec<String>> {
    // honour an explicit ordering when one is given
    let names: Vec<&String> = match order {
        Some(order) => order
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|name| rocks.keys().find(|k| k.as_str() == name))
            .collect(),
        None => rocks.keys().collect(),
    };

    frame_block("ROCKS", true, false, || {
        let mut out = Vec::new();
        for name in names {
            let rock = rocks[name].as_object().cloned().unwrap_or_default();

            let rp = rock.get("relative_permeability").and_then(Value::as_object);
            let cp = rock.get("capillarity").and_then(Value::as_object);
            let second_record = [
                "compressibility",
                "expansivity",
                "conductivity_dry",
                "tortuosity",
                "klinkenberg_parameter",
                "distribution_coefficient_3",
                "distribution_coefficient_4",
            ];
            let has_second = second_record.iter().any(|key| rock.contains_key(*key));

            let nad = if rp.is_some() || cp.is_some() {
                Some(2)
            } else if has_second {
                Some(1)
            } else {
                None
            };

            let permeability = scalar_or_triple(rock.get("permeability"));
            let mut fields = vec![
                Field::str(name.clone(), 5),
                Field::Int {
                    value: nad,
                    width: 5,
                },
                float_field(&rock, "density", 10, 4),
                float_field(&rock, "porosity", 10, 4),
            ];
            for k in permeability {
                fields.push(Field::Float {
                    value: k,
                    width: 10,
                    precision: 4,
                });
            }
            fields.push(float_field(&rock, "conductivity", 10, 4));
            fields.push(float_field(&rock, "specific_heat", 10, 4));
            out.push(write_record(&fields));

            if nad >= Some(1) {
                let fields: Vec<Field> = second_record
                    .iter()
                    .map(|key| float_field(&rock, key, 10, 4))
                    .collect();
                out.push(write_record(&fields));
            }
            if nad == Some(2) {
                out.push(model_record(rp));
                out.push(model_record(cp));
            }
        }
        Ok(out)
    })
}

/// RP/CP record: model id then up to seven parameters
fn model_record(model: Option<&Map<String, Value>>) -> String {
    let mut fields = vec![
        Field::Int {
            value: model.and_then(|m| m.get("id")).and_then(Value::as_i64),
            width: 5,
        },
        Field::blank(5),
    ];
    let parameters = model
        .and_then(|m| m.get("parameters"))
        .map(float_list)
        .unwrap_or_default();
    for value in parameters.iter().take(7) {
        fields.push(Field::Float {
            value: *value,
            width: 10,
            precision: 3,
        });
    }
    write_record(&fields)
}

fn flac_block(flac: &Map<String, Value>) -> Result<Vec<String>> {
    frame_block("FLAC", false, false, || {
        let creep = flac.get("creep").and_then(Value::as_bool).map(i64::from);
        Ok(vec![write_record(&[
            Field::Int {
                value: creep,
                width: 5,
            },
            Field::Int {
                value: flac.get("porosity_model").and_then(Value::as_i64),
                width: 5,
            },
            Field::Int {
                value: flac.get("version").and_then(Value::as_i64),
                width: 5,
            },
        ])])
    })
}

fn param_block(root: &Map<String, Value>) -> Result<Vec<String>> {
    let empty = Map::new();
    let options = root
        .get("options")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let extra = root
        .get("extra_options")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    // MOP switches live as single digits in fixed columns
    let mop: String = (1..=24)
        .map(|i| {
            extra
                .get(&i.to_string())
                .and_then(Value::as_i64)
                .map(|v| char::from_digit(v as u32 % 10, 10).unwrap())
                .unwrap_or(' ')
        })
        .collect();

    let t_steps = options.get("t_steps");
    let (delten, step_table): (Option<f64>, Vec<f64>) = match t_steps {
        Some(Value::Array(_)) => {
            let table = float_list(t_steps.unwrap())
                .into_iter()
                .flatten()
                .collect::<Vec<f64>>();
            (Some(-(table.len() as f64)), table)
        }
        Some(value) => (value.as_f64(), Vec::new()),
        None => (None, Vec::new()),
    };

    frame_block("PARAM", false, false, || {
        let mut out = Vec::new();

        out.push(write_record(&[
            int_field(options, "n_iteration", 2),
            int_field(options, "verbosity", 2),
            int_field(options, "n_cycle", 4),
            int_field(options, "n_second", 4),
            int_field(options, "n_cycle_print", 4),
            Field::str(mop.clone(), 24),
            Field::blank(10),
            float_field(options, "temperature_dependence_gas", 10, 4),
            float_field(options, "effective_strength_vapor", 10, 4),
        ]));

        out.push(write_record(&[
            float_field(options, "t_ini", 10, 4),
            float_field(options, "t_max", 10, 4),
            Field::Float {
                value: delten,
                width: 10,
                precision: 4,
            },
            float_field(options, "t_step_max", 10, 4),
            Field::blank(5),
            Field::blank(5),
            float_field(options, "gravity", 10, 4),
            float_field(options, "t_reduce_factor", 10, 4),
            float_field(options, "mesh_scale_factor", 10, 4),
        ]));

        if !step_table.is_empty() {
            let fields: Vec<Field> = step_table
                .iter()
                .map(|&v| Field::float(v, 10, 4))
                .collect();
            out.extend(write_multi_record(&fields, 8));
        }

        out.push(write_record(&[
            float_field(options, "eps1", 10, 4),
            float_field(options, "eps2", 10, 4),
            Field::blank(10),
            float_field(options, "w_upstream", 10, 4),
            float_field(options, "w_newton", 10, 4),
            float_field(options, "derivative_factor", 10, 4),
        ]));

        // record 4 carries the default primary variables
        let default = root
            .get("default")
            .and_then(Value::as_object)
            .and_then(|d| d.get("initial_condition"))
            .map(float_list)
            .unwrap_or_default();
        let fields: Vec<Field> = default
            .iter()
            .take(4)
            .map(|v| Field::Float {
                value: *v,
                width: 20,
                precision: 13,
            })
            .collect();
        out.push(write_record(&fields));

        Ok(out)
    })
}

fn momop_block(more: &Map<String, Value>) -> Result<Vec<String>> {
    let switches: String = (1..=40)
        .map(|i| {
            more.get(&i.to_string())
                .and_then(Value::as_i64)
                .map(|v| char::from_digit(v as u32 % 10, 10).unwrap())
                .unwrap_or(' ')
        })
        .collect();
    frame_block("MOMOP", false, false, || {
        Ok(vec![write_record(&[Field::str(switches.clone(), 40)])])
    })
}

fn selec_block(selections: &Map<String, Value>) -> Result<Vec<String>> {
    let empty = Map::new();
    let integers = selections
        .get("integers")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let floats = selections
        .get("floats")
        .map(float_list)
        .unwrap_or_default();

    frame_block("SELEC", false, false, || {
        let fields: Vec<Field> = (1..=16)
            .map(|i| Field::Int {
                value: integers.get(&i.to_string()).and_then(Value::as_i64),
                width: 5,
            })
            .collect();
        let mut out = vec![write_record(&fields)];

        let fields: Vec<Field> = floats
            .iter()
            .map(|v| Field::Float {
                value: *v,
                width: 10,
                precision: 4,
            })
            .collect();
        out.extend(write_multi_record(&fields, 8));
        Ok(out)
    })
}

fn solvr_block(solver: &Map<String, Value>) -> Result<Vec<String>> {
    frame_block("SOLVR", false, false, || {
        Ok(vec![write_record(&[
            int_field(solver, "method", 1),
            Field::blank(2),
            Field::str(
                solver
                    .get("z_precond")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                2,
            ),
            Field::blank(3),
            Field::str(
                solver
                    .get("o_precond")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                2,
            ),
            float_field(solver, "rel_iter_max", 10, 4),
            float_field(solver, "eps", 10, 4),
        ])])
    })
}

fn times_block(times: &Value) -> Result<Vec<String>> {
    let values: Vec<f64> = float_list(times).into_iter().flatten().collect();
    frame_block("TIMES", false, false, || {
        let mut out = vec![write_record(&[Field::int(values.len() as i64, 5)])];
        let fields: Vec<Field> = values.iter().map(|&v| Field::float(v, 10, 4)).collect();
        out.extend(write_multi_record(&fields, 8));
        Ok(out)
    })
}

fn gener_block(generators: &Map<String, Value>) -> Result<Vec<String>> {
    frame_block("GENER", true, false, || {
        let mut out = Vec::new();
        for (element, generator) in generators {
            let generator = generator.as_object().cloned().unwrap_or_default();

            let times: Vec<f64> = generator
                .get("times")
                .map(float_list)
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect();
            let rates: Vec<f64> = generator
                .get("rates")
                .map(float_list)
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect();
            let tabular = !times.is_empty();

            if tabular && times.len() != rates.len() {
                bail!(
                    "Generator '{element}' has {} times but {} rates",
                    times.len(),
                    rates.len()
                );
            }

            out.push(write_record(&[
                Field::str(element.clone(), 5),
                Field::str(
                    generator.get("name").and_then(Value::as_str).unwrap_or(""),
                    5,
                ),
                Field::blank(15),
                Field::Int {
                    value: tabular.then_some(times.len() as i64),
                    width: 5,
                },
                Field::blank(5),
                Field::str(
                    generator.get("type").and_then(Value::as_str).unwrap_or(""),
                    4,
                ),
                Field::str(if tabular { "F" } else { "" }, 1),
                Field::Float {
                    value: (!tabular)
                        .then(|| generator.get("rates").and_then(Value::as_f64))
                        .flatten(),
                    width: 10,
                    precision: 4,
                },
                Field::Float {
                    value: generator.get("specific_enthalpy").and_then(Value::as_f64),
                    width: 10,
                    precision: 4,
                },
                Field::Float {
                    value: generator.get("layer_thickness").and_then(Value::as_f64),
                    width: 10,
                    precision: 4,
                },
            ]));

            if tabular {
                for table in [&times, &rates] {
                    let fields: Vec<Field> =
                        table.iter().map(|&v| Field::float(v, 14, 7)).collect();
                    out.extend(write_multi_record(&fields, 4));
                }
            }
        }
        Ok(out)
    })
}

fn outpu_block(output: &Map<String, Value>) -> Result<Vec<String>> {
    let empty = Map::new();
    let variables = output
        .get("variables")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    frame_block("OUTPU", false, false, || {
        let mut out = Vec::new();
        if let Some(format) = output.get("format").and_then(Value::as_str) {
            out.push(write_record(&[Field::str(format.to_uppercase(), 20)]));
        }
        out.push(write_record(&[Field::int(variables.len() as i64, 5)]));
        for (name, options) in variables {
            let mut fields = vec![Field::str(name.to_uppercase(), 20)];
            // options may be a single index or a short list of them
            let options = match options {
                Value::Array(_) => float_list(options),
                value => value.as_f64().map(|v| vec![Some(v)]).unwrap_or_default(),
            };
            for option in options.iter().take(2) {
                fields.push(Field::Int {
                    value: option.map(|v| v as i64),
                    width: 5,
                });
            }
            out.push(write_record(&fields));
        }
        Ok(out)
    })
}

fn eleme_block(elements: &Map<String, Value>) -> Result<Vec<String>> {
    frame_block("ELEME", true, false, || {
        let mut out = Vec::new();
        for (label, element) in elements {
            let element = element.as_object().cloned().unwrap_or_default();
            let center = element
                .get("center")
                .map(float_list)
                .unwrap_or_default();

            // material may be a rock name or a 1-based rock index
            let material = match element.get("material") {
                Some(Value::Number(n)) => f!("{:>5}", n),
                Some(Value::String(s)) => f!("{s:>5}"),
                _ => f!("{:>5}", ""),
            };

            let mut fields = vec![
                Field::str(label.clone(), 5),
                Field::blank(10),
                Field::str(material, 5),
                float_field(&element, "volume", 10, 4),
                float_field(&element, "heat_exchange_area", 10, 4),
                float_field(&element, "permeability_modifier", 10, 4),
            ];
            for axis in 0..3 {
                fields.push(Field::Float {
                    value: center.get(axis).copied().flatten(),
                    width: 10,
                    precision: 3,
                });
            }
            out.push(write_record(&fields));
        }
        Ok(out)
    })
}

fn conne_block(connections: &Map<String, Value>) -> Result<Vec<String>> {
    frame_block("CONNE", true, false, || {
        let mut out = Vec::new();
        for (pair, connection) in connections {
            let connection = connection.as_object().cloned().unwrap_or_default();
            let distances = connection
                .get("nodal_distances")
                .map(float_list)
                .unwrap_or_default();

            out.push(write_record(&[
                Field::str(pair.clone(), 10),
                Field::blank(15),
                Field::Int {
                    value: connection
                        .get("permeability_direction")
                        .and_then(Value::as_i64),
                    width: 5,
                },
                Field::Float {
                    value: distances.first().copied().flatten(),
                    width: 10,
                    precision: 4,
                },
                Field::Float {
                    value: distances.get(1).copied().flatten(),
                    width: 10,
                    precision: 4,
                },
                float_field(&connection, "interface_area", 10, 4),
                float_field(&connection, "gravity_cosine_angle", 10, 4),
                float_field(&connection, "radiant_emittance_factor", 10, 4),
            ]));
        }
        Ok(out)
    })
}

fn incon_block(incon: &Map<String, Value>) -> Result<Vec<String>> {
    frame_block("INCON", true, false, || {
        let mut out = Vec::new();
        for (label, entry) in incon {
            let entry = entry.as_object().cloned().unwrap_or_default();

            out.push(write_record(&[
                Field::str(label.clone(), 5),
                Field::blank(10),
                Field::Float {
                    value: entry.get("porosity").and_then(Value::as_f64),
                    width: 15,
                    precision: 9,
                },
            ]));

            let values = entry.get("values").map(float_list).unwrap_or_default();
            let fields: Vec<Field> = values
                .iter()
                .take(4)
                .map(|v| Field::Float {
                    value: *v,
                    width: 20,
                    precision: 13,
                })
                .collect();
            out.push(write_record(&fields));
        }
        Ok(out)
    })
}

/// Per-cell scalar data by name, when present
fn scalar_data<'a>(mesh: &'a Mesh, name: &str) -> Option<&'a [f64]> {
    mesh.cell_data.get(name).and_then(DataArray::as_scalar)
}

/// Scalar permeability expands to all three directions
fn scalar_or_triple(value: Option<&Value>) -> [Option<f64>; 3] {
    match value {
        Some(Value::Array(_)) => {
            let list = float_list(value.unwrap());
            [
                list.first().copied().flatten(),
                list.get(1).copied().flatten(),
                list.get(2).copied().flatten(),
            ]
        }
        Some(value) => {
            let k = value.as_f64();
            [k, k, k]
        }
        None => [None; 3],
    }
}

/// Numbers of an array value; nulls stay as gaps
fn float_list(value: &Value) -> Vec<Option<f64>> {
    match value {
        Value::Array(values) => values.iter().map(Value::as_f64).collect(),
        _ => Vec::new(),
    }
}

fn float_field(map: &Map<String, Value>, key: &str, width: usize, precision: usize) -> Field {
    Field::Float {
        value: map.get(key).and_then(Value::as_f64),
        width,
        precision,
    }
}

fn int_field(map: &Map<String, Value>, key: &str, width: usize) -> Field {
    Field::Int {
        value: map.get(key).and_then(Value::as_i64),
        width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Axis, CellBlock, CellType};

    fn two_cell_mesh() -> Mesh {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 1.0, 0.0],
        ];
        let cells = vec![CellBlock::new(
            CellType::Quad,
            vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4]],
        )];
        let mut mesh = Mesh::new(points, cells).unwrap();
        mesh.extrude_to_3d(&[1.0], Axis::Z).unwrap();
        mesh
    }

    #[test]
    fn mesh_parameters_labels_match_cell_order() {
        let parameters = mesh_parameters(&two_cell_mesh()).unwrap();
        let elements = parameters["elements"].as_object().unwrap();
        let labels: Vec<&String> = elements.keys().collect();
        assert_eq!(labels, ["AAA00", "AAA01"]);

        let connections = parameters["connections"].as_object().unwrap();
        assert_eq!(connections.keys().next().unwrap(), "AAA00AAA01");
    }

    #[test]
    fn boundary_cells_get_scaled_volume() {
        let mut mesh = two_cell_mesh();
        mesh.add_cell_data(
            "boundary_condition",
            DataArray::Scalar(vec![0.0, 1.0]),
        )
        .unwrap();

        let parameters = mesh_parameters(&mesh).unwrap();
        let elements = parameters["elements"].as_object().unwrap();
        let v0 = elements["AAA00"]["volume"].as_f64().unwrap();
        let v1 = elements["AAA01"]["volume"].as_f64().unwrap();
        assert!((v0 - 1.0).abs() < 1e-12);
        assert!(v1 > 1.0e49);
    }

    #[test]
    fn eleme_records_are_fixed_width() {
        let parameters = mesh_parameters(&two_cell_mesh()).unwrap();
        let lines = eleme_block(parameters["elements"].as_object().unwrap()).unwrap();

        // keyword header, two records, blank terminator
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ELEME----1----*"));
        assert_eq!(lines[1].trim_end_matches('\n').len(), 80);
        assert!(lines[1].starts_with("AAA00"));
        assert!(lines[1].contains("dfalt"));
        assert_eq!(lines.last().unwrap(), "\n");
    }

    #[test]
    fn incon_values_below_threshold_are_blank() {
        let mut mesh = two_cell_mesh();
        mesh.add_cell_data(
            "initial_condition",
            DataArray::Rows(vec![
                vec![1.0e5, 0.05, -1.0e9, 10.0],
                vec![1.0e5, -1.0e9, -1.0e9, 10.0],
            ]),
        )
        .unwrap();

        let incon = incon_parameters(&mesh).unwrap();
        let values = incon["AAA01"]["values"].as_array().unwrap();
        assert!(values[1].is_null());
        assert!(values[3].as_f64().is_some());

        let lines = incon_block(incon.as_object().unwrap()).unwrap();
        // second record of the second element keeps column positions
        let record = &lines[4];
        assert_eq!(&record[20..40], &" ".repeat(20));
        assert!(record.contains("1.0000000000000e+01"));
    }

    #[test]
    fn unknown_root_key_warns_but_writes() {
        let parameters = serde_json::json!({
            "title": "deck",
            "not_a_real_key": 1,
        });
        let mut out = Vec::new();
        assert!(write_input(&mut out, &parameters).is_ok());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("deck\n"));
        assert!(text.contains("ENDCY"));
    }

    #[test]
    fn mistyped_known_key_aborts_before_writing() {
        let parameters = serde_json::json!({
            "title": "deck",
            "rocks": { "SAND1": { "density": "heavy" } },
        });
        let mut out = Vec::new();
        assert!(write_input(&mut out, &parameters).is_err());
        assert!(out.is_empty());
    }
}
