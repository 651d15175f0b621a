//! Declarative parameter tables and dictionary validation
//!
//! Run configuration is carried around as a [serde_json::Value] tree so that
//! decks can come from JSON just as easily as from code. Before anything is
//! serialised, every sub-dictionary is checked against the static tables in
//! this module, which are the single source of truth for what fields exist
//! in each block of the deck.
//!
//! Validation is deliberately asymmetric:
//! - unknown keys are logged as warnings and skipped, so decks carrying
//!   deprecated or experimental fields still round-trip,
//! - known keys holding the wrong shape fail hard with the offending key
//!   and expected kind in the message.

// standard library
use std::fmt;

// external crates
use anyhow::{bail, Result};
use log::warn;
use serde_json::{Map, Value};

/// Closed set of value shapes a parameter may take
///
/// The accepted JSON representations are checked by an explicit match, so
/// adding a kind means the compiler walks you through every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Str,
    Bool,
    /// A short label, either quoted or a bare integer
    StrInt,
    ArrayLike,
    Dict,
    /// Any number, integer or float
    Scalar,
    /// A number or an array of numbers
    ScalarArrayLike,
    /// A string or an array of strings
    StrArrayLike,
}

impl ValueKind {
    /// Check a JSON value against the accepted representations
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Int => value.as_i64().is_some(),
            Self::Float => value.is_f64(),
            Self::Str => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::StrInt => value.is_string() || value.as_i64().is_some(),
            Self::ArrayLike => value.is_array(),
            Self::Dict => value.is_object(),
            Self::Scalar => value.is_number(),
            Self::ScalarArrayLike => value.is_number() || value.is_array(),
            Self::StrArrayLike => value.is_string() || value.is_array(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::StrInt => "str_int",
            Self::ArrayLike => "array_like",
            Self::Dict => "dict",
            Self::Scalar => "scalar",
            Self::ScalarArrayLike => "scalar_array_like",
            Self::StrArrayLike => "str_array_like",
        };
        write!(f, "{name}")
    }
}

/// Root keys of the parameter dictionary
pub const PARAMETERS: &[(&str, ValueKind)] = &[
    ("title", ValueKind::Str),
    ("eos", ValueKind::Str),
    ("n_component", ValueKind::Int),
    ("n_phase", ValueKind::Int),
    ("n_component_mass", ValueKind::Int),
    ("flac", ValueKind::Dict),
    ("isothermal", ValueKind::Bool),
    ("start", ValueKind::Bool),
    ("nover", ValueKind::Bool),
    ("rocks", ValueKind::Dict),
    ("rocks_order", ValueKind::ArrayLike),
    ("options", ValueKind::Dict),
    ("extra_options", ValueKind::Dict),
    ("more_options", ValueKind::Dict),
    ("selections", ValueKind::Dict),
    ("solver", ValueKind::Dict),
    ("generators", ValueKind::Dict),
    ("times", ValueKind::ScalarArrayLike),
    ("element_history", ValueKind::ArrayLike),
    ("connection_history", ValueKind::ArrayLike),
    ("generator_history", ValueKind::ArrayLike),
    ("diffusion", ValueKind::ArrayLike),
    ("output", ValueKind::Dict),
    ("elements", ValueKind::Dict),
    ("elements_order", ValueKind::ArrayLike),
    ("connections", ValueKind::Dict),
    ("initial_conditions", ValueKind::Dict),
    ("default", ValueKind::Dict),
];

/// Per-rock-type material properties
pub const ROCKS: &[(&str, ValueKind)] = &[
    ("density", ValueKind::Scalar),
    ("porosity", ValueKind::Scalar),
    ("permeability", ValueKind::ScalarArrayLike),
    ("conductivity", ValueKind::Scalar),
    ("specific_heat", ValueKind::Scalar),
    ("compressibility", ValueKind::Scalar),
    ("expansivity", ValueKind::Scalar),
    ("conductivity_dry", ValueKind::Scalar),
    ("tortuosity", ValueKind::Scalar),
    ("klinkenberg_parameter", ValueKind::Scalar),
    ("distribution_coefficient_3", ValueKind::Scalar),
    ("distribution_coefficient_4", ValueKind::Scalar),
    ("initial_condition", ValueKind::ArrayLike),
    ("relative_permeability", ValueKind::Dict),
    ("capillarity", ValueKind::Dict),
];

/// Geomechanics coupling switches
pub const FLAC: &[(&str, ValueKind)] = &[
    ("creep", ValueKind::Bool),
    ("porosity_model", ValueKind::Int),
    ("version", ValueKind::Int),
];

/// Relative permeability and capillarity sub-model records
pub const MODEL: &[(&str, ValueKind)] = &[
    ("id", ValueKind::Int),
    ("parameters", ValueKind::ArrayLike),
];

/// Solver cycling and time stepping options
pub const PARAM: &[(&str, ValueKind)] = &[
    ("n_iteration", ValueKind::Int),
    ("n_cycle", ValueKind::Int),
    ("n_second", ValueKind::Int),
    ("n_cycle_print", ValueKind::Int),
    ("verbosity", ValueKind::Int),
    ("temperature_dependence_gas", ValueKind::Scalar),
    ("effective_strength_vapor", ValueKind::Scalar),
    ("t_ini", ValueKind::Scalar),
    ("t_max", ValueKind::Scalar),
    ("t_steps", ValueKind::ScalarArrayLike),
    ("t_step_max", ValueKind::Scalar),
    ("t_reduce_factor", ValueKind::Scalar),
    ("gravity", ValueKind::Scalar),
    ("mesh_scale_factor", ValueKind::Scalar),
    ("eps1", ValueKind::Scalar),
    ("eps2", ValueKind::Scalar),
    ("w_upstream", ValueKind::Scalar),
    ("w_newton", ValueKind::Scalar),
    ("derivative_factor", ValueKind::Scalar),
];

/// Selection block, free-form integers and floats
pub const SELEC: &[(&str, ValueKind)] = &[
    ("integers", ValueKind::Dict),
    ("floats", ValueKind::ArrayLike),
];

/// Linear solver settings
pub const SOLVR: &[(&str, ValueKind)] = &[
    ("method", ValueKind::Int),
    ("z_precond", ValueKind::Str),
    ("o_precond", ValueKind::Str),
    ("rel_iter_max", ValueKind::Scalar),
    ("eps", ValueKind::Scalar),
];

/// Sources and sinks
pub const GENER: &[(&str, ValueKind)] = &[
    ("name", ValueKind::StrArrayLike),
    ("type", ValueKind::StrArrayLike),
    ("times", ValueKind::ScalarArrayLike),
    ("rates", ValueKind::ScalarArrayLike),
    ("specific_enthalpy", ValueKind::ScalarArrayLike),
    ("layer_thickness", ValueKind::ScalarArrayLike),
];

/// Output requests
pub const OUTPU: &[(&str, ValueKind)] = &[
    ("format", ValueKind::Str),
    ("variables", ValueKind::Dict),
];

/// Per-element records
pub const ELEME: &[(&str, ValueKind)] = &[
    ("material", ValueKind::StrInt),
    ("volume", ValueKind::Scalar),
    ("heat_exchange_area", ValueKind::Scalar),
    ("permeability_modifier", ValueKind::Scalar),
    ("center", ValueKind::ArrayLike),
];

/// Per-connection records
pub const CONNE: &[(&str, ValueKind)] = &[
    ("permeability_direction", ValueKind::Int),
    ("nodal_distances", ValueKind::ArrayLike),
    ("interface_area", ValueKind::Scalar),
    ("gravity_cosine_angle", ValueKind::Scalar),
    ("radiant_emittance_factor", ValueKind::Scalar),
];

/// Per-element initial condition records
pub const INCON: &[(&str, ValueKind)] = &[
    ("porosity", ValueKind::Scalar),
    ("values", ValueKind::ArrayLike),
];

/// Validate a dictionary against one of the static block tables
///
/// Unknown keys are logged and skipped, never fatal. Known keys must hold
/// one of the accepted representations of their declared kind, or the whole
/// validation fails naming the key and the expected kind. `path` is only
/// used to point at the offending sub-dictionary in messages, e.g.
/// `"['rocks']['SAND1']"`.
pub fn check_parameters(
    params: &Map<String, Value>,
    table: &[(&str, ValueKind)],
    path: &str,
) -> Result<()> {
    for (key, value) in params {
        let kind = match table.iter().find(|(name, _)| name == key) {
            Some((_, kind)) => kind,
            None => {
                warn!("Unknown key '{key}'{}. Skipping.", in_path(path));
                continue;
            }
        };

        if !value.is_null() && !kind.accepts(value) {
            bail!(
                "Invalid type for parameter '{key}'{} (expected {kind}).",
                in_path(path)
            );
        }
    }

    Ok(())
}

/// Validate every entry of a dictionary-of-dictionaries against `table`
///
/// Used for the per-entity blocks where each key is a rock, element, or
/// connection label owning its own property dictionary. Entries that are
/// not dictionaries at all fail against the parent table instead, so they
/// are simply skipped here.
pub fn check_each(
    params: &Map<String, Value>,
    table: &[(&str, ValueKind)],
    path: &str,
) -> Result<()> {
    for (name, entry) in params {
        if let Value::Object(map) = entry {
            check_parameters(map, table, &format!("{path}['{name}']"))?;
        }
    }
    Ok(())
}

/// Validate a nested sub-model dictionary of every entry, when present
///
/// For example the `relative_permeability` and `capillarity` dictionaries
/// carried by individual rocks, each checked against [MODEL].
pub fn check_each_nested(
    params: &Map<String, Value>,
    inner: &str,
    table: &[(&str, ValueKind)],
    path: &str,
) -> Result<()> {
    for (name, entry) in params {
        let nested = entry.get(inner).and_then(Value::as_object);
        if let Some(map) = nested {
            check_parameters(map, table, &format!("{path}['{name}']['{inner}']"))?;
        }
    }
    Ok(())
}

/// Validate an integer-keyed option block such as MOP or MOMOP
///
/// Keys must parse to option indices within `1..=max`, values must be
/// integers. Out-of-range keys are unknown keys, so they warn and skip.
pub fn check_options(params: &Map<String, Value>, max: usize, path: &str) -> Result<()> {
    for (key, value) in params {
        let index: Option<usize> = key.parse().ok().filter(|i| (1..=max).contains(i));
        if index.is_none() {
            warn!("Unknown key '{key}'{}. Skipping.", in_path(path));
            continue;
        }

        if !value.is_null() && !ValueKind::Int.accepts(value) {
            bail!(
                "Invalid type for parameter '{key}'{} (expected int).",
                in_path(path)
            );
        }
    }
    Ok(())
}

fn in_path(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" in {path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn valid_parameters_pass() {
        let params = as_map(json!({
            "title": "Sample run",
            "isothermal": false,
            "times": [1.0, 2.0, 3.0],
            "rocks": {},
        }));
        assert!(check_parameters(&params, PARAMETERS, "").is_ok());
    }

    #[test]
    fn unknown_key_is_skipped_not_fatal() {
        let params = as_map(json!({
            "title": "Sample run",
            "experimental_field": 42,
        }));
        // warn-and-drop, never an error
        assert!(check_parameters(&params, PARAMETERS, "").is_ok());
    }

    #[test]
    fn mistyped_scalar_is_rejected() {
        let params = as_map(json!({ "density": "heavy" }));
        let err = check_parameters(&params, ROCKS, "['rocks']['SAND1']").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'density'"));
        assert!(msg.contains("scalar"));
        assert!(msg.contains("['rocks']['SAND1']"));
    }

    #[test]
    fn str_int_accepts_both_representations() {
        let by_name = as_map(json!({ "material": "SAND1" }));
        let by_index = as_map(json!({ "material": 2 }));
        assert!(check_parameters(&by_name, ELEME, "").is_ok());
        assert!(check_parameters(&by_index, ELEME, "").is_ok());
    }

    #[test]
    fn int_kind_rejects_float() {
        let params = as_map(json!({ "n_component": 1.5 }));
        assert!(check_parameters(&params, PARAMETERS, "").is_err());
    }

    #[test]
    fn null_values_are_allowed() {
        let params = as_map(json!({ "porosity": null }));
        assert!(check_parameters(&params, ROCKS, "").is_ok());
    }

    #[test]
    fn nested_rock_models_are_checked() {
        let rocks = as_map(json!({
            "SAND1": {
                "density": 2600.0,
                "capillarity": { "id": 2, "parameters": [1.0e4, 0.3, 1.0, 1.0] },
            }
        }));
        assert!(check_each(&rocks, ROCKS, "['rocks']").is_ok());
        assert!(check_each_nested(&rocks, "capillarity", MODEL, "['rocks']").is_ok());

        let bad = as_map(json!({
            "SAND1": { "capillarity": { "id": "two" } }
        }));
        assert!(check_each_nested(&bad, "capillarity", MODEL, "['rocks']").is_err());
    }

    #[test]
    fn option_blocks_check_index_range() {
        let ok = as_map(json!({ "1": 2, "24": 0 }));
        assert!(check_options(&ok, 24, "['extra_options']").is_ok());

        // out of range keys are unknown keys, so skipped
        let skipped = as_map(json!({ "25": 2 }));
        assert!(check_options(&skipped, 24, "['extra_options']").is_ok());

        // in-range key with a non-integer value is fatal
        let bad = as_map(json!({ "3": "on" }));
        assert!(check_options(&bad, 24, "['extra_options']").is_err());
    }
}
