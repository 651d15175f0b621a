//! Low-level fixed-width record codec
//!
//! The simulator input deck is column-positional: every record is an
//! 80-column line whose fields live at fixed offsets with fixed widths, and
//! every block is framed by a 5-column keyword header. This module is the
//! only place that knows how to turn values into those columns and back.
//!
//! Writing goes through [Field] lists and [write_record], reading through
//! [read_record] with a comma-separated field spec such as `"5s,5d,10e"`.
//! Both directions are pure text transforms with no side effects.

// internal modules
use crate::utils::*;

// external crates
use anyhow::{anyhow, Context, Result};

/// Column ruler appended to every block keyword header line
pub const HEADER: &str =
    "----1----*----2----*----3----*----4----*----5----*----6----*----7----*----8";

/// A single fixed-width field of an output record
///
/// Strings are left-justified and truncated to their width, numbers are
/// right-justified. A `None` value renders as blanks so that optional
/// trailing fields can simply be skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Left-justified string, truncated to `width`
    Str { value: Option<String>, width: usize },
    /// Right-justified integer
    Int { value: Option<i64>, width: usize },
    /// Right-justified scientific float with `precision` decimals
    Float {
        value: Option<f64>,
        width: usize,
        precision: usize,
    },
}

impl Field {
    /// Shorthand for a string field
    pub fn str<S: Into<String>>(value: S, width: usize) -> Self {
        Self::Str {
            value: Some(value.into()),
            width,
        }
    }

    /// Shorthand for an integer field
    pub fn int(value: i64, width: usize) -> Self {
        Self::Int {
            value: Some(value),
            width,
        }
    }

    /// Shorthand for a scientific float field
    pub fn float(value: f64, width: usize, precision: usize) -> Self {
        Self::Float {
            value: Some(value),
            width,
            precision,
        }
    }

    /// Shorthand for a blank field of `width` columns
    pub fn blank(width: usize) -> Self {
        Self::Str { value: None, width }
    }

    /// Render the field into its fixed columns
    fn to_columns(&self) -> String {
        match self {
            Self::Str { value, width } => match value {
                Some(s) => {
                    let mut s = s.clone();
                    s.truncate(*width);
                    f!("{s:<width$}")
                }
                None => f!("{:<width$}", ""),
            },
            Self::Int { value, width } => match value {
                Some(i) => f!("{i:>width$}"),
                None => f!("{:>width$}", ""),
            },
            Self::Float {
                value,
                width,
                precision,
            } => match value {
                Some(v) => {
                    // negative signs and wide exponents must not push the
                    // later fields off their columns
                    let mut precision = *precision;
                    let mut out = v.sci(*width, precision);
                    while out.len() > *width && precision > 0 {
                        precision -= 1;
                        out = v.sci(*width, precision);
                    }
                    out
                }
                None => f!("{:>width$}", ""),
            },
        }
    }
}

/// Format one 80-column record line from a list of fields
///
/// The line is padded with spaces to 80 columns and terminated with a
/// newline, matching the simulator's reader which always consumes full
/// cards.
pub fn write_record(fields: &[Field]) -> String {
    let body: String = fields.iter().map(|field| field.to_columns()).collect();
    f!("{body:<80}\n")
}

/// Format a long list of fields as multiple records, `ncol` fields per line
///
/// Used by blocks that serialise arrays, such as the time stepping and
/// diffusion records.
pub fn write_multi_record(fields: &[Field], ncol: usize) -> Vec<String> {
    fields
        .chunks(ncol)
        .map(|chunk| write_record(chunk))
        .collect()
}

/// Frame a block body with its keyword header line
///
/// The keyword occupies the first five columns followed by the column
/// ruler. Multi-record blocks are terminated by a blank line, and `noend`
/// blocks (the end-of-deck marker) drop the trailing newline entirely.
pub fn frame_block<F>(keyword: &str, multi: bool, noend: bool, body: F) -> Result<Vec<String>>
where
    F: FnOnce() -> Result<Vec<String>>,
{
    let head = if noend {
        f!("{keyword:<5}{HEADER}")
    } else {
        f!("{keyword:<5}{HEADER}\n")
    };

    let mut out = vec![head];
    out.extend(body()?);
    if multi {
        out.push("\n".to_string());
    }

    Ok(out)
}

/// A value parsed back out of a fixed-width record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl RecordValue {
    /// The value as a string slice, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a float, coercing integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(i) => Some(*i as f64),
            Self::Str(_) => None,
        }
    }

    /// The value as an integer, if it is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Parse one record line against a comma-separated field spec
///
/// Each token is a width followed by a type tag: `s` for a trimmed string,
/// `S` for a raw untrimmed string, `d` for an integer, and `f`/`e` for a
/// float. Blank slices parse to `None`. Lines shorter than the spec are
/// treated as blank-filled, which is how the simulator pads short cards.
///
/// ```rust
/// # use toughprep::record::{read_record, RecordValue};
/// let values = read_record("AAA00          SAND1 1.0000e+00", "5s,5s,5s,5s,10e").unwrap();
/// assert_eq!(values[0], Some(RecordValue::Str("AAA00".into())));
/// assert_eq!(values[1], None);
/// assert_eq!(values[4], Some(RecordValue::Float(1.0)));
/// ```
///
/// A malformed type tag is a programming error and panics; a slice that
/// cannot be coerced to the declared type is a validation error.
pub fn read_record(line: &str, spec: &str) -> Result<Vec<Option<RecordValue>>> {
    let mut start = 0;
    let mut out = Vec::new();

    for token in spec.split(',') {
        let (width, tag) = token.split_at(token.len() - 1);
        let width: usize = width
            .parse()
            .unwrap_or_else(|_| panic!("Malformed field spec token \"{token}\""));

        let end = (start + width).min(line.len());
        let slice = if start < line.len() {
            &line[start..end]
        } else {
            ""
        };
        start += width;

        let trimmed = slice.trim();
        if trimmed.is_empty() {
            out.push(None);
            continue;
        }

        let value = match tag {
            "s" => RecordValue::Str(trimmed.to_string()),
            "S" => RecordValue::Str(slice.to_string()),
            "d" => RecordValue::Int(
                trimmed
                    .parse()
                    .with_context(|| f!("Could not parse \"{trimmed}\" to an integer"))?,
            ),
            "f" | "e" => RecordValue::Float(
                trimmed
                    .parse()
                    .with_context(|| f!("Could not parse \"{trimmed}\" to a float"))?,
            ),
            _ => panic!("Unknown type tag in field spec token \"{token}\""),
        };
        out.push(Some(value));
    }

    Ok(out)
}

/// Drop trailing `None` values from a parsed record
///
/// Optional trailing fields that were blank in the file carry no
/// information, so most readers only want the populated prefix.
pub fn prune_trailing(values: Vec<Option<RecordValue>>) -> Vec<Option<RecordValue>> {
    let last = values.iter().rposition(|v| v.is_some());
    match last {
        Some(i) => values.into_iter().take(i + 1).collect(),
        None => Vec::new(),
    }
}

/// Float from a parsed slot, with the field named on failure
pub fn require_f64(values: &[Option<RecordValue>], index: usize, name: &str) -> Result<f64> {
    values
        .get(index)
        .and_then(|v| v.as_ref())
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow!("Missing value for field '{name}'"))
}

/// Trimmed string from a parsed slot, with the field named on failure
pub fn require_str<'a>(
    values: &'a [Option<RecordValue>],
    index: usize,
    name: &str,
) -> Result<&'a str> {
    values
        .get(index)
        .and_then(|v| v.as_ref())
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Missing value for field '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_lines_are_80_columns() {
        let line = write_record(&[Field::str("AAA00", 5), Field::float(1.5, 10, 4)]);
        assert_eq!(line.len(), 81); // 80 columns + newline
        assert!(line.starts_with("AAA00"));
        assert!(line.contains("1.5000e+00"));
    }

    #[test]
    fn blank_fields_render_as_spaces() {
        let line = write_record(&[Field::blank(5), Field::int(3, 5)]);
        assert_eq!(&line[..10], "         3");
    }

    #[test]
    fn negative_floats_hold_their_columns() {
        let line = write_record(&[
            Field::float(-3.0, 10, 4),
            Field::float(3600.0, 10, 4),
        ]);
        assert_eq!(&line[..10], "-3.000e+00");
        assert_eq!(&line[10..20], "3.6000e+03");
    }

    #[test]
    fn multi_record_chunks_eight_per_line() {
        let fields: Vec<Field> = (0..10).map(|i| Field::float(i as f64, 10, 3)).collect();
        let lines = write_multi_record(&fields, 8);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("9.000e+00"));
    }

    #[test]
    fn frame_block_header_and_terminator() {
        let lines = frame_block("ROCKS", true, false, || Ok(vec!["body\n".to_string()])).unwrap();
        assert_eq!(lines[0], f!("ROCKS{HEADER}\n"));
        assert_eq!(lines.last().unwrap(), "\n");
    }

    #[test]
    fn frame_block_noend_drops_newline() {
        let lines = frame_block("ENDCY", false, true, || Ok(Vec::new())).unwrap();
        assert_eq!(lines, vec![f!("ENDCY{HEADER}")]);
    }

    #[test]
    fn read_record_coerces_types() {
        let line = "ABC12    2          1.2300e+05  4.50";
        let values = read_record(line, "5s,5d,5s,12e,6f").unwrap();
        assert_eq!(values[0], Some(RecordValue::Str("ABC12".into())));
        assert_eq!(values[1], Some(RecordValue::Int(2)));
        assert_eq!(values[2], None);
        assert_eq!(values[3], Some(RecordValue::Float(1.23e5)));
        assert_eq!(values[4], Some(RecordValue::Float(4.5)));
    }

    #[test]
    fn read_record_short_line_pads_with_none() {
        let values = read_record("AAA00", "5s,5s,10e").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], None);
        assert_eq!(values[2], None);
    }

    #[test]
    fn read_record_untrimmed_keeps_padding() {
        let values = read_record("AB   ", "5S").unwrap();
        assert_eq!(values[0], Some(RecordValue::Str("AB   ".into())));
    }

    #[test]
    fn read_record_rejects_bad_number() {
        assert!(read_record("abcde", "5d").is_err());
    }

    #[test]
    #[should_panic]
    fn malformed_spec_token_panics() {
        let _ = read_record("AAA00", "5x");
    }

    #[test]
    fn prune_trailing_drops_empty_tail() {
        let values = read_record("AAA00               ", "5s,5s,5s,5s").unwrap();
        let pruned = prune_trailing(values);
        assert_eq!(pruned.len(), 1);
    }
}
