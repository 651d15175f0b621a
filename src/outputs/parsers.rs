//! Line classifiers and parsers for the result file readers
//!
//! Small nom combinators shared by the output readers. Each reader works
//! line by line, so everything here classifies or picks apart a single
//! line of text.

// external crates
use nom::bytes::complete::{tag, take_until, take_while};
use nom::character::complete::{char, multispace0, space0, space1};
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;

/// Check for the banner announcing a new listing time step
pub fn is_step_banner(i: &str) -> bool {
    i.trim_start().starts_with("OUTPUT DATA AFTER")
}

/// Check for the listing's total-time table header
pub fn is_total_time_header(i: &str) -> bool {
    i.trim_start().starts_with("TOTAL TIME")
}

/// Check for an element or connection table header in a listing
pub fn is_table_header(i: &str) -> bool {
    let head = i.trim_start();
    head.starts_with("ELEM.") || head.starts_with("ELEM1") || head.starts_with("ELEM ")
}

/// Check for a units row, every token parenthesised
pub fn is_units_row(i: &str) -> bool {
    let mut tokens = i.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|t| t.starts_with('('))
}

/// Check for the header row of a time history log
pub fn is_history_header(i: &str) -> bool {
    i.trim_start().starts_with("TIME")
}

/// The content of one double-quoted field
pub fn quoted_field(i: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_until("\""), char('"'))(i)
}

/// A whole line of comma-separated quoted fields
pub fn quoted_row(i: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(
        tuple((space0, char(','), space0)),
        quoted_field,
    )(i)
}

/// The time value out of a quoted `"TIME [sec]  8.64e+04"` marker line
pub fn csv_time_marker(i: &str) -> IResult<&str, f64> {
    let (i, field) = quoted_field(i.trim_start())?;
    let (_, time) = preceded(
        tuple((tag("TIME"), take_while(|c: char| !c.is_ascii_digit() && c != '-'))),
        double,
    )(field)?;
    Ok((i, time))
}

/// The time in days out of a listing step banner
pub fn banner_time(i: &str) -> IResult<&str, f64> {
    preceded(
        tuple((take_until("THE TIME IS"), tag("THE TIME IS"), space1)),
        double,
    )(i)
}

/// Every whitespace-separated double on a line
pub fn double_list(i: &str) -> IResult<&str, Vec<f64>> {
    preceded(multispace0, separated_list1(space1, double))(i)
}

/// Split one delimited data row into trimmed fields
///
/// The label field is quoted, the numeric fields are bare; both appear in
/// the same row so this cannot be a pure nom grammar without ambiguity.
pub fn csv_fields(i: &str) -> Vec<String> {
    i.split(',')
        .map(|field| field.trim().trim_matches('"').trim().to_string())
        .collect()
}

/// First whitespace-separated word of a line
pub fn first_word(i: &str) -> IResult<&str, &str> {
    preceded(space0, take_while(|c: char| !c.is_whitespace()))(i)
}

/// Alternative accepted spellings of a label column header
pub fn is_label_header(name: &str) -> bool {
    matches!(name, "ELEM" | "ELEM." | "ELEM1" | "ELEME")
}

/// Fortran-style doubles, which may carry `D` exponents
pub fn fortran_double(i: &str) -> IResult<&str, f64> {
    let (i, _) = space0(i)?;
    let (rest, token) = take_while(|c: char| !c.is_whitespace())(i)?;
    match token.replace(['D', 'd'], "E").parse::<f64>() {
        Ok(v) => Ok((rest, v)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Float,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_listing_lines() {
        assert!(is_step_banner(
            " OUTPUT DATA AFTER (    5,  6)-2-TIME STEPS      THE TIME IS 0.115741E-01 DAYS"
        ));
        assert!(is_total_time_header(" TOTAL TIME    KCYC  ITER"));
        assert!(is_table_header(" ELEM.  INDEX     P          T"));
        assert!(is_table_header(" ELEM1 ELEM2 INDEX   FLOH"));
        assert!(!is_table_header(" AAA00      1 0.10065E+06"));
        assert!(is_units_row("          (PA)      (DEG-C)"));
        assert!(!is_units_row(" AAA00      1 0.10065E+06"));
    }

    #[test]
    fn quoted_rows_split_cleanly() {
        let (_, fields) = quoted_row("\"     ELEM\",\"        X\",\" PRES\"").unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[2].trim(), "PRES");
    }

    #[test]
    fn csv_time_markers_parse() {
        let (_, time) = csv_time_marker("\"TIME [sec]  8.6400000e+04\"").unwrap();
        assert_eq!(time, 86400.0);
    }

    #[test]
    fn banner_times_parse() {
        let line =
            " OUTPUT DATA AFTER (    5,  6)-2-TIME STEPS      THE TIME IS 0.115741E-01 DAYS";
        let (_, time) = banner_time(line).unwrap();
        assert!((time - 0.0115741).abs() < 1e-9);
    }

    #[test]
    fn double_lists_parse() {
        let (_, values) = double_list(" 0.10000E+04     5.0    0.29671E+05").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 1000.0);
    }

    #[test]
    fn fortran_exponents_parse() {
        let (_, value) = fortran_double(" 0.10000D+04").unwrap();
        assert_eq!(value, 1000.0);
    }
}
