//! Regression fixtures for the three result file layouts

use rstest::rstest;
use toughprep::outputs::{time_step, OutputKind};
use toughprep::read_output;

#[rstest]
#[case::first_step(0, 2.0e5, 26.0)]
#[case::last_step(-1, 5.0e5, 29.0)]
fn csv_fixture_means(#[case] index: isize, #[case] pres: f64, #[case] temp: f64) {
    let steps = read_output("./data/outputs/OUTPUT_ELEME.csv").unwrap();
    assert_eq!(steps.len(), 2);

    let step = time_step(&steps, index).unwrap();
    assert_eq!(step.kind, OutputKind::Element);
    assert_eq!(step.labels, vec!["AAA00", "AAA01", "AAA02"]);
    assert!((step.mean("PRES").unwrap() - pres).abs() < 1e-6);
    assert!((step.mean("TEMP").unwrap() - temp).abs() < 1e-9);
}

#[test]
fn csv_fixture_times() {
    let steps = read_output("./data/outputs/OUTPUT_ELEME.csv").unwrap();
    assert_eq!(steps[0].time, 0.0);
    assert_eq!(steps[1].time, 86400.0);
}

#[test]
fn listing_fixture_tables() {
    let steps = read_output("./data/outputs/OUTPUT.listing").unwrap();
    // two time steps, each with an element and a connection table
    assert_eq!(steps.len(), 4);

    let first = time_step(&steps, 0).unwrap();
    assert_eq!(first.kind, OutputKind::Element);
    assert_eq!(first.time, 1000.0);
    assert!((first.mean("PRES").unwrap() - 2.0e5).abs() < 1e-6);
    assert!((first.mean("TEMP").unwrap() - 26.0).abs() < 1e-9);

    let last = time_step(&steps, -1).unwrap();
    assert_eq!(last.kind, OutputKind::Connection);
    assert_eq!(last.time, 86400.0);
    assert_eq!(last.labels, vec!["AAA00AAA01"]);
    assert!((last.mean("FLOH").unwrap() - 7.0e-2).abs() < 1e-9);
}

#[test]
fn history_fixture_rows() {
    let steps = read_output("./data/outputs/FOFT.dat").unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].labels, vec!["AAA00", "AAA01"]);

    let last = time_step(&steps, -1).unwrap();
    assert_eq!(last.time, 172800.0);
    assert!((last.mean("VALUE").unwrap() - 1.7e5).abs() < 1e-6);
}

#[test]
fn missing_file_is_a_resource_error() {
    assert!(read_output("./data/outputs/NO_SUCH_FILE").is_err());
}
