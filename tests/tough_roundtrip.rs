//! Round trips through the fixed-width input deck

use serde_json::json;
use std::io::Cursor;
use toughprep::mesh::{Axis, CellBlock, CellType, DataArray, Mesh};
use toughprep::tough;

/// Two extruded hexahedra side by side
fn small_mesh() -> Mesh {
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
fn mesh_file_round_trip() {
    let mut mesh = small_mesh();
    mesh.set_material("SAND1", (1.0, 2.0), (0.0, 1.0), (0.0, 1.0));

    let mut file = Vec::new();
    tough::write_mesh(&mut file, &mesh).unwrap();
    let parameters = tough::read_input(Cursor::new(file)).unwrap();

    // labels, materials, and centers survive the fixed-width fields
    let elements = parameters["elements"].as_object().unwrap();
    let labels: Vec<&String> = elements.keys().collect();
    assert_eq!(labels, ["AAA00", "AAA01"]);
    assert_eq!(elements["AAA00"]["material"], "dfalt");
    assert_eq!(elements["AAA01"]["material"], "SAND1");

    let centers = mesh.centers();
    for (index, label) in ["AAA00", "AAA01"].iter().enumerate() {
        let center = elements[*label]["center"].as_array().unwrap();
        for axis in 0..3 {
            let expected = centers[index][axis];
            let read = center[axis].as_f64().unwrap();
            // written with four significant figures
            assert!(
                (read - expected).abs() <= 1e-3 * expected.abs().max(1.0),
                "center mismatch for {label}: {read} vs {expected}"
            );
        }
    }

    let connections = parameters["connections"].as_object().unwrap();
    assert_eq!(connections.len(), 1);
    let connection = connections["AAA00AAA01"].as_object().unwrap();
    assert_eq!(connection["permeability_direction"], 1);
    assert!((connection["interface_area"].as_f64().unwrap() - 1.0).abs() < 1e-3);
}

#[test]
fn volumes_round_trip_through_eleme_records() {
    let mesh = small_mesh();
    let mut file = Vec::new();
    tough::write_mesh(&mut file, &mesh).unwrap();
    let parameters = tough::read_input(Cursor::new(file)).unwrap();

    for (label, element) in parameters["elements"].as_object().unwrap() {
        let volume = element["volume"].as_f64().unwrap();
        assert!(
            (volume - 1.0).abs() < 1e-3,
            "volume mismatch for {label}: {volume}"
        );
    }
}

#[test]
fn incon_round_trip_omits_unset_values() {
    let mut mesh = small_mesh();
    mesh.add_cell_data(
        "initial_condition",
        DataArray::Rows(vec![
            vec![1.0e5, 0.05, -1.0e9, 10.0],
            vec![2.0e5, -1.0e9, -1.0e9, 12.5],
        ]),
    )
    .unwrap();
    mesh.add_cell_data("porosity", DataArray::Scalar(vec![0.1, 0.2]))
        .unwrap();

    let mut file = Vec::new();
    tough::write_incon(&mut file, &mesh).unwrap();
    let parameters = tough::read_input(Cursor::new(file)).unwrap();

    let incon = parameters["initial_conditions"].as_object().unwrap();
    assert_eq!(incon["AAA00"]["porosity"], 0.1);

    let values = incon["AAA01"]["values"].as_array().unwrap();
    assert_eq!(values.len(), 4);
    assert!(values[1].is_null());
    assert!(values[2].is_null());
    assert!((values[3].as_f64().unwrap() - 12.5).abs() < 1e-9);
}

#[test]
fn full_deck_round_trip() {
    let parameters = json!({
        "title": "Sample injection problem",
        "start": true,
        "rocks": {
            "SAND1": {
                "density": 2600.0,
                "porosity": 0.1,
                "permeability": 1.0e-13,
                "conductivity": 2.5,
                "specific_heat": 800.0,
                "compressibility": 1.0e-9,
                "relative_permeability": { "id": 3, "parameters": [0.3, 0.05] },
                "capillarity": { "id": 7, "parameters": [1.0e4, 0.3, 1.0] },
            },
            "BOUND": { "density": 2600.0, "porosity": 0.1 },
        },
        "options": {
            "n_iteration": 8,
            "n_cycle": 100,
            "n_cycle_print": 10,
            "t_ini": 0.0,
            "t_max": 86400.0,
            "t_steps": [100.0, 1000.0, 10000.0],
            "t_step_max": 3600.0,
            "gravity": 9.81,
            "eps1": 1.0e-5,
        },
        "extra_options": { "16": 4, "21": 8 },
        "solver": {
            "method": 5,
            "z_precond": "Z1",
            "o_precond": "O0",
            "rel_iter_max": 0.1,
            "eps": 1.0e-7,
        },
        "times": [3600.0, 86400.0],
        "generators": {
            "AAA00": {
                "name": "INJ 1",
                "type": "COM3",
                "rates": 1.0e-2,
                "specific_enthalpy": 2.0e4,
            },
        },
        "default": { "initial_condition": [1.0e5, 0.05, 10.0] },
    });

    let mut file = Vec::new();
    tough::write_input(&mut file, &parameters).unwrap();
    let read = tough::read_input(Cursor::new(file)).unwrap();

    assert_eq!(read["title"], "Sample injection problem");
    assert_eq!(read["start"], true);

    let rock = &read["rocks"]["SAND1"];
    assert_eq!(rock["density"], 2600.0);
    assert_eq!(rock["permeability"], 1.0e-13);
    assert_eq!(rock["relative_permeability"]["id"], 3);
    assert_eq!(rock["capillarity"]["parameters"][0], 1.0e4);

    let options = read["options"].as_object().unwrap();
    assert_eq!(options["n_cycle"], 100);
    assert_eq!(options["t_steps"].as_array().unwrap().len(), 3);
    assert_eq!(options["gravity"], 9.81);

    assert_eq!(read["extra_options"]["16"], 4);
    assert_eq!(read["extra_options"]["21"], 8);

    let solver = read["solver"].as_object().unwrap();
    assert_eq!(solver["method"], 5);
    assert_eq!(solver["z_precond"], "Z1");

    assert_eq!(read["times"].as_array().unwrap().len(), 2);

    let generator = &read["generators"]["AAA00"];
    assert_eq!(generator["name"], "INJ 1");
    assert_eq!(generator["type"], "COM3");
    assert!((generator["rates"].as_f64().unwrap() - 1.0e-2).abs() < 1e-9);

    let defaults = read["default"]["initial_condition"].as_array().unwrap();
    assert_eq!(defaults.len(), 3);
    assert!((defaults[0].as_f64().unwrap() - 1.0e5).abs() < 1e-6);
}

#[test]
fn boundary_cells_are_written_with_huge_volumes() {
    let mut mesh = small_mesh();
    mesh.set_material("BOUND", (1.0, 2.0), (0.0, 1.0), (0.0, 1.0));
    mesh.add_cell_data("boundary_condition", DataArray::Scalar(vec![0.0, 1.0]))
        .unwrap();

    let mut file = Vec::new();
    tough::write_mesh(&mut file, &mesh).unwrap();
    let parameters = tough::read_input(Cursor::new(file)).unwrap();

    let elements = parameters["elements"].as_object().unwrap();
    assert!(elements["AAA00"]["volume"].as_f64().unwrap() < 2.0);
    assert!(elements["AAA01"]["volume"].as_f64().unwrap() > 1.0e49);
}
