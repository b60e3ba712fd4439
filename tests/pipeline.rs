//! End-to-end pipeline tests on synthetic sweep campaigns: CSV on disk,
//! table load and sort, regridding, figure rendering.

use std::fs;
use std::path::PathBuf;

use sweep_plot::cli::PlotRequest;
use sweep_plot::plotting::render_figure;
use sweep_plot::results_table::ResultsTable;
use sweep_plot::sweep_grid::regrid_metric;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sweep_plot_it_{}_{}", std::process::id(), name))
}

fn request(datafile: &str, params: &[&str], metrics: &[&str]) -> PlotRequest {
    PlotRequest {
        datafile: datafile.to_string(),
        sweep_params: params.iter().map(|s| s.to_string()).collect(),
        metrics: metrics.iter().map(|s| s.to_string()).collect(),
        contour_panels: Vec::new(),
        logx_panels: Vec::new(),
        logy_panels: Vec::new(),
    }
}

#[test]
fn single_parameter_sweep_renders_line_panels() {
    let csv = temp_path("single.csv");
    // Rows deliberately out of order; one gain cell failed.
    fs::write(
        &csv,
        "IBIAS;Gain;BW\n\
         30e-6;22.0;1.2e6\n\
         10e-6;20.0;1.0e6\n\
         20e-6;failed;1.1e6\n",
    )
    .unwrap();

    let mut table = ResultsTable::from_csv_path(&csv).unwrap();
    table.sort_by_columns(&["ibias".to_string()]).unwrap();
    assert_eq!(table.column("ibias").unwrap(), vec![10e-6, 20e-6, 30e-6]);
    assert!(table.column("gain").unwrap()[1].is_nan());

    let mut req = request("single.csv", &["ibias"], &["gain", "bw"]);
    req.logx_panels = vec![0, 1];
    req.logy_panels = vec![1];

    let png = temp_path("single.png");
    let rendered = render_figure(&table, &req, &png).unwrap();
    assert!(rendered);
    let bytes = fs::metadata(&png).unwrap().len();
    assert!(bytes > 0);

    fs::remove_file(&csv).ok();
    fs::remove_file(&png).ok();
}

#[test]
fn two_parameter_sweep_regrids_and_renders() {
    let csv = temp_path("two.csv");
    // 3x2 lattice with the (1.2, 2e-5) run missing: that curve keeps its
    // endpoints, so the middle cell is rebuilt by interpolation.
    fs::write(
        &csv,
        "vdd;ibias;gain\n\
         1.0;1e-5;10.0\n\
         1.0;2e-5;11.0\n\
         1.2;1e-5;20.0\n\
         1.4;1e-5;30.0\n\
         1.4;2e-5;31.0\n",
    )
    .unwrap();

    let mut table = ResultsTable::from_csv_path(&csv).unwrap();
    table
        .sort_by_columns(&["vdd".to_string(), "ibias".to_string()])
        .unwrap();

    let x_raw = table.column("vdd").unwrap();
    let y_raw = table.column("ibias").unwrap();
    let z_raw = table.column("gain").unwrap();
    let grid = regrid_metric("gain", &x_raw, &y_raw, &z_raw);

    assert_eq!(grid.x, vec![1.0, 1.2, 1.4]);
    assert_eq!(grid.y, vec![1e-5, 2e-5]);
    assert_eq!(grid.z[[1, 0]], 20.0);
    assert!((grid.z[[1, 1]] - 21.0).abs() < 1e-9); // interpolated between 11 and 31

    let mut req = request("two.csv", &["vdd", "ibias"], &["gain", "gain"]);
    req.contour_panels = vec![0];

    let png = temp_path("two.png");
    let rendered = render_figure(&table, &req, &png).unwrap();
    assert!(rendered);
    assert!(fs::metadata(&png).unwrap().len() > 0);

    fs::remove_file(&csv).ok();
    fs::remove_file(&png).ok();
}

#[test]
fn more_than_two_parameters_skips_plotting() {
    let table = ResultsTable {
        columns: vec!["p1".into(), "p2".into(), "p3".into(), "m".into()],
        rows: vec![vec![1.0, 2.0, 3.0, 4.0]],
    };
    let req = request("three.csv", &["p1", "p2", "p3"], &["m"]);
    let png = temp_path("three.png");

    let rendered = render_figure(&table, &req, &png).unwrap();
    assert!(!rendered);
    assert!(!png.exists());
}
