use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::Command;

use sweep_plot::cli::{self, PlotRequest};
use sweep_plot::plotting::render_figure;
use sweep_plot::results_table::ResultsTable;

/// Campaign layout: results tables live under the simulations directory.
const RESULTS_DIR: &str = "./simulations/results";

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 7 {
        eprintln!("Error: incorrect number of arguments.");
        cli::print_usage(&args[0]);
        std::process::exit(1);
    }
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let request = PlotRequest::from_args(args)?;
    let data_file = Path::new(RESULTS_DIR).join(&request.datafile);

    let mut table = ResultsTable::from_csv_path(&data_file)?;
    table.sort_by_columns(&request.sweep_params)?;

    let output = figure_path(&data_file);
    if render_figure(&table, &request, &output)? {
        println!("✓ Generated {}", output.display());
        show_figure(&output);
    }
    Ok(())
}

/// `foo.csv` -> `foo_plots.png`, next to the input file.
fn figure_path(data_file: &Path) -> PathBuf {
    let stem = data_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sweep_results");
    data_file.with_file_name(format!("{}_plots.png", stem))
}

/// Open the figure with the platform image viewer. Best effort: a missing
/// viewer only prints a note, the PNG is already on disk.
fn show_figure(path: &Path) {
    #[cfg(target_os = "macos")]
    let viewer = "open";
    #[cfg(not(target_os = "macos"))]
    let viewer = "xdg-open";

    if let Err(e) = Command::new(viewer).arg(path).spawn() {
        eprintln!("Note: could not open {} with {}: {}", path.display(), viewer, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figure_path_swaps_extension_for_plots_suffix() {
        let path = figure_path(Path::new("simulations/results/run1.csv"));
        assert_eq!(path, Path::new("simulations/results/run1_plots.png"));
    }
}
