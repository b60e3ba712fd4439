//! Positional argument parsing for the sweep plotter.
//!
//! The invocation mirrors the sweep campaign tooling: a results CSV name
//! followed by bracketed comma-separated lists, e.g.
//! `sweep_plot inv_sweep_tb_sweep_results.csv [m1_w_val,m2_w_val] [gain_passband_db,gbw] [3] [1,2] [2]`

/// Everything the plotting pipeline needs, parsed from argv.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    /// Results CSV filename (resolved under the campaign results directory).
    pub datafile: String,
    /// Swept-parameter column names, lowercase.
    pub sweep_params: Vec<String>,
    /// Metric column names to plot, lowercase, one subplot each.
    pub metrics: Vec<String>,
    /// Subplot indices rendered as filled contours (2-parameter sweeps only).
    pub contour_panels: Vec<usize>,
    /// Subplot indices with a log-scaled x axis.
    pub logx_panels: Vec<usize>,
    /// Subplot indices with a log-scaled y axis.
    pub logy_panels: Vec<usize>,
}

impl PlotRequest {
    /// Build a request from the full argv slice (`args[0]` is the program).
    pub fn from_args(args: &[String]) -> Result<PlotRequest, String> {
        if args.len() < 7 {
            return Err("incorrect number of arguments".to_string());
        }
        Ok(PlotRequest {
            datafile: args[1].clone(),
            sweep_params: parse_name_list(&args[2]),
            metrics: parse_name_list(&args[3]),
            contour_panels: parse_index_list(&args[4])?,
            logx_panels: parse_index_list(&args[5])?,
            logy_panels: parse_index_list(&args[6])?,
        })
    }
}

fn strip_brackets(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '[' || c == ']')
}

/// `[Gain,BW]` -> `["gain", "bw"]`. Column names are matched lowercase.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    strip_brackets(raw)
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

/// `[1,2]` -> `[1, 2]`. Blank entries between commas are skipped, so `[]`
/// and `` both parse to an empty list.
pub fn parse_index_list(raw: &str) -> Result<Vec<usize>, String> {
    let mut indices = Vec::new();
    for part in strip_brackets(raw).split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let index = part
            .parse::<usize>()
            .map_err(|_| format!("invalid subplot index '{}'", part))?;
        indices.push(index);
    }
    Ok(indices)
}

pub fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <csv_file> <param_name_list> <results_plot_list> \
         <contour_index_list> <logx_index_list> <logy_index_list>",
        program
    );
    eprintln!(
        "Example: {} inv_sweep_tb_sweep_results.csv [m1_w_val,m2_w_val] \
         [gain_passband_db,fc_l,fc_u,gbw] [3] [1,2] [2]",
        program
    );
}
