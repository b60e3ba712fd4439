//! Reshaping metric columns onto the 2-D sweep lattice.

use ndarray::Array2;

/// One metric reshaped onto the (x, y) sweep lattice. `z[[i, j]]` is the
/// metric at `x[i]`, `y[j]`; NaN marks points the campaign never produced.
#[derive(Debug, Clone)]
pub struct SweepGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Array2<f64>,
}

/// Ascending unique finite values of a parameter column.
pub fn unique_sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
}

/// Linear interpolation of (xs, zs) samples at xq. Samples must be in
/// ascending x order. Queries outside the sampled range return NaN; an
/// exact hit on a sample x returns the sampled z.
pub fn linear_interp(xs: &[f64], zs: &[f64], xq: f64) -> f64 {
    if xs.len() < 2 || xq < xs[0] || xq > xs[xs.len() - 1] {
        return f64::NAN;
    }
    if let Some(pos) = xs.iter().position(|&x| x == xq) {
        return zs[pos];
    }
    let hi = match xs.iter().position(|&x| x > xq) {
        Some(pos) => pos,
        None => return f64::NAN,
    };
    let lo = hi - 1;
    let t = (xq - xs[lo]) / (xs[hi] - xs[lo]);
    zs[lo] + t * (zs[hi] - zs[lo])
}

/// Reshape one metric's values onto the sweep lattice.
///
/// Expects the raw columns in table order, rows sorted by the first
/// parameter then the second; a complete campaign is then a direct
/// x-major reshape. An incomplete campaign (missing or failed runs) is
/// rebuilt curve-by-curve: for each second-parameter value, the metric is
/// linearly interpolated over the unique first-parameter values, leaving
/// cells outside the sampled range NaN and warning about the metric.
pub fn regrid_metric(name: &str, x_raw: &[f64], y_raw: &[f64], z_raw: &[f64]) -> SweepGrid {
    let x = unique_sorted(x_raw);
    let y = unique_sorted(y_raw);
    let expected = x.len() * y.len();

    if z_raw.len() == expected {
        let z = Array2::from_shape_vec((x.len(), y.len()), z_raw.to_vec())
            .expect("row count equals the lattice size");
        return SweepGrid { x, y, z };
    }

    eprintln!(
        "Warning: metric '{}': expected {} grid points but found {}.",
        name,
        expected,
        z_raw.len()
    );
    eprintln!("Hint: missing or failed simulation points; rebuilding the grid curve-by-curve.");

    let mut z = Array2::from_elem((x.len(), y.len()), f64::NAN);
    for (j, &yj) in y.iter().enumerate() {
        let mut xs = Vec::new();
        let mut zs = Vec::new();
        for ((&xr, &yr), &zr) in x_raw.iter().zip(y_raw).zip(z_raw) {
            if yr == yj {
                xs.push(xr);
                zs.push(zr);
            }
        }
        if xs.len() < 2 {
            eprintln!(
                "Skipping interpolation at y={}: not enough points.",
                fmt_g(yj, 3)
            );
            continue;
        }
        for (i, &xi) in x.iter().enumerate() {
            z[[i, j]] = linear_interp(&xs, &zs, xi);
        }
    }
    SweepGrid { x, y, z }
}

/// `%.2g`-style formatting: `sig` significant digits, scientific notation
/// for very large or small magnitudes, trailing zeros trimmed.
pub fn fmt_g(value: f64, sig: usize) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let sig = sig.max(1);
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= sig as i32 {
        trim_mantissa(&format!("{:.*e}", sig - 1, value))
    } else {
        let decimals = (sig as i32 - 1 - exponent).max(0) as usize;
        let fixed = format!("{:.*}", decimals, value);
        if fixed.contains('.') {
            fixed.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            fixed
        }
    }
}

fn trim_mantissa(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let mantissa = if mantissa.contains('.') {
                mantissa.trim_end_matches('0').trim_end_matches('.')
            } else {
                mantissa
            };
            format!("{}e{}", mantissa, exponent)
        }
        None => formatted.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_sorted_sorts_and_dedups() {
        let values = [1.2, 1.0, 1.2, 1.4, 1.0];
        assert_eq!(unique_sorted(&values), vec![1.0, 1.2, 1.4]);
    }

    #[test]
    fn unique_sorted_drops_non_finite_values() {
        let values = [1.0, f64::NAN, 2.0, f64::INFINITY];
        assert_eq!(unique_sorted(&values), vec![1.0, 2.0]);
    }

    #[test]
    fn interp_hits_midpoints_and_samples() {
        let xs = [1.0, 2.0, 4.0];
        let zs = [10.0, 20.0, 40.0];
        assert_eq!(linear_interp(&xs, &zs, 1.5), 15.0);
        assert_eq!(linear_interp(&xs, &zs, 3.0), 30.0);
        assert_eq!(linear_interp(&xs, &zs, 2.0), 20.0);
    }

    #[test]
    fn interp_does_not_extrapolate() {
        let xs = [1.0, 2.0];
        let zs = [10.0, 20.0];
        assert!(linear_interp(&xs, &zs, 0.5).is_nan());
        assert!(linear_interp(&xs, &zs, 2.5).is_nan());
    }

    #[test]
    fn interp_needs_two_samples() {
        assert!(linear_interp(&[1.0], &[10.0], 1.0).is_nan());
        assert!(linear_interp(&[], &[], 1.0).is_nan());
    }

    #[test]
    fn complete_campaign_is_a_direct_reshape() {
        // Rows sorted x-primary: (x, y) = (1,10) (1,20) (2,10) (2,20).
        let x_raw = [1.0, 1.0, 2.0, 2.0];
        let y_raw = [10.0, 20.0, 10.0, 20.0];
        let z_raw = [0.1, 0.2, 0.3, 0.4];
        let grid = regrid_metric("m", &x_raw, &y_raw, &z_raw);

        assert_eq!(grid.x, vec![1.0, 2.0]);
        assert_eq!(grid.y, vec![10.0, 20.0]);
        assert_eq!(grid.z[[0, 0]], 0.1);
        assert_eq!(grid.z[[0, 1]], 0.2);
        assert_eq!(grid.z[[1, 0]], 0.3);
        assert_eq!(grid.z[[1, 1]], 0.4);
    }

    #[test]
    fn incomplete_campaign_interpolates_interior_points() {
        // 3x2 lattice with (2,10) missing: the y=10 curve keeps x=1 and
        // x=3, so the middle point is interpolated.
        let x_raw = [1.0, 1.0, 2.0, 3.0, 3.0];
        let y_raw = [10.0, 20.0, 20.0, 10.0, 20.0];
        let z_raw = [10.0, 1.0, 2.0, 30.0, 3.0];
        let grid = regrid_metric("m", &x_raw, &y_raw, &z_raw);

        assert_eq!(grid.x, vec![1.0, 2.0, 3.0]);
        assert_eq!(grid.y, vec![10.0, 20.0]);
        assert_eq!(grid.z[[0, 0]], 10.0);
        assert_eq!(grid.z[[1, 0]], 20.0); // interpolated
        assert_eq!(grid.z[[2, 0]], 30.0);
        assert_eq!(grid.z[[1, 1]], 2.0);
    }

    #[test]
    fn incomplete_campaign_leaves_uncovered_cells_nan() {
        // The y=10 curve only covers x in [1, 2]; x=3 is out of range.
        let x_raw = [1.0, 1.0, 2.0, 2.0, 3.0];
        let y_raw = [10.0, 20.0, 10.0, 20.0, 20.0];
        let z_raw = [10.0, 1.0, 20.0, 2.0, 3.0];
        let grid = regrid_metric("m", &x_raw, &y_raw, &z_raw);

        assert!(grid.z[[2, 0]].is_nan());
        assert_eq!(grid.z[[2, 1]], 3.0);
    }

    #[test]
    fn single_sample_curve_stays_nan() {
        // Only one point at y=10: interpolation is skipped entirely.
        let x_raw = [1.0, 1.0, 2.0];
        let y_raw = [10.0, 20.0, 20.0];
        let z_raw = [5.0, 1.0, 2.0];
        let grid = regrid_metric("m", &x_raw, &y_raw, &z_raw);

        assert!(grid.z[[0, 0]].is_nan());
        assert!(grid.z[[1, 0]].is_nan());
        assert_eq!(grid.z[[0, 1]], 1.0);
        assert_eq!(grid.z[[1, 1]], 2.0);
    }

    #[test]
    fn fmt_g_matches_general_format() {
        assert_eq!(fmt_g(0.123456, 2), "0.12");
        assert_eq!(fmt_g(5.0, 2), "5");
        assert_eq!(fmt_g(1234.0, 2), "1.2e3");
        assert_eq!(fmt_g(100.0, 2), "1e2");
        assert_eq!(fmt_g(0.0000123, 3), "1.23e-5");
        assert_eq!(fmt_g(-0.5, 2), "-0.5");
        assert_eq!(fmt_g(0.0, 2), "0");
        assert_eq!(fmt_g(f64::NAN, 2), "NaN");
    }
}
