use std::f64::consts::PI;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use super::histogram::Range;
use crate::data::catalog;
use crate::data::filter;
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};

/// Two-dimensional Gaussian kernel density estimate with a full covariance
/// kernel scaled by Scott's factor `n^(-1/6)`.
#[derive(Debug, Clone)]
pub struct GaussianKde2D {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Inverse of the kernel covariance, `[[a, b], [b, c]]`.
    inv_cov: [f64; 3],
    norm: f64,
}

impl GaussianKde2D {
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "x and y have different lengths ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        let n = xs.len();
        if n < 2 {
            return Err(PipelineError::InvalidConfig(
                "a density estimate needs at least two points".into(),
            ));
        }

        let nf = n as f64;
        let mean_x = xs.iter().sum::<f64>() / nf;
        let mean_y = ys.iter().sum::<f64>() / nf;
        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for (&x, &y) in xs.iter().zip(ys) {
            let (dx, dy) = (x - mean_x, y - mean_y);
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }
        let factor2 = nf.powf(-1.0 / 6.0).powi(2);
        let (cxx, cxy, cyy) = (
            sxx / (nf - 1.0) * factor2,
            sxy / (nf - 1.0) * factor2,
            syy / (nf - 1.0) * factor2,
        );

        let det = cxx * cyy - cxy * cxy;
        if !(det.is_finite() && det > 0.0) {
            return Err(PipelineError::InvalidConfig(
                "points are collinear, kernel covariance is singular".into(),
            ));
        }
        debug!("KDE bandwidth covariance [[{cxx}, {cxy}], [{cxy}, {cyy}]]");

        Ok(GaussianKde2D {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            inv_cov: [cyy / det, -cxy / det, cxx / det],
            norm: 1.0 / (2.0 * PI * det.sqrt() * nf),
        })
    }

    /// Estimated density at `(x, y)`.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let [a, b, c] = self.inv_cov;
        let sum: f64 = self
            .xs
            .iter()
            .zip(&self.ys)
            .map(|(&xi, &yi)| {
                let (dx, dy) = (x - xi, y - yi);
                (-0.5 * (a * dx * dx + 2.0 * b * dx * dy + c * dy * dy)).exp()
            })
            .sum();
        sum * self.norm
    }
}

/// Density sampled on an evenly spaced, endpoint-inclusive mesh.
#[derive(Debug, Clone)]
pub struct DensityGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// `values[ix][iy]` is the density at `(xs[ix], ys[iy])`.
    pub values: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct GridRow {
    x: f64,
    y: f64,
    density: f64,
}

fn linspace((min, max): Range, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            (0..n).map(|i| min + step * i as f64).collect()
        }
    }
}

pub fn density_grid(kde: &GaussianKde2D, x_range: Range, y_range: Range, gridsize: usize) -> DensityGrid {
    let xs = linspace(x_range, gridsize);
    let ys = linspace(y_range, gridsize);
    let values = xs
        .iter()
        .map(|&x| ys.iter().map(|&y| kde.evaluate(x, y)).collect())
        .collect();
    DensityGrid { xs, ys, values }
}

impl DensityGrid {
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (ix, &x) in self.xs.iter().enumerate() {
            for (iy, &y) in self.ys.iter().enumerate() {
                writer.serialize(GridRow {
                    x,
                    y,
                    density: self.values[ix][iy],
                })?;
            }
        }
        writer.flush()?;
        info!("Wrote {}×{} density grid to {}", self.xs.len(), self.ys.len(), path.display());
        Ok(())
    }
}

/// Track x/y positions of the first `limit` track events.
pub fn track_positions(table: &Table, limit: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    let tracks = filter::filter_rows(table, catalog::IS_SHOWER, |v| *v == Value::Bool(false))?;
    let first: Vec<usize> = (0..tracks.len().min(limit)).collect();
    let tracks = tracks.take_rows(&first);
    info!("Using {} track events for the density", tracks.len());
    Ok((
        tracks.numeric_column(catalog::TRACK_X)?,
        tracks.numeric_column(catalog::TRACK_Y)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> (Vec<f64>, Vec<f64>) {
        let xs = vec![0.0, 1.0, -1.0, 0.5, -0.5, 0.2, -0.3, 0.8];
        let ys = vec![0.0, 0.4, -0.2, -0.9, 0.7, 0.1, -0.5, 0.3];
        (xs, ys)
    }

    #[test]
    fn density_peaks_near_the_data() {
        let (xs, ys) = cloud();
        let kde = GaussianKde2D::new(&xs, &ys).unwrap();
        let centre = kde.evaluate(0.0, 0.0);
        let far = kde.evaluate(10.0, 10.0);
        assert!(centre > 0.0);
        assert!(far < centre * 1e-6);
    }

    #[test]
    fn density_integrates_to_one() {
        let (xs, ys) = cloud();
        let kde = GaussianKde2D::new(&xs, &ys).unwrap();
        let n = 161;
        let grid = density_grid(&kde, (-4.0, 4.0), (-4.0, 4.0), n);
        let cell = (8.0 / (n - 1) as f64).powi(2);
        let integral: f64 = grid.values.iter().flatten().sum::<f64>() * cell;
        assert!((integral - 1.0).abs() < 0.02, "integral {integral}");
    }

    #[test]
    fn grid_includes_endpoints() {
        let (xs, ys) = cloud();
        let kde = GaussianKde2D::new(&xs, &ys).unwrap();
        let grid = density_grid(&kde, (300.0, 600.0), (450.0, 700.0), 4);
        assert_eq!(grid.xs, vec![300.0, 400.0, 500.0, 600.0]);
        assert_eq!(grid.ys.last(), Some(&700.0));
        assert_eq!(grid.values.len(), 4);
        assert!(grid.values.iter().all(|col| col.len() == 4));
    }

    #[test]
    fn collinear_points_are_rejected() {
        assert!(GaussianKde2D::new(&[0.0, 1.0, 2.0], &[0.0, 2.0, 4.0]).is_err());
        assert!(GaussianKde2D::new(&[0.0], &[0.0]).is_err());
    }

    #[test]
    fn picks_leading_track_events() {
        let t = Table::from_columns(vec![
            (
                catalog::IS_SHOWER.into(),
                vec![true.into(), false.into(), false.into(), false.into()],
            ),
            (
                catalog::TRACK_X.into(),
                vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()],
            ),
            (
                catalog::TRACK_Y.into(),
                vec![5.0.into(), 6.0.into(), 7.0.into(), 8.0.into()],
            ),
        ])
        .unwrap();
        let (xs, ys) = track_positions(&t, 2).unwrap();
        assert_eq!(xs, vec![2.0, 3.0]);
        assert_eq!(ys, vec![6.0, 7.0]);
    }
}
