use std::path::Path;

use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Closed interval `[min, max]` binned into equal-width bins.
pub type Range = (f64, f64);

/// Equal-width 1-D histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

/// Equal-width 2-D histogram, `counts[ix][iy]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    pub counts: Vec<Vec<u64>>,
}

#[derive(Serialize)]
struct BinRow {
    low: f64,
    high: f64,
    count: u64,
}

#[derive(Serialize)]
struct CellRow {
    x_low: f64,
    x_high: f64,
    y_low: f64,
    y_high: f64,
    count: u64,
}

fn data_range(values: &[f64]) -> Option<Range> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (min <= max).then_some((min, max))
}

fn edges(bins: usize, (min, max): Range) -> Vec<f64> {
    // a single distinct value still gets a bin of width 1 around it
    let (min, max) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (max - min) / bins as f64;
    (0..=bins).map(|i| min + width * i as f64).collect()
}

/// Bin index of `v`; the right edge belongs to the last bin.
fn bin_of(v: f64, edges: &[f64]) -> Option<usize> {
    let bins = edges.len() - 1;
    let (min, max) = (edges[0], edges[bins]);
    if !v.is_finite() || v < min || v > max {
        return None;
    }
    let idx = ((v - min) / (max - min) * bins as f64) as usize;
    Some(idx.min(bins - 1))
}

fn check_bins(bins: usize) -> Result<()> {
    if bins == 0 {
        return Err(PipelineError::InvalidConfig(
            "a histogram needs at least one bin".into(),
        ));
    }
    Ok(())
}

impl Histogram1D {
    /// Bin `values`. Without an explicit `range` the data's own min/max are
    /// used; with one, values outside it are dropped.
    pub fn from_values(values: &[f64], bins: usize, range: Option<Range>) -> Result<Self> {
        check_bins(bins)?;
        let range = range.or_else(|| data_range(values)).unwrap_or((0.0, 1.0));
        let edges = edges(bins, range);
        let mut counts = vec![0; bins];
        for &v in values {
            if let Some(i) = bin_of(v, &edges) {
                counts[i] += 1;
            }
        }
        Ok(Histogram1D { edges, counts })
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (i, &count) in self.counts.iter().enumerate() {
            writer.serialize(BinRow {
                low: self.edges[i],
                high: self.edges[i + 1],
                count,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Histogram2D {
    /// Bin `(xs[i], ys[i])` pairs on a `bins × bins` grid.
    pub fn from_pairs(
        xs: &[f64],
        ys: &[f64],
        bins: usize,
        range: Option<(Range, Range)>,
    ) -> Result<Self> {
        check_bins(bins)?;
        if xs.len() != ys.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "x and y have different lengths ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        let (x_range, y_range) = match range {
            Some(r) => r,
            None => (
                data_range(xs).unwrap_or((0.0, 1.0)),
                data_range(ys).unwrap_or((0.0, 1.0)),
            ),
        };
        let x_edges = edges(bins, x_range);
        let y_edges = edges(bins, y_range);
        let mut counts = vec![vec![0; bins]; bins];
        for (&x, &y) in xs.iter().zip(ys) {
            if let (Some(ix), Some(iy)) = (bin_of(x, &x_edges), bin_of(y, &y_edges)) {
                counts[ix][iy] += 1;
            }
        }
        Ok(Histogram2D {
            x_edges,
            y_edges,
            counts,
        })
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (ix, column) in self.counts.iter().enumerate() {
            for (iy, &count) in column.iter().enumerate() {
                writer.serialize(CellRow {
                    x_low: self.x_edges[ix],
                    x_high: self.x_edges[ix + 1],
                    y_low: self.y_edges[iy],
                    y_high: self.y_edges[iy + 1],
                    count,
                })?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_value_in_data_range() {
        let h = Histogram1D::from_values(&[0.0, 1.0, 2.0, 3.0, 4.0], 4, None).unwrap();
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // the maximum lands in the last bin
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
    }

    #[test]
    fn explicit_range_drops_outliers() {
        let h = Histogram1D::from_values(&[-5.0, 0.5, 1.5, 50.0, f64::NAN], 2, Some((0.0, 2.0)))
            .unwrap();
        assert_eq!(h.counts, vec![1, 1]);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn constant_data_gets_one_wide_bin() {
        let h = Histogram1D::from_values(&[3.0, 3.0], 1, None).unwrap();
        assert_eq!(h.edges, vec![2.5, 3.5]);
        assert_eq!(h.counts, vec![2]);
    }

    #[test]
    fn zero_bins_is_invalid() {
        assert!(Histogram1D::from_values(&[1.0], 0, None).is_err());
    }

    #[test]
    fn pairs_fill_the_grid() {
        let xs = [0.0, 0.0, 10.0, 5.0];
        let ys = [-10.0, 0.0, 0.0, -5.0];
        let h = Histogram2D::from_pairs(&xs, &ys, 2, None).unwrap();
        assert_eq!(h.total(), 4);
        assert_eq!(h.counts[0][0], 1);
        assert_eq!(h.counts[0][1], 1);
        assert_eq!(h.counts[1][1], 2);

        let clipped =
            Histogram2D::from_pairs(&xs, &ys, 2, Some(((0.0, 5.0), (-5.0, 0.0)))).unwrap();
        assert_eq!(clipped.total(), 2);
    }

    #[test]
    fn mismatched_pairs_are_rejected() {
        assert!(Histogram2D::from_pairs(&[1.0], &[], 3, None).is_err());
    }
}
