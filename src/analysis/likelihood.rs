use std::path::Path;

use log::info;

use super::histogram::{Histogram1D, Histogram2D, Range};
use crate::data::catalog;
use crate::data::filter;
use crate::data::model::Table;
use crate::error::Result;

pub const LIKELIHOOD_TRACK: &str = "Likelihood track";
pub const LIKELIHOOD_SHOWER: &str = "Likelihood shower";

/// Track and shower likelihoods of the events above an energy cut.
#[derive(Debug, Clone)]
pub struct LikelihoodData {
    pub energy_min: f64,
    pub track: Vec<f64>,
    pub shower: Vec<f64>,
}

impl LikelihoodData {
    pub fn len(&self) -> usize {
        self.track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    /// Largest absolute track and shower likelihoods.
    pub fn abs_max(&self) -> (f64, f64) {
        let max_abs = |v: &[f64]| v.iter().fold(0.0f64, |m, x| m.max(x.abs()));
        (max_abs(&self.track), max_abs(&self.shower))
    }

    /// End points of the reference line from the origin to
    /// `(max |track|, -max |shower|)` drawn over the 2-D histograms.
    pub fn reference_line(&self) -> [(f64, f64); 2] {
        let (x, y) = self.abs_max();
        [(0.0, 0.0), (x, -y)]
    }
}

/// Keep complete events above `energy_min` and pull out the two likelihoods.
pub fn prepare_likelihood(table: Table, energy_min: f64) -> Result<LikelihoodData> {
    let (table, _) = filter::drop_missing(table);

    info!("Only retaining relevant columns related to likelihood and energy");
    let table = table.select_columns(&[
        catalog::TRACK_LIKELIHOOD,
        catalog::SHOWER_LIKELIHOOD,
        catalog::ENERGY,
    ])?;

    info!("Dropping low-energy values below {energy_min}");
    let table = filter::above(&table, catalog::ENERGY, energy_min)?;

    Ok(LikelihoodData {
        energy_min,
        track: table.numeric_column(catalog::TRACK_LIKELIHOOD)?,
        shower: table.numeric_column(catalog::SHOWER_LIKELIHOOD)?,
    })
}

/// One histogram panel of the likelihood overview.
#[derive(Debug, Clone)]
pub enum Panel {
    Track(Histogram1D),
    Shower(Histogram1D),
    Joint {
        name: &'static str,
        hist: Histogram2D,
    },
}

/// Zoomed views on the (track, shower) plane: name, bins, range.
const JOINT_VIEWS: &[(&str, usize, Option<(Range, Range)>)] = &[
    ("joint_100", 100, None),
    ("joint_300", 300, None),
    ("joint_300_zoom200", 300, Some(((0.0, 200.0), (-200.0, 0.0)))),
    ("joint_100_zoom100", 100, Some(((0.0, 100.0), (-100.0, 0.0)))),
    ("joint_100_core", 100, Some(((20.0, 75.0), (-125.0, -25.0)))),
];

/// Bins of the 1-D likelihood histograms.
pub const HIST_BINS: usize = 10;

pub fn likelihood_panels(data: &LikelihoodData) -> Result<Vec<Panel>> {
    let mut panels = vec![
        Panel::Track(Histogram1D::from_values(&data.track, HIST_BINS, None)?),
        Panel::Shower(Histogram1D::from_values(&data.shower, HIST_BINS, None)?),
    ];
    for &(name, bins, range) in JOINT_VIEWS {
        panels.push(Panel::Joint {
            name,
            hist: Histogram2D::from_pairs(&data.track, &data.shower, bins, range)?,
        });
    }
    Ok(panels)
}

/// Write each panel to `<dir>/<panel>.csv`.
pub fn write_panels(panels: &[Panel], dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for panel in panels {
        match panel {
            Panel::Track(h) => h.write_csv(&dir.join("track_likelihood.csv"))?,
            Panel::Shower(h) => h.write_csv(&dir.join("shower_likelihood.csv"))?,
            Panel::Joint { name, hist } => hist.write_csv(&dir.join(format!("{name}.csv")))?,
        }
    }
    info!("Wrote {} likelihood panels to {}", panels.len(), dir.display());
    Ok(())
}
