use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::balance::split::SplitConfig;
use crate::classifier::TrainerConfig;
use crate::data::catalog;

// ---------------------------------------------------------------------------
// Run configurations
// ---------------------------------------------------------------------------

fn data_files(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|n| PathBuf::from("data").join(n)).collect()
}

/// Settings of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub input_files: Vec<PathBuf>,
    /// Preprocessed table; reused when present, written otherwise.
    pub snapshot_file: PathBuf,
    pub model_file: PathBuf,
    /// Columns left out of normalisation and training.
    pub excluded_columns: Vec<String>,
    pub equalise: bool,
    /// Grouping used by both the equaliser and the balanced split.
    pub equalised_columns: Vec<String>,
    pub split: SplitConfig,
    pub trainer: TrainerConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            input_files: data_files(&[
                "neutrino11x.parquet",
                "neutrino12x.parquet",
                "neutrino13x.parquet",
            ]),
            snapshot_file: PathBuf::from("data").join("neutrino_processed.parquet"),
            model_file: PathBuf::from("models").join("model.json"),
            excluded_columns: vec![
                catalog::IS_SHOWER.into(),
                catalog::PARTICLE_NAME.into(),
                catalog::INELASTICITY.into(),
                catalog::IS_CC.into(),
            ],
            equalise: true,
            equalised_columns: vec![catalog::PARTICLE_NAME.into(), catalog::IS_CC.into()],
            split: SplitConfig::default(),
            trainer: TrainerConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Used columns that are fed to the classifier.
    pub fn train_columns(&self) -> Vec<String> {
        catalog::USED_COLUMNS
            .iter()
            .filter(|c| !self.excluded_columns.iter().any(|e| e == *c))
            .map(|c| c.to_string())
            .collect()
    }
}

/// Settings of the likelihood overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodConfig {
    pub input_files: Vec<PathBuf>,
    pub energy_min: f64,
    pub output_dir: PathBuf,
}

impl Default for LikelihoodConfig {
    fn default() -> Self {
        Self {
            input_files: data_files(&["newsel.parquet"]),
            energy_min: 9000.0,
            output_dir: PathBuf::from("plots").join("likelihood"),
        }
    }
}

/// Settings of the track-position density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityConfig {
    pub input_files: Vec<PathBuf>,
    pub gridsize: usize,
    pub datapoint_count: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub output_file: PathBuf,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            input_files: data_files(&[
                "neutrino11x.parquet",
                "neutrino12x.parquet",
                "neutrino13x.parquet",
            ]),
            gridsize: 100,
            datapoint_count: 1000,
            x_range: (300.0, 600.0),
            y_range: (450.0, 700.0),
            output_file: PathBuf::from("plots").join("track_density.csv"),
        }
    }
}

/// Initialise `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_columns_skip_excluded() {
        let cfg = TrainConfig::default();
        let cols = cfg.train_columns();
        assert!(!cols.iter().any(|c| c == catalog::IS_SHOWER));
        assert!(!cols.iter().any(|c| c == catalog::INELASTICITY));
        assert!(cols.iter().any(|c| c == catalog::TRACK_LIKELIHOOD));
        assert_eq!(cols.len(), catalog::USED_COLUMNS.len() - 4);
    }

    #[test]
    fn config_serialises() {
        let cfg = TrainConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
        assert!(back.split.seed.is_none());
    }
}
