//! Linear SVM training on a balanced split, and the model artifact that
//! records what was learned.

use std::path::Path;

use linfa::prelude::*;
use linfa_svm::Svm;
use log::{debug, info};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::balance::split::SplitSet;
use crate::data::model::Table;
use crate::error::{PipelineError, Result, SchemaError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Soft-margin penalty, applied to both classes.
    pub c: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self { c: 1.0 }
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// Everything kept from a training run: the features the model expects,
/// its linear decision function and how well it scored.
///
/// An event is classified as a shower when
/// `coefficients · features + intercept >= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub validation_accuracy: f64,
    pub training_samples: usize,
    pub validation_samples: usize,
}

impl ModelArtifact {
    pub fn decision(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    pub fn predict(&self, features: &[f64]) -> bool {
        self.decision(features) >= 0.0
    }

    /// Features ordered by the magnitude of their coefficient, largest first.
    pub fn coefficient_ranking(&self) -> Vec<(String, f64)> {
        let mut ranking: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.coefficients.iter().map(|w| w.abs()))
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }
}

pub fn save_artifact(artifact: &ModelArtifact, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, json)?;
    info!("Saving model at {}", path.display());
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<ModelArtifact> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// Dense row-major feature matrix. Booleans become 0/1.
pub fn to_matrix(features: &Table) -> Result<Array2<f64>> {
    let n_cols = features.column_names.len();
    let mut data = Vec::with_capacity(features.len() * n_cols);
    for (row, rec) in features.rows.iter().enumerate() {
        for (col, value) in rec.values.iter().enumerate() {
            let x = value.as_f64().ok_or_else(|| SchemaError::NotNumeric {
                column: features.column_names[col].clone(),
                row,
                found: value.to_string(),
            })?;
            data.push(x);
        }
    }
    Array2::from_shape_vec((features.len(), n_cols), data)
        .map_err(|e| PipelineError::Model(e.to_string()))
}

/// Fit a linear SVM on the training half and score it on the validation half.
///
/// The solver holds the dense `n × n` kernel matrix of the training rows, so
/// memory grows quadratically with the training set.
pub fn train(split: &SplitSet, config: &TrainerConfig) -> Result<ModelArtifact> {
    if split.y_train.is_empty() || split.y_valid.is_empty() {
        return Err(PipelineError::Model(
            "training and validation sets must both be non-empty".into(),
        ));
    }
    if split.y_train.iter().all(|&y| y) || split.y_train.iter().all(|&y| !y) {
        return Err(PipelineError::Model(
            "training labels contain a single class".into(),
        ));
    }

    info!("Training samples:\t{}", split.y_train.len());
    info!("Validation samples:\t{}", split.y_valid.len());

    let x_train = to_matrix(&split.x_train)?;
    let x_valid = to_matrix(&split.x_valid)?;
    let dataset = Dataset::new(x_train.clone(), Array1::from(split.y_train.clone()));

    info!("Training model");
    let model = Svm::<f64, bool>::params()
        .pos_neg_weights(config.c, config.c)
        .linear_kernel()
        .fit(&dataset)
        .map_err(|e| PipelineError::Model(e.to_string()))?;
    debug!("Model uses {} support vectors", model.nsupport());

    let predictions: Array1<bool> = model.predict(&x_valid);
    let accuracy = accuracy(predictions.iter().copied(), &split.y_valid);
    info!("Score: {accuracy}");

    // The dual weights are signed by class, so the hyperplane normal of a
    // linear kernel is their weighted sum of training rows.
    if model.alpha.len() != x_train.nrows() {
        return Err(PipelineError::Model(format!(
            "expected {} dual weights, model has {}",
            x_train.nrows(),
            model.alpha.len()
        )));
    }
    let alpha = Array1::from(model.alpha.clone());
    let coefficients = x_train.t().dot(&alpha);

    Ok(ModelArtifact {
        feature_names: split.x_train.column_names.clone(),
        coefficients: coefficients.to_vec(),
        intercept: -model.rho,
        validation_accuracy: accuracy,
        training_samples: split.y_train.len(),
        validation_samples: split.y_valid.len(),
    })
}

/// Share of predictions that equal their label.
pub fn accuracy<I: IntoIterator<Item = bool>>(predictions: I, labels: &[bool]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .into_iter()
        .zip(labels)
        .filter(|(p, y)| p == *y)
        .count();
    correct as f64 / labels.len() as f64
}
