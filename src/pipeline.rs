//! The training run: preprocess (or reuse the snapshot), split, fit, save.

use log::info;

use crate::balance::equalize::equal_entries;
use crate::balance::split::train_test_balanced;
use crate::classifier::{self, ModelArtifact};
use crate::config::TrainConfig;
use crate::data::model::Table;
use crate::data::{catalog, filter, loader};
use crate::error::Result;
use crate::normalize::normalise;

/// Load the raw files and run every preprocessing stage.
pub fn preprocess(config: &TrainConfig) -> Result<Table> {
    info!("Loading dataframe");
    let table = loader::load_events(&config.input_files)?;

    info!("Excluding unused data");
    let table = table.select_columns(catalog::USED_COLUMNS)?;

    let (mut table, _) = filter::drop_missing(table);

    if config.equalise {
        info!("Equalizing distribution per particle");
        table = equal_entries(&config.equalised_columns, &table, catalog::USED_COLUMNS)?;
    }

    info!("Normalising data");
    normalise(&table, &config.excluded_columns)
}

/// Reuse the snapshot when it exists, otherwise preprocess and write it.
pub fn load_or_preprocess(config: &TrainConfig) -> Result<Table> {
    if config.snapshot_file.is_file() {
        info!("Loading preprocessed data");
        return loader::read_snapshot(&config.snapshot_file);
    }
    let table = preprocess(config)?;
    loader::write_snapshot(&table, &config.snapshot_file)?;
    Ok(table)
}

/// Full training run. The artifact is only written once training succeeded.
pub fn run_training(config: &TrainConfig) -> Result<ModelArtifact> {
    let table = load_or_preprocess(config)?;

    info!("Dividing data into training and validation sets");
    let split = train_test_balanced(
        &table,
        &config.equalised_columns,
        &config.train_columns(),
        &config.split,
    )?;

    let artifact = classifier::train(&split, &config.trainer)?;
    classifier::save_artifact(&artifact, &config.model_file)?;
    Ok(artifact)
}
