use anyhow::Context;
use log::info;

use neutrino_eda::config::{self, TrainConfig};
use neutrino_eda::pipeline;

fn main() -> anyhow::Result<()> {
    config::init_logging();

    let cfg = TrainConfig::default();
    info!("Configuration: {}", serde_json::to_string(&cfg)?);

    let artifact = pipeline::run_training(&cfg).context("training run failed")?;

    println!("Score: {}", artifact.validation_accuracy);
    Ok(())
}
