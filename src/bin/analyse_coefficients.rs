use anyhow::Context;

use neutrino_eda::classifier::load_artifact;
use neutrino_eda::config::{self, TrainConfig};

fn main() -> anyhow::Result<()> {
    config::init_logging();
    let model_file = TrainConfig::default().model_file;

    let artifact = load_artifact(&model_file)
        .with_context(|| format!("reading model {}", model_file.display()))?;

    println!("Absolute values of the coefficients used in the SVM classifier");
    let width = artifact
        .feature_names
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0);
    for (name, weight) in artifact.coefficient_ranking() {
        println!("{name:<width$}  {weight:>10.4}");
    }
    println!(
        "validation accuracy {:.4} ({} training / {} validation events)",
        artifact.validation_accuracy, artifact.training_samples, artifact.validation_samples
    );
    Ok(())
}
