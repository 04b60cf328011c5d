use anyhow::Context;
use log::info;

use neutrino_eda::analysis::likelihood::{likelihood_panels, prepare_likelihood, write_panels};
use neutrino_eda::config::{self, LikelihoodConfig};
use neutrino_eda::data::loader;

fn main() -> anyhow::Result<()> {
    config::init_logging();
    let cfg = LikelihoodConfig::default();

    info!("Loading dataframe");
    let table = loader::load_events(&cfg.input_files).context("loading events")?;

    let data = prepare_likelihood(table, cfg.energy_min)?;
    let (x_max, y_max) = data.abs_max();
    info!("The maximum absolute value of track likelihood is {x_max}");
    info!("The maximum absolute value of shower likelihood is {y_max}");

    let panels = likelihood_panels(&data)?;
    write_panels(&panels, &cfg.output_dir)
        .with_context(|| format!("writing panels to {}", cfg.output_dir.display()))?;

    println!(
        "Likelihood histograms with energy > {} ({} events) in {}",
        cfg.energy_min,
        data.len(),
        cfg.output_dir.display()
    );
    Ok(())
}
