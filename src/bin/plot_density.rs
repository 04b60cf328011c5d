use anyhow::Context;
use log::info;

use neutrino_eda::analysis::density::{density_grid, track_positions, GaussianKde2D};
use neutrino_eda::config::{self, DensityConfig};
use neutrino_eda::data::loader;

fn main() -> anyhow::Result<()> {
    config::init_logging();
    let cfg = DensityConfig::default();

    info!("Loading database...");
    let table = loader::load_events(&cfg.input_files).context("loading events")?;

    info!("Extracting muon data...");
    let (xs, ys) = track_positions(&table, cfg.datapoint_count)?;

    info!("Plotting density...");
    let kde = GaussianKde2D::new(&xs, &ys)?;
    let grid = density_grid(&kde, cfg.x_range, cfg.y_range, cfg.gridsize);

    if let Some(parent) = cfg.output_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    grid.write_csv(&cfg.output_file)
        .with_context(|| format!("writing {}", cfg.output_file.display()))?;
    Ok(())
}
