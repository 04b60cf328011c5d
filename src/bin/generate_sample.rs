use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use neutrino_eda::config::{self, LikelihoodConfig, TrainConfig};

/// Box-Muller transform for a normal deviate.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Raw float columns and how their mean shifts for track-like events.
/// (name, shower mean, track mean, spread)
const FEATURES: &[(&str, f64, f64, f64)] = &[
    ("angle_shfit_gandalf", 0.6, 0.2, 0.2),
    ("distance_shfit_gandalf", 30.0, 80.0, 20.0),
    ("dt_shfit_gandalf", 50.0, 250.0, 60.0),
    ("E.trks.lik[:,0]", 40.0, 120.0, 30.0),
    ("E.trks.lik[:,1]", -110.0, -40.0, 30.0),
    ("E.trks.len[:,0]", 20.0, 300.0, 80.0),
    ("E.trks.dir.x[:,0]", 0.0, 0.0, 0.5),
    ("E.trks.dir.y[:,0]", 0.0, 0.0, 0.5),
    ("E.trks.dir.z[:,0]", 0.1, -0.3, 0.5),
    ("E.trks.pos.x[:,0]", 450.0, 450.0, 60.0),
    ("E.trks.pos.y[:,0]", 575.0, 575.0, 50.0),
    ("E.trks.pos.z[:,0]", 100.0, 100.0, 40.0),
    ("E.trks.dir.x[:,1]", 0.0, 0.0, 0.5),
    ("E.trks.dir.y[:,1]", 0.0, 0.0, 0.5),
    ("E.trks.dir.z[:,1]", 0.1, -0.3, 0.5),
    ("E.trks.pos.x[:,1]", 450.0, 450.0, 60.0),
    ("E.trks.pos.y[:,1]", 575.0, 575.0, 50.0),
    ("E.trks.pos.z[:,1]", 100.0, 100.0, 40.0),
    ("T.feat_Neutrino2020.cherCond_n_doms", 12.0, 25.0, 5.0),
    ("T.feat_Neutrino2020.gandalf_nHits", 40.0, 90.0, 15.0),
    ("T.sum_mc_nu.by", 0.5, 0.3, 0.2),
    ("energy", 9000.0, 11000.0, 3000.0),
];

const PDGIDS: [i64; 6] = [12, -12, 14, -14, 16, -16];

fn write_events(path: &Path, n_events: usize, rng: &mut StdRng) -> Result<()> {
    let mut run_numbers = Vec::with_capacity(n_events);
    let mut pdgids = Vec::with_capacity(n_events);
    let mut is_cc = Vec::with_capacity(n_events);
    let mut features: Vec<Vec<f64>> = vec![Vec::with_capacity(n_events); FEATURES.len()];

    for event in 0..n_events {
        let pdgid = PDGIDS[rng.gen_range(0..PDGIDS.len())];
        let cc = if rng.gen_bool(0.7) { 1.0 } else { 0.0 };
        let track = pdgid.abs() == 14 && cc == 1.0;

        run_numbers.push(event as i64);
        pdgids.push(pdgid);
        is_cc.push(cc);
        for (column, &(_, shower_mean, track_mean, spread)) in features.iter_mut().zip(FEATURES) {
            let mean = if track { track_mean } else { shower_mean };
            column.push(gauss(rng, mean, spread));
        }
    }

    let mut fields = vec![
        Field::new("Unnamed: 0", DataType::Int64, false),
        Field::new("pdgid", DataType::Int64, false),
        Field::new("is_cc", DataType::Float64, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(run_numbers)),
        Arc::new(Int64Array::from(pdgids)),
        Arc::new(Float64Array::from(is_cc)),
    ];
    for ((name, ..), column) in FEATURES.iter().zip(features) {
        fields.push(Field::new(*name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from(column)));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    info!("Wrote {n_events} events to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    config::init_logging();
    let mut rng = StdRng::seed_from_u64(42);

    let mut paths = TrainConfig::default().input_files;
    paths.extend(LikelihoodConfig::default().input_files);
    for path in &paths {
        write_events(path, 2000, &mut rng)?;
    }

    println!("Wrote {} sample event files", paths.len());
    Ok(())
}
