use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::groups::group_rows;
use crate::data::catalog;
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result, SchemaError};

const FRACTION_EPSILON: f64 = 1e-9;

/// How each group is divided between training and validation.
///
/// Without a `seed` the shuffle draws from OS entropy, so two runs produce
/// different splits. Set a seed whenever the split must be reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Share of every group that goes to training.
    pub train_fraction: f64,
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.75,
            seed: None,
        }
    }
}

impl SplitConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "train_fraction must lie in (0, 1), got {}",
                self.train_fraction
            )));
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Validation rows for a group of `n`: whatever is left once training
    /// takes `floor(n * train_fraction)` rows.
    fn validation_size(&self, n: usize) -> usize {
        // 10 * 0.7 may land a hair below 7.0
        let n_train = (n as f64 * self.train_fraction + FRACTION_EPSILON).floor() as usize;
        n - n_train.min(n)
    }
}

/// Row indices of the training and validation halves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

/// Feature tables and shower/track labels of both halves.
#[derive(Debug, Clone)]
pub struct SplitSet {
    pub x_train: Table,
    pub x_valid: Table,
    pub y_train: Vec<bool>,
    pub y_valid: Vec<bool>,
}

/// Split every group of `group_columns` independently, so each group is
/// represented in training and validation with the same proportions.
///
/// Rows are shuffled within their group before the cut. Groups are
/// concatenated in group-key order.
pub fn split_indices<S: AsRef<str>>(
    table: &Table,
    group_columns: &[S],
    config: &SplitConfig,
) -> Result<SplitIndices> {
    config.validate()?;
    let mut rng = config.rng();
    let mut split = SplitIndices::default();

    for (key, mut rows) in group_rows(table, group_columns)? {
        if rows.len() < 2 {
            warn!("Group {key:?} has a single event, it goes to validation only");
        }
        rows.shuffle(&mut rng);
        let n_valid = config.validation_size(rows.len());
        let train = rows.split_off(n_valid);
        debug!(
            "Group {key:?}: {} training, {} validation",
            train.len(),
            rows.len()
        );
        split.valid.extend(rows);
        split.train.extend(train);
    }

    Ok(split)
}

/// Balanced train/validation split returning feature tables and labels.
///
/// `feature_columns` select the classifier inputs; labels come from the
/// shower/track column.
pub fn train_test_balanced<S: AsRef<str>, T: AsRef<str>>(
    table: &Table,
    group_columns: &[S],
    feature_columns: &[T],
    config: &SplitConfig,
) -> Result<SplitSet> {
    let labels = table
        .column(catalog::IS_SHOWER)?
        .enumerate()
        .map(|(row, v)| match v {
            Value::Bool(b) => Ok(*b),
            other => other.as_f64().map(|x| x != 0.0).ok_or_else(|| {
                SchemaError::NotNumeric {
                    column: catalog::IS_SHOWER.to_string(),
                    row,
                    found: other.to_string(),
                }
            }),
        })
        .collect::<Result<Vec<bool>, SchemaError>>()?;
    let features = table.select_columns(feature_columns)?;

    let split = split_indices(table, group_columns, config)?;
    info!(
        "Split {} events into {} training and {} validation",
        table.len(),
        split.train.len(),
        split.valid.len()
    );

    Ok(SplitSet {
        x_train: features.take_rows(&split.train),
        x_valid: features.take_rows(&split.valid),
        y_train: split.train.iter().map(|&i| labels[i]).collect(),
        y_valid: split.valid.iter().map(|&i| labels[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::balance::groups::group_rows;

    /// Groups of very different sizes: "big" dominates the table.
    fn skewed_table() -> Table {
        let mut species = Vec::new();
        let mut cc = Vec::new();
        let mut shower = Vec::new();
        let mut feature = Vec::new();
        for (name, n) in [("big", 400usize), ("mid", 40), ("small", 8), ("tiny", 4)] {
            for i in 0..n {
                species.push(Value::from(name));
                cc.push(Value::Float((i % 2) as f64));
                shower.push(Value::Bool(i % 3 != 0));
                feature.push(Value::Float(i as f64));
            }
        }
        Table::from_columns(vec![
            ("species".into(), species),
            ("is_cc".into(), cc),
            (catalog::IS_SHOWER.into(), shower),
            ("feature".into(), feature),
        ])
        .unwrap()
    }

    #[test]
    fn every_row_lands_in_exactly_one_half() {
        let t = skewed_table();
        let split = split_indices(&t, &["species", "is_cc"], &SplitConfig::seeded(7)).unwrap();
        let train: BTreeSet<_> = split.train.iter().copied().collect();
        let valid: BTreeSet<_> = split.valid.iter().copied().collect();
        assert!(train.is_disjoint(&valid));
        assert_eq!(train.len() + valid.len(), t.len());
        assert_eq!(split.train.len() + split.valid.len(), t.len());
    }

    #[test]
    fn each_group_keeps_the_configured_share() {
        let t = skewed_table();
        let cols = ["species", "is_cc"];
        let config = SplitConfig::seeded(11);
        let split = split_indices(&t, &cols, &config).unwrap();
        let train: BTreeSet<_> = split.train.iter().copied().collect();

        for (key, rows) in group_rows(&t, &cols).unwrap() {
            if rows.len() < 4 {
                continue;
            }
            let in_train = rows.iter().filter(|r| train.contains(r)).count();
            let share = in_train as f64 / rows.len() as f64;
            assert!(
                (share - config.train_fraction).abs() <= 0.15,
                "group {key:?}: share {share}"
            );
        }
    }

    #[test]
    fn group_of_ten_splits_exactly() {
        let t = Table::from_columns(vec![
            ("species".into(), vec![Value::from("a"); 10]),
            (catalog::IS_SHOWER.into(), vec![Value::Bool(true); 10]),
        ])
        .unwrap();
        for (train_fraction, n_train) in [(0.7, 7), (0.3, 3), (0.75, 7), (0.9, 9), (0.1, 1)] {
            let config = SplitConfig {
                train_fraction,
                seed: Some(1),
            };
            let split = split_indices(&t, &["species"], &config).unwrap();
            assert_eq!(split.train.len(), n_train, "train_fraction {train_fraction}");
            assert_eq!(split.valid.len(), 10 - n_train, "train_fraction {train_fraction}");
        }
    }

    #[test]
    fn seed_makes_split_reproducible() {
        let t = skewed_table();
        let a = split_indices(&t, &["species"], &SplitConfig::seeded(3)).unwrap();
        let b = split_indices(&t, &["species"], &SplitConfig::seeded(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_event_group_goes_to_validation() {
        let t = Table::from_columns(vec![
            ("species".into(), vec!["a".into()]),
            (catalog::IS_SHOWER.into(), vec![true.into()]),
        ])
        .unwrap();
        let split = split_indices(&t, &["species"], &SplitConfig::seeded(1)).unwrap();
        assert!(split.train.is_empty());
        assert_eq!(split.valid, vec![0]);
    }

    #[test]
    fn rejects_degenerate_fractions() {
        let t = skewed_table();
        for train_fraction in [0.0, 1.0, 1.5] {
            let config = SplitConfig {
                train_fraction,
                seed: Some(0),
            };
            assert!(matches!(
                split_indices(&t, &["species"], &config),
                Err(PipelineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn labels_follow_their_rows() {
        let t = skewed_table();
        let set =
            train_test_balanced(&t, &["species"], &["feature"], &SplitConfig::seeded(5)).unwrap();
        assert_eq!(set.x_train.column_names, vec!["feature"]);
        assert_eq!(set.x_train.len(), set.y_train.len());
        assert_eq!(set.x_valid.len(), set.y_valid.len());

        // feature i has label (i % 3 != 0)
        for (rec, label) in set.x_train.rows.iter().zip(&set.y_train) {
            let i = rec.values[0].as_f64().unwrap() as usize;
            assert_eq!(*label, i % 3 != 0);
        }
    }
}
