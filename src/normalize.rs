//! Rank-based quantile transform of feature columns onto a standard normal.

use log::{debug, info};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};

/// Quantiles are clipped to `[BOUNDS, 1 - BOUNDS]` so the extremes map to
/// finite values (about ±5.2).
pub const BOUNDS: f64 = 1e-7;

/// Quantile-transform every column not listed in `excluded`.
///
/// Output columns: transformed columns in their original order, followed by
/// the excluded columns in their original order. Excluded values are copied
/// untouched. Names in `excluded` that the table lacks are ignored.
pub fn normalise<S: AsRef<str>>(table: &Table, excluded: &[S]) -> Result<Table> {
    let is_excluded = |name: &str| excluded.iter().any(|e| e.as_ref() == name);
    let (kept, skipped): (Vec<&String>, Vec<&String>) =
        table.column_names.iter().partition(|c| !is_excluded(c.as_str()));

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| PipelineError::InvalidConfig(format!("standard normal: {e}")))?;

    let mut transformed = Vec::with_capacity(kept.len());
    for name in &kept {
        let values = table.numeric_column(name)?;
        let mapped = quantile_normal(&values, &normal);
        debug!("Normalised '{name}' ({} values)", mapped.len());
        transformed.push(((*name).clone(), mapped.into_iter().map(Value::Float).collect()));
    }
    let transformed = Table::from_columns(transformed)?;
    let untouched = table.select_columns(&skipped)?;

    // Both halves are positional; they must still line up row for row.
    let n_transformed = if kept.is_empty() { table.len() } else { transformed.len() };
    if n_transformed != untouched.len() {
        return Err(PipelineError::RowMismatch {
            transformed: n_transformed,
            excluded: untouched.len(),
        });
    }

    let mut column_names = transformed.column_names;
    column_names.extend(untouched.column_names);
    let rows = if kept.is_empty() {
        untouched.rows
    } else if skipped.is_empty() {
        transformed.rows
    } else {
        transformed
            .rows
            .into_iter()
            .zip(untouched.rows)
            .map(|(mut t, u)| {
                t.values.extend(u.values);
                t
            })
            .collect()
    };

    info!(
        "Normalised {} columns, left {} untouched",
        kept.len(),
        skipped.len()
    );
    Ok(Table::new(column_names, rows))
}

/// Map each value to its empirical quantile, then through the standard
/// normal inverse CDF. Ties share their average rank.
pub fn quantile_normal(values: &[f64], normal: &Normal) -> Vec<f64> {
    average_ranks(values)
        .into_iter()
        .map(|rank| {
            let q = if values.len() > 1 {
                (rank - 1.0) / (values.len() - 1) as f64
            } else {
                0.5
            };
            normal.inverse_cdf(q.clamp(BOUNDS, 1.0 - BOUNDS))
        })
        .collect()
}

/// 1-based ranks, ties receiving the mean of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1 ..= end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = avg;
        }
        start = end;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Normal {
        Normal::new(0.0, 1.0).unwrap()
    }

    fn table() -> Table {
        Table::from_columns(vec![
            (
                "length".into(),
                vec![3.0.into(), 1.0.into(), 2.0.into(), 2.0.into(), 10.0.into()],
            ),
            (
                "label".into(),
                vec![true.into(), false.into(), true.into(), true.into(), false.into()],
            ),
            (
                "hits".into(),
                vec![5i64.into(), 6i64.into(), 7i64.into(), 8i64.into(), 9i64.into()],
            ),
            (
                "name".into(),
                vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn ties_share_average_rank() {
        assert_eq!(average_ranks(&[3.0, 1.0, 2.0, 2.0, 10.0]), vec![4.0, 1.0, 2.5, 2.5, 5.0]);
        assert_eq!(average_ranks(&[7.0, 7.0, 7.0]), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn transform_is_monotonic_and_centred() {
        let out = quantile_normal(&[3.0, 1.0, 2.0, 2.0, 10.0], &standard());
        assert!(out[1] < out[2] && out[2] < out[0] && out[0] < out[4]);
        assert_eq!(out[2], out[3]);
        assert!(out[2].abs() < 0.7);
        // median maps to 0, extremes are clipped to finite values
        let sym = quantile_normal(&[1.0, 2.0, 3.0], &standard());
        assert!(sym[1].abs() < 1e-9);
        assert!(sym[0].is_finite() && sym[0] < -5.0);
        assert!((sym[0] + sym[2]).abs() < 1e-6);
    }

    #[test]
    fn single_value_and_constant_columns_map_to_zero() {
        assert!(quantile_normal(&[42.0], &standard())[0].abs() < 1e-9);
        assert!(quantile_normal(&[4.0, 4.0], &standard())
            .iter()
            .all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn excluded_columns_are_untouched_and_moved_last() {
        let t = table();
        let out = normalise(&t, &["label", "name", "Inelasticity"]).unwrap();
        assert_eq!(out.column_names, vec!["length", "hits", "label", "name"]);
        assert_eq!(out.len(), t.len());
        for (before, after) in t.rows.iter().zip(&out.rows) {
            assert_eq!(before.values[1], after.values[2]);
            assert_eq!(before.values[3], after.values[3]);
        }
    }

    #[test]
    fn normalising_is_deterministic() {
        let t = table();
        let a = normalise(&t, &["label", "name"]).unwrap();
        let b = normalise(&t, &["label", "name"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_numeric_features_are_rejected() {
        assert!(normalise(&table(), &["label"]).is_err());
    }

    #[test]
    fn everything_excluded_is_a_copy() {
        let t = table();
        let out = normalise(&t, &t.column_names).unwrap();
        assert_eq!(out, t);
    }
}
