use log::info;

use super::model::{Table, Value};
use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Missing values
// ---------------------------------------------------------------------------

/// Number of missing cells (null or NaN) in the whole table.
pub fn count_missing(table: &Table) -> usize {
    table
        .rows
        .iter()
        .flat_map(|r| r.values.iter())
        .filter(|v| v.is_missing())
        .count()
}

/// Drop every event that has at least one missing cell.
///
/// Returns the filtered table and the number of missing cells that were
/// present before dropping.
pub fn drop_missing(table: Table) -> (Table, usize) {
    let missing = count_missing(&table);
    info!("Removing missing values ({missing} now)");

    let Table { column_names, rows } = table;
    let rows = rows
        .into_iter()
        .filter(|r| !r.values.iter().any(Value::is_missing))
        .collect();
    let table = Table::new(column_names, rows);

    info!("Missing values: {}", count_missing(&table));
    (table, missing)
}

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// Keep the events whose value in `column` satisfies `keep`.
pub fn filter_rows<F>(table: &Table, column: &str, keep: F) -> Result<Table, SchemaError>
where
    F: Fn(&Value) -> bool,
{
    let idx = table.require_column(column)?;
    let indices: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, r)| keep(&r.values[idx]))
        .map(|(i, _)| i)
        .collect();
    Ok(table.take_rows(&indices))
}

/// Keep events with a numeric `column` strictly above `threshold`.
/// Non-numeric cells never pass.
pub fn above(table: &Table, column: &str, threshold: f64) -> Result<Table, SchemaError> {
    filter_rows(table, column, |v| v.as_f64().is_some_and(|x| x > threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_columns(vec![
            (
                "energy".into(),
                vec![100.0.into(), f64::NAN.into(), 20000.0.into(), 9500.0.into()],
            ),
            (
                "label".into(),
                vec![true.into(), true.into(), Value::Null, false.into()],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn counts_null_and_nan() {
        assert_eq!(count_missing(&table()), 2);
    }

    #[test]
    fn drop_missing_keeps_complete_rows() {
        let (clean, missing) = drop_missing(table());
        assert_eq!(missing, 2);
        assert_eq!(clean.len(), 2);
        assert_eq!(count_missing(&clean), 0);
        assert_eq!(clean.rows[1].values[0], Value::Float(9500.0));
    }

    #[test]
    fn energy_cut_is_strict() {
        let cut = above(&table(), "energy", 9500.0).unwrap();
        assert_eq!(cut.len(), 1);
        assert_eq!(cut.rows[0].values[0], Value::Float(20000.0));
    }

    #[test]
    fn filter_by_label() {
        let tracks = filter_rows(&table(), "label", |v| *v == Value::Bool(false)).unwrap();
        assert_eq!(tracks.len(), 1);
        assert!(filter_rows(&table(), "nope", |_| true).is_err());
    }
}
