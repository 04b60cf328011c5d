use log::info;

use super::groups::group_rows;
use crate::data::model::Table;
use crate::error::{EmptyGroupError, Result};

/// Rows kept per group beyond the smallest group's size.
pub const EQUALIZE_SLACK: usize = 1;

/// Downsample every group in `group_columns` to the size of the smallest one
/// (plus [`EQUALIZE_SLACK`]).
///
/// Each group keeps its first rows in table order; groups are emitted in
/// group-key order and the result holds exactly `output_columns`.
pub fn equal_entries<S: AsRef<str>, T: AsRef<str>>(
    group_columns: &[S],
    table: &Table,
    output_columns: &[T],
) -> Result<Table> {
    let groups = group_rows(table, group_columns)?;
    let min = groups.values().map(Vec::len).min().ok_or_else(|| EmptyGroupError {
        columns: group_columns.iter().map(|c| c.as_ref().to_string()).collect(),
    })?;
    let keep = min + EQUALIZE_SLACK;

    let selected: Vec<usize> = groups
        .values()
        .flat_map(|rows| rows.iter().take(keep).copied())
        .collect();

    info!(
        "Equalised {} groups to at most {keep} events each ({} of {} kept)",
        groups.len(),
        selected.len(),
        table.len()
    );

    Ok(table.take_rows(&selected).select_columns(output_columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::groups::count_groups;
    use crate::data::model::Value;
    use crate::error::PipelineError;

    fn species_table(sizes: &[(&str, usize)]) -> Table {
        let mut species = Vec::new();
        let mut order = Vec::new();
        for (name, n) in sizes {
            for i in 0..*n {
                species.push(Value::from(*name));
                order.push(Value::Integer(i as i64));
            }
        }
        Table::from_columns(vec![
            ("species".into(), species),
            ("order".into(), order),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_min_plus_one_per_group() {
        let t = species_table(&[("a", 10), ("b", 3), ("c", 7)]);
        let out = equal_entries(&["species"], &t, &["species", "order"]).unwrap();

        let counts = count_groups(&out, &["species"]).unwrap();
        assert!(counts.values().all(|&n| n <= 4));
        assert_eq!(counts[&vec![Value::from("a")]], 4);
        assert_eq!(counts[&vec![Value::from("b")]], 3);
        assert_eq!(counts[&vec![Value::from("c")]], 4);
        assert!(out.len() <= 12);
    }

    #[test]
    fn keeps_leading_rows_in_group_key_order() {
        let t = species_table(&[("b", 5), ("a", 2)]);
        let out = equal_entries(&["species"], &t, &["species", "order"]).unwrap();
        let firsts: Vec<_> = out.rows.iter().map(|r| r.values.clone()).collect();
        assert_eq!(
            firsts,
            vec![
                vec![Value::from("a"), Value::Integer(0)],
                vec![Value::from("a"), Value::Integer(1)],
                vec![Value::from("b"), Value::Integer(0)],
                vec![Value::from("b"), Value::Integer(1)],
                vec![Value::from("b"), Value::Integer(2)],
            ]
        );
    }

    #[test]
    fn output_columns_match_request() {
        let t = species_table(&[("a", 3), ("b", 3)]);
        let out = equal_entries(&["species"], &t, &t.column_names).unwrap();
        assert_eq!(out.column_names, t.column_names);

        let out = equal_entries(&["species"], &t, &["order"]).unwrap();
        assert_eq!(out.column_names, vec!["order"]);
    }

    #[test]
    fn empty_table_has_no_groups() {
        let t = species_table(&[]);
        assert!(matches!(
            equal_entries(&["species"], &t, &["species"]),
            Err(PipelineError::EmptyGroup(_))
        ));
    }
}
