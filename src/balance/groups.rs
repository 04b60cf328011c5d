use std::collections::BTreeMap;

use crate::data::model::{Table, Value};
use crate::error::SchemaError;

/// One combination of values across the grouping columns.
pub type GroupKey = Vec<Value>;

/// Rows per group. Only combinations that occur are present.
pub type GroupCounts = BTreeMap<GroupKey, usize>;

/// Row indices of every group, each list in table order.
pub fn group_rows<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
) -> Result<BTreeMap<GroupKey, Vec<usize>>, SchemaError> {
    if columns.is_empty() {
        return Err(SchemaError::NoGroupColumns);
    }
    let indices = columns
        .iter()
        .map(|c| table.require_column(c.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for (row, rec) in table.rows.iter().enumerate() {
        let key: GroupKey = indices.iter().map(|&i| rec.values[i].clone()).collect();
        groups.entry(key).or_default().push(row);
    }
    Ok(groups)
}

/// Count the rows sharing each combination of values in `columns`.
pub fn count_groups<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<GroupCounts, SchemaError> {
    Ok(group_rows(table, columns)?
        .into_iter()
        .map(|(key, rows)| (key, rows.len()))
        .collect())
}
