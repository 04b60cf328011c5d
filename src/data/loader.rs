use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde_json::Value as JsonValue;

use super::catalog;
use super::model::{EventRecord, Table, Value};
use crate::error::{LoadError, PipelineError, Result, SchemaError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every file, stack them, rename the raw columns and derive the
/// species and shower/track columns.
pub fn load_events<P: AsRef<Path>>(paths: &[P]) -> Result<Table> {
    let mut combined: Option<Table> = None;
    for path in paths {
        let table = load_file(path.as_ref())?;
        info!(
            "Loaded {} events from {}",
            table.len(),
            path.as_ref().display()
        );
        combined = Some(match combined {
            None => table,
            Some(acc) => acc.concat(table)?,
        });
    }
    let mut table = combined.ok_or(LoadError::NoInputs)?;

    table.column_names = table
        .column_names
        .iter()
        .map(|raw| catalog::rename(raw).to_string())
        .collect();

    derive_labels(&mut table)?;
    Ok(table)
}

/// Load a single table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat columns of numbers, booleans and strings
/// * `.json`    – `[{ "pdgid": 14, "is_cc": 1.0, ... }, ...]`
/// * `.csv`     – header row, one event per line
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing {
            path: path.to_path_buf(),
        });
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };
    loaded.map_err(|e| LoadError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Read a preprocessed snapshot. Its schema is trusted as-is.
pub fn read_snapshot(path: &Path) -> Result<Table> {
    let table = load_file(path)?;
    info!("Loaded preprocessed snapshot with {} events", table.len());
    Ok(table)
}

/// Write `table` as a parquet snapshot, one Arrow column per table column.
pub fn write_snapshot(table: &Table, path: &Path) -> Result<()> {
    let mut fields = Vec::with_capacity(table.column_names.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.column_names.len());

    for (idx, name) in table.column_names.iter().enumerate() {
        let cells: Vec<&Value> = table.rows.iter().map(|r| &r.values[idx]).collect();
        let array = column_to_arrow(name, &cells)?;
        fields.push(Field::new(name, array.data_type().clone(), true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    info!("Wrote snapshot of {} events to {}", table.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Derived columns
// ---------------------------------------------------------------------------

fn derive_labels(table: &mut Table) -> Result<(), SchemaError> {
    let pdg_idx = table.require_column(catalog::PDGID)?;
    let cc_idx = table.require_column(catalog::IS_CC)?;

    let mut names = Vec::with_capacity(table.len());
    let mut labels = Vec::with_capacity(table.len());
    let mut unknown = 0usize;

    for (row, rec) in table.rows.iter().enumerate() {
        let pdgid = integer_cell(&rec.values[pdg_idx], catalog::PDGID, row)?;
        let is_cc = numeric_cell(&rec.values[cc_idx], catalog::IS_CC, row)?;

        names.push(match catalog::species_name(pdgid) {
            Some(name) => Value::String(name.to_string()),
            None => {
                unknown += 1;
                Value::Null
            }
        });
        labels.push(Value::Bool(catalog::is_shower(pdgid, is_cc)));
    }

    if unknown > 0 {
        warn!("{unknown} events carry a pdgid that is not a neutrino");
    }
    debug!("Derived '{}' and '{}'", catalog::PARTICLE_NAME, catalog::IS_SHOWER);

    table.push_column(catalog::PARTICLE_NAME, names)?;
    table.push_column(catalog::IS_SHOWER, labels)?;
    Ok(())
}

fn numeric_cell(value: &Value, column: &str, row: usize) -> Result<f64, SchemaError> {
    value.as_f64().ok_or_else(|| SchemaError::NotNumeric {
        column: column.to_string(),
        row,
        found: value.to_string(),
    })
}

/// Particle codes arrive as integers or as whole floats (`14.0`).
fn integer_cell(value: &Value, column: &str, row: usize) -> Result<i64, SchemaError> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Float(x) if x.fract() == 0.0 && x.abs() < 9.0e15 => Ok(*x as i64),
        Value::Float(_) => Err(SchemaError::NotInteger {
            column: column.to_string(),
            row,
            found: value.to_string(),
        }),
        other => Err(SchemaError::NotNumeric {
            column: column.to_string(),
            row,
            found: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`).
/// Columns are the keys of the first record; keys missing from later
/// records read as null.
fn load_json(path: &Path) -> anyhow::Result<Table> {
    use anyhow::Context;

    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let column_names: Vec<String> = match records.first() {
        Some(first) => first
            .as_object()
            .context("Row 0 is not a JSON object")?
            .keys()
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let values = column_names
            .iter()
            .map(|col| obj.get(col).map(json_to_value).unwrap_or(Value::Null))
            .collect();
        rows.push(EventRecord::new(values));
    }

    Ok(Table::new(column_names, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> anyhow::Result<Table> {
    use anyhow::Context;

    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let column_names: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(EventRecord::new(
            record.iter().map(guess_value_type).collect(),
        ));
    }

    Ok(Table::new(column_names, rows))
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    match s {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat parquet file. Works with files written by **Pandas**
/// (`df.to_parquet()`), **Polars** and [`write_snapshot`].
fn load_parquet(path: &Path) -> anyhow::Result<Table> {
    use anyhow::Context;

    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&column_names)
            .map(|(col, name)| {
                arrow_to_values(col).with_context(|| format!("column '{name}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            rows.push(EventRecord::new(
                columns.iter().map(|c| c[row].clone()).collect(),
            ));
        }
    }

    Ok(Table::new(column_names, rows))
}

// -- Parquet / Arrow helpers --

/// Convert a whole Arrow column to cells. Integer and float widths are
/// widened to 64 bits; anything else that Arrow can cast to text is kept as
/// a string.
fn arrow_to_values(col: &ArrayRef) -> anyhow::Result<Vec<Value>> {
    let cells = match col.data_type() {
        DataType::Boolean => {
            let arr = col.as_boolean();
            (0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        Value::Null
                    } else {
                        Value::Bool(arr.value(i))
                    }
                })
                .collect()
        }
        DataType::Utf8 => strings(col.as_string::<i32>()),
        DataType::LargeUtf8 => strings(col.as_string::<i64>()),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let widened = cast(col, &DataType::Float64)?;
            widened
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.map(Value::Float).unwrap_or(Value::Null))
                .collect()
        }
        dt if dt.is_integer() => {
            let widened = cast(col, &DataType::Int64)?;
            widened
                .as_primitive::<Int64Type>()
                .iter()
                .map(|v| v.map(Value::Integer).unwrap_or(Value::Null))
                .collect()
        }
        _ => {
            let text = cast(col, &DataType::Utf8)?;
            strings(text.as_string::<i32>())
        }
    };
    Ok(cells)
}

fn strings<O: arrow::array::OffsetSizeTrait>(
    arr: &arrow::array::GenericStringArray<O>,
) -> Vec<Value> {
    arr.iter()
        .map(|v| v.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null))
        .collect()
}

/// Arrow type for a column, inferred from the kinds of values it holds.
fn column_to_arrow(name: &str, cells: &[&Value]) -> Result<ArrayRef> {
    let has = |pred: &dyn Fn(&Value) -> bool| cells.iter().copied().any(|v| pred(v));

    let array: ArrayRef = if has(&|v| matches!(v, Value::String(_))) {
        Arc::new(StringArray::from(
            cells
                .iter()
                .map(|v| match v {
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>(),
        ))
    } else if has(&|v| matches!(v, Value::Float(_))) {
        Arc::new(Float64Array::from(
            cells.iter().map(|v| v.as_f64()).collect::<Vec<_>>(),
        ))
    } else if has(&|v| matches!(v, Value::Integer(_))) {
        Arc::new(Int64Array::from(
            cells
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    Value::Bool(b) => Some(i64::from(*b)),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ))
    } else if has(&|v| matches!(v, Value::Bool(_))) {
        Arc::new(BooleanArray::from(
            cells
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ))
    } else {
        debug!("Column '{name}' holds only nulls, writing as Float64");
        Arc::new(Float64Array::from(vec![None::<f64>; cells.len()]))
    };

    if array.len() != cells.len() {
        return Err(PipelineError::InvalidConfig(format!(
            "column '{name}' lost rows while converting to Arrow"
        )));
    }
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_cell_types() {
        assert_eq!(guess_value_type(""), Value::Null);
        assert_eq!(guess_value_type("14"), Value::Integer(14));
        assert_eq!(guess_value_type("-0.5"), Value::Float(-0.5));
        assert_eq!(guess_value_type("True"), Value::Bool(true));
        assert_eq!(guess_value_type("mu"), Value::String("mu".into()));
    }

    #[test]
    fn derives_species_and_labels() {
        let mut table = Table::from_columns(vec![
            (
                catalog::PDGID.into(),
                vec![14i64.into(), 14i64.into(), 12i64.into(), 99i64.into()],
            ),
            (
                catalog::IS_CC.into(),
                vec![1.0.into(), 0.0.into(), 1.0.into(), 1.0.into()],
            ),
        ])
        .unwrap();
        derive_labels(&mut table).unwrap();

        let labels: Vec<_> = table.column(catalog::IS_SHOWER).unwrap().cloned().collect();
        assert_eq!(
            labels,
            vec![false.into(), true.into(), true.into(), true.into()]
        );
        let names: Vec<_> = table
            .column(catalog::PARTICLE_NAME)
            .unwrap()
            .cloned()
            .collect();
        assert_eq!(names[0], Value::from("Muon neutrino"));
        assert_eq!(names[2], Value::from("Electron neutrino"));
        assert_eq!(names[3], Value::Null);
    }

    #[test]
    fn label_derivation_needs_raw_fields() {
        let mut table =
            Table::from_columns(vec![(catalog::PDGID.into(), vec![14i64.into()])]).unwrap();
        assert!(matches!(
            derive_labels(&mut table),
            Err(SchemaError::MissingColumn(c)) if c == catalog::IS_CC
        ));
    }

    #[test]
    fn particle_codes_must_be_whole_numbers() {
        let codes = |pdgid: Value| {
            let mut table = Table::from_columns(vec![
                (catalog::PDGID.into(), vec![pdgid]),
                (catalog::IS_CC.into(), vec![1.0.into()]),
            ])
            .unwrap();
            derive_labels(&mut table).map(|_| table)
        };

        let table = codes(Value::Float(-14.0)).unwrap();
        let labels: Vec<_> = table.column(catalog::IS_SHOWER).unwrap().cloned().collect();
        assert_eq!(labels, vec![Value::Bool(false)]);

        assert!(matches!(
            codes(Value::Float(14.7)),
            Err(SchemaError::NotInteger { row: 0, .. })
        ));
        assert!(matches!(
            codes(Value::Float(1e300)),
            Err(SchemaError::NotInteger { .. })
        ));

        let table = codes(Value::Integer(i64::MIN)).unwrap();
        let labels: Vec<_> = table.column(catalog::IS_SHOWER).unwrap().cloned().collect();
        assert_eq!(labels, vec![Value::Bool(true)]);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_file(Path::new("does/not/exist.parquet")).unwrap_err();
        assert!(matches!(err, LoadError::Missing { .. }));
    }

    #[test]
    fn empty_path_list_is_rejected() {
        let paths: [&str; 0] = [];
        assert!(matches!(
            load_events(&paths),
            Err(PipelineError::Load(LoadError::NoInputs))
        ));
    }
}
