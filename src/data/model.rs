use std::fmt;

use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Value – a single cell of an event table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value covering the dtypes found in event tables.
/// Group keys are `Vec<Value>` inside `BTreeMap`s, so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Integer(i64),
    Bool(bool),
    String(String),
    Null,
}

// -- Manual Eq/Ord so Value can key a BTreeMap --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view of the value. Booleans count as 0/1 so flag columns
    /// can be fed to the normaliser and classifier like any other feature.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Null, or a float that is NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

// ---------------------------------------------------------------------------
// EventRecord – one row of the table
// ---------------------------------------------------------------------------

/// A single detector event. `values[i]` belongs to `Table::column_names[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub values: Vec<Value>,
}

impl EventRecord {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// An ordered collection of events sharing one column schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Ordered column names.
    pub column_names: Vec<String>,
    /// All events (rows).
    pub rows: Vec<EventRecord>,
}

impl Table {
    pub fn new(column_names: Vec<String>, rows: Vec<EventRecord>) -> Self {
        Table { column_names, rows }
    }

    /// Build a table from whole columns. All columns must have equal length.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, SchemaError> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        for (name, col) in &columns {
            if col.len() != n_rows {
                return Err(SchemaError::Length {
                    column: name.clone(),
                    expected: n_rows,
                    got: col.len(),
                });
            }
        }
        let mut rows: Vec<EventRecord> = (0..n_rows)
            .map(|_| EventRecord::new(Vec::with_capacity(columns.len())))
            .collect();
        let mut column_names = Vec::with_capacity(columns.len());
        for (name, col) in columns {
            column_names.push(name);
            for (row, value) in rows.iter_mut().zip(col) {
                row.values.push(value);
            }
        }
        Ok(Table { column_names, rows })
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no events.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, SchemaError> {
        self.column_index(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over the cells of one column.
    pub fn column<'a>(
        &'a self,
        name: &str,
    ) -> Result<impl Iterator<Item = &'a Value> + 'a, SchemaError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |r| &r.values[idx]))
    }

    /// Copy one column out as floats; any non-numeric cell is an error.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, SchemaError> {
        self.column(name)?
            .enumerate()
            .map(|(row, v)| {
                v.as_f64().ok_or_else(|| SchemaError::NotNumeric {
                    column: name.to_string(),
                    row,
                    found: v.to_string(),
                })
            })
            .collect()
    }

    /// Projection onto `names`, in that order.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, SchemaError> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|r| EventRecord::new(indices.iter().map(|&i| r.values[i].clone()).collect()))
            .collect();
        Ok(Table {
            column_names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            rows,
        })
    }

    /// New table holding the rows at `indices`, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            column_names: self.column_names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Append `other` below `self`. Both tables must share the same columns.
    pub fn concat(mut self, other: Table) -> Result<Table, SchemaError> {
        if self.column_names != other.column_names {
            return Err(SchemaError::Mismatch {
                left: self.column_names,
                right: other.column_names,
            });
        }
        self.rows.extend(other.rows);
        Ok(self)
    }

    /// Append a derived column at the right edge.
    pub fn push_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), SchemaError> {
        if values.len() != self.rows.len() {
            return Err(SchemaError::Length {
                column: name.to_string(),
                expected: self.rows.len(),
                got: values.len(),
            });
        }
        self.column_names.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.push(value);
        }
        Ok(())
    }
}
