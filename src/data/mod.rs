/// Data layer: core types, column catalog, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse files → Table, rename via catalog,
///   └──────────┘  derive "Particle name" / "Is shower?"
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  column names + Vec<EventRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop missing values, row predicates (energy cut, labels)
///   └──────────┘
/// ```

pub mod catalog;
pub mod filter;
pub mod loader;
pub mod model;
