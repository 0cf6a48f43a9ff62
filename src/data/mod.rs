/// Data layer: core types, loading, inference, filtering and statistics.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (cells typed by storage)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  infer    │  date-like column names → temporal columns
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  filter   │          │ summary  │  sum / mean / min / max (raw data)
///   └──────────┘          └──────────┘
///        │
///        ▼
///   filtered Dataset → chart
/// ```

pub mod filter;
pub mod infer;
pub mod loader;
pub mod model;
pub mod summary;
