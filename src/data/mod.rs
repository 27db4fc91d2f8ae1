/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → BenchmarkTable
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ BenchmarkTable │  Vec<Measurement>, distinct values per axis
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  fixed-axis predicates → selected rows
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  point series, mean pivot, keyed ratio
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
