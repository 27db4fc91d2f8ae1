//! Comparative charts for DPU host-transfer benchmark results.
//!
//! [`pipeline::run`] loads `benchmark_results.csv` and writes six PNG
//! reports into `plots/`.

pub mod color;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod style;
