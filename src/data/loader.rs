use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::error::ArrowError;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use thiserror::Error;

use super::model::{required_columns, BenchmarkTable, Measurement, TransferMode};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The input table could not be turned into a [`BenchmarkTable`].
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("input table {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: missing required column(s): {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("{}: CSV row {row}", .path.display())]
    Csv {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("{}: invalid JSON records", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: reading parquet", .path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("{}: column '{column}'", .path.display())]
    Arrow {
        path: PathBuf,
        column: &'static str,
        #[source]
        source: ArrowError,
    },

    #[error("{}: row {row}, column '{column}': {reason}", .path.display())]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: &'static str,
        reason: String,
    },

    #[error("creating output directory {}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a benchmark table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row + one row per configuration (harness output)
/// * `.json`    – `[{ "nr_dpus": 1, "mode": "serial", ... }, ...]`
/// * `.parquet` – one column per field
pub fn load_file(path: &Path) -> Result<BenchmarkTable, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataLoadError::UnsupportedFormat(other.to_string())),
    }?;

    log::info!("loaded {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<(), DataLoadError> {
    std::fs::create_dir_all(dir).map_err(|source| DataLoadError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn missing_columns(path: &Path, present: impl Fn(&str) -> bool) -> Result<(), DataLoadError> {
    let columns: Vec<String> = required_columns()
        .filter(|c| !present(c))
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        Ok(())
    } else {
        Err(DataLoadError::MissingColumns {
            path: path.to_path_buf(),
            columns,
        })
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, any order. Columns the harness writes on
/// top of the required ones (min/max/std) are ignored.
fn load_csv(path: &Path) -> Result<BenchmarkTable, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            row: 0,
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            row: 0,
            source,
        })?
        .clone();
    missing_columns(path, |c| headers.iter().any(|h| h == c))?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.deserialize::<Measurement>().enumerate() {
        let row = result.map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            row: row_no + 1,
            source,
        })?;
        rows.push(row);
    }

    Ok(BenchmarkTable::from_rows(rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "nr_dpus": 8, "nr_tasklets": 1, "mode": "parallel", "size": 4096,
///     "write_mean_us": 51.2, "read_mean_us": 60.3,
///     "write_throughput_mbps": 640.0, "read_throughput_mbps": 543.4 }
/// ]
/// ```
fn load_json(path: &Path) -> Result<BenchmarkTable, DataLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<Measurement> =
        serde_json::from_str(&text).map_err(|source| DataLoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(BenchmarkTable::from_rows(rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field.
///
/// Integer columns may use any integer width and float columns Float32 or
/// Float64; everything is cast to Int64 / Float64 / Utf8 before reading.
/// Works with files written by Pandas (`df.to_parquet()`) and Polars.
fn load_parquet(path: &Path) -> Result<BenchmarkTable, DataLoadError> {
    let parquet_err = |source| DataLoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;

    let schema = builder.schema().clone();
    missing_columns(path, |c| schema.index_of(c).is_ok())?;

    let reader = builder.build().map_err(parquet_err)?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|source| DataLoadError::Arrow {
            path: path.to_path_buf(),
            column: "*",
            source,
        })?;
        let columns = BatchColumns::new(path, &batch)?;
        let offset = rows.len();

        for i in 0..batch.num_rows() {
            let at = CellRef {
                path,
                row: offset + i + 1,
                index: i,
            };
            rows.push(Measurement {
                nr_dpus: at.count(&columns.nr_dpus, "nr_dpus")?,
                nr_tasklets: at.count(&columns.nr_tasklets, "nr_tasklets")?,
                mode: at.mode(&columns.mode)?,
                size: at.count(&columns.size, "size")?,
                write_mean_us: at.float(&columns.write_mean, "write_mean_us")?,
                read_mean_us: at.float(&columns.read_mean, "read_mean_us")?,
                write_throughput_mbps: at.float(&columns.write_tput, "write_throughput_mbps")?,
                read_throughput_mbps: at.float(&columns.read_tput, "read_throughput_mbps")?,
            });
        }
    }

    Ok(BenchmarkTable::from_rows(rows))
}

// -- Parquet / Arrow helpers --

/// The eight required columns of one record batch, cast to canonical types.
struct BatchColumns {
    nr_dpus: Arc<dyn Array>,
    nr_tasklets: Arc<dyn Array>,
    mode: Arc<dyn Array>,
    size: Arc<dyn Array>,
    write_mean: Arc<dyn Array>,
    read_mean: Arc<dyn Array>,
    write_tput: Arc<dyn Array>,
    read_tput: Arc<dyn Array>,
}

impl BatchColumns {
    fn new(path: &Path, batch: &arrow::record_batch::RecordBatch) -> Result<Self, DataLoadError> {
        let column = |name: &'static str, to: &DataType| -> Result<Arc<dyn Array>, DataLoadError> {
            let col = batch.column_by_name(name).ok_or_else(|| DataLoadError::MissingColumns {
                path: path.to_path_buf(),
                columns: vec![name.to_string()],
            })?;
            cast(col, to).map_err(|source| DataLoadError::Arrow {
                path: path.to_path_buf(),
                column: name,
                source,
            })
        };

        Ok(BatchColumns {
            nr_dpus: column("nr_dpus", &DataType::Int64)?,
            nr_tasklets: column("nr_tasklets", &DataType::Int64)?,
            mode: column("mode", &DataType::Utf8)?,
            size: column("size", &DataType::Int64)?,
            write_mean: column("write_mean_us", &DataType::Float64)?,
            read_mean: column("read_mean_us", &DataType::Float64)?,
            write_tput: column("write_throughput_mbps", &DataType::Float64)?,
            read_tput: column("read_throughput_mbps", &DataType::Float64)?,
        })
    }
}

/// One row of one batch, for reading cells with row-numbered errors.
struct CellRef<'a> {
    path: &'a Path,
    /// 1-based row number across the whole file.
    row: usize,
    /// Index within the current batch.
    index: usize,
}

impl CellRef<'_> {
    fn invalid(&self, column: &'static str, reason: impl Into<String>) -> DataLoadError {
        DataLoadError::InvalidValue {
            path: self.path.to_path_buf(),
            row: self.row,
            column,
            reason: reason.into(),
        }
    }

    fn count(&self, col: &Arc<dyn Array>, name: &'static str) -> Result<u64, DataLoadError> {
        if col.is_null(self.index) {
            return Err(self.invalid(name, "null"));
        }
        let v = col.as_primitive::<Int64Type>().value(self.index);
        u64::try_from(v).map_err(|_| self.invalid(name, format!("{v} is negative")))
    }

    fn float(&self, col: &Arc<dyn Array>, name: &'static str) -> Result<f64, DataLoadError> {
        if col.is_null(self.index) {
            return Err(self.invalid(name, "null"));
        }
        Ok(col.as_primitive::<Float64Type>().value(self.index))
    }

    fn mode(&self, col: &Arc<dyn Array>) -> Result<TransferMode, DataLoadError> {
        if col.is_null(self.index) {
            return Err(self.invalid("mode", "null"));
        }
        col.as_string::<i32>()
            .value(self.index)
            .parse()
            .map_err(|reason: String| self.invalid("mode", reason))
    }
}
