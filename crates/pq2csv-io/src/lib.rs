#![forbid(unsafe_code)]
//! pq2csv-io: the columnar reader and the delimited-text writer.
//!
//! - `readers`: `RowSource` trait + the Parquet implementation yielding `Row`s.
//! - `arrow_convert`: Arrow arrays → `Scalar` values and `Schema`.
//! - `writers`: streaming CSV writer for a header plus `Row`s.

pub mod arrow_convert;
pub mod readers;
pub mod writers;

pub mod error;

pub use error::{Error, Result};
pub use readers::parquet::{ParquetReader, ReadOptions};
pub use readers::RowSource;
pub use writers::csv::CsvWriter;
