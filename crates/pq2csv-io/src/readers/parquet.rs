//! Parquet row reader with column projection.
//!
//! Wraps the Arrow record-batch reader from the `parquet` crate and hands out
//! one `Row` at a time. Batches are decoded lazily: only the batch holding the
//! current row is kept in memory.

use std::fs::File;
use std::path::Path;

use arrow_array::{RecordBatch, RecordBatchReader};
use arrow_schema::Schema as ArrowSchema;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use parquet::file::reader::ChunkReader;

use pq2csv_core::config::{ConvertConfig, DEFAULT_BATCH_SIZE};
use pq2csv_core::schema::Schema;
use pq2csv_core::types::Row;

use crate::arrow_convert::{record_batch_row, schema_from_arrow};
use crate::error::{Error, Result};
use crate::readers::RowSource;

/// Options applied when opening a Parquet input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Number of rows per decoded batch.
    pub batch_size: usize,
    /// Top-level columns to keep; `None` keeps all of them.
    pub projection: Option<Vec<String>>,
    /// Upper bound on rows decoded from the file.
    pub limit: Option<usize>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            projection: None,
            limit: None,
        }
    }
}

impl ReadOptions {
    /// Batch size and decode limit taken from a conversion config.
    pub fn from_config(cfg: &ConvertConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            projection: None,
            limit: cfg.limit().map(|l| usize::try_from(l).unwrap_or(usize::MAX)),
        }
    }

    pub fn with_projection(mut self, columns: Vec<String>) -> Self {
        self.projection = Some(columns);
        self
    }
}

pub struct ParquetReader {
    reader: ParquetRecordBatchReader,
    schema: Schema,
    total_rows: i64,
    row_groups: usize,
    current: Option<RecordBatch>,
    cursor: usize,
    batches_read: usize,
    exhausted: bool,
}

impl ParquetReader {
    /// Open the Parquet file at `path`.
    pub fn from_path(path: impl AsRef<Path>, options: ReadOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::try_new(file, options)
    }

    /// Open a Parquet input from any random-access source.
    ///
    /// Reads and validates the footer; fails if `input` is not a Parquet file,
    /// is truncated, or a projected column does not exist.
    pub fn try_new<T: ChunkReader + 'static>(input: T, options: ReadOptions) -> Result<Self> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(input)?;

        let file_schema = builder.schema().clone();
        let metadata = builder.metadata().clone();
        let total_rows = metadata.file_metadata().num_rows();
        let row_groups = metadata.num_row_groups();

        let mut builder = match &options.projection {
            Some(columns) => {
                let indices = projection_indices(file_schema.as_ref(), columns)?;
                let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
                builder.with_projection(mask)
            }
            None => builder,
        };

        builder = builder.with_batch_size(options.batch_size.max(1));
        if let Some(limit) = options.limit {
            builder = builder.with_limit(limit);
        }

        let reader = builder.build()?;
        let arrow_schema = reader.schema();
        let schema = schema_from_arrow(arrow_schema.as_ref());

        tracing::info!(
            columns = schema.len(),
            rows = total_rows,
            row_groups,
            "Observed file schema: {}",
            schema
        );

        Ok(Self {
            reader,
            schema,
            total_rows,
            row_groups,
            current: None,
            cursor: 0,
            batches_read: 0,
            exhausted: false,
        })
    }

    /// Row count recorded in the file footer (before projection or limits).
    pub fn total_rows(&self) -> i64 {
        self.total_rows
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups
    }

    /// Pull the next non-empty batch; `false` once the file is exhausted.
    fn advance_batch(&mut self) -> Result<bool> {
        while !self.exhausted {
            match self.reader.next() {
                Some(Ok(batch)) => {
                    self.batches_read += 1;
                    tracing::trace!(
                        batch = self.batches_read,
                        rows = batch.num_rows(),
                        "decoded record batch"
                    );
                    if batch.num_rows() == 0 {
                        continue;
                    }
                    self.current = Some(batch);
                    self.cursor = 0;
                    return Ok(true);
                }
                Some(Err(e)) => {
                    self.exhausted = true;
                    self.current = None;
                    return Err(Error::Arrow(e)
                        .with_context(format!("decoding record batch {}", self.batches_read + 1)));
                }
                None => {
                    self.exhausted = true;
                    self.current = None;
                    tracing::debug!(batches = self.batches_read, "parquet input exhausted");
                }
            }
        }
        Ok(false)
    }
}

impl RowSource for ParquetReader {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(batch) = &self.current {
                if self.cursor < batch.num_rows() {
                    let row = record_batch_row(batch, self.cursor)?;
                    self.cursor += 1;
                    return Ok(Some(row));
                }
            }
            if !self.advance_batch()? {
                return Ok(None);
            }
        }
    }
}

/// Resolve projected column names to root field indices of `schema`.
fn projection_indices(schema: &ArrowSchema, columns: &[String]) -> Result<Vec<usize>> {
    if columns.is_empty() {
        return Err(Error::Schema("projection selects no columns".into()));
    }
    columns
        .iter()
        .map(|col_name| {
            schema
                .fields()
                .iter()
                .position(|f| f.name() == col_name)
                .ok_or_else(|| {
                    Error::Schema(format!("column '{}' not found in Parquet schema", col_name))
                })
        })
        .collect()
}
