//! Streaming CSV writer for a header line plus `Row`s.
//!
//! Fields are comma separated and quoted only when they contain the
//! delimiter, a quote or a line break. Output stays buffered until `flush`.

use std::io::Write;

use csv as csv_crate;
use pq2csv_core::schema::Schema;
use pq2csv_core::types::Row;

use crate::error::{Error, Result};

pub struct CsvWriter<W: Write> {
    wtr: csv_crate::Writer<W>,
    rows_written: u64,
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        let wtr = csv_crate::WriterBuilder::new()
            .delimiter(b',')
            .quote_style(csv_crate::QuoteStyle::Necessary)
            .terminator(csv_crate::Terminator::Any(b'\n'))
            .from_writer(writer);
        Self {
            wtr,
            rows_written: 0,
        }
    }

    /// Write the column names of `schema` as one record.
    pub fn write_header(&mut self, schema: &Schema) -> Result<()> {
        self.wtr.write_record(schema.column_names())?;
        Ok(())
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        self.wtr.write_record(row.fields().map(|f| f.into_owned()))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Push buffered records through to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }

    /// Data rows accepted so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}
