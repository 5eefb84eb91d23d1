//! Runtime: drive a `RowSource` into a `CsvWriter` and report what happened.
//!
//! Behavior:
//! - Writes the header first, even when the source has no rows.
//! - Pulls rows strictly one at a time; there is no read-ahead beyond what the
//!   source itself does.
//! - Stops after exactly `row_limit` rows when the limit is non-zero, without
//!   asking the source for another row.
//! - Flushes every `flush_every` rows, at the limit and at end of data.
//! - Any decode or write failure ends the run; nothing is retried or skipped.

use std::fmt;
use std::io::Write;

use thiserror::Error;

use pq2csv_core::config::ConvertConfig;
use pq2csv_core::session::{ConversionReport, ConversionSession};
use pq2csv_io::error::Error as IoError;
use pq2csv_io::readers::parquet::{ParquetReader, ReadOptions};
use pq2csv_io::readers::RowSource;
use pq2csv_io::writers::csv::CsvWriter;

use parquet::file::reader::ChunkReader;

/// Where a write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Header,
    /// 1-based number of the row being written.
    Row(u64),
    Flush,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStage::Header => f.write_str("headers"),
            WriteStage::Row(n) => write!(f, "row {}", n),
            WriteStage::Flush => f.write_str("buffered output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input could not be opened as a Parquet file (bad magic, truncated
    /// footer, unknown projected column). Nothing has been written.
    #[error("failed to open parquet input: {0}")]
    Format(#[source] IoError),

    /// A row could not be decoded. Rows before `row` are in the output.
    #[error("reading record {row} failed: {source}")]
    Decode {
        row: u64,
        #[source]
        source: IoError,
    },

    /// The output stream rejected a write.
    #[error("failed to write {stage}: {source}")]
    Write {
        stage: WriteStage,
        #[source]
        source: IoError,
    },
}

impl ConvertError {
    fn write(stage: WriteStage, source: IoError) -> Self {
        ConvertError::Write { stage, source }
    }

    /// Short name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            ConvertError::Format(_) => "open",
            ConvertError::Decode { .. } => "row-read",
            ConvertError::Write { stage: WriteStage::Header, .. } => "header-write",
            ConvertError::Write { stage: WriteStage::Row(_), .. } => "row-write",
            ConvertError::Write { stage: WriteStage::Flush, .. } => "flush",
        }
    }

    /// Get suggestions for common errors.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ConvertError::Format(IoError::Schema(_)) => vec![
                "Check that the column name is spelled correctly".into(),
                "Run with --schema to list the columns of the input file".into(),
            ],
            ConvertError::Format(IoError::Io(_)) => {
                vec!["Check that the input path exists and is readable".into()]
            }
            ConvertError::Format(_) => vec![
                "Check that the input is a Parquet file".into(),
                "The file may be truncated; re-copy or regenerate it".into(),
            ],
            ConvertError::Decode { row, .. } if *row > 1 => vec![
                format!("Rows 1 to {} were converted before the failure", row - 1),
                format!("Use -n {} to extract only the readable prefix", row - 1),
            ],
            ConvertError::Decode { .. } => {
                vec!["The first row group could not be decoded; the file may be corrupt".into()]
            }
            ConvertError::Write { .. } => vec![
                "Check free space and permissions of the output destination".into(),
            ],
        }
    }
}

/// Converter owns the configuration of one conversion call.
pub struct Converter {
    cfg: ConvertConfig,
}

impl Converter {
    pub fn new(cfg: ConvertConfig) -> Self {
        Self { cfg }
    }

    /// Write the header and then every row of `source` to `writer`.
    ///
    /// On a decode error the rows already written are flushed (best effort)
    /// before the error is returned.
    pub fn run<S, W>(
        &self,
        source: &mut S,
        writer: &mut CsvWriter<W>,
    ) -> Result<ConversionReport, ConvertError>
    where
        S: RowSource + ?Sized,
        W: Write,
    {
        writer
            .write_header(source.schema())
            .map_err(|e| ConvertError::write(WriteStage::Header, e))?;

        let mut session = ConversionSession::new(self.cfg.row_limit, self.cfg.flush_every);

        loop {
            let attempt = session.begin_row();

            let row = match source.next_row() {
                Ok(Some(row)) => row,
                Ok(None) => {
                    flush(writer)?;
                    let report = session.finish_end_of_data();
                    tracing::info!(rows = report.rows, "Reached end of file ({} records)", report.rows);
                    return Ok(report);
                }
                Err(e) => {
                    if let Err(flush_err) = writer.flush() {
                        tracing::warn!(error = %flush_err, "could not flush rows written before the read failure");
                    }
                    return Err(ConvertError::Decode { row: attempt, source: e });
                }
            };

            writer
                .write_row(&row)
                .map_err(|e| ConvertError::write(WriteStage::Row(attempt), e))?;

            if session.limit_reached() {
                flush(writer)?;
                let report = session.finish_row_limit();
                tracing::info!(rows = report.rows, "Reached row limit ({} rows)", report.rows);
                return Ok(report);
            } else if session.flush_due() {
                flush(writer)?;
                tracing::info!(rows = attempt, "Processed {} records...", attempt);
            }
        }
    }
}

/// Open `input` as Parquet and convert it to CSV on `out`.
///
/// `projection` restricts the output to the named top-level columns.
pub fn convert_parquet<T, W>(
    input: T,
    out: W,
    cfg: ConvertConfig,
    projection: Option<Vec<String>>,
) -> Result<ConversionReport, ConvertError>
where
    T: ChunkReader + 'static,
    W: Write,
{
    let mut options = ReadOptions::from_config(&cfg);
    options.projection = projection;

    let mut reader = ParquetReader::try_new(input, options).map_err(ConvertError::Format)?;
    let mut writer = CsvWriter::to_writer(out);
    Converter::new(cfg).run(&mut reader, &mut writer)
}

fn flush<W: Write>(writer: &mut CsvWriter<W>) -> Result<(), ConvertError> {
    writer
        .flush()
        .map_err(|e| ConvertError::write(WriteStage::Flush, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq2csv_core::schema::{DataType, Field, Schema};
    use pq2csv_core::session::Termination;
    use pq2csv_core::types::{Row, Scalar};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    /// Scripted row source that records how often it was polled.
    struct MockSource {
        schema: Schema,
        script: VecDeque<Result<Row, IoError>>,
        calls: u64,
    }

    impl MockSource {
        fn with_rows(n: u64) -> Self {
            let script = (1..=n).map(|i| Ok(numbered_row(i))).collect();
            Self {
                schema: schema(),
                script,
                calls: 0,
            }
        }

        /// `n` rows where row `bad` fails to decode.
        fn failing_at(n: u64, bad: u64) -> Self {
            let script = (1..=n)
                .map(|i| {
                    if i == bad {
                        Err(IoError::Other(format!("corrupt page in row {i}")))
                    } else {
                        Ok(numbered_row(i))
                    }
                })
                .collect();
            Self {
                schema: schema(),
                script,
                calls: 0,
            }
        }
    }

    impl RowSource for MockSource {
        fn schema(&self) -> &Schema {
            &self.schema
        }

        fn next_row(&mut self) -> pq2csv_io::Result<Option<Row>> {
            self.calls += 1;
            self.script.pop_front().transpose()
        }
    }

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("label", DataType::Utf8, true),
            Field::new("flag", DataType::Boolean, true),
        ])
    }

    fn numbered_row(i: u64) -> Row {
        Row::from(vec![
            Scalar::I64(i as i64),
            Scalar::Str(format!("r{i}")),
            Scalar::Bool(i % 2 == 0),
        ])
    }

    /// Writer whose contents stay observable after the CsvWriter is done.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.borrow().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "downstream closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn cfg(row_limit: u64) -> ConvertConfig {
        ConvertConfig::default().with_row_limit(row_limit)
    }

    #[test]
    fn unlimited_converts_every_row() {
        let buf = SharedBuf::default();
        let mut writer = CsvWriter::to_writer(buf.clone());
        let mut source = MockSource::with_rows(10);

        let report = Converter::new(cfg(0)).run(&mut source, &mut writer).unwrap();

        assert_eq!(report.rows, 10);
        assert_eq!(report.termination, Termination::EndOfData);
        let lines = buf.lines();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "id,label,flag");
        assert_eq!(lines[1], "1,r1,false");
        assert_eq!(lines[10], "10,r10,true");
    }

    #[test]
    fn limit_stops_without_probing_next_row() {
        let buf = SharedBuf::default();
        let mut writer = CsvWriter::to_writer(buf.clone());
        let mut source = MockSource::with_rows(10);

        let report = Converter::new(cfg(5)).run(&mut source, &mut writer).unwrap();

        assert_eq!(report.rows, 5);
        assert_eq!(report.termination, Termination::RowLimit);
        assert_eq!(source.calls, 5);
        // Flushed at the limit, before the writer is dropped.
        assert_eq!(buf.lines().len(), 6);
    }

    #[test]
    fn limit_above_row_count_never_triggers() {
        let buf = SharedBuf::default();
        let mut writer = CsvWriter::to_writer(buf.clone());
        let mut source = MockSource::with_rows(3);

        let report = Converter::new(cfg(50)).run(&mut source, &mut writer).unwrap();

        assert_eq!(report.rows, 3);
        assert_eq!(report.termination, Termination::EndOfData);
        assert_eq!(source.calls, 4);
        assert_eq!(buf.lines().len(), 4);
    }

    #[test]
    fn limit_equal_to_row_count_stops_on_limit() {
        let mut writer = CsvWriter::to_writer(Vec::new());
        let mut source = MockSource::with_rows(4);

        let report = Converter::new(cfg(4)).run(&mut source, &mut writer).unwrap();

        assert_eq!(report.termination, Termination::RowLimit);
        assert_eq!(source.calls, 4);
    }

    #[test]
    fn empty_source_writes_only_header() {
        let buf = SharedBuf::default();
        let mut writer = CsvWriter::to_writer(buf.clone());
        let mut source = MockSource::with_rows(0);

        let report = Converter::new(cfg(0)).run(&mut source, &mut writer).unwrap();

        assert_eq!(report.rows, 0);
        assert_eq!(report.termination, Termination::EndOfData);
        assert_eq!(buf.lines(), vec!["id,label,flag".to_string()]);
    }

    #[test]
    fn decode_error_keeps_prior_rows_and_fails() {
        let buf = SharedBuf::default();
        let mut writer = CsvWriter::to_writer(buf.clone());
        let mut source = MockSource::failing_at(10, 7);

        let err = Converter::new(cfg(0)).run(&mut source, &mut writer).unwrap_err();

        match &err {
            ConvertError::Decode { row, .. } => assert_eq!(*row, 7),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert_eq!(err.stage(), "row-read");
        assert_eq!(source.calls, 7);

        let lines = buf.lines();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[6], "6,r6,true");
        assert!(!lines.iter().any(|l| l.starts_with("7,")));
    }

    /// Source that records how many output lines were visible at each poll.
    struct ProbeSource {
        inner: MockSource,
        out: SharedBuf,
        seen: Vec<usize>,
    }

    impl RowSource for ProbeSource {
        fn schema(&self) -> &Schema {
            self.inner.schema()
        }

        fn next_row(&mut self) -> pq2csv_io::Result<Option<Row>> {
            self.seen.push(self.out.lines().len());
            self.inner.next_row()
        }
    }

    #[test]
    fn periodic_flush_happens_on_interval() {
        let buf = SharedBuf::default();
        let mut writer = CsvWriter::to_writer(buf.clone());
        let mut source = ProbeSource {
            inner: MockSource::with_rows(5),
            out: buf.clone(),
            seen: Vec::new(),
        };
        let config = ConvertConfig {
            flush_every: 2,
            ..ConvertConfig::default()
        };

        Converter::new(config).run(&mut source, &mut writer).unwrap();

        // Header and rows stay buffered until rows 2 and 4 trigger a flush.
        assert_eq!(source.seen, vec![0, 0, 3, 3, 5, 5]);
        assert_eq!(buf.lines().len(), 6);
    }

    #[test]
    fn write_failure_is_fatal_write_error() {
        let mut writer = CsvWriter::to_writer(FailingWriter);
        let mut source = MockSource::with_rows(2);

        let err = Converter::new(cfg(0)).run(&mut source, &mut writer).unwrap_err();

        assert!(matches!(err, ConvertError::Write { .. }));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn scalar_rendering_is_stable_across_rows() {
        let mut writer = CsvWriter::to_writer(Vec::new());
        let mut source = MockSource {
            schema: Schema::new(vec![
                Field::new("n", DataType::Int64, false),
                Field::new("b", DataType::Boolean, false),
                Field::new("s", DataType::Binary, true),
            ]),
            script: (0..3)
                .map(|_| {
                    Ok(Row::from(vec![
                        Scalar::I64(42),
                        Scalar::Bool(true),
                        Scalar::Bin(b"hello,world".to_vec()),
                    ]))
                })
                .collect(),
            calls: 0,
        };

        Converter::new(cfg(0)).run(&mut source, &mut writer).unwrap();

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "n,b,s");
        for line in &lines[1..] {
            assert_eq!(*line, "42,true,\"hello,world\"");
        }
    }

    #[test]
    fn null_values_render_as_empty_fields() {
        let mut writer = CsvWriter::to_writer(Vec::new());
        let mut source = MockSource {
            schema: schema(),
            script: vec![Ok(Row::from(vec![Scalar::I64(1), Scalar::Null, Scalar::Null]))].into(),
            calls: 0,
        };

        Converter::new(cfg(0)).run(&mut source, &mut writer).unwrap();

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "id,label,flag\n1,,\n");
    }

    #[test]
    fn stage_names_follow_error_kind() {
        let format = ConvertError::Format(IoError::Other("bad magic".into()));
        assert_eq!(format.stage(), "open");
        assert!(format.suggestions().iter().any(|s| s.contains("Parquet")));

        let header = ConvertError::write(
            WriteStage::Header,
            IoError::Io(io::Error::new(io::ErrorKind::Other, "x")),
        );
        assert_eq!(header.stage(), "header-write");
        assert!(header.to_string().contains("headers"));

        let decode = ConvertError::Decode {
            row: 7,
            source: IoError::Other("bad page".into()),
        };
        assert!(decode.suggestions().iter().any(|s| s.contains("-n 6")));
    }
}
