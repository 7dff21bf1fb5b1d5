//! CSV result output.
//!
//! Rows are written as soon as their batch finishes, so an interrupted run
//! still leaves every completed row on disk.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::types::ClassificationResult;

/// UTF-8 byte-order mark, written so spreadsheet tools pick the right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Output columns, in order.
pub const HEADER: [&str; 4] = ["imgname", "predict_label", "predict_label_num", "probability"];

/// Destination for classification results.
pub trait ResultSink {
    /// Write one record.
    fn write_record(&mut self, result: &ClassificationResult) -> io::Result<()>;

    /// Push buffered records to the underlying destination.
    fn flush(&mut self) -> io::Result<()>;
}

/// A writer that serializes results as CSV rows.
pub struct CsvWriter<W: Write> {
    writer: W,
    rows_written: usize,
}

impl CsvWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the BOM and header.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wrap `writer`, writing the BOM and header line immediately.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writer.write_all(UTF8_BOM)?;
        writeln!(writer, "{}", HEADER.join(","))?;
        writer.flush()?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Number of data rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Consume the writer and return the underlying destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for CsvWriter<W> {
    fn write_record(&mut self, result: &ClassificationResult) -> io::Result<()> {
        let path = result.path.to_string_lossy();
        writeln!(
            self.writer,
            "{},{},{},{}",
            escape_field(&path),
            escape_field(result.label_name),
            result.label_index,
            result.probability
        )?;
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(path: &str, label_index: usize, probability: f32) -> ClassificationResult {
        ClassificationResult {
            path: PathBuf::from(path),
            label_index,
            label_name: crate::classify::LABELS[label_index],
            probability,
        }
    }

    #[test]
    fn test_header_with_bom() {
        let writer = CsvWriter::new(Vec::new()).unwrap();
        let out = writer.into_inner();
        assert!(out.starts_with(UTF8_BOM));
        assert_eq!(
            String::from_utf8(out[3..].to_vec()).unwrap(),
            "imgname,predict_label,predict_label_num,probability\n"
        );
    }

    #[test]
    fn test_rows_in_order() {
        let mut writer = CsvWriter::new(Vec::new()).unwrap();
        writer.write_record(&result("a.jpg", 0, 0.5)).unwrap();
        writer.write_record(&result("b.jpg", 6, 0.25)).unwrap();
        assert_eq!(writer.rows_written(), 2);

        let out = String::from_utf8(writer.into_inner()[3..].to_vec()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "a.jpg,0.Panoramic-landscape,0,0.5");
        assert_eq!(lines[2], "b.jpg,6.Canopied-landscape,6,0.25");
    }

    #[test]
    fn test_paths_with_commas_are_quoted() {
        let mut writer = CsvWriter::new(Vec::new()).unwrap();
        writer
            .write_record(&result("photos/lake, \"dawn\".jpg", 1, 0.75))
            .unwrap();
        let out = String::from_utf8(writer.into_inner()[3..].to_vec()).unwrap();
        assert_eq!(
            out.lines().nth(1).unwrap(),
            "\"photos/lake, \"\"dawn\"\".jpg\",1.Feature-landscape,1,0.75"
        );
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.csv");
        assert!(CsvWriter::create(&path).is_err());
    }
}
