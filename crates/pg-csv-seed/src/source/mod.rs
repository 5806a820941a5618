//! CSV source files.

pub mod layout;

pub use layout::FileLayout;

use crate::error::{Result, SeedError};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// One data row of a CSV export.
#[derive(Debug, Clone)]
pub struct CsvRow {
    line: u64,
    record: StringRecord,
}

impl CsvRow {
    /// Build a row from raw fields, for callers that do not read files.
    pub fn from_fields<I, T>(line: u64, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut record = StringRecord::new();
        for field in fields {
            record.push_field(field.as_ref());
        }
        Self { line, record }
    }

    /// 1-based line the row starts on.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Number of fields in the row.
    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Field at a zero-based position, or `""` past the end.
    pub fn field(&self, position: usize) -> &str {
        self.record.get(position).unwrap_or("")
    }

    /// Field at a zero-based position, or `None` past the end.
    pub fn optional(&self, position: usize) -> Option<&str> {
        self.record.get(position)
    }
}

/// Streaming reader over the data rows of one CSV export.
///
/// The header row is consumed and ignored. Rows may have any number of
/// fields; length checks belong to the loaders.
pub struct CsvSource<R: Read> {
    file: String,
    reader: csv::Reader<R>,
    record: StringRecord,
}

impl CsvSource<File> {
    /// Open `layout.file_name` inside `dir`.
    pub fn open(dir: &Path, layout: &FileLayout) -> Result<Self> {
        let path = dir.join(layout.file_name);
        let file = File::open(&path)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_reader(layout.file_name, file))
    }
}

impl<R: Read> CsvSource<R> {
    /// Build a source from any `Read`.
    pub fn from_reader(file: impl Into<String>, reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Self {
            file: file.into(),
            reader,
            record: StringRecord::new(),
        }
    }

    /// File name used in error messages.
    pub fn file(&self) -> &str {
        &self.file
    }
}

impl<R: Read> Iterator for CsvSource<R> {
    type Item = Result<CsvRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                Some(Ok(CsvRow {
                    line,
                    record: self.record.clone(),
                }))
            }
            Ok(false) => None,
            Err(e) => Some(Err(SeedError::csv(self.file.clone(), e))),
        }
    }
}
