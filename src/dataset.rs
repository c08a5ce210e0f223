use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{QcError, Result};

/// One assessed property. Cells are addressed through the owning
/// [`Dataset`]'s header; a row shorter than the header simply has no value
/// for the trailing columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut String> {
        self.fields.get_mut(idx)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact, case-sensitive header lookup. The first match wins when a
    /// header is duplicated.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell value by column name. `None` when either the column or the
    /// cell is absent.
    pub fn value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a str> {
        self.column_index(column).and_then(|i| record.get(i))
    }

    /// New dataset with the same header, keeping records for which `keep`
    /// returns true. Order is preserved.
    pub fn filtered<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        Dataset {
            headers: self.headers.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// Counters from a load, mirroring what gets echoed to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

pub fn load_csv(path: &Path) -> Result<(Dataset, LoadReport)> {
    let file = File::open(path).map_err(|e| QcError::io(path, e))?;
    debug!(path = %path.display(), "reading assessment csv");
    read_csv(file)
}

/// Reads a comma-delimited, header-first CSV. Rows that fail to decode are
/// counted and skipped; a missing header row is an error.
pub fn read_csv<R: Read>(reader: R) -> Result<(Dataset, LoadReport)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(QcError::EmptyInput);
    }

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = report.total_rows, error = %e, "CSV parse error, row skipped");
                report.parse_errors += 1;
                continue;
            }
        };
        records.push(Record::new(row.iter()));
        report.loaded_rows += 1;
    }

    debug!(
        columns = headers.len(),
        rows = report.loaded_rows,
        errors = report.parse_errors,
        "csv loaded"
    );
    Ok((Dataset::new(headers, records), report))
}
