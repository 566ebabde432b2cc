use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::rc::Rc;

use csv::{ReaderBuilder, StringRecord};

use crate::error::PillTrackError;

/// Header name → column position. Names are trimmed, lower-cased and stripped
/// of a UTF-8 byte order mark.
type HeaderIndex = HashMap<String, usize>;

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// A CSV file whose first line is a header row. Rows are read lazily; shorter
/// rows than the header are accepted and their missing fields read as absent.
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
    columns: Rc<HeaderIndex>,
}

impl CsvSource<File> {
    pub fn open(path: &Path) -> Result<Self, PillTrackError> {
        let file = File::open(path).map_err(|e| {
            PillTrackError::IoError(io::Error::new(
                e.kind(),
                format!("Cannot open CSV '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_reader(file)
    }
}

impl<R: io::Read> CsvSource<R> {
    pub fn from_reader(rdr: R) -> Result<Self, PillTrackError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);

        let columns: HeaderIndex = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (normalize_header(name), i))
            .collect();

        Ok(Self {
            reader,
            columns: Rc::new(columns),
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn rows(&mut self) -> impl Iterator<Item = Result<CsvRow, csv::Error>> + '_ {
        let columns = Rc::clone(&self.columns);
        self.reader.records().map(move |record| {
            record.map(|record| CsvRow {
                columns: Rc::clone(&columns),
                record,
            })
        })
    }
}

/// One data row, addressed by header name.
#[derive(Debug, Clone)]
pub struct CsvRow {
    columns: Rc<HeaderIndex>,
    record: StringRecord,
}

impl CsvRow {
    /// Trimmed field value; `None` when the column or field is absent or blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        let idx = *self.columns.get(name)?;
        let value = self.record.get(idx)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Integer field; `None` when absent, blank or not an integer.
    pub fn int_field(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(|v| v.parse().ok())
    }

    /// Decimal field; `None` when absent, blank or not a finite number.
    pub fn decimal_field(&self, name: &str) -> Option<f64> {
        self.field(name)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Count field; `default` when absent, blank or not an integer.
    pub fn count_field(&self, name: &str, default: i64) -> i64 {
        self.int_field(name).unwrap_or(default)
    }

    /// 1-based line of this row in the source, when known.
    pub fn line(&self) -> Option<u64> {
        self.record.position().map(|p| p.line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(data: &str) -> CsvSource<&[u8]> {
        CsvSource::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_fields_by_header_name() {
        let mut src = source("brand id,Brand Name ,unit_price\n 42 , Napa ,1.20\n");
        assert!(src.has_column("brand name"));

        let rows: Vec<CsvRow> = src.rows().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.field("brand name"), Some("Napa"));
        assert_eq!(row.int_field("brand id"), Some(42));
        assert_eq!(row.decimal_field("unit_price"), Some(1.2));
        assert_eq!(row.line(), Some(2));
    }

    #[test]
    fn test_blank_and_missing_fields_are_absent() {
        let mut src = source("a,b,c\n1,   \n");
        let row = src.rows().next().unwrap().unwrap();
        assert_eq!(row.field("a"), Some("1"));
        assert_eq!(row.field("b"), None);
        assert_eq!(row.field("c"), None);
        assert_eq!(row.field("no such column"), None);
    }

    #[test]
    fn test_defensive_numeric_parsing() {
        let mut src = source("unit_price,generics count,brand id\nN/A,many,12x\n");
        let row = src.rows().next().unwrap().unwrap();
        assert_eq!(row.decimal_field("unit_price"), None);
        assert_eq!(row.count_field("generics count", 0), 0);
        assert_eq!(row.int_field("brand id"), None);
    }

    #[test]
    fn test_non_finite_decimals_are_absent() {
        let mut src = source("unit_price,pack_price\nNaN,inf\n");
        let row = src.rows().next().unwrap().unwrap();
        assert_eq!(row.decimal_field("unit_price"), None);
        assert_eq!(row.decimal_field("pack_price"), None);
    }

    #[test]
    fn test_quoted_fields_and_bom() {
        let mut src = source("\u{feff}brand name,generic\n\"Napa, Extra\",\"Paracetamol + Caffeine\"\n");
        let row = src.rows().next().unwrap().unwrap();
        assert_eq!(row.field("brand name"), Some("Napa, Extra"));
        assert_eq!(row.field("generic"), Some("Paracetamol + Caffeine"));
    }

    #[test]
    fn test_open_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "indication name,slug").unwrap();
        writeln!(file, "Fever,fever").unwrap();
        writeln!(file, "Pain,pain").unwrap();

        let mut src = CsvSource::open(file.path()).unwrap();
        assert_eq!(src.rows().count(), 2);
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(CsvSource::open(Path::new("/nonexistent/medicine.csv")).is_err());
    }
}
