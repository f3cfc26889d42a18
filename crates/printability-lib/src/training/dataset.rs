//! Experimental dataset loading
//!
//! Reads a CSV export of the lab sheet into [`RawRecord`]s. Every column is
//! kept as-is; interpretation happens later in feature extraction.

use crate::error::TrainingError;
use crate::models::{CellValue, RawRecord};
use std::io::Read;
use std::path::Path;

/// Load every row of a CSV file with a header line
pub fn load_csv(path: &Path) -> Result<Vec<RawRecord>, TrainingError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| TrainingError::Dataset {
            path: path.to_path_buf(),
            source,
        })?;
    read_records(reader).map_err(|source| TrainingError::Dataset {
        path: path.to_path_buf(),
        source,
    })
}

/// Load records from any CSV source (used for in-memory fixtures)
pub fn load_csv_reader<R: Read>(rdr: R) -> Result<Vec<RawRecord>, csv::Error> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    read_records(reader)
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRecord>, csv::Error> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let mut record = RawRecord::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = row.get(idx).map(CellValue::from_field).unwrap_or(CellValue::Empty);
            record.insert(header.clone(), value);
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::columns;

    const SAMPLE: &str = "\
Composition,Crosslinker,Gauge,LH (mm),Pressure (kPa),TG (°C),Printable
\"Silk 5%, Gelatin 15%\",Genipin,22,0.1,40,25,Yes
\"Silk 4%, Gelatin 16%\",None,\u{2013},,35,24,-
";

    #[test]
    fn test_reads_headers_and_cells() {
        let records = load_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get(columns::COMPOSITION),
            Some(&CellValue::from("Silk 5%, Gelatin 15%"))
        );
        assert_eq!(records[0].get(columns::TEMPERATURE), Some(&CellValue::from("25")));
        assert_eq!(records[1].get(columns::LAYER_HEIGHT), Some(&CellValue::Empty));
        assert_eq!(records[1].get(columns::GAUGE), Some(&CellValue::from("\u{2013}")));
    }

    #[test]
    fn test_short_rows_pad_with_empty() {
        let data = "Composition,Printable\n\"Silk 5%, Gelatin 15%\"\n";
        let records = load_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(records[0].get(columns::PRINTABLE), Some(&CellValue::Empty));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_csv(Path::new("/nonexistent/raw_data.csv")).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset { .. }));
    }
}
