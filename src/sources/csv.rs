//! Hourly profiles read from CSV files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::SourceError;

/// Reads one value per record from a CSV file.
///
/// See [`parse_hourly_csv`] for the accepted layout.
///
/// # Errors
///
/// Returns a [`SourceError`] if the file cannot be opened or parsed.
pub fn read_hourly_csv(path: &Path) -> Result<Vec<f64>, SourceError> {
    let label = path.display().to_string();
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: label.clone(),
        source,
    })?;
    parse_hourly_csv(file, &label)
}

/// Parses one value per record from CSV data.
///
/// The last column of every record is used, so both a bare column of numbers
/// and `timestamp,value` exports are accepted. A first record that does not
/// parse as a number is treated as a header. Callers check the length.
///
/// # Errors
///
/// Returns a [`SourceError`] for malformed CSV or unparsable values.
pub fn parse_hourly_csv(reader: impl Read, label: &str) -> Result<Vec<f64>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|source| SourceError::Csv {
            path: label.to_string(),
            source,
        })?;
        let Some(field) = record.iter().last() else {
            continue;
        };
        match field.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) if i == 0 => {}
            Err(_) => {
                return Err(SourceError::Parse {
                    path: label.to_string(),
                    line: i + 1,
                    value: field.to_string(),
                });
            }
        }
    }

    Ok(values)
}
