//! CSV reading and writing.

use std::{fs::File, io::Cursor, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::{SerReader, SerWriter}, prelude::{CsvReadOptions, CsvWriter}};

/// Reads a CSV file with a header row from `path` into a Polars DataFrame.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Reads CSV text already held in memory.
pub fn read_csv_string(csv: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(csv.as_bytes()))
        .finish()
        .context("[io::csv::read] Failed to read CSV from string")
}

/// Write a DataFrame to a CSV file, creating parent directories as needed.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("[io::csv::write] Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    #[test]
    fn file_round_trip_preserves_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("features.csv");

        let mut df = df!(
            "year" => [2010i64, 2011],
            "district" => [1i64, 2],
            "percnt_true" => [0.5, 0.0],
        ).unwrap();
        write_csv(&mut df, &path).unwrap();

        let back = read_csv(&path).unwrap();
        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back.get_column_names(), df.get_column_names());
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = read_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("not/here.csv"));
    }

    #[test]
    fn reads_in_memory_text() {
        let df = read_csv_string("district,neighbor\n1,2\n2,1\n").unwrap();
        assert_eq!(df.height(), 2);
    }
}
