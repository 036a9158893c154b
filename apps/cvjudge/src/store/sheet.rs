//! Untyped CSV sheet: a header row plus string cells, read and written verbatim.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Reads every cell as a string. A missing file is `MissingInput`.
    pub fn read(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::MissingInput(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| r.map(|record| record.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

        debug!(path = %path.display(), rows = rows.len(), "sheet loaded");
        Ok(Sheet { headers, rows })
    }

    /// Writes to a temp file beside `path`, then renames it over `path`.
    /// Readers see either the old file or the complete new one.
    pub fn write_atomic(&self, path: &Path) -> Result<(), AppError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| AppError::Io(e.error))?;

        debug!(path = %path.display(), rows = self.rows.len(), "sheet persisted");
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Appends a column filled with `value`, returning its index.
    pub fn add_column(&mut self, name: &str, value: &str) -> usize {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
        self.headers.len() - 1
    }
}
