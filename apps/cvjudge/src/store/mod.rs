//! Record Store — loads or creates the working table and persists it atomically.

pub mod sentinel;
pub mod sheet;
pub mod table;

use std::path::Path;

use tracing::info;

use crate::errors::AppError;
pub use sentinel::{Counterpart, Winner};
pub use sheet::Sheet;
pub use table::{RecordState, Table};

/// Loads the checkpoint verbatim when it exists, otherwise builds a fresh table from `base`.
/// Configured judges missing from a checkpoint get empty columns.
pub fn load_or_create(
    base: &Path,
    progress: &Path,
    body_column: &str,
    judges: &[String],
) -> Result<Table, AppError> {
    if progress.exists() {
        info!("Loading progress from {}...", progress.display());
        let mut table = Table::from_checkpoint(Sheet::read(progress)?, body_column, progress)?;
        let added = table.ensure_judges(judges);
        if !added.is_empty() {
            info!(
                "Added result columns for new judges: {} (existing rows will be reprocessed for them)",
                added.join(", ")
            );
        }
        return Ok(table);
    }

    info!("Loading base file {}...", base.display());
    let table = Table::from_base(Sheet::read(base)?, body_column, judges, base)?;
    info!("Created table with {} records", table.len());
    Ok(table)
}

/// Writes the full table in checkpoint layout, replacing `path` atomically.
pub fn persist(table: &Table, path: &Path) -> Result<(), AppError> {
    table.to_sheet().write_atomic(path)
}
