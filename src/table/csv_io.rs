//! CSV loading and atomic full-table writes

use crate::config::TableConfig;
use crate::table::row::{Row, RowSet, Schema};
use crate::{LoadError, PersistError};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads the whole table into memory
///
/// Short records are accepted and their missing cells stay empty. Cells
/// beyond the header width are discarded.
///
/// # Errors
///
/// Any failure here is a [`LoadError`]: the file cannot be opened, the CSV is
/// malformed, or the header has no url column.
pub fn load_table(path: &Path, config: &TableConfig) -> Result<RowSet, LoadError> {
    let display = path.display().to_string();

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: display.clone(),
            source,
        })?
        .iter()
        .map(str::to_string)
        .collect();
    let header_width = headers.len();

    let schema = Schema::new(headers, &config.url_column, &config.manifest_column).ok_or_else(
        || LoadError::MissingUrlColumn {
            path: display.clone(),
            column: config.url_column.clone(),
        },
    )?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::Csv {
            path: display.clone(),
            source,
        })?;

        let mut cells: Vec<Option<String>> = record
            .iter()
            .take(header_width)
            .map(|cell| Some(cell.to_string()))
            .collect();
        cells.resize(schema.len(), None);
        rows.push(Row::new(cells));
    }

    tracing::debug!("Columns: {:?}", schema.columns());
    Ok(RowSet::new(schema, rows))
}

/// Overwrites the table with the current contents of `rows`
///
/// Only schema columns are written. The data goes to a temporary file in the
/// target's directory which is synced and renamed over the target, so a crash
/// leaves either the old table or the new one.
pub fn write_table(path: &Path, rows: &RowSet) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = csv::Writer::from_writer(tmp);

    let schema = rows.schema();
    writer.write_record(schema.columns())?;
    for row in rows.rows() {
        writer.write_record(row.rendered(schema.len()))?;
    }

    let mut tmp = writer
        .into_inner()
        .map_err(|e| PersistError::Io(e.into_error()))?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;

    // Temp files are created 0600; the table keeps whatever mode it had
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| PersistError::Rename {
        path: path.display().to_string(),
        source: e.error,
    })?;
    Ok(())
}
