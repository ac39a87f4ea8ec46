use super::category::{CategoryData, CategoryError, Table};
use std::path::Path;
use tracing::debug;

/// Reads one CSV file with a header row into a table named `name`.
pub fn read_table(name: &str, path: &Path) -> Result<Table, CategoryError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|source| CategoryError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|source| CategoryError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| CategoryError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
    Table::from_rows(name, &header_refs, &rows)
}

/// Loads every `<category>.csv` file of a directory; the file stem names the category.
pub fn read_directory(dir: &Path) -> Result<CategoryData, CategoryError> {
    let io_error = |source: std::io::Error| CategoryError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut data = CategoryData::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(io_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let table = read_table(name, &path)?;
        debug!("Loaded category '{}' with {} rows from {:?}", name, table.row_count(), path);
        data.insert(table);
    }
    Ok(data)
}
