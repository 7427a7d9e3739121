//! CSV input and CLI errors.

use condreg::CondregError;
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by the command-line front end.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Estimation error.
    #[error(transparent)]
    Condreg(#[from] CondregError),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input matrix.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Read a numeric matrix from a CSV file.
pub(crate) fn read_matrix(path: &Path) -> Result<Array2<f64>, CliError> {
    let file = File::open(path)?;
    let matrix = read_matrix_from(file)?;
    log::info!(
        "read {} x {} matrix from {}",
        matrix.nrows(),
        matrix.ncols(),
        path.display()
    );
    Ok(matrix)
}

/// Read a numeric matrix from CSV text.
///
/// A first row that does not parse as numbers is taken to be a header.
pub(crate) fn read_matrix_from<R: Read>(reader: R) -> Result<Array2<f64>, CliError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let parsed: Option<Vec<f64>> = record.iter().map(|field| field.parse().ok()).collect();
        match parsed {
            Some(row) => rows.push(row),
            None if index == 0 => log::debug!("treating first row as a header"),
            None => {
                return Err(CliError::InvalidInput(format!(
                    "row {} contains a non-numeric field",
                    index + 1
                )));
            }
        }
    }

    let ncols = rows.first().map_or(0, Vec::len);
    if ncols == 0 {
        return Err(CliError::InvalidInput("no numeric rows found".to_string()));
    }
    if let Some(bad) = rows.iter().position(|row| row.len() != ncols) {
        return Err(CliError::InvalidInput(format!(
            "row {} has {} fields, expected {}",
            bad + 1,
            rows[bad].len(),
            ncols
        )));
    }

    let nrows = rows.len();
    Array2::from_shape_vec((nrows, ncols), rows.concat())
        .map_err(|e| CliError::InvalidInput(e.to_string()))
}
