//! Workbook reading (calamine) and writing (rust_xlsxwriter)

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{CellValue, Dataset, DatasetError};

const READABLE_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xls"];
const DATE_FORMAT: &str = "dd.mm.yyyy";
const DATETIME_FORMAT: &str = "dd.mm.yyyy hh:mm:ss";

fn read_error(path: &Path, reason: impl ToString) -> DatasetError {
    DatasetError::Read {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn write_error(path: &Path, reason: impl ToString) -> DatasetError {
    DatasetError::Write {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::from(text.as_str()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => value
            .as_datetime()
            .map_or(CellValue::Number(value.as_f64()), CellValue::from_datetime),
        Data::DateTimeIso(text) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::from_datetime)
            .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d").map(CellValue::Date))
            .unwrap_or_else(|_| CellValue::from(text.as_str())),
        Data::DurationIso(text) => CellValue::from(text.as_str()),
        Data::Error(e) => {
            debug!("Cell error {:?} read as empty", e);
            CellValue::Empty
        }
    }
}

/// Read the first sheet of a workbook; the first row is the header
pub fn read_workbook(path: &Path) -> Result<Dataset, DatasetError> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| READABLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
    if !supported {
        return Err(DatasetError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| read_error(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| read_error(path, "workbook has no sheets"))?
        .map_err(|e| read_error(path, e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .unwrap_or_default();

    let mut dataset = Dataset::new(headers);
    for row in rows {
        dataset.push_row(row.iter().map(cell_from_data).collect());
    }

    info!(
        "Loaded {} rows, {} columns from {}",
        dataset.len(),
        dataset.headers().len(),
        path.display()
    );
    Ok(dataset)
}

/// Write the dataset as a single-sheet `.xlsx` workbook
pub fn write_workbook(dataset: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

    for (col, header) in dataset.headers().iter().enumerate() {
        let col = u16::try_from(col).map_err(|e| write_error(path, e))?;
        worksheet
            .write_string_with_format(0, col, header, &header_format)
            .map_err(|e| write_error(path, e))?;
    }

    for (index, cells) in dataset.rows().iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|e| write_error(path, e))?;
        for (col, cell) in cells.iter().enumerate() {
            let col = u16::try_from(col).map_err(|e| write_error(path, e))?;
            let written = match cell {
                CellValue::Empty => continue,
                CellValue::Text(text) => worksheet.write_string(row, col, text),
                CellValue::Number(value) => worksheet.write_number(row, col, *value),
                CellValue::Bool(value) => worksheet.write_boolean(row, col, *value),
                CellValue::Date(date) => {
                    worksheet.write_datetime_with_format(row, col, date, &date_format)
                }
                CellValue::DateTime(datetime) => {
                    worksheet.write_datetime_with_format(row, col, datetime, &datetime_format)
                }
            };
            written.map_err(|e| write_error(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| write_error(path, e))?;
    info!("Saved {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// Explicit output path, else `<stem>_processed.xlsx` next to the input
pub fn derive_output_path(input: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_processed.xlsx"))
}
