//! Workbook read/write against real files
use chrono::NaiveDate;
use rmsp_lookup::infrastructure::dataset::{
    CellValue, Dataset, DatasetError, read_workbook, write_workbook,
};

#[test]
fn typed_cells_survive_a_write_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.xlsx");
    let date = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();

    let mut dataset = Dataset::new(vec!["ИНН".to_string(), "Дата заключения".to_string(), "Флаг".to_string()]);
    dataset.push_row(vec![
        CellValue::Number(500100732259.0),
        CellValue::Date(date),
        CellValue::Bool(true),
    ]);
    dataset.push_row(vec![CellValue::from("7707083893"), CellValue::from("01.02.2020")]);
    write_workbook(&dataset, &path).unwrap();

    let loaded = read_workbook(&path).unwrap();
    assert_eq!(loaded.headers(), dataset.headers());
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get(0, 0).as_text().as_deref(), Some("500100732259"));
    assert_eq!(loaded.get(0, 1), &CellValue::Date(date));
    assert_eq!(loaded.get(0, 2), &CellValue::Bool(true));
    assert_eq!(loaded.get(1, 1), &CellValue::from("01.02.2020"));
    assert_eq!(loaded.get(1, 2), &CellValue::Empty);
}

#[test]
fn missing_required_columns_are_reported_with_available_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("columns.xlsx");

    let mut dataset = Dataset::new(vec!["Контрагент".to_string(), "ИНН".to_string()]);
    dataset.push_row(vec![CellValue::from("ООО Ромашка"), CellValue::from("7707083893")]);
    write_workbook(&dataset, &path).unwrap();

    let loaded = read_workbook(&path).unwrap();
    match loaded.require_columns(&["ИНН", "Дата заключения"]) {
        Err(DatasetError::MissingColumns { missing, available }) => {
            assert_eq!(missing, vec!["Дата заключения"]);
            assert_eq!(available, vec!["Контрагент", "ИНН"]);
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
}

#[test]
fn unreadable_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a zip archive").unwrap();

    assert!(matches!(read_workbook(&path), Err(DatasetError::Read { .. })));
}
