//! Spreadsheet page counting: non-empty rows across all sheets, bucketed.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::FileError;
use crate::meter::pages_for_rows;

/// Count billable pages for an xlsx/xls workbook.
///
/// A row counts when any of its cells holds a non-empty value; the total over
/// all sheets is bucketed into pages of 50 rows.
pub(crate) fn count_pages(name: &str, bytes: &[u8]) -> Result<u64, FileError> {
    let cursor = Cursor::new(bytes);
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| FileError::CountFailed {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

    let mut rows = 0u64;
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| FileError::CountFailed {
                name: name.to_string(),
                detail: format!("sheet '{sheet_name}': {e}"),
            })?;
        rows += range.rows().filter(|row| row_has_value(row)).count() as u64;
    }

    Ok(pages_for_rows(rows))
}

/// True when any cell in the row holds a non-null, non-empty value.
fn row_has_value(row: &[Data]) -> bool {
    row.iter().any(|cell| match cell {
        Data::Empty => false,
        Data::String(s) => !s.is_empty(),
        _ => true,
    })
}
