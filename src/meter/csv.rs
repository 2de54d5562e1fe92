//! CSV page counting: literal line-break splitting, bucketed.
//!
//! The billing rule is defined over physical lines, not parsed CSV records —
//! a quoted multi-line field still counts as the lines it occupies. Using a
//! CSV reader here would silently change invoices for such files.

use crate::meter::pages_for_rows;

/// Count billable pages for a CSV file.
///
/// Blank lines are dropped; when more than one line remains, one line is
/// subtracted for an assumed header row. Never fails — undecodable bytes are
/// replaced and counted as the lines they form.
pub(crate) fn count_pages(bytes: &[u8]) -> u64 {
    let text = String::from_utf8_lossy(bytes);
    let lines = text.lines().filter(|line| !line.trim().is_empty()).count() as u64;
    let data_rows = if lines > 1 { lines - 1 } else { lines };
    pages_for_rows(data_rows)
}
