//! Billable page metering across heterogeneous file formats.
//!
//! Each submodule implements exactly one format's counting rule. Keeping the
//! rules separate makes each independently testable and lets a rule change
//! (billing rules do change) without touching the others.
//!
//! ## Counting rules
//!
//! | Format        | Rule                                             |
//! |---------------|--------------------------------------------------|
//! | PDF           | native page count from the page table            |
//! | xlsx / xls    | non-empty rows across all sheets, ÷ 50, floored  |
//! | CSV           | non-blank lines minus an assumed header, ÷ 50    |
//! | png/jpg/jpeg  | flat 1                                           |
//! | anything else | 0, surfaced as a warning                         |
//!
//! A per-file failure never aborts the batch: the file is reported with zero
//! pages and a [`FileError`] so callers see exactly what was not counted.

mod csv;
mod format;
mod pdf;
mod sheet;

pub use format::FileFormat;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::FileError;

/// Rows per billable page for tabular formats.
const ROWS_PER_PAGE: u64 = 50;

/// Bucket a row count into billable pages (floored).
pub(crate) fn pages_for_rows(rows: u64) -> u64 {
    rows / ROWS_PER_PAGE
}

/// A candidate file: raw bytes plus the declared filename the format is
/// inferred from.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Per-file metering result.
///
/// `error` carries the non-fatal reason when `pages` could not be computed
/// (then `pages` is 0) or when the format is unknown.
#[derive(Debug, Clone, Serialize)]
pub struct FileCount {
    pub name: String,
    /// Input size in bytes.
    pub size: u64,
    pub format: FileFormat,
    pub pages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

/// Aggregated metering result for a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchCount {
    /// Sum of all per-file page counts.
    pub total: u64,
    /// Per-file breakdown in input order.
    pub files: Vec<FileCount>,
}

impl BatchCount {
    /// Files that were not counted cleanly (warnings, not failures of the
    /// batch).
    pub fn warnings(&self) -> impl Iterator<Item = &FileError> {
        self.files.iter().filter_map(|f| f.error.as_ref())
    }
}

/// Count billable pages for a single file.
///
/// Never fails: a counting error is captured in [`FileCount::error`] with a
/// zero page count so the rest of the batch proceeds.
pub fn count(file: &FileInput) -> FileCount {
    let format = FileFormat::from_name(&file.name);
    let size = file.bytes.len() as u64;

    let counted: Result<u64, FileError> = match format {
        FileFormat::Pdf => pdf::count_pages(&file.name, &file.bytes),
        FileFormat::Excel => sheet::count_pages(&file.name, &file.bytes),
        FileFormat::Csv => Ok(csv::count_pages(&file.bytes)),
        FileFormat::Image => Ok(1),
        FileFormat::Unknown => Err(FileError::UnknownFormat {
            name: file.name.clone(),
        }),
    };

    match counted {
        Ok(pages) => {
            debug!("counted '{}' ({format}): {pages} pages", file.name);
            FileCount {
                name: file.name.clone(),
                size,
                format,
                pages,
                error: None,
            }
        }
        Err(e) => {
            warn!("{e}");
            FileCount {
                name: file.name.clone(),
                size,
                format,
                pages: 0,
                error: Some(e),
            }
        }
    }
}

/// Count billable pages for a whole batch.
///
/// Parsing is CPU-bound, so each file runs under `spawn_blocking`, fanned
/// out `concurrency` at a time. Results come back in input order. An empty
/// batch yields a zero total and an empty breakdown, not an error.
pub async fn count_batch(files: Vec<FileInput>, concurrency: usize) -> BatchCount {
    let mut counted: Vec<(usize, FileCount)> =
        stream::iter(files.into_iter().enumerate().map(|(idx, file)| async move {
            let name = file.name.clone();
            let result = tokio::task::spawn_blocking(move || count(&file)).await;
            let file_count = result.unwrap_or_else(|e| FileCount {
                name: name.clone(),
                size: 0,
                format: FileFormat::from_name(&name),
                pages: 0,
                error: Some(FileError::CountFailed {
                    name,
                    detail: format!("counting task panicked: {e}"),
                }),
            });
            (idx, file_count)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    counted.sort_by_key(|(idx, _)| *idx);
    let files: Vec<FileCount> = counted.into_iter().map(|(_, fc)| fc).collect();
    let total = files.iter().map(|f| f.pages).sum();

    BatchCount { total, files }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_bytes(data_rows: usize) -> Vec<u8> {
        let mut text = String::from("id,value\n");
        for i in 0..data_rows {
            text.push_str(&format!("{i},{i}\n"));
        }
        text.into_bytes()
    }

    #[test]
    fn row_bucketing_is_floored_and_monotone() {
        let mut prev = 0;
        for n in 0..=500u64 {
            let pages = pages_for_rows(n);
            assert_eq!(pages, n / 50);
            assert!(pages >= prev, "pages must not decrease as rows grow");
            prev = pages;
        }
    }

    #[test]
    fn image_is_one_page_regardless_of_size() {
        let small = count(&FileInput::new("a.png", vec![0u8; 10]));
        let large = count(&FileInput::new("b.jpg", vec![0u8; 10_000_000]));
        assert_eq!(small.pages, 1);
        assert_eq!(large.pages, 1);
    }

    #[test]
    fn unknown_format_is_zero_pages_with_warning() {
        let result = count(&FileInput::new("notes.docx", vec![0u8; 4096]));
        assert_eq!(result.format, FileFormat::Unknown);
        assert_eq!(result.pages, 0);
        assert!(matches!(
            result.error,
            Some(FileError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn corrupt_file_is_isolated_not_fatal() {
        let result = count(&FileInput::new("broken.pdf", b"garbage".to_vec()));
        assert_eq!(result.pages, 0);
        assert!(matches!(result.error, Some(FileError::CountFailed { .. })));
    }

    #[tokio::test]
    async fn empty_batch_is_zero_total() {
        let batch = count_batch(Vec::new(), 4).await;
        assert_eq!(batch.total, 0);
        assert!(batch.files.is_empty());
    }

    #[tokio::test]
    async fn batch_total_is_sum_of_per_file_counts() {
        let files = vec![
            FileInput::new("rows.csv", csv_bytes(101)), // 2 pages
            FileInput::new("scan.png", vec![0u8; 64]),  // 1 page
            FileInput::new("misc.bin", vec![0u8; 64]),  // 0 pages, warning
            FileInput::new("three.pdf", crate::testutil::pdf_with_pages(3)), // 3 pages
        ];

        let expected: u64 = files.iter().map(|f| count(f).pages).sum();
        let batch = count_batch(files, 2).await;

        assert_eq!(batch.total, expected);
        assert_eq!(batch.total, 6);
        assert_eq!(batch.files.len(), 4);
        assert_eq!(batch.warnings().count(), 1);
        // Input order is preserved.
        assert_eq!(batch.files[0].name, "rows.csv");
        assert_eq!(batch.files[3].name, "three.pdf");
    }
}
