//! Billable file format detection.
//!
//! Format is inferred from the declared filename extension, never from
//! content sniffing — the billing rules are defined per declared format and
//! must stay predictable for the user looking at their own file list.

use serde::{Deserialize, Serialize};

/// Billable format of a candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Excel,
    Csv,
    Image,
    /// Anything unrecognised. Always billed as 0 pages and surfaced as a
    /// warning to the caller.
    Unknown,
}

impl FileFormat {
    /// Detect the format from a declared filename.
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return FileFormat::Unknown,
        };
        match ext.as_str() {
            "pdf" => FileFormat::Pdf,
            "xlsx" | "xls" => FileFormat::Excel,
            "csv" => FileFormat::Csv,
            "png" | "jpg" | "jpeg" => FileFormat::Image,
            _ => FileFormat::Unknown,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Pdf => write!(f, "pdf"),
            FileFormat::Excel => write!(f, "excel"),
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Image => write!(f, "image"),
            FileFormat::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(FileFormat::from_name("report.pdf"), FileFormat::Pdf);
        assert_eq!(FileFormat::from_name("ledger.XLSX"), FileFormat::Excel);
        assert_eq!(FileFormat::from_name("legacy.xls"), FileFormat::Excel);
        assert_eq!(FileFormat::from_name("rows.csv"), FileFormat::Csv);
        assert_eq!(FileFormat::from_name("scan.PNG"), FileFormat::Image);
        assert_eq!(FileFormat::from_name("photo.jpeg"), FileFormat::Image);
        assert_eq!(FileFormat::from_name("notes.docx"), FileFormat::Unknown);
    }

    #[test]
    fn no_extension_is_unknown() {
        assert_eq!(FileFormat::from_name("README"), FileFormat::Unknown);
        assert_eq!(FileFormat::from_name(""), FileFormat::Unknown);
    }

    #[test]
    fn last_extension_wins() {
        assert_eq!(FileFormat::from_name("archive.tar.csv"), FileFormat::Csv);
    }
}
