//! Minimal Office Open XML (xlsx) workbook support.
//!
//! Only what the post import/export needs: a single-sheet writer with shared
//! strings and column widths, and a reader that yields the typed cells of the
//! first worksheet.

pub mod cell;
pub mod reader;
pub mod writer;

pub use cell::{CellValue, column_index, column_name};
pub use reader::{SheetRows, read_first_sheet};
pub use writer::WorkbookWriter;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing workbook part: {0}")]
    MissingPart(String),

    #[error("malformed workbook: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, SpreadsheetError>;
