use log::warn;

use crate::post::post_model::{NewPost, PostDto};
use crate::spreadsheet::{self, CellValue, SheetRows, SpreadsheetError, WorkbookWriter};

pub const SHEET_NAME: &str = "Posts";
pub const HEADERS: [&str; 3] = ["ID", "Title", "Description"];

/// Title and description columns of a plain upload.
const UPLOAD_COLUMNS: (u32, u32) = (0, 1);
/// Title and description columns of a sheet produced by `export_posts`.
const EXPORT_COLUMNS: (u32, u32) = (1, 2);

/// A row that was dropped during import.
#[derive(Debug, Clone, PartialEq)]
pub struct RowWarning {
    pub row: u32,
    pub message: String,
}

/// Outcome of parsing an uploaded sheet, before anything is persisted.
#[derive(Debug, Default)]
pub struct ImportBatch {
    pub candidates: Vec<NewPost>,
    pub warnings: Vec<RowWarning>,
}

/// Render posts as a workbook with a single "Posts" sheet.
pub fn export_posts(posts: &[PostDto]) -> Result<Vec<u8>, SpreadsheetError> {
    let mut writer = WorkbookWriter::new(SHEET_NAME);
    writer.append_row(HEADERS.iter().map(|h| CellValue::from(*h)));

    for post in posts {
        writer.append_row([
            post.id.map_or(CellValue::Empty, CellValue::from),
            CellValue::from(post.title.as_str()),
            CellValue::from(post.description.as_str()),
        ]);
    }

    writer.autofit_columns();
    writer.finish()
}

/// Parse the first sheet into import candidates.
///
/// Row 0 is always the header and never imported. Title and description
/// are read from columns A and B, or from B and C when the header is the one
/// written by `export_posts`. Rows without a usable title are skipped and
/// reported in `warnings`; rows missing from the sheet are skipped silently.
pub fn parse_posts(bytes: &[u8]) -> Result<ImportBatch, SpreadsheetError> {
    let sheet = spreadsheet::read_first_sheet(bytes)?;
    let mut batch = ImportBatch::default();

    let (title_column, description_column) = if is_export_header(&sheet) {
        EXPORT_COLUMNS
    } else {
        UPLOAD_COLUMNS
    };

    for (index, cells) in sheet.rows_from(1) {
        let title = cell_as_text(cells.get(&title_column));
        let description = cell_as_text(cells.get(&description_column));

        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                warn!("Skipping row {} due to missing title", index);
                batch.warnings.push(RowWarning {
                    row: index,
                    message: format!("Skipping row {} due to missing title", index),
                });
                continue;
            }
        };

        batch.candidates.push(NewPost {
            title,
            description: description.unwrap_or_default(),
        });
    }

    Ok(batch)
}

fn is_export_header(sheet: &SheetRows) -> bool {
    HEADERS.iter().enumerate().all(|(col, header)| {
        cell_as_text(sheet.cell(0, col as u32)).as_deref() == Some(*header)
    })
}

/// Text form of a cell; blank, error and formula cells have none.
pub fn cell_as_text(cell: Option<&CellValue>) -> Option<String> {
    match cell? {
        CellValue::Text(s) => Some(s.trim().to_string()),
        CellValue::Number(n) => Some((n.trunc() as i64).to_string()),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Formula(_) | CellValue::Error(_) | CellValue::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn row_indices(rows: &SheetRows) -> Vec<u32> {
        rows.rows_from(0).map(|(index, _)| index).collect()
    }

    fn sheet(rows: Vec<(u32, Vec<CellValue>)>) -> Vec<u8> {
        let mut writer = WorkbookWriter::new("Sheet1");
        writer.set_row(0, vec!["Title".into(), "Description".into()]);
        for (index, cells) in rows {
            writer.set_row(index, cells);
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_cell_as_text() {
        assert_eq!(cell_as_text(Some(&CellValue::Number(42.0))), Some("42".into()));
        assert_eq!(cell_as_text(Some(&CellValue::Number(42.9))), Some("42".into()));
        assert_eq!(cell_as_text(Some(&CellValue::Number(-3.7))), Some("-3".into()));
        assert_eq!(cell_as_text(Some(&CellValue::Bool(false))), Some("false".into()));
        assert_eq!(cell_as_text(Some(&"  hi  ".into())), Some("hi".into()));
        assert_eq!(cell_as_text(Some(&CellValue::Formula(Some("2".into())))), None);
        assert_eq!(cell_as_text(Some(&CellValue::Error("#N/A".into()))), None);
        assert_eq!(cell_as_text(Some(&CellValue::Empty)), None);
        assert_eq!(cell_as_text(None), None);
    }

    #[test]
    fn test_export_layout() {
        let posts = vec![
            PostDto {
                id: Some(1),
                title: "First".into(),
                description: "one".into(),
            },
            PostDto {
                id: Some(5),
                title: "Second".into(),
                description: String::new(),
            },
        ];
        let rows = spreadsheet::read_first_sheet(&export_posts(&posts).unwrap()).unwrap();

        assert_eq!(row_indices(&rows), vec![0, 1, 2]);
        for (col, header) in HEADERS.iter().enumerate() {
            assert_eq!(rows.cell(0, col as u32), Some(&CellValue::from(*header)));
        }
        assert_eq!(rows.cell(1, 0), Some(&CellValue::Number(1.0)));
        assert_eq!(rows.cell(1, 1), Some(&CellValue::from("First")));
        assert_eq!(rows.cell(2, 0), Some(&CellValue::Number(5.0)));
        assert_eq!(rows.cell(2, 2), Some(&CellValue::from("")));
    }

    #[test]
    fn test_export_with_no_posts_has_header_only() {
        let rows = spreadsheet::read_first_sheet(&export_posts(&[]).unwrap()).unwrap();
        assert_eq!(row_indices(&rows), vec![0]);
    }

    #[test]
    fn test_blank_title_row_is_skipped_with_warning() {
        let bytes = sheet(vec![
            (1, vec!["First".into(), "a".into()]),
            (2, vec!["   ".into(), "b".into()]),
            (3, vec!["Third".into()]),
        ]);
        let batch = parse_posts(&bytes).unwrap();

        assert_eq!(
            batch.candidates,
            vec![
                NewPost {
                    title: "First".into(),
                    description: "a".into()
                },
                NewPost {
                    title: "Third".into(),
                    description: String::new()
                },
            ]
        );
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.warnings[0].row, 2);
        assert!(batch.warnings[0].message.contains("row 2"));
    }

    #[test]
    fn test_numeric_and_boolean_cells_become_text() {
        let bytes = sheet(vec![(1, vec![42.0.into(), true.into()])]);
        let batch = parse_posts(&bytes).unwrap();
        assert_eq!(batch.candidates[0].title, "42");
        assert_eq!(batch.candidates[0].description, "true");
    }

    #[test]
    fn test_missing_rows_are_silent_and_empty_rows_warn() {
        let bytes = sheet(vec![(4, vec!["Late".into()]), (6, vec![])]);
        let batch = parse_posts(&bytes).unwrap();

        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(batch.candidates[0].title, "Late");
        assert_eq!(
            batch.warnings.iter().map(|w| w.row).collect::<Vec<_>>(),
            vec![6]
        );
    }

    #[test]
    fn test_exported_sheet_reads_title_and_description_columns() {
        let posts = vec![
            PostDto {
                id: Some(10),
                title: "Kept".into(),
                description: "with text".into(),
            },
            PostDto {
                id: Some(11),
                title: String::new(),
                description: "no title".into(),
            },
        ];
        let batch = parse_posts(&export_posts(&posts).unwrap()).unwrap();

        assert_eq!(
            batch.candidates,
            vec![NewPost {
                title: "Kept".into(),
                description: "with text".into()
            }]
        );
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.warnings[0].row, 2);
    }

    #[test]
    fn test_other_headers_use_first_two_columns() {
        let mut writer = WorkbookWriter::new("Sheet1");
        writer.append_row(vec!["ID".into(), "Name".into(), "Description".into()]);
        writer.append_row(vec![CellValue::from(7i64), "x".into(), "y".into()]);
        let batch = parse_posts(&writer.finish().unwrap()).unwrap();

        assert_eq!(batch.candidates[0].title, "7");
        assert_eq!(batch.candidates[0].description, "x");
    }

    #[test]
    fn test_header_only_sheet_yields_nothing() {
        let batch = parse_posts(&sheet(vec![])).unwrap();
        assert!(batch.candidates.is_empty());
        assert!(batch.warnings.is_empty());
    }

    #[test]
    fn test_distant_row_does_not_walk_the_gap() {
        let worksheet = r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Title</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>Near</t></is></c></row><row r="400000000"><c r="A400000000" t="inlineStr"><is><t>Far</t></is></c></row></sheetData></worksheet>"#;
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("xl/workbook.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(br#"<workbook xmlns:r="r"><sheets><sheet name="S" sheetId="1" r:id="rId1"/></sheets></workbook>"#)
            .unwrap();
        zip.start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(worksheet.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let started = std::time::Instant::now();
        let batch = parse_posts(&bytes).unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(
            batch.candidates.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
            vec!["Near", "Far"]
        );
        assert!(batch.warnings.is_empty());
    }
}
