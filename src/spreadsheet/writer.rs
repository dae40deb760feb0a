/// Single-sheet XLSX writer.
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use super::cell::{CellValue, column_name};
use super::{Result, SpreadsheetError};

const MAX_COLUMN_WIDTH: f64 = 255.0;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs></styleSheet>"#;

/// Shared strings table.
///
/// Each distinct string is stored once and cells refer to it by index.
#[derive(Debug, Default)]
struct SharedStrings {
    strings: Vec<String>,
    string_to_index: HashMap<String, usize>,
    references: usize,
}

impl SharedStrings {
    fn add_string(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(&index) = self.string_to_index.get(s) {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(s.to_string());
        self.string_to_index.insert(s.to_string(), index);
        index
    }

    fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256 + self.strings.len() * 32);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.strings.len()
        )
        .map_err(xml_write_error)?;

        for s in &self.strings {
            let written = if s.trim() != s {
                write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s))
            } else {
                write!(xml, "<si><t>{}</t></si>", escape(s))
            };
            written.map_err(xml_write_error)?;
        }

        xml.push_str("</sst>");
        Ok(xml)
    }
}

fn xml_write_error(e: std::fmt::Error) -> SpreadsheetError {
    SpreadsheetError::Malformed(format!("XML write error: {}", e))
}

/// Builds a workbook holding one worksheet and serializes it to bytes.
#[derive(Debug)]
pub struct WorkbookWriter {
    sheet_name: String,
    rows: BTreeMap<u32, Vec<CellValue>>,
    next_row: u32,
    column_widths: Vec<f64>,
}

impl WorkbookWriter {
    pub fn new(sheet_name: &str) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            rows: BTreeMap::new(),
            next_row: 0,
            column_widths: Vec::new(),
        }
    }

    /// Append a row after the last written one.
    pub fn append_row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = CellValue>,
    {
        let index = self.next_row;
        self.set_row(index, cells);
    }

    /// Write a row at a zero-based index, replacing whatever was there.
    ///
    /// Rows that are never written do not appear in the sheet at all.
    pub fn set_row<I>(&mut self, index: u32, cells: I)
    where
        I: IntoIterator<Item = CellValue>,
    {
        self.rows.insert(index, cells.into_iter().collect());
        self.next_row = self.next_row.max(index + 1);
    }

    /// Size every column to fit the longest value currently written in it.
    pub fn autofit_columns(&mut self) {
        let mut widths: Vec<f64> = Vec::new();
        for cells in self.rows.values() {
            for (col, cell) in cells.iter().enumerate() {
                let chars = display_len(cell) as f64;
                let width = (chars * 1.1 + 2.0).min(MAX_COLUMN_WIDTH);
                if widths.len() <= col {
                    widths.resize(col + 1, 0.0);
                }
                if width > widths[col] {
                    widths[col] = width;
                }
            }
        }
        self.column_widths = widths;
    }

    /// Serialize the workbook as an xlsx archive.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut shared_strings = SharedStrings::default();
        let sheet_xml = self.sheet_xml(&mut shared_strings)?;
        let shared_strings_xml = shared_strings.to_xml()?;
        let workbook_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            escape(&self.sheet_name)
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, &[u8]); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
            ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
            ("xl/workbook.xml", workbook_xml.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.as_bytes()),
            ("xl/styles.xml", STYLES_XML.as_bytes()),
            ("xl/sharedStrings.xml", shared_strings_xml.as_bytes()),
            ("xl/worksheets/sheet1.xml", sheet_xml.as_bytes()),
        ];
        for (path, content) in parts {
            zip.start_file(path, options)?;
            zip.write_all(content)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn sheet_xml(&self, shared_strings: &mut SharedStrings) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.rows.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.column_widths.is_empty() {
            xml.push_str("<cols>");
            for (col, width) in self.column_widths.iter().enumerate() {
                write!(
                    xml,
                    r#"<col min="{0}" max="{0}" width="{1:.2}" customWidth="1"/>"#,
                    col + 1,
                    width
                )
                .map_err(xml_write_error)?;
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        for (&row, cells) in &self.rows {
            let row_number = row + 1;
            write!(xml, r#"<row r="{}">"#, row_number).map_err(xml_write_error)?;
            for (col, cell) in cells.iter().enumerate() {
                let reference = format!("{}{}", column_name(col as u32), row_number);
                write_cell(&mut xml, &reference, cell, shared_strings)?;
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");

        Ok(xml)
    }
}

fn write_cell(
    xml: &mut String,
    reference: &str,
    cell: &CellValue,
    shared_strings: &mut SharedStrings,
) -> Result<()> {
    let written = match cell {
        CellValue::Text(s) => {
            let index = shared_strings.add_string(s);
            write!(xml, r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, index)
        }
        CellValue::Number(n) if n.is_finite() => {
            write!(xml, r#"<c r="{}"><v>{}</v></c>"#, reference, n)
        }
        CellValue::Number(_) => write!(xml, r#"<c r="{}" t="e"><v>#NUM!</v></c>"#, reference),
        CellValue::Bool(b) => {
            write!(xml, r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, u8::from(*b))
        }
        // Formula and error cells are written blank.
        CellValue::Formula(_) | CellValue::Error(_) | CellValue::Empty => {
            write!(xml, r#"<c r="{}"/>"#, reference)
        }
    };
    written.map_err(xml_write_error)
}

fn display_len(cell: &CellValue) -> usize {
    match cell {
        CellValue::Text(s) => s.chars().count(),
        CellValue::Number(n) => n.to_string().len(),
        CellValue::Bool(true) => 4,
        CellValue::Bool(false) => 5,
        CellValue::Formula(_) | CellValue::Error(_) | CellValue::Empty => 0,
    }
}
