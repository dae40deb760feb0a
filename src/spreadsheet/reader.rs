//! Reader for the first worksheet of an XLSX workbook.
//!
//! The workbook part, its relationships and the shared strings table are
//! consulted to locate the first sheet and to resolve string cells. Rows keep
//! their sheet indices, so gaps in the sheet stay visible to callers.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use super::cell::{CellValue, column_index};
use super::{Result, SpreadsheetError};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Cells of one worksheet keyed by zero-based row and column index.
#[derive(Debug, Default)]
pub struct SheetRows {
    rows: BTreeMap<u32, BTreeMap<u32, CellValue>>,
}

impl SheetRows {
    /// Rows present in the sheet from `start` onwards, in index order.
    ///
    /// Only rows the sheet actually contains are visited.
    pub fn rows_from(
        &self,
        start: u32,
    ) -> impl Iterator<Item = (u32, &BTreeMap<u32, CellValue>)> {
        self.rows.range(start..).map(|(&index, cells)| (index, cells))
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }
}

/// Open an in-memory XLSX document and read its first worksheet.
pub fn read_first_sheet(bytes: &[u8]) -> Result<SheetRows> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
        .ok_or_else(|| SpreadsheetError::MissingPart(WORKBOOK_PART.to_string()))?;
    let relationship_id = first_sheet_relationship(&workbook_xml)?
        .ok_or_else(|| SpreadsheetError::Malformed("workbook has no sheets".to_string()))?;

    let sheet_part = match read_part(&mut archive, WORKBOOK_RELS_PART)? {
        Some(rels_xml) => relationship_target(&rels_xml, &relationship_id)?
            .map(|target| resolve_target(&target))
            .unwrap_or_else(|| DEFAULT_SHEET_PART.to_string()),
        None => DEFAULT_SHEET_PART.to_string(),
    };

    let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_xml = read_part(&mut archive, &sheet_part)?
        .ok_or(SpreadsheetError::MissingPart(sheet_part))?;

    parse_sheet(&sheet_xml, &shared_strings)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Relationship id (`r:id`) of the first `<sheet>` in workbook.xml.
fn first_sheet_relationship(workbook_xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(workbook_xml);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                return attribute(e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn relationship_target(rels_xml: &str, relationship_id: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(rels_xml);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if attribute(e, b"Id")?.as_deref() == Some(relationship_id) {
                    return attribute(e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Targets are relative to `xl/` unless absolute within the package.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si && phonetic_depth == 0 => in_t = true,
                b"rPh" => phonetic_depth += 1,
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
                b"t" => in_t = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Event::Text(ref t) if in_t => {
                current.push_str(&t.decode().map_err(quick_xml::Error::from)?)
            }
            Event::CData(ref t) if in_t => {
                current.push_str(&t.decode().map_err(quick_xml::Error::from)?)
            }
            Event::GeneralRef(ref r) if in_t => push_entity(&mut current, r)?,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// Cell being assembled while its child elements are read.
#[derive(Default)]
struct PendingCell {
    col: u32,
    cell_type: Option<String>,
    value: String,
    inline_text: String,
    has_formula: bool,
}

impl PendingCell {
    fn finish(self, shared_strings: &[String]) -> Result<CellValue> {
        if self.has_formula {
            let cached = (!self.value.is_empty()).then_some(self.value);
            return Ok(CellValue::Formula(cached));
        }

        let value = match self.cell_type.as_deref() {
            Some("inlineStr") => CellValue::Text(self.inline_text),
            _ if self.value.is_empty() => CellValue::Empty,
            Some("s") => {
                let index: usize = self.value.trim().parse().map_err(|_| {
                    SpreadsheetError::Malformed(format!("invalid shared string index: {}", self.value))
                })?;
                let text = shared_strings.get(index).ok_or_else(|| {
                    SpreadsheetError::Malformed(format!("shared string {} out of range", index))
                })?;
                CellValue::Text(text.clone())
            }
            Some("str") | Some("d") => CellValue::Text(self.value),
            Some("b") => CellValue::Bool(matches!(self.value.trim(), "1" | "true")),
            Some("e") => CellValue::Error(self.value),
            _ => {
                let number: f64 = self.value.trim().parse().map_err(|_| {
                    SpreadsheetError::Malformed(format!("invalid numeric cell: {}", self.value))
                })?;
                CellValue::Number(number)
            }
        };
        Ok(value)
    }
}

fn parse_sheet(xml: &str, shared_strings: &[String]) -> Result<SheetRows> {
    let mut reader = Reader::from_str(xml);
    let mut sheet = SheetRows::default();

    let mut current_row: Option<u32> = None;
    let mut next_row = 0u32;
    let mut next_col = 0u32;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"row" => {
                    let row = row_index(e, next_row)?;
                    sheet.rows.entry(row).or_default();
                    current_row = Some(row);
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" if current_row.is_some() => {
                    let col = cell_column(e, next_col)?;
                    next_col = col + 1;
                    cell = Some(PendingCell {
                        col,
                        cell_type: attribute(e, b"t")?,
                        ..PendingCell::default()
                    });
                }
                b"v" => in_value = cell.is_some(),
                b"f" => {
                    if let Some(pending) = cell.as_mut() {
                        pending.has_formula = true;
                    }
                }
                b"rPh" => phonetic_depth += 1,
                b"t" => in_inline_text = cell.is_some() && phonetic_depth == 0,
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"row" => {
                    let row = row_index(e, next_row)?;
                    sheet.rows.entry(row).or_default();
                    next_row = row + 1;
                }
                b"c" => {
                    if let Some(row) = current_row {
                        let col = cell_column(e, next_col)?;
                        next_col = col + 1;
                        sheet
                            .rows
                            .entry(row)
                            .or_default()
                            .insert(col, CellValue::Empty);
                    }
                }
                b"f" => {
                    if let Some(pending) = cell.as_mut() {
                        pending.has_formula = true;
                    }
                }
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"row" => current_row = None,
                b"c" => {
                    if let (Some(row), Some(pending)) = (current_row, cell.take()) {
                        let col = pending.col;
                        let value = pending.finish(shared_strings)?;
                        sheet.rows.entry(row).or_default().insert(col, value);
                    }
                }
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Event::Text(ref t) => {
                if let Some(pending) = cell.as_mut() {
                    let text = t.decode().map_err(quick_xml::Error::from)?;
                    if in_value {
                        pending.value.push_str(&text);
                    } else if in_inline_text {
                        pending.inline_text.push_str(&text);
                    }
                }
            }
            Event::CData(ref t) => {
                if let Some(pending) = cell.as_mut()
                    && in_inline_text
                {
                    pending
                        .inline_text
                        .push_str(&t.decode().map_err(quick_xml::Error::from)?);
                }
            }
            Event::GeneralRef(ref r) => {
                if let Some(pending) = cell.as_mut() {
                    if in_value {
                        push_entity(&mut pending.value, r)?;
                    } else if in_inline_text {
                        push_entity(&mut pending.inline_text, r)?;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheet)
}

fn row_index(e: &BytesStart, fallback: u32) -> Result<u32> {
    match attribute(e, b"r")? {
        Some(r) => {
            let number: u32 = r
                .trim()
                .parse()
                .map_err(|_| SpreadsheetError::Malformed(format!("invalid row number: {}", r)))?;
            number
                .checked_sub(1)
                .ok_or_else(|| SpreadsheetError::Malformed("row number 0".to_string()))
        }
        None => Ok(fallback),
    }
}

fn cell_column(e: &BytesStart, fallback: u32) -> Result<u32> {
    match attribute(e, b"r")? {
        Some(reference) => column_index(&reference).map(|(col, _)| col),
        None => Ok(fallback),
    }
}

/// Attribute value by local name, with entities resolved.
fn attribute(e: &BytesStart, local_name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn push_entity(buf: &mut String, reference: &BytesRef) -> Result<()> {
    if let Some(ch) = reference.resolve_char_ref()? {
        buf.push(ch);
        return Ok(());
    }
    let name = reference.decode().map_err(quick_xml::Error::from)?;
    let resolved = resolve_predefined_entity(&name)
        .ok_or_else(|| SpreadsheetError::Malformed(format!("unknown entity: &{};", name)))?;
    buf.push_str(resolved);
    Ok(())
}
