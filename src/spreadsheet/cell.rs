use super::{Result, SpreadsheetError};

/// Columns available in a worksheet ("A" through "XFD").
const MAX_COLUMNS: u32 = 16_384;

/// A single worksheet cell as stored in the sheet XML.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Formula cell; holds the cached result text if the file carried one.
    Formula(Option<String>),
    Error(String),
    Empty,
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Column letters for a zero-based column index (0 -> "A", 26 -> "AA").
pub fn column_name(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Split a cell reference such as "B12" into zero-based (column, row).
pub fn column_index(reference: &str) -> Result<(u32, u32)> {
    let bytes = reference.as_bytes();
    let digits_at = bytes
        .iter()
        .position(|b| b.is_ascii_digit())
        .ok_or_else(|| SpreadsheetError::Malformed(format!("invalid reference: {}", reference)))?;

    if digits_at == 0 {
        return Err(SpreadsheetError::Malformed(format!(
            "invalid reference: {}",
            reference
        )));
    }

    let mut col = 0u32;
    for &byte in &bytes[..digits_at] {
        if !byte.is_ascii_alphabetic() {
            return Err(SpreadsheetError::Malformed(format!(
                "invalid column in reference: {}",
                reference
            )));
        }
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add((byte.to_ascii_uppercase() - b'A' + 1) as u32))
            .filter(|c| *c <= MAX_COLUMNS)
            .ok_or_else(|| {
                SpreadsheetError::Malformed(format!("column out of range in reference: {}", reference))
            })?;
    }

    let row: u32 = reference[digits_at..]
        .parse()
        .map_err(|_| SpreadsheetError::Malformed(format!("invalid row in reference: {}", reference)))?;
    if row == 0 {
        return Err(SpreadsheetError::Malformed(format!(
            "invalid row in reference: {}",
            reference
        )));
    }

    Ok((col - 1, row - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(2), "C");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1").unwrap(), (0, 0));
        assert_eq!(column_index("c7").unwrap(), (2, 6));
        assert_eq!(column_index("AA10").unwrap(), (26, 9));
        assert!(column_index("12").is_err());
        assert!(column_index("A0").is_err());
        assert!(column_index("B").is_err());
    }

    #[test]
    fn test_column_index_bounds() {
        assert_eq!(column_index("XFD1").unwrap(), (MAX_COLUMNS - 1, 0));
        assert!(matches!(
            column_index("XFE1"),
            Err(SpreadsheetError::Malformed(_))
        ));
        assert!(matches!(
            column_index("ZZZZZZZZZZZZ2"),
            Err(SpreadsheetError::Malformed(_))
        ));
    }
}
