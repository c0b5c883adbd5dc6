//! Seed value sum type.

use std::fmt;

/// Rendering used for SQL NULL in logs and `Display` output.
pub const NULL_SENTINEL: &str = "NULL";

/// A single column value produced by a seed query.
///
/// Temporal and decimal columns are carried as `Text` in their canonical
/// MySQL rendering so they round-trip through the query template unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Raw bytes of a BINARY/VARBINARY/BLOB/BIT column. Rebound as bytes,
    /// displayed as lossy UTF-8.
    Binary(Vec<u8>),
}

impl SeedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SeedValue::Null)
    }

    /// Short name of the value kind, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            SeedValue::Null => "null",
            SeedValue::Int(_) => "int",
            SeedValue::UInt(_) => "uint",
            SeedValue::Float(_) => "float",
            SeedValue::Bool(_) => "bool",
            SeedValue::Text(_) => "text",
            SeedValue::Binary(_) => "binary",
        }
    }
}

impl fmt::Display for SeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedValue::Null => f.write_str(NULL_SENTINEL),
            SeedValue::Int(v) => write!(f, "{v}"),
            SeedValue::UInt(v) => write!(f, "{v}"),
            SeedValue::Float(v) => write!(f, "{v}"),
            SeedValue::Bool(v) => write!(f, "{v}"),
            SeedValue::Text(v) => f.write_str(v),
            SeedValue::Binary(v) => f.write_str(&String::from_utf8_lossy(v)),
        }
    }
}

impl From<i64> for SeedValue {
    fn from(v: i64) -> Self {
        SeedValue::Int(v)
    }
}

impl From<i32> for SeedValue {
    fn from(v: i32) -> Self {
        SeedValue::Int(v as i64)
    }
}

impl From<u64> for SeedValue {
    fn from(v: u64) -> Self {
        SeedValue::UInt(v)
    }
}

impl From<f64> for SeedValue {
    fn from(v: f64) -> Self {
        SeedValue::Float(v)
    }
}

impl From<bool> for SeedValue {
    fn from(v: bool) -> Self {
        SeedValue::Bool(v)
    }
}

impl From<String> for SeedValue {
    fn from(v: String) -> Self {
        SeedValue::Text(v)
    }
}

impl From<&str> for SeedValue {
    fn from(v: &str) -> Self {
        SeedValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SeedValue {
    fn from(v: Vec<u8>) -> Self {
        SeedValue::Binary(v)
    }
}

impl<T: Into<SeedValue>> From<Option<T>> for SeedValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SeedValue::Null)
    }
}

/// One row of a seed query result, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeedRow {
    values: Vec<SeedValue>,
}

impl SeedRow {
    pub fn new(values: Vec<SeedValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[SeedValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SeedValue> {
        self.values.get(index)
    }
}

impl From<Vec<SeedValue>> for SeedRow {
    fn from(values: Vec<SeedValue>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<SeedValue> for SeedRow {
    fn from_iter<I: IntoIterator<Item = SeedValue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for SeedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_scalars() {
        assert_eq!(SeedValue::Int(-7).to_string(), "-7");
        assert_eq!(SeedValue::UInt(18_446_744_073_709_551_615).to_string(), "18446744073709551615");
        assert_eq!(SeedValue::Float(2.5).to_string(), "2.5");
        assert_eq!(SeedValue::Bool(true).to_string(), "true");
        assert_eq!(SeedValue::Text("foobar".into()).to_string(), "foobar");
    }

    #[test]
    fn test_null_renders_sentinel() {
        assert_eq!(SeedValue::Null.to_string(), NULL_SENTINEL);
        assert!(SeedValue::Null.is_null());
        assert_eq!(SeedValue::from(None::<i64>), SeedValue::Null);
    }

    #[test]
    fn test_binary_renders_as_text() {
        let value = SeedValue::Binary(b"Foo Bar".to_vec());
        assert_eq!(value.to_string(), "Foo Bar");
        assert_eq!(value.kind(), "binary");

        let invalid = SeedValue::Binary(vec![0x66, 0xff, 0x6f]);
        assert_eq!(invalid.to_string(), "f\u{fffd}o");
    }

    #[test]
    fn test_row_display() {
        let row: SeedRow = vec![
            SeedValue::Int(1),
            SeedValue::from("foobar"),
            SeedValue::Null,
        ]
        .into();
        assert_eq!(row.to_string(), "[1, foobar, NULL]");
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(1), Some(&SeedValue::Text("foobar".into())));
        assert_eq!(SeedRow::default().to_string(), "[]");
    }
}
