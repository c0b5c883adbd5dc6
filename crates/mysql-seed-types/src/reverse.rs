//! Reverse conversion: MySQL rows → `SeedRow`
//!
//! Each column is classified by the type name the driver reports for it and
//! decoded with the matching typed decoder. There is no runtime reflection:
//! the set of kinds is closed and anything not recognised is read as text.

use crate::value::{SeedRow, SeedValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::error::BoxDynError;
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySql, MySqlRow, MySqlValueRef};
use sqlx::{Decode, Row, TypeInfo, ValueRef};
use thiserror::Error;

/// Error while turning a result row into a `SeedRow`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read column {index}: {source}")]
    Column {
        index: usize,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to decode column {index} ({type_name}): {source}")]
    Value {
        index: usize,
        type_name: String,
        #[source]
        source: BoxDynError,
    },
}

/// Decoding strategy for a column, derived from its MySQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Double,
    Date,
    Time,
    DateTime,
    Timestamp,
    Binary,
    Text,
}

impl ColumnKind {
    /// Classify a column by the name `sqlx` reports for its type
    /// (e.g. `BIGINT UNSIGNED`, `VARBINARY`, `BOOLEAN`).
    pub fn from_type_name(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        let (base, unsigned) = match upper.strip_suffix(" UNSIGNED") {
            Some(base) => (base, true),
            None => (upper.as_str(), false),
        };

        match base {
            "NULL" => ColumnKind::Null,
            "BOOLEAN" | "BOOL" => ColumnKind::Bool,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => {
                if unsigned {
                    ColumnKind::UInt
                } else {
                    ColumnKind::Int
                }
            }
            "YEAR" => ColumnKind::Int,
            "FLOAT" => ColumnKind::Float,
            "DOUBLE" | "REAL" => ColumnKind::Double,
            "DATE" => ColumnKind::Date,
            "TIME" => ColumnKind::Time,
            "DATETIME" => ColumnKind::DateTime,
            "TIMESTAMP" => ColumnKind::Timestamp,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => ColumnKind::Binary,
            // CHAR, VARCHAR, *TEXT, ENUM, SET, JSON, DECIMAL and anything newer
            _ => ColumnKind::Text,
        }
    }
}

/// Decode every column of `row` in order.
pub fn row_to_seed_row(row: &MySqlRow) -> Result<SeedRow, DecodeError> {
    (0..row.len())
        .map(|index| column_to_seed_value(row, index))
        .collect::<Result<Vec<_>, _>>()
        .map(SeedRow::new)
}

fn column_to_seed_value(row: &MySqlRow, index: usize) -> Result<SeedValue, DecodeError> {
    let raw = row
        .try_get_raw(index)
        .map_err(|source| DecodeError::Column { index, source })?;

    if raw.is_null() {
        return Ok(SeedValue::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let kind = ColumnKind::from_type_name(&type_name);

    decode_value(raw, kind).map_err(|source| DecodeError::Value {
        index,
        type_name,
        source,
    })
}

/// Text for a zero date of `kind`, or `None` when `raw` holds a real date.
///
/// The binary protocol sends a zero date as a bare zero length byte, the text
/// protocol as the literal zero date.
fn zero_date_text(
    raw: &MySqlValueRef<'_>,
    kind: ColumnKind,
) -> Result<Option<&'static str>, BoxDynError> {
    let bytes = <&[u8] as Decode<MySql>>::decode(raw.clone())?;
    if bytes != &[0u8][..] && !bytes.starts_with(b"0000-00-00") {
        return Ok(None);
    }
    Ok(Some(match kind {
        ColumnKind::Date => "0000-00-00",
        _ => "0000-00-00 00:00:00",
    }))
}

/// Format a TIME value the way MySQL prints it, sign and hours past 24 kept.
fn format_time(time: &MySqlTime) -> String {
    let sign = if time.is_negative() { "-" } else { "" };
    let mut text = format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        time.hours(),
        time.minutes(),
        time.seconds()
    );
    if time.microseconds() != 0 {
        text.push_str(&format!(".{:06}", time.microseconds()));
    }
    text
}

fn decode_value(raw: MySqlValueRef<'_>, kind: ColumnKind) -> Result<SeedValue, BoxDynError> {
    if matches!(
        kind,
        ColumnKind::Date | ColumnKind::DateTime | ColumnKind::Timestamp
    ) {
        if let Some(text) = zero_date_text(&raw, kind)? {
            return Ok(SeedValue::Text(text.to_string()));
        }
    }

    let value = match kind {
        ColumnKind::Null => SeedValue::Null,
        ColumnKind::Bool => SeedValue::Bool(<bool as Decode<MySql>>::decode(raw)?),
        ColumnKind::Int => SeedValue::Int(<i64 as Decode<MySql>>::decode(raw)?),
        ColumnKind::UInt => SeedValue::UInt(<u64 as Decode<MySql>>::decode(raw)?),
        ColumnKind::Float => SeedValue::Float(<f32 as Decode<MySql>>::decode(raw)? as f64),
        ColumnKind::Double => SeedValue::Float(<f64 as Decode<MySql>>::decode(raw)?),
        ColumnKind::Date => {
            let date = <NaiveDate as Decode<MySql>>::decode(raw)?;
            SeedValue::Text(date.format("%Y-%m-%d").to_string())
        }
        ColumnKind::Time => {
            let time = <MySqlTime as Decode<MySql>>::decode(raw)?;
            SeedValue::Text(format_time(&time))
        }
        ColumnKind::DateTime => {
            let dt = <NaiveDateTime as Decode<MySql>>::decode(raw)?;
            SeedValue::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
        }
        ColumnKind::Timestamp => {
            let dt = <DateTime<Utc> as Decode<MySql>>::decode(raw)?;
            SeedValue::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
        }
        ColumnKind::Binary => SeedValue::Binary(<Vec<u8> as Decode<MySql>>::decode(raw)?),
        ColumnKind::Text => {
            let bytes = <&[u8] as Decode<MySql>>::decode(raw)?;
            SeedValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    };
    Ok(value)
}
