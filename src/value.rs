// ABOUTME: Tagged column values and records with canonical equality rules
// ABOUTME: Handles diff-key derivation, MySQL parameter conversion, and PostgreSQL literal encoding

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

/// An engine-independent column value.
///
/// DECIMAL and JSON columns are decoded to their canonical string form at read
/// time, so they travel through here as `Text`. Whether a string-ish column
/// becomes `Text` or `Bytes` is decided by the column's BINARY flag when the
/// row is decoded, not here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// A row keyed by column name.
pub type Record = BTreeMap<String, Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Value equality under the canonical comparison rule.
    ///
    /// Signed and unsigned integers compare value-wise (widened to i128), so a
    /// local `INT` and a production `BIGINT UNSIGNED` holding the same number
    /// are equal. Doubles compare bit-for-bit except that NaN equals NaN, so a
    /// record containing NaN on both sides does not show up as modified on
    /// every pass. Everything else compares exactly; timestamps already carry
    /// microsecond precision on both sides.
    pub fn canonical_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Bool(a), Int(b)) | (Int(b), Bool(a)) => i64::from(*a) == *b,
            (Bool(a), UInt(b)) | (UInt(b), Bool(a)) => u64::from(*a) == *b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Int(a), UInt(b)) | (UInt(b), Int(a)) => i128::from(*a) == i128::from(*b),
            (Double(a), Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Text(a), Text(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            _ => false,
        }
    }

    /// Canonical string form used as the diff map key.
    ///
    /// Values that are canonically equal produce the same key string, so
    /// `Int(1)` and `UInt(1)` collide as the same primary-key entry. A type
    /// prefix keeps `Text("1")` distinct from the number 1.
    pub fn key_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => u8::from(*b).to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Double(d) => {
                if d.is_nan() {
                    "f:nan".to_string()
                } else {
                    format!("f:{:016x}", d.to_bits())
                }
            }
            Value::Text(s) => format!("s:{s}"),
            Value::Bytes(b) => {
                let mut key = String::with_capacity(b.len() * 2 + 2);
                key.push_str("b:");
                for byte in b {
                    let _ = write!(key, "{byte:02x}");
                }
                key
            }
            Value::DateTime(dt) => format!("dt:{}", dt.format("%Y-%m-%dT%H:%M:%S%.6f")),
            Value::Date(d) => format!("d:{d}"),
            Value::Time(t) => format!("t:{}", t.format("%H:%M:%S%.6f")),
        }
    }

    /// Render as a PostgreSQL SQL literal for migration INSERT statements.
    ///
    /// NULL is unquoted, booleans are `true`/`false`, numbers are unquoted,
    /// binary becomes a `'\x…'` hex literal, timestamps are quoted ISO-8601,
    /// and strings are single-quoted with embedded quotes doubled.
    pub fn to_pg_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Double(d) => {
                if d.is_finite() {
                    d.to_string()
                } else if d.is_nan() {
                    "'NaN'".to_string()
                } else if *d > 0.0 {
                    "'Infinity'".to_string()
                } else {
                    "'-Infinity'".to_string()
                }
            }
            Value::Text(s) => quote_literal(s),
            Value::Bytes(b) => {
                let mut lit = String::with_capacity(b.len() * 2 + 4);
                lit.push_str("'\\x");
                for byte in b {
                    let _ = write!(lit, "{byte:02x}");
                }
                lit.push('\'');
                lit
            }
            Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.6f")),
            Value::Date(d) => format!("'{d}'"),
            Value::Time(t) => format!("'{}'", t.format("%H:%M:%S%.6f")),
        }
    }
}

impl From<&Value> for mysql_async::Value {
    fn from(value: &Value) -> mysql_async::Value {
        match value {
            Value::Null => mysql_async::Value::NULL,
            Value::Bool(b) => mysql_async::Value::Int(i64::from(*b)),
            Value::Int(i) => mysql_async::Value::Int(*i),
            Value::UInt(u) => mysql_async::Value::UInt(*u),
            Value::Double(d) => mysql_async::Value::Double(*d),
            Value::Text(s) => mysql_async::Value::Bytes(s.clone().into_bytes()),
            Value::Bytes(b) => mysql_async::Value::Bytes(b.clone()),
            Value::DateTime(dt) => mysql_async::Value::Date(
                dt.year() as u16,
                dt.month() as u8,
                dt.day() as u8,
                dt.hour() as u8,
                dt.minute() as u8,
                dt.second() as u8,
                dt.and_utc().timestamp_subsec_micros(),
            ),
            Value::Date(d) => {
                mysql_async::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
            }
            Value::Time(t) => mysql_async::Value::Time(
                false,
                0,
                t.hour() as u8,
                t.minute() as u8,
                t.second() as u8,
                t.nanosecond() / 1_000,
            ),
        }
    }
}

/// Quote a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push('\'');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Field-by-field record equality under [`Value::canonical_eq`].
///
/// Records with different column sets are never identical.
pub fn records_identical(a: &Record, b: &Record) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .all(|((col_a, val_a), (col_b, val_b))| col_a == col_b && val_a.canonical_eq(val_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_eq_int_uint_widening() {
        assert!(Value::Int(1).canonical_eq(&Value::UInt(1)));
        assert!(Value::UInt(42).canonical_eq(&Value::Int(42)));
        assert!(!Value::Int(-1).canonical_eq(&Value::UInt(u64::MAX)));
    }

    #[test]
    fn test_canonical_eq_nan() {
        assert!(Value::Double(f64::NAN).canonical_eq(&Value::Double(f64::NAN)));
        assert!(!Value::Double(f64::NAN).canonical_eq(&Value::Double(0.0)));
        assert!(Value::Double(1.5).canonical_eq(&Value::Double(1.5)));
    }

    #[test]
    fn test_canonical_eq_null_and_mismatched_tags() {
        assert!(Value::Null.canonical_eq(&Value::Null));
        assert!(!Value::Null.canonical_eq(&Value::Int(0)));
        assert!(!Value::Text("1".into()).canonical_eq(&Value::Int(1)));
    }

    #[test]
    fn test_key_string_unifies_int_and_uint() {
        assert_eq!(Value::Int(7).key_string(), Value::UInt(7).key_string());
        assert_ne!(Value::Text("7".into()).key_string(), Value::Int(7).key_string());
    }

    #[test]
    fn test_pg_literal_encoding() {
        assert_eq!(Value::Null.to_pg_literal(), "NULL");
        assert_eq!(Value::Bool(true).to_pg_literal(), "true");
        assert_eq!(Value::Int(-3).to_pg_literal(), "-3");
        assert_eq!(Value::Text("it's".into()).to_pg_literal(), "'it''s'");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_pg_literal(), "'\\xdead'");

        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_micro_opt(10, 30, 0, 123456)
            .unwrap();
        assert_eq!(
            Value::DateTime(dt).to_pg_literal(),
            "'2024-03-15T10:30:00.123456'"
        );
    }

    #[test]
    fn test_records_identical_requires_same_columns() {
        let mut a = Record::new();
        a.insert("id".into(), Value::Int(1));
        a.insert("name".into(), Value::Text("x".into()));

        let mut b = a.clone();
        assert!(records_identical(&a, &b));

        b.insert("extra".into(), Value::Null);
        assert!(!records_identical(&a, &b));

        let mut c = a.clone();
        c.insert("name".into(), Value::Text("y".into()));
        assert!(!records_identical(&a, &c));
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("hello"), "'hello'");
        assert_eq!(quote_literal(""), "''");
        assert_eq!(quote_literal("a'b"), "'a''b'");
    }
}
