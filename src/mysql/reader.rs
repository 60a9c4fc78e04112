// ABOUTME: Table snapshot reads; decodes MySQL wire values into tagged records
// ABOUTME: Column type and the BINARY flag decide text vs bytes; DECIMAL and JSON become canonical strings

use chrono::{NaiveDate, NaiveTime};
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Row};

use super::catalog::{self, ColumnDescriptor};
use super::quote_table;
use crate::error::{Error, Result};
use crate::value::{Record, Value};

/// A full read of one table: schema metadata plus every row decoded.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Option<String>,
    pub rows: Vec<Record>,
}

impl TableSnapshot {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Read schema metadata and all rows of `table`.
///
/// The snapshot is a plain read with no locking; callers that diff two
/// snapshots accept that each side is a point-in-time view.
pub async fn fetch_snapshot(conn: &mut Conn, database: &str, table: &str) -> Result<TableSnapshot> {
    let columns = catalog::get_columns(conn, database, table).await?;
    let primary_key = catalog::get_primary_key(conn, database, table).await?;
    let rows = fetch_rows(conn, database, table).await?;

    Ok(TableSnapshot {
        table: table.to_string(),
        columns,
        primary_key,
        rows,
    })
}

/// Read every row of `table` as decoded records.
pub async fn fetch_rows(conn: &mut Conn, database: &str, table: &str) -> Result<Vec<Record>> {
    let query = format!("SELECT * FROM {}", quote_table(database, table));
    let rows: Vec<Row> = conn
        .query(query)
        .await
        .map_err(|e| Error::classify_mysql(table, e))?;

    Ok(rows.into_iter().map(decode_row).collect())
}

fn decode_row(row: Row) -> Record {
    let columns = row.columns();
    let values = row.unwrap();

    columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            let decoded = decode_value(value, column.column_type(), column.flags());
            (column.name_str().into_owned(), decoded)
        })
        .collect()
}

/// Decode one wire value given its column metadata.
///
/// DECIMAL and JSON arrive as bytes and are kept as their canonical string
/// form so both sides of a diff compare as strings. Other byte payloads become
/// `Bytes` only when the column carries the BINARY flag. Temporal values that
/// cannot be represented (zero dates) decode to `Null`.
pub(crate) fn decode_value(
    value: mysql_async::Value,
    column_type: ColumnType,
    flags: ColumnFlags,
) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Int(i) => Value::Int(i),
        mysql_async::Value::UInt(u) => Value::UInt(u),
        mysql_async::Value::Float(f) => Value::Double(f64::from(f)),
        mysql_async::Value::Double(d) => Value::Double(d),
        mysql_async::Value::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day));
            match date {
                None => Value::Null,
                Some(date) if column_type == ColumnType::MYSQL_TYPE_DATE => Value::Date(date),
                Some(date) => date
                    .and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                    .map_or(Value::Null, Value::DateTime),
            }
        }
        mysql_async::Value::Time(negative, days, hours, minutes, seconds, micros) => {
            // MySQL TIME is a duration and may be negative or exceed 24 hours;
            // those fall back to the canonical string form.
            if negative || days > 0 {
                let total_hours = u32::from(days) * 24 + u32::from(hours);
                let sign = if negative { "-" } else { "" };
                Value::Text(format!(
                    "{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
                ))
            } else {
                NaiveTime::from_hms_micro_opt(
                    u32::from(hours),
                    u32::from(minutes),
                    u32::from(seconds),
                    micros,
                )
                .map_or(Value::Null, Value::Time)
            }
        }
        mysql_async::Value::Bytes(bytes) => decode_bytes(bytes, column_type, flags),
    }
}

fn decode_bytes(bytes: Vec<u8>, column_type: ColumnType, flags: ColumnFlags) -> Value {
    match column_type {
        ColumnType::MYSQL_TYPE_DECIMAL
        | ColumnType::MYSQL_TYPE_NEWDECIMAL
        | ColumnType::MYSQL_TYPE_JSON => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
        _ if flags.contains(ColumnFlags::BINARY_FLAG) => Value::Bytes(bytes),
        _ => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_decimal_as_text() {
        let decoded = decode_value(
            mysql_async::Value::Bytes(b"12.50".to_vec()),
            ColumnType::MYSQL_TYPE_NEWDECIMAL,
            ColumnFlags::BINARY_FLAG,
        );
        assert_eq!(decoded, Value::Text("12.50".to_string()));
    }

    #[test]
    fn test_decode_binary_flag_yields_bytes() {
        let decoded = decode_value(
            mysql_async::Value::Bytes(vec![0x00, 0xff]),
            ColumnType::MYSQL_TYPE_BLOB,
            ColumnFlags::BINARY_FLAG,
        );
        assert_eq!(decoded, Value::Bytes(vec![0x00, 0xff]));
    }

    #[test]
    fn test_decode_text_without_binary_flag() {
        let decoded = decode_value(
            mysql_async::Value::Bytes(b"hello".to_vec()),
            ColumnType::MYSQL_TYPE_VAR_STRING,
            ColumnFlags::empty(),
        );
        assert_eq!(decoded, Value::Text("hello".to_string()));
    }

    #[test]
    fn test_decode_datetime_and_date() {
        let dt = decode_value(
            mysql_async::Value::Date(2024, 6, 1, 12, 0, 0, 500),
            ColumnType::MYSQL_TYPE_DATETIME,
            ColumnFlags::empty(),
        );
        match dt {
            Value::DateTime(ts) => assert_eq!(ts.and_utc().timestamp_subsec_micros(), 500),
            other => panic!("expected DateTime, got {other:?}"),
        }

        let d = decode_value(
            mysql_async::Value::Date(2024, 6, 1, 0, 0, 0, 0),
            ColumnType::MYSQL_TYPE_DATE,
            ColumnFlags::empty(),
        );
        assert!(matches!(d, Value::Date(_)));
    }

    #[test]
    fn test_decode_zero_date_as_null() {
        let decoded = decode_value(
            mysql_async::Value::Date(0, 0, 0, 0, 0, 0, 0),
            ColumnType::MYSQL_TYPE_DATETIME,
            ColumnFlags::empty(),
        );
        assert_eq!(decoded, Value::Null);
    }

    #[test]
    fn test_decode_negative_time_as_text() {
        let decoded = decode_value(
            mysql_async::Value::Time(true, 1, 2, 3, 4, 0),
            ColumnType::MYSQL_TYPE_TIME,
            ColumnFlags::empty(),
        );
        assert_eq!(decoded, Value::Text("-26:03:04.000000".to_string()));
    }
}
