use duckdb::types::{TimeUnit, ValueRef};
use serde_json::{Map, Value};

/// A single result row: column name to scalar value.
pub type Row = Map<String, Value>;

/// Rows returned by a query, in result order.
pub type RowSet = Vec<Row>;

/// Drains DuckDB rows into row-mappings, preserving result order.
pub fn collect_rows(rows: &mut duckdb::Rows<'_>) -> Result<RowSet, duckdb::Error> {
    let mut out = Vec::new();
    let mut columns: Vec<String> = Vec::new();

    while let Some(row) = rows.next()? {
        // Column names are only known once the statement has produced a row
        if columns.is_empty() {
            let stmt = row.as_ref();
            for i in 0..stmt.column_count() {
                columns.push(stmt.column_name(i)?.to_string());
            }
        }

        let mut mapped = Map::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            mapped.insert(name.clone(), value_to_json(row.get_ref(i)?));
        }
        out.push(mapped);
    }

    Ok(out)
}

/// Convert a DuckDB value to JSON
pub fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::from(i),
        ValueRef::SmallInt(i) => Value::from(i),
        ValueRef::Int(i) => Value::from(i),
        ValueRef::BigInt(i) => Value::from(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(i.to_string())),
        ValueRef::UTinyInt(i) => Value::from(i),
        ValueRef::USmallInt(i) => Value::from(i),
        ValueRef::UInt(i) => Value::from(i),
        ValueRef::UBigInt(i) => Value::from(i),
        ValueRef::Float(f) => float_to_json(f as f64),
        ValueRef::Double(f) => float_to_json(f),
        ValueRef::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .map(float_to_json)
                .unwrap_or(Value::String(text))
        }
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
        ValueRef::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros)
                .map(|ts| Value::String(ts.naive_utc().to_string()))
                .unwrap_or(Value::Null)
        }
        ValueRef::Date32(days) => chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days as i64)))
            .map(|date| Value::String(date.to_string()))
            .unwrap_or(Value::Null),
        other => Value::String(format!("{:?}", other)),
    }
}

fn float_to_json(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
