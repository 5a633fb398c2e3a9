//! tokio-postgres implementations of the execution capability.
//!
//! Statements arrive with named placeholders (`:val{token}_{column}`);
//! the driver wants positional `$n` parameters. The adapter rewrites the
//! text, lines the bindings up in first-use order, and decodes returned
//! rows back into [`Value`]s.

use std::error::Error;

use bytes::BytesMut;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type};

use crate::error::ExecutionError;
use crate::executor::{Executor, RawResult, RawRow};
use crate::map::BindValues;
use crate::value::Value;

/// Rewrite `:name` placeholders to positional `$n` parameters.
///
/// Returns the rewritten text plus the placeholder names in first-use
/// order (repeats reuse their index). `::` casts and single-quoted
/// literals pass through untouched.
pub fn to_positional(sql: &str) -> (String, Vec<String>) {
    let mut text = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            text.push(c);
            if c == '\'' {
                in_string = false;
            }
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                text.push(c);
            }
            ':' => {
                if chars.peek() == Some(&':') {
                    // type cast
                    text.push(c);
                    if let Some(second) = chars.next() {
                        text.push(second);
                    }
                } else if chars
                    .peek()
                    .is_some_and(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
                {
                    let mut name = String::from(":");
                    while let Some(ch) = chars.peek() {
                        if ch.is_ascii_alphanumeric() || *ch == '_' {
                            name.push(*ch);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let index = match names.iter().position(|known| known == &name) {
                        Some(index) => index,
                        None => {
                            names.push(name);
                            names.len() - 1
                        }
                    };
                    text.push('$');
                    text.push_str(&(index + 1).to_string());
                } else {
                    text.push(c);
                }
            }
            _ => text.push(c),
        }
    }
    (text, names)
}

fn bind_params<'a>(
    names: &[String],
    bindings: &'a BindValues,
) -> Result<Vec<&'a (dyn ToSql + Sync)>, ExecutionError> {
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(names.len());
    for name in names {
        let value = bindings
            .get(name)
            .ok_or_else(|| ExecutionError::UnknownPlaceholder(name.clone()))?;
        params.push(value as &(dyn ToSql + Sync));
    }
    Ok(params)
}

fn returns_rows(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|verb| verb.eq_ignore_ascii_case("SELECT"))
}

fn decode_rows(rows: &[Row]) -> Result<RawResult, ExecutionError> {
    let mut decoded = Vec::with_capacity(rows.len());
    for row in rows {
        decoded.push(decode_row(row)?);
    }
    Ok(RawResult::from_rows(decoded))
}

fn decode_row(row: &Row) -> Result<RawRow, ExecutionError> {
    let mut raw = RawRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_value(row, index, column.name(), column.type_())?;
        raw.push(column.name(), value);
    }
    Ok(raw)
}

fn decode_value(
    row: &Row,
    index: usize,
    column: &str,
    ty: &Type,
) -> Result<Value, ExecutionError> {
    let decoded = match *ty {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(index)
            .map(|v| v.map(Value::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)
            .map(|v| v.map(|v| Value::Int(v.into()))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)
            .map(|v| v.map(|v| Value::Int(v.into()))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(index)
            .map(|v| v.map(Value::Int)),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)
            .map(|v| v.map(|v| Value::Float(v.into()))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(index)
            .map(|v| v.map(Value::Float)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(index)
            .map(|v| v.map(Value::Text)),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)
            .map(|v| v.map(Value::Bytes)),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(index)
            .map(|v| v.map(Value::Uuid)),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(index)
            .map(|v| v.map(Value::Timestamp)),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(index)
            .map(|v| v.map(|naive| Value::Timestamp(naive.and_utc()))),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(index)
            .map(|v| v.map(Value::Json)),
        _ => {
            return Err(ExecutionError::UnsupportedType {
                column: column.to_string(),
                ty: ty.to_string(),
            });
        }
    };
    decoded
        .map(|value| value.unwrap_or(Value::Null))
        .map_err(|e| ExecutionError::decode(column, e.to_string()))
}

fn mismatch(value: &Value, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot bind a {} value to column type {}", value.kind_name(), ty).into()
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::Json(_) => "json",
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => {
                if !<bool as ToSql>::accepts(ty) {
                    return Err(mismatch(self, ty));
                }
                v.to_sql(ty, out)
            }
            Self::Int(v) => {
                if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT8 {
                    v.to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Self::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    v.to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Self::Text(v) => {
                if !<&str as ToSql>::accepts(ty) {
                    return Err(mismatch(self, ty));
                }
                v.as_str().to_sql(ty, out)
            }
            Self::Bytes(v) => {
                if !<&[u8] as ToSql>::accepts(ty) {
                    return Err(mismatch(self, ty));
                }
                v.as_slice().to_sql(ty, out)
            }
            Self::Uuid(v) => {
                if !<uuid::Uuid as ToSql>::accepts(ty) {
                    return Err(mismatch(self, ty));
                }
                v.to_sql(ty, out)
            }
            Self::Timestamp(v) => {
                if *ty == Type::TIMESTAMP {
                    v.naive_utc().to_sql(ty, out)
                } else if *ty == Type::TIMESTAMPTZ {
                    v.to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Self::Json(v) => {
                if !<serde_json::Value as ToSql>::accepts(ty) {
                    return Err(mismatch(self, ty));
                }
                v.to_sql(ty, out)
            }
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BYTEA
                | Type::UUID
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::JSON
                | Type::JSONB
        )
    }

    tokio_postgres::types::to_sql_checked!();
}

impl Executor for tokio_postgres::Client {
    async fn execute(&self, sql: &str, bindings: &BindValues) -> Result<RawResult, ExecutionError> {
        let (text, names) = to_positional(sql);
        let params = bind_params(&names, bindings)?;
        if returns_rows(&text) {
            let rows = tokio_postgres::Client::query(self, text.as_str(), &params)
                .await
                .map_err(ExecutionError::from_db_error)?;
            decode_rows(&rows)
        } else {
            let count = tokio_postgres::Client::execute(self, text.as_str(), &params)
                .await
                .map_err(ExecutionError::from_db_error)?;
            Ok(RawResult::from_rows_affected(count))
        }
    }

    async fn last_insert_id(&self) -> Result<Value, ExecutionError> {
        let row = tokio_postgres::Client::query_one(self, "SELECT lastval()", &[])
            .await
            .map_err(ExecutionError::from_db_error)?;
        let id: i64 = row
            .try_get(0)
            .map_err(|e| ExecutionError::decode("lastval", e.to_string()))?;
        Ok(Value::Int(id))
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn execute(&self, sql: &str, bindings: &BindValues) -> Result<RawResult, ExecutionError> {
        let (text, names) = to_positional(sql);
        let params = bind_params(&names, bindings)?;
        if returns_rows(&text) {
            let rows = tokio_postgres::Transaction::query(self, text.as_str(), &params)
                .await
                .map_err(ExecutionError::from_db_error)?;
            decode_rows(&rows)
        } else {
            let count = tokio_postgres::Transaction::execute(self, text.as_str(), &params)
                .await
                .map_err(ExecutionError::from_db_error)?;
            Ok(RawResult::from_rows_affected(count))
        }
    }

    async fn last_insert_id(&self) -> Result<Value, ExecutionError> {
        let row = tokio_postgres::Transaction::query_one(self, "SELECT lastval()", &[])
            .await
            .map_err(ExecutionError::from_db_error)?;
        let id: i64 = row
            .try_get(0)
            .map_err(|e| ExecutionError::decode("lastval", e.to_string()))?;
        Ok(Value::Int(id))
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    async fn execute(&self, sql: &str, bindings: &BindValues) -> Result<RawResult, ExecutionError> {
        // Delegate to the deref target (ClientWrapper).
        Executor::execute(&**self, sql, bindings).await
    }

    async fn last_insert_id(&self) -> Result<Value, ExecutionError> {
        Executor::last_insert_id(&**self).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::ClientWrapper {
    async fn execute(&self, sql: &str, bindings: &BindValues) -> Result<RawResult, ExecutionError> {
        Executor::execute(&**self, sql, bindings).await
    }

    async fn last_insert_id(&self) -> Result<Value, ExecutionError> {
        Executor::last_insert_id(&**self).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Transaction<'_> {
    async fn execute(&self, sql: &str, bindings: &BindValues) -> Result<RawResult, ExecutionError> {
        Executor::execute(&**self, sql, bindings).await
    }

    async fn last_insert_id(&self) -> Result<Value, ExecutionError> {
        Executor::last_insert_id(&**self).await
    }
}
