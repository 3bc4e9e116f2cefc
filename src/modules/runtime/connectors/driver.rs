//! ScyllaDB driver transport
//!
//! Statements are prepared, then executed unpaged with parameters bound by the
//! prepared statement's column types. Result rows are decoded to JSON values.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use cqlbridge_core::error::Result;
use cqlbridge_core::{ConnectorConfig, CqlError};
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::cluster::metadata::{CollectionType, ColumnType, NativeType};
use scylla::policies::load_balancing::DefaultPolicy;
use scylla::response::query_result::QueryResult;
use scylla::value::{
    Counter, CqlDate, CqlDecimal, CqlTime, CqlTimestamp, CqlTimeuuid, CqlValue, Row as CqlRow,
};
use serde_json::{Map, Number, Value};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::traits::{RawConnection, Response, Row, Rows, Transport};

/// CQL dates count days from 1970-01-01 with this offset
const DATE_EPOCH_OFFSET: i64 = 1 << 31;

/// Opens driver sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct ScyllaTransport;

impl ScyllaTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for ScyllaTransport {
    async fn connect(&self, config: &ConnectorConfig) -> Result<Arc<dyn RawConnection>> {
        let mut profile = ExecutionProfile::builder().request_timeout(Some(config.request_timeout()));
        if let Some(datacenter) = &config.local_datacenter {
            profile = profile.load_balancing_policy(
                DefaultPolicy::builder()
                    .prefer_datacenter(datacenter.clone())
                    .build(),
            );
        }

        let mut builder = SessionBuilder::new()
            .known_nodes(&config.contact_points)
            .connection_timeout(config.connect_timeout())
            .default_execution_profile_handle(profile.build().into_handle());

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.user(username, password);
        }

        if let Some(keyspace) = config.keyspace() {
            builder = builder.use_keyspace(keyspace, true);
        }

        let session = builder
            .build()
            .await
            .map_err(|e| CqlError::Transport(format!("Cassandra connection failed: {}", e)))?;

        Ok(Arc::new(ScyllaConnection { session }))
    }
}

/// A driver session
pub struct ScyllaConnection {
    session: Session,
}

#[async_trait]
impl RawConnection for ScyllaConnection {
    async fn execute(&self, cql: &str, params: &[Value]) -> Result<Response> {
        let prepared = self
            .session
            .prepare(cql)
            .await
            .map_err(|e| CqlError::Transport(format!("Failed to prepare statement: {}", e)))?;

        let specs = prepared.get_variable_col_specs();
        if specs.len() != params.len() {
            return Err(CqlError::Configuration(format!(
                "Statement expects {} parameter(s), got {}",
                specs.len(),
                params.len()
            )));
        }

        let values = specs
            .iter()
            .zip(params)
            .map(|(spec, value)| {
                bind_value(value, spec.typ()).map_err(|e| match e {
                    CqlError::Configuration(msg) => {
                        CqlError::Configuration(format!("Parameter '{}': {}", spec.name(), msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let result = self
            .session
            .execute_unpaged(&prepared, values)
            .await
            .map_err(|e| CqlError::Transport(e.to_string()))?;

        decode_result(result)
    }

    /// Infallible: the session closes its connections once the last handle
    /// is dropped
    async fn shutdown(&self) -> Result<()> {
        debug!("Releasing Cassandra session");
        Ok(())
    }
}

fn mismatch(value: &Value, typ: &ColumnType<'_>) -> CqlError {
    CqlError::Configuration(format!("Cannot bind {} as {:?}", value, typ))
}

/// Convert a JSON parameter to the CQL value of the bound column type
fn bind_value(value: &Value, typ: &ColumnType<'_>) -> Result<Option<CqlValue>> {
    if value.is_null() {
        return Ok(None);
    }
    let fail = || mismatch(value, typ);

    let bound = match typ {
        ColumnType::Native(native) => match native {
            NativeType::Ascii => CqlValue::Ascii(value.as_str().ok_or_else(fail)?.to_string()),
            NativeType::Text => CqlValue::Text(value.as_str().ok_or_else(fail)?.to_string()),
            NativeType::Boolean => CqlValue::Boolean(value.as_bool().ok_or_else(fail)?),
            NativeType::TinyInt => CqlValue::TinyInt(int_value(value).ok_or_else(fail)?),
            NativeType::SmallInt => CqlValue::SmallInt(int_value(value).ok_or_else(fail)?),
            NativeType::Int => CqlValue::Int(int_value(value).ok_or_else(fail)?),
            NativeType::BigInt => CqlValue::BigInt(value.as_i64().ok_or_else(fail)?),
            NativeType::Counter => CqlValue::Counter(Counter(value.as_i64().ok_or_else(fail)?)),
            NativeType::Float => CqlValue::Float(value.as_f64().ok_or_else(fail)? as f32),
            NativeType::Double => CqlValue::Double(value.as_f64().ok_or_else(fail)?),
            NativeType::Decimal => CqlValue::Decimal(decimal_value(value).ok_or_else(fail)?),
            NativeType::Uuid => CqlValue::Uuid(uuid_value(value).ok_or_else(fail)?),
            NativeType::Timeuuid => {
                CqlValue::Timeuuid(CqlTimeuuid::from(uuid_value(value).ok_or_else(fail)?))
            }
            NativeType::Timestamp => CqlValue::Timestamp(timestamp_value(value).ok_or_else(fail)?),
            NativeType::Date => CqlValue::Date(date_value(value).ok_or_else(fail)?),
            NativeType::Time => CqlValue::Time(time_value(value).ok_or_else(fail)?),
            NativeType::Inet => CqlValue::Inet(
                value
                    .as_str()
                    .and_then(|s| s.parse::<IpAddr>().ok())
                    .ok_or_else(fail)?,
            ),
            NativeType::Blob => CqlValue::Blob(blob_value(value).ok_or_else(fail)?),
            _ => return Err(fail()),
        },
        ColumnType::Collection { typ: collection, .. } => match collection {
            CollectionType::List(element) => CqlValue::List(bind_elements(value, element)?),
            CollectionType::Set(element) => CqlValue::Set(bind_elements(value, element)?),
            CollectionType::Map(key_type, value_type) => {
                let entries = value.as_object().ok_or_else(fail)?;
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, item) in entries {
                    let key = bind_value(&Value::String(key.clone()), key_type)?.ok_or_else(fail)?;
                    let item = bind_value(item, value_type)?.ok_or_else(fail)?;
                    pairs.push((key, item));
                }
                CqlValue::Map(pairs)
            }
            _ => return Err(fail()),
        },
        _ => return Err(fail()),
    };
    Ok(Some(bound))
}

fn bind_elements(value: &Value, element: &ColumnType<'_>) -> Result<Vec<CqlValue>> {
    let items = value.as_array().ok_or_else(|| mismatch(value, element))?;
    items
        .iter()
        .map(|item| bind_value(item, element)?.ok_or_else(|| mismatch(item, element)))
        .collect()
}

fn int_value<T: TryFrom<i64>>(value: &Value) -> Option<T> {
    value.as_i64().and_then(|n| T::try_from(n).ok())
}

fn uuid_value(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s).ok())
}

/// Milliseconds since the epoch, or an RFC 3339 string
fn timestamp_value(value: &Value) -> Option<CqlTimestamp> {
    match value {
        Value::Number(n) => n.as_i64().map(CqlTimestamp),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| CqlTimestamp(dt.timestamp_millis())),
        _ => None,
    }
}

/// `YYYY-MM-DD`
fn date_value(value: &Value) -> Option<CqlDate> {
    let date = NaiveDate::parse_from_str(value.as_str()?, "%Y-%m-%d").ok()?;
    let days = date.signed_duration_since(epoch_date()).num_days();
    u32::try_from(days + DATE_EPOCH_OFFSET).ok().map(CqlDate)
}

/// `HH:MM:SS[.fraction]`
fn time_value(value: &Value) -> Option<CqlTime> {
    let time = NaiveTime::parse_from_str(value.as_str()?, "%H:%M:%S%.f").ok()?;
    Some(CqlTime(
        time.num_seconds_from_midnight() as i64 * 1_000_000_000 + time.nanosecond() as i64,
    ))
}

fn decimal_value(value: &Value) -> Option<CqlDecimal> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let (integer, fraction) = text.split_once('.').unwrap_or((&text, ""));
    let unscaled: i128 = format!("{}{}", integer, fraction).parse().ok()?;
    let scale = i32::try_from(fraction.len()).ok()?;
    Some(CqlDecimal::from_signed_be_bytes_slice_and_exponent(
        &minimal_be_bytes(unscaled),
        scale,
    ))
}

/// Array of byte values
fn blob_value(value: &Value) -> Option<Vec<u8>> {
    value
        .as_array()?
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Two's complement big-endian bytes without redundant sign bytes
fn minimal_be_bytes(n: i128) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn signed_be_bytes_to_i128(bytes: &[u8]) -> Option<i128> {
    if bytes.is_empty() || bytes.len() > 16 {
        return None;
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Some(i128::from_be_bytes(buf))
}

fn format_decimal(unscaled: i128, scale: i32) -> String {
    if scale <= 0 {
        return format!("{}{}", unscaled, "0".repeat(scale.unsigned_abs() as usize));
    }
    let scale = scale as usize;
    let digits = unscaled.unsigned_abs().to_string();
    let digits = format!("{:0>width$}", digits, width = scale + 1);
    let (integer, fraction) = digits.split_at(digits.len() - scale);
    let sign = if unscaled < 0 { "-" } else { "" };
    format!("{}{}.{}", sign, integer, fraction)
}

fn float_json(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// Convert a CQL value to JSON
fn to_json(value: CqlValue) -> Value {
    match value {
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::String(s),
        CqlValue::Boolean(b) => Value::Bool(b),
        CqlValue::TinyInt(n) => Value::from(n),
        CqlValue::SmallInt(n) => Value::from(n),
        CqlValue::Int(n) => Value::from(n),
        CqlValue::BigInt(n) => Value::from(n),
        CqlValue::Counter(c) => Value::from(c.0),
        CqlValue::Float(f) => float_json(f as f64),
        CqlValue::Double(f) => float_json(f),
        CqlValue::Decimal(d) => {
            let (bytes, scale) = d.as_signed_be_bytes_slice_and_exponent();
            signed_be_bytes_to_i128(bytes)
                .map(|unscaled| Value::String(format_decimal(unscaled, scale)))
                .unwrap_or(Value::Null)
        }
        CqlValue::Uuid(u) => Value::String(u.to_string()),
        CqlValue::Timeuuid(u) => Value::String(u.to_string()),
        CqlValue::Timestamp(CqlTimestamp(ms)) => DateTime::from_timestamp_millis(ms)
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or_else(|| Value::from(ms)),
        CqlValue::Date(CqlDate(days)) => epoch_date()
            .checked_add_signed(chrono::Duration::days(days as i64 - DATE_EPOCH_OFFSET))
            .map(|date| Value::String(date.to_string()))
            .unwrap_or_else(|| Value::from(days)),
        CqlValue::Time(CqlTime(nanos)) => {
            let secs = (nanos / 1_000_000_000) as u32;
            let frac = (nanos % 1_000_000_000) as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(secs, frac)
                .map(|time| Value::String(time.to_string()))
                .unwrap_or_else(|| Value::from(nanos))
        }
        CqlValue::Duration(d) => serde_json::json!({
            "months": d.months,
            "days": d.days,
            "nanoseconds": d.nanoseconds,
        }),
        CqlValue::Inet(addr) => Value::String(addr.to_string()),
        CqlValue::Blob(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
        CqlValue::List(items) | CqlValue::Set(items) => {
            Value::Array(items.into_iter().map(to_json).collect())
        }
        CqlValue::Map(pairs) => {
            if pairs
                .iter()
                .all(|(k, _)| matches!(k, CqlValue::Text(_) | CqlValue::Ascii(_)))
            {
                let mut map = Map::with_capacity(pairs.len());
                for (key, item) in pairs {
                    if let Value::String(key) = to_json(key) {
                        map.insert(key, to_json(item));
                    }
                }
                Value::Object(map)
            } else {
                Value::Array(
                    pairs
                        .into_iter()
                        .map(|(k, v)| Value::Array(vec![to_json(k), to_json(v)]))
                        .collect(),
                )
            }
        }
        CqlValue::Tuple(items) => Value::Array(
            items
                .into_iter()
                .map(|item| item.map(to_json).unwrap_or(Value::Null))
                .collect(),
        ),
        CqlValue::UserDefinedType { fields, .. } => Value::Object(
            fields
                .into_iter()
                .map(|(name, item)| (name, item.map(to_json).unwrap_or(Value::Null)))
                .collect(),
        ),
        CqlValue::Empty => Value::Null,
        other => Value::String(format!("{:?}", other)),
    }
}

fn decode_result(result: QueryResult) -> Result<Response> {
    let warnings: Vec<String> = result.warnings().map(str::to_string).collect();
    if !result.is_rows() {
        return Ok(Response {
            rows: None,
            warnings,
        });
    }

    let rows_result = result
        .into_rows_result()
        .map_err(|e| CqlError::Transport(format!("Failed to read result rows: {}", e)))?;
    let names: Vec<String> = rows_result
        .column_specs()
        .iter()
        .map(|spec| spec.name().to_string())
        .collect();

    let rows = rows_result
        .rows::<CqlRow>()
        .map_err(|e| CqlError::Transport(format!("Failed to read result rows: {}", e)))?
        .map(|row| -> Result<Row> {
            let row = row.map_err(|e| CqlError::Transport(format!("Failed to decode row: {}", e)))?;
            Ok(names
                .iter()
                .cloned()
                .zip(
                    row.columns
                        .into_iter()
                        .map(|value| value.map(to_json).unwrap_or(Value::Null)),
                )
                .collect())
        })
        .collect::<Result<Rows>>()?;

    debug!("Decoded {} row(s)", rows.len());
    Ok(Response {
        rows: Some(rows),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::CassandraConnector;
    use serde_json::json;

    fn native(typ: NativeType) -> ColumnType<'static> {
        ColumnType::Native(typ)
    }

    #[test]
    fn test_bind_scalars() {
        assert_eq!(
            bind_value(&json!("Chair"), &native(NativeType::Text)).unwrap(),
            Some(CqlValue::Text("Chair".to_string()))
        );
        assert_eq!(
            bind_value(&json!(7), &native(NativeType::Int)).unwrap(),
            Some(CqlValue::Int(7))
        );
        assert_eq!(
            bind_value(&json!(7), &native(NativeType::BigInt)).unwrap(),
            Some(CqlValue::BigInt(7))
        );
        assert_eq!(
            bind_value(&json!(true), &native(NativeType::Boolean)).unwrap(),
            Some(CqlValue::Boolean(true))
        );
        assert_eq!(bind_value(&json!(null), &native(NativeType::Int)).unwrap(), None);
    }

    #[test]
    fn test_bind_mismatch() {
        assert!(bind_value(&json!("seven"), &native(NativeType::Int)).is_err());
        assert!(bind_value(&json!(70000), &native(NativeType::SmallInt)).is_err());
        assert!(bind_value(&json!("not-a-uuid"), &native(NativeType::Uuid)).is_err());
    }

    #[test]
    fn test_bind_temporal() {
        assert_eq!(
            bind_value(&json!("1970-01-02"), &native(NativeType::Date)).unwrap(),
            Some(CqlValue::Date(CqlDate((1 << 31) + 1)))
        );
        assert_eq!(
            bind_value(&json!("1970-01-01T00:00:01Z"), &native(NativeType::Timestamp)).unwrap(),
            Some(CqlValue::Timestamp(CqlTimestamp(1000)))
        );
        assert_eq!(
            bind_value(&json!("00:00:01.5"), &native(NativeType::Time)).unwrap(),
            Some(CqlValue::Time(CqlTime(1_500_000_000)))
        );
    }

    #[test]
    fn test_bind_list() {
        let typ = ColumnType::Collection {
            frozen: false,
            typ: CollectionType::List(Box::new(native(NativeType::Text))),
        };
        assert_eq!(
            bind_value(&json!(["a", "b"]), &typ).unwrap(),
            Some(CqlValue::List(vec![
                CqlValue::Text("a".to_string()),
                CqlValue::Text("b".to_string()),
            ]))
        );
        assert!(bind_value(&json!(["a", null]), &typ).is_err());
    }

    #[test]
    fn test_decimal_bytes() {
        assert_eq!(minimal_be_bytes(0), vec![0x00]);
        assert_eq!(minimal_be_bytes(127), vec![0x7f]);
        assert_eq!(minimal_be_bytes(128), vec![0x00, 0x80]);
        assert_eq!(minimal_be_bytes(-1), vec![0xff]);
        assert_eq!(minimal_be_bytes(-129), vec![0xff, 0x7f]);
        assert_eq!(signed_be_bytes_to_i128(&[0xff, 0x7f]), Some(-129));
        assert_eq!(format_decimal(123456, 4), "12.3456");
        assert_eq!(format_decimal(-5, 2), "-0.05");
        assert_eq!(format_decimal(12, -2), "1200");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(to_json(CqlValue::Text("x".to_string())), json!("x"));
        assert_eq!(to_json(CqlValue::Int(3)), json!(3));
        assert_eq!(to_json(CqlValue::Date(CqlDate((1 << 31) + 1))), json!("1970-01-02"));
        assert_eq!(
            to_json(CqlValue::Map(vec![(
                CqlValue::Text("a".to_string()),
                CqlValue::Int(1)
            )])),
            json!({ "a": 1 })
        );
        assert_eq!(
            to_json(CqlValue::List(vec![CqlValue::Int(1), CqlValue::Int(2)])),
            json!([1, 2])
        );
    }

    #[tokio::test]
    #[ignore] // Requires actual Cassandra
    async fn test_health_check() {
        use crate::connectors::Connector;

        let config = ConnectorConfig::new(vec!["127.0.0.1:9042"]);
        let connector = CassandraConnector::new(config).unwrap();
        assert!(connector.health_check().await.is_ok());
        connector.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires actual Cassandra
    async fn test_keyspace_roundtrip() {
        let config = ConnectorConfig::new(vec!["127.0.0.1:9042"]);
        let connector = CassandraConnector::new(config).unwrap();
        let keyspace = connector.keyspace("cqlbridge_test");
        keyspace.create(None).await.unwrap();
        assert!(keyspace.exists().await.unwrap());
    }
}
