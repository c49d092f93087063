//! System and user containers.
//!
//! Both sections of a model file are a single MessagePack array whose
//! elements map positionally onto a declared field list:
//!
//! ```text
//! system: [version, timestamp, type, id, config]
//! user:   [version, user_data]
//! ```
//!
//! Extra trailing elements are ignored so that files written by newer
//! engines still load. Missing or mistyped elements are decode errors.

use crate::error::{ModelError, ModelResult};
use crate::msgpack::{self, MsgPackError, Value, ValueExt};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A section that is encoded as an ordered MessagePack array.
pub trait Container: Sized {
    /// Field names in wire order.
    const FIELDS: &'static [&'static str];

    /// Build the container from decoded array elements.
    fn from_values(values: &[Value]) -> ModelResult<Self>;

    /// Encode the field values in wire order, without the array header.
    fn write_fields<W: Write>(&self, wr: &mut W) -> Result<(), MsgPackError>;

    /// Decode a section.
    fn load(bytes: &[u8]) -> ModelResult<Self> {
        let value = msgpack::decode(bytes)?;
        let values = value.as_array().ok_or_else(|| {
            ModelError::Decode(format!(
                "expected an array of {} fields, found {}",
                Self::FIELDS.len(),
                value.to_json()
            ))
        })?;
        if values.len() < Self::FIELDS.len() {
            return Err(ModelError::Decode(format!(
                "missing field `{}`: expected {} values, got {}",
                Self::FIELDS[values.len()],
                Self::FIELDS.len(),
                values.len()
            )));
        }
        Self::from_values(values)
    }

    /// Encode a section.
    fn dump(&self) -> ModelResult<Vec<u8>> {
        let mut buf = Vec::new();
        msgpack::write_array_len(&mut buf, Self::FIELDS.len())?;
        self.write_fields(&mut buf)?;
        Ok(buf)
    }
}

fn field<'a>(values: &'a [Value], idx: usize, name: &str) -> ModelResult<&'a Value> {
    values
        .get(idx)
        .ok_or_else(|| ModelError::Decode(format!("missing field `{}`", name)))
}

fn uint_field(values: &[Value], idx: usize, name: &str) -> ModelResult<u64> {
    field(values, idx, name)?
        .as_u64()
        .ok_or_else(|| ModelError::Decode(format!("field `{}` is not an unsigned integer", name)))
}

fn int_field(values: &[Value], idx: usize, name: &str) -> ModelResult<i64> {
    field(values, idx, name)?
        .as_i64()
        .ok_or_else(|| ModelError::Decode(format!("field `{}` is not an integer", name)))
}

fn bytes_field(values: &[Value], idx: usize, name: &str) -> ModelResult<Vec<u8>> {
    field(values, idx, name)?
        .str_bytes()
        .map(<[u8]>::to_vec)
        .ok_or_else(|| ModelError::Decode(format!("field `{}` is not a byte string", name)))
}

// ============================================================================
// System Container
// ============================================================================

/// Metadata section: which service wrote the model, and with what config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "SystemRecord", from = "SystemRecord")]
pub struct SystemContainer {
    /// System section revision
    pub version: u64,
    /// Save time (seconds since epoch)
    pub timestamp: i64,
    /// Service name, e.g. `classifier`
    pub service_type: Vec<u8>,
    /// Model id given at save time
    pub id: Vec<u8>,
    /// Service configuration as JSON text
    pub config: Vec<u8>,
}

impl SystemContainer {
    /// Service name, lossily decoded.
    pub fn service_type(&self) -> String {
        String::from_utf8_lossy(&self.service_type).into_owned()
    }

    /// Model id, lossily decoded.
    pub fn id(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }

    /// Configuration text. Fails with [`ModelError::ConfigNotText`] when the
    /// stored bytes are not UTF-8.
    pub fn config_str(&self) -> ModelResult<&str> {
        Ok(std::str::from_utf8(&self.config)?)
    }

    /// Configuration parsed as JSON.
    pub fn config_json(&self) -> ModelResult<serde_json::Value> {
        Ok(serde_json::from_str(self.config_str()?)?)
    }

    /// `(key, value)` rows in declared field order, for the text dump.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("version", self.version.to_string()),
            ("timestamp", self.timestamp.to_string()),
            ("type", self.service_type()),
            ("id", self.id()),
            ("config", String::from_utf8_lossy(&self.config).into_owned()),
        ]
    }
}

impl Container for SystemContainer {
    const FIELDS: &'static [&'static str] = &["version", "timestamp", "type", "id", "config"];

    fn from_values(values: &[Value]) -> ModelResult<Self> {
        Ok(SystemContainer {
            version: uint_field(values, 0, "version")?,
            timestamp: int_field(values, 1, "timestamp")?,
            service_type: bytes_field(values, 2, "type")?,
            id: bytes_field(values, 3, "id")?,
            config: bytes_field(values, 4, "config")?,
        })
    }

    fn write_fields<W: Write>(&self, wr: &mut W) -> Result<(), MsgPackError> {
        msgpack::write_uint(wr, self.version)?;
        msgpack::write_int(wr, self.timestamp)?;
        msgpack::write_str_bytes(wr, &self.service_type)?;
        msgpack::write_str_bytes(wr, &self.id)?;
        msgpack::write_str_bytes(wr, &self.config)
    }
}

/// JSON shape of the system section.
#[derive(Serialize, Deserialize)]
struct SystemRecord {
    version: u64,
    timestamp: i64,
    #[serde(rename = "type")]
    service_type: String,
    id: String,
    config: String,
}

impl From<SystemContainer> for SystemRecord {
    fn from(s: SystemContainer) -> Self {
        SystemRecord {
            version: s.version,
            timestamp: s.timestamp,
            service_type: s.service_type(),
            id: s.id(),
            config: String::from_utf8_lossy(&s.config).into_owned(),
        }
    }
}

impl From<SystemRecord> for SystemContainer {
    fn from(r: SystemRecord) -> Self {
        SystemContainer {
            version: r.version,
            timestamp: r.timestamp,
            service_type: r.service_type.into_bytes(),
            id: r.id.into_bytes(),
            config: r.config.into_bytes(),
        }
    }
}

// ============================================================================
// User Container
// ============================================================================

/// Payload section: the engine-private model data.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContainer {
    /// User section revision
    pub version: u64,
    /// Opaque, service-specific model data
    pub user_data: Value,
}

impl Default for UserContainer {
    fn default() -> Self {
        UserContainer {
            version: 0,
            user_data: Value::Map(Vec::new()),
        }
    }
}

impl UserContainer {
    /// JSON rendering (`{"version": .., "user_data": ..}`); lossy for binary
    /// content inside `user_data`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "version": self.version,
            "user_data": self.user_data.to_json(),
        })
    }

    /// Build from the JSON rendering.
    pub fn from_json(json: &serde_json::Value) -> ModelResult<Self> {
        let version = json
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| {
                ModelError::InvalidFormat("user section lacks an integer `version`".to_string())
            })?;
        let user_data = json.get("user_data").ok_or_else(|| {
            ModelError::InvalidFormat("user section lacks `user_data`".to_string())
        })?;
        Ok(UserContainer {
            version,
            user_data: Value::from_json(user_data),
        })
    }

    /// `(key, value)` rows in declared field order, for the text dump.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("version", self.version.to_string()),
            ("user_data", self.user_data.to_json().to_string()),
        ]
    }
}

impl Container for UserContainer {
    const FIELDS: &'static [&'static str] = &["version", "user_data"];

    fn from_values(values: &[Value]) -> ModelResult<Self> {
        Ok(UserContainer {
            version: uint_field(values, 0, "version")?,
            user_data: field(values, 1, "user_data")?.clone(),
        })
    }

    fn write_fields<W: Write>(&self, wr: &mut W) -> Result<(), MsgPackError> {
        msgpack::write_uint(wr, self.version)?;
        msgpack::write_value(wr, &self.user_data)
    }
}
