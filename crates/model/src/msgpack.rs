//! MessagePack values as stored in model containers.
//!
//! Jubatus writes its containers with the legacy MessagePack "raw" type, so
//! string-family values are byte strings that are usually, but not always,
//! UTF-8. Decoding goes through [`rmpv`], whose string values keep invalid
//! UTF-8 as the bytes that were found.
//!
//! Besides whole-value decoding this module exposes two splicing primitives,
//! [`read_array_len`] and [`read_raw`], which walk an encoded buffer and hand
//! back sub-ranges of it untouched. The transformation engine relies on them
//! to move engine-private blobs between models without re-encoding.
//!
//! Encoding is local: the engine's reader predates `str 8`, which
//! `rmpv::encode` would emit.

use byteorder::{BigEndian, WriteBytesExt};
use rmp::decode::ValueReadError;
use rmp::encode;
use rmp::Marker;
use std::fmt::Display;
use std::io::{self, Write};
use thiserror::Error;

pub use rmpv::Value;

/// Nesting limit for decoding; deeper input is rejected instead of
/// exhausting the stack.
pub const MAX_DEPTH: usize = 512;

/// MessagePack codec error.
#[derive(Debug, Error)]
pub enum MsgPackError {
    /// Input ended in the middle of a value
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// Nesting deeper than [`MAX_DEPTH`]
    #[error("value nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,
    /// Malformed input other than truncation, e.g. a reserved marker
    #[error("invalid MessagePack data: {0}")]
    Invalid(String),
    /// Found a different value type than the caller asked for
    #[error("expected {expected}, found marker {found:#04x}")]
    UnexpectedType {
        /// What the caller wanted
        expected: &'static str,
        /// Marker byte actually present
        found: u8,
    },
    /// Array has a different number of elements than the caller expected
    #[error("expected a {expected}-element array, found {found} elements")]
    ArrayLength {
        /// Length the caller wanted
        expected: u32,
        /// Length actually declared
        found: u32,
    },
    /// Value could not be written
    #[error("failed to encode value: {0}")]
    Encode(String),
}

impl From<rmpv::decode::Error> for MsgPackError {
    fn from(e: rmpv::decode::Error) -> Self {
        use rmpv::decode::Error;
        match e {
            Error::InvalidMarkerRead(ref err) | Error::InvalidDataRead(ref err)
                if err.kind() == io::ErrorKind::UnexpectedEof =>
            {
                MsgPackError::UnexpectedEof
            }
            Error::DepthLimitExceeded => MsgPackError::TooDeep,
            other => MsgPackError::Invalid(other.to_string()),
        }
    }
}

fn encode_err<E: Display>(e: E) -> MsgPackError {
    MsgPackError::Encode(e.to_string())
}

/// Conversions between [`Value`] and the forms the rest of the crate needs.
pub trait ValueExt: Sized {
    /// Bytes of a `str` or `bin` value, verbatim.
    fn str_bytes(&self) -> Option<&[u8]>;

    /// Render as JSON.
    ///
    /// Lossy: byte strings that are not UTF-8 get replacement characters,
    /// `str` and `bin` become indistinguishable, and non-string map keys are
    /// rendered as their JSON text.
    fn to_json(&self) -> serde_json::Value;

    /// Convert a JSON document into a MessagePack value.
    ///
    /// Strings become `str`, objects become maps with string keys, and
    /// numbers pick the narrowest of unsigned, signed and float.
    fn from_json(json: &serde_json::Value) -> Self;
}

impl ValueExt for Value {
    fn str_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s.as_bytes()),
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Nil => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Integer(n) => match (n.as_u64(), n.as_i64()) {
                (Some(u), _) => Json::from(u),
                (None, Some(i)) => Json::from(i),
                (None, None) => Json::Null,
            },
            Value::F32(f) => float_to_json(f64::from(*f)),
            Value::F64(f) => float_to_json(*f),
            Value::String(_) | Value::Binary(_) => Json::String(lossy(self)),
            Value::Array(items) => Json::Array(items.iter().map(ValueExt::to_json).collect()),
            Value::Map(entries) => {
                let mut obj = serde_json::Map::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = match k {
                        Value::String(_) | Value::Binary(_) => lossy(k),
                        other => other.to_json().to_string(),
                    };
                    obj.insert(key, v.to_json());
                }
                Json::Object(obj)
            }
            Value::Ext(ty, data) => Json::Array(vec![
                Json::from(*ty),
                Json::String(String::from_utf8_lossy(data).into_owned()),
            ]),
        }
    }

    fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Boolean(*b),
            Json::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else {
                    Value::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Json::String(s) => Value::from(s.as_str()),
            Json::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            Json::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (Value::from(k.as_str()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

fn lossy(value: &Value) -> String {
    String::from_utf8_lossy(value.str_bytes().unwrap_or_default()).into_owned()
}

fn float_to_json(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one value from the front of `rd`, advancing it past the value.
pub fn read_value(rd: &mut &[u8]) -> Result<Value, MsgPackError> {
    Ok(rmpv::decode::read_value_with_max_depth(rd, MAX_DEPTH)?)
}

/// Read an array header from the front of `rd` and return its length.
pub fn read_array_len(rd: &mut &[u8]) -> Result<u32, MsgPackError> {
    let found = *rd.first().ok_or(MsgPackError::UnexpectedEof)?;
    rmp::decode::read_array_len(rd).map_err(|e| match e {
        ValueReadError::TypeMismatch(_) => MsgPackError::UnexpectedType {
            expected: "array",
            found,
        },
        _ => MsgPackError::UnexpectedEof,
    })
}

/// Return the encoded bytes of the next value in `rd` without re-encoding,
/// advancing `rd` past it.
pub fn read_raw<'a>(rd: &mut &'a [u8]) -> Result<&'a [u8], MsgPackError> {
    let start: &'a [u8] = rd;
    read_value(rd)?;
    Ok(&start[..start.len() - rd.len()])
}

/// Decode a complete buffer holding exactly one value at its front.
/// Trailing bytes are ignored.
pub fn decode(bytes: &[u8]) -> Result<Value, MsgPackError> {
    let mut rd = bytes;
    read_value(&mut rd)
}

// ============================================================================
// Encoding
// ============================================================================

fn len_u32(len: usize) -> Result<u32, MsgPackError> {
    u32::try_from(len).map_err(|_| MsgPackError::Encode(format!("length {} exceeds u32", len)))
}

/// Write an array header for `len` elements.
pub fn write_array_len<W: Write>(wr: &mut W, len: usize) -> Result<(), MsgPackError> {
    encode::write_array_len(wr, len_u32(len)?).map_err(encode_err)?;
    Ok(())
}

/// Write a non-negative integer in its narrowest encoding.
pub fn write_uint<W: Write>(wr: &mut W, n: u64) -> Result<(), MsgPackError> {
    encode::write_uint(wr, n).map_err(encode_err)?;
    Ok(())
}

/// Write a signed integer in its narrowest encoding; non-negative values
/// use the unsigned family.
pub fn write_int<W: Write>(wr: &mut W, n: i64) -> Result<(), MsgPackError> {
    match u64::try_from(n) {
        Ok(u) => write_uint(wr, u),
        Err(_) => {
            encode::write_sint(wr, n).map_err(encode_err)?;
            Ok(())
        }
    }
}

/// Write a byte string with a `str`-family marker.
///
/// `str 8` did not exist in the raw-type format the engine reads, so
/// strings of 32..=255 bytes use `str 16` instead.
pub fn write_str_bytes<W: Write>(wr: &mut W, bytes: &[u8]) -> Result<(), MsgPackError> {
    let len = len_u32(bytes.len())?;
    if len < 32 {
        encode::write_str_len(wr, len).map_err(encode_err)?;
    } else if let Ok(len) = u16::try_from(len) {
        wr.write_u8(Marker::Str16.to_u8()).map_err(encode_err)?;
        wr.write_u16::<BigEndian>(len).map_err(encode_err)?;
    } else {
        wr.write_u8(Marker::Str32.to_u8()).map_err(encode_err)?;
        wr.write_u32::<BigEndian>(len).map_err(encode_err)?;
    }
    wr.write_all(bytes).map_err(encode_err)
}

/// Encode `value` onto `wr` using the narrowest markers.
pub fn write_value<W: Write>(wr: &mut W, value: &Value) -> Result<(), MsgPackError> {
    match value {
        Value::Nil => encode::write_nil(wr).map_err(encode_err)?,
        Value::Boolean(b) => encode::write_bool(wr, *b).map_err(encode_err)?,
        Value::Integer(n) => match (n.as_u64(), n.as_i64()) {
            (Some(u), _) => write_uint(wr, u)?,
            (None, Some(i)) => write_int(wr, i)?,
            (None, None) => return Err(MsgPackError::Encode(format!("integer {} out of range", n))),
        },
        Value::F32(f) => encode::write_f32(wr, *f).map_err(encode_err)?,
        Value::F64(f) => encode::write_f64(wr, *f).map_err(encode_err)?,
        Value::String(s) => write_str_bytes(wr, s.as_bytes())?,
        Value::Binary(b) => {
            encode::write_bin_len(wr, len_u32(b.len())?).map_err(encode_err)?;
            wr.write_all(b).map_err(encode_err)?;
        }
        Value::Array(items) => {
            write_array_len(wr, items.len())?;
            for item in items {
                write_value(wr, item)?;
            }
        }
        Value::Map(entries) => {
            encode::write_map_len(wr, len_u32(entries.len())?).map_err(encode_err)?;
            for (k, v) in entries {
                write_value(wr, k)?;
                write_value(wr, v)?;
            }
        }
        Value::Ext(ty, data) => {
            encode::write_ext_meta(wr, len_u32(data.len())?, *ty).map_err(encode_err)?;
            wr.write_all(data).map_err(encode_err)?;
        }
    }
    Ok(())
}

/// Encode `value` into a fresh buffer.
pub fn encode_to_vec(value: &Value) -> Result<Vec<u8>, MsgPackError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}
