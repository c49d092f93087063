//! Jubatus model file manipulation
//!
//! This crate reads, inspects, edits, repairs and transforms the model files
//! that Jubatus servers save:
//! - Header: fixed 48-byte big-endian header with magic, versions, sizes and CRC32
//! - Containers: MessagePack system and user sections
//! - Checksum: CRC32 over header, system and user bytes
//! - Model: the in-memory aggregate, binary I/O and header repair
//! - JSON / text: human-facing renderings
//! - Transform: cut a shared component out of one service's model
//! - DumpBridge: high-level payload dump through the external `jubadump`
//!
//! # Example
//!
//! ```ignore
//! use jubakit_model::{LoadOptions, Model};
//!
//! let mut model = Model::load_binary_file(path, LoadOptions::default())?;
//! let weight = model.transform("weight")?;
//! weight.dump_binary(&mut out)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checksum;
pub mod container;
pub mod dump_bridge;
pub mod error;
pub mod header;
pub mod json;
pub mod model;
pub mod msgpack;
pub mod text;
pub mod transform;

pub use container::{Container, SystemContainer, UserContainer};
pub use dump_bridge::DumpBridge;
pub use error::{ModelError, ModelResult};
pub use header::{
    EngineVersion, Header, CRC32_OFFSET, HEADER_SIZE, HEADER_SIZE_WITHOUT_CHECKSUM,
    MODEL_FORMAT_VERSION, MODEL_MAGIC,
};
pub use json::JsonOptions;
pub use model::{FileFormat, LoadOptions, Model};
pub use msgpack::{MsgPackError, Value, ValueExt};
pub use transform::{services, Rule, GENERIC_SERVICES, RULES};
