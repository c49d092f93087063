//! JSON rendering of model files.
//!
//! ```text
//! {
//!   "header":   { "format_version": 1, "jubatus_version_major": 1, ... },
//!   "system":   { "version": 1, "timestamp": .., "type": "classifier", ... },
//!   "user":     { "version": 1, "user_data": [...] },
//!   "user_raw": "<base64 of the user section>"
//! }
//! ```
//!
//! `user` is a decoded view and loses fidelity for byte strings that are not
//! UTF-8. `user_raw` carries the exact section bytes and wins over `user`
//! when a document has both.

use crate::container::{SystemContainer, UserContainer};
use crate::error::{ModelError, ModelResult};
use crate::header::Header;
use crate::model::Model;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::io::{Read, Write};

/// Options for [`Model::dump_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// Embed the raw user section as base64 (`user_raw`).
    pub include_raw: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions { include_raw: true }
    }
}

fn section<'a>(
    record: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> ModelResult<&'a serde_json::Value> {
    record
        .get(key)
        .ok_or_else(|| ModelError::InvalidFormat(format!("{} section does not exist", key)))
}

impl Model {
    /// Load a model from its JSON rendering.
    pub fn load_json<R: Read>(r: &mut R) -> ModelResult<Self> {
        let doc: serde_json::Value = serde_json::from_reader(r)?;
        let record = doc.as_object().ok_or_else(|| {
            ModelError::InvalidFormat("JSON model must be an object".to_string())
        })?;

        let header: Header = serde_json::from_value(section(record, "header")?.clone())?;
        let system: SystemContainer = serde_json::from_value(section(record, "system")?.clone())?;

        let mut model = Model {
            header,
            system,
            ..Model::default()
        };

        match (record.get("user_raw"), record.get("user")) {
            (Some(raw), user) => {
                if user.is_some() {
                    tracing::info!("using \"user_raw\" record from JSON; \"user\" record is ignored");
                }
                let encoded = raw.as_str().ok_or_else(|| {
                    ModelError::InvalidFormat("user_raw must be a base64 string".to_string())
                })?;
                model.set_user_raw(BASE64.decode(encoded)?)?;
            }
            (None, Some(user)) => {
                model.user = UserContainer::from_json(user)?;
            }
            (None, None) => {
                return Err(ModelError::InvalidFormat(
                    "user or user_raw section does not exist".to_string(),
                ));
            }
        }

        Ok(model)
    }

    /// Write the model as pretty-printed JSON.
    pub fn dump_json<W: Write>(&self, w: &mut W, options: JsonOptions) -> ModelResult<()> {
        let mut record = serde_json::Map::new();
        record.insert("header".to_string(), serde_json::to_value(self.header)?);
        record.insert("system".to_string(), serde_json::to_value(&self.system)?);
        record.insert("user".to_string(), self.user.to_json());
        if options.include_raw {
            let raw = self.user_bytes()?;
            record.insert(
                "user_raw".to_string(),
                serde_json::Value::String(BASE64.encode(&raw)),
            );
        }
        serde_json::to_writer_pretty(&mut *w, &serde_json::Value::Object(record))?;
        w.write_all(b"\n")?;
        Ok(())
    }
}
