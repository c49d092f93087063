//! The in-memory model aggregate and its binary file I/O.
//!
//! ## Binary File Layout
//!
//! ```text
//! +---------------------+
//! | Header (48 bytes)   |  magic, versions, crc32, section sizes
//! +---------------------+
//! | System (N bytes)    |  [version, timestamp, type, id, config]
//! +---------------------+
//! | User (M bytes)      |  [version, user_data]
//! +---------------------+
//! ```
//!
//! ## Stale Headers
//!
//! Nothing recomputes the header behind the caller's back. Editing the
//! system container, the engine version or the raw user bytes leaves the
//! header sizes and CRC32 stale until [`Model::fix_header`] is called. This
//! lets corrupt or legacy files be loaded with validation disabled,
//! inspected, and repaired explicitly.

use crate::checksum;
use crate::container::{Container, SystemContainer, UserContainer};
use crate::error::{ModelError, ModelResult};
use crate::header::{EngineVersion, Header, MODEL_MAGIC};
use crate::msgpack::{self, Value};
use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Options for [`Model::load_binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Check section sizes against the header and verify the CRC32.
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { validate: true }
    }
}

impl LoadOptions {
    /// Load without any size or checksum validation.
    pub fn no_validate() -> Self {
        LoadOptions { validate: false }
    }
}

/// On-disk representation of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Native binary model file
    Binary,
    /// JSON rendering produced by [`Model::dump_json`]
    Json,
}

/// A model file held in memory.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// File header
    pub header: Header,
    /// Metadata section
    pub system: SystemContainer,
    /// Decoded payload section
    pub user: UserContainer,
    /// Payload section exactly as read, when known
    pub(crate) user_raw: Option<Vec<u8>>,
    /// Metadata section as last read or encoded; only written back while it
    /// still decodes to `system`
    pub(crate) system_raw: Option<Vec<u8>>,
}

// `system_raw` is an encoding of `system` and takes no part in equality.
impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.system == other.system
            && self.user == other.user
            && self.user_raw == other.user_raw
    }
}

fn read_section<R: Read>(r: &mut R, size: u64) -> ModelResult<Vec<u8>> {
    let mut buf = Vec::new();
    r.by_ref().take(size).read_to_end(&mut buf)?;
    Ok(buf)
}

fn check_section_size(section: &'static str, expected: u64, buf: &[u8]) -> ModelResult<()> {
    let actual = buf.len() as u64;
    if actual != expected {
        return Err(ModelError::UnexpectedEof {
            section,
            expected,
            actual,
        });
    }
    Ok(())
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Model::default()
    }

    /// Build a model from its parts, keeping `user_raw` as the payload
    /// bytes. The header is taken as given.
    pub fn from_parts(header: Header, system: SystemContainer, user_raw: Vec<u8>) -> ModelResult<Self> {
        let user = UserContainer::load(&user_raw)?;
        Ok(Model {
            header,
            system,
            user,
            user_raw: Some(user_raw),
            system_raw: None,
        })
    }

    /// Load a binary model file from `r`.
    ///
    /// With validation enabled, a section shorter than its declared size is
    /// [`ModelError::UnexpectedEof`] and a bad CRC32 is
    /// [`ModelError::ChecksumMismatch`]; both are checked before either
    /// section is decoded. With validation disabled neither check runs.
    pub fn load_binary<R: Read>(r: &mut R, options: LoadOptions) -> ModelResult<Self> {
        let header = Header::read_from(r)?;

        let system_raw = read_section(r, header.system_data_size)?;
        if options.validate {
            check_section_size("system_data", header.system_data_size, &system_raw)?;
        }
        let user_raw = read_section(r, header.user_data_size)?;
        if options.validate {
            check_section_size("user_data", header.user_data_size, &user_raw)?;
            checksum::validate(&header, &system_raw, &user_raw)?;
        } else {
            tracing::debug!("model validation disabled; sizes and CRC32 not checked");
        }

        let system = SystemContainer::load(&system_raw)?;
        let user = UserContainer::load(&user_raw)?;

        tracing::debug!(
            service = %system.service_type(),
            system_data_size = system_raw.len(),
            user_data_size = user_raw.len(),
            "loaded binary model"
        );

        Ok(Model {
            header,
            system,
            user,
            user_raw: Some(user_raw),
            system_raw: Some(system_raw),
        })
    }

    /// Load a binary model file from `path`.
    pub fn load_binary_file(path: &Path, options: LoadOptions) -> ModelResult<Self> {
        let mut file = File::open(path)?;
        Model::load_binary(&mut file, options)
    }

    /// Write the model as a binary model file. The header is written as it
    /// currently is; call [`Model::fix_header`] first after edits.
    pub fn dump_binary<W: Write>(&self, w: &mut W) -> ModelResult<()> {
        self.header.write_to(w, true)?;
        w.write_all(&self.system_bytes()?)?;
        w.write_all(&self.user_bytes()?)?;
        Ok(())
    }

    /// Guess the format of the model file at `path` from its first byte.
    pub fn predict_format(path: &Path) -> ModelResult<FileFormat> {
        let mut file = File::open(path)?;
        let mut sig = [0u8; 1];
        let n = file.read(&mut sig)?;
        match sig[0] {
            b if n == 1 && b == MODEL_MAGIC[0] => Ok(FileFormat::Binary),
            b'{' if n == 1 => Ok(FileFormat::Json),
            _ => Err(ModelError::InvalidFormat(
                "model format cannot be predicted".to_string(),
            )),
        }
    }

    /// Recompute the section sizes and CRC32 from the current contents.
    ///
    /// The system section is re-encoded, and later dumps write that
    /// encoding; the user section uses the stored raw bytes. Calling this
    /// twice gives the same header as calling it once.
    pub fn fix_header(&mut self) -> ModelResult<()> {
        if self.user_raw.is_none() {
            tracing::warn!(
                "re-encoding user data without its original bytes; may generate corrupt model"
            );
            self.user_raw = Some(self.user.dump()?);
        }
        let system_raw = self.system.dump()?;
        let user_raw = self.user_raw.as_deref().unwrap_or_default();

        let mut header = self.header;
        header.system_data_size = system_raw.len() as u64;
        header.user_data_size = user_raw.len() as u64;
        header.crc32 = checksum::compute_for(&header, &system_raw, user_raw);
        self.header = header;
        self.system_raw = Some(system_raw);
        Ok(())
    }

    /// Verify the current header against the current contents, the same
    /// check [`Model::load_binary`] performs.
    pub fn validate(&self) -> ModelResult<()> {
        let system_raw = self.system_bytes()?;
        let user_raw = self.user_bytes()?;
        check_section_size("system_data", self.header.system_data_size, &system_raw)?;
        check_section_size("user_data", self.header.user_data_size, &user_raw)?;
        checksum::validate(&self.header, &system_raw, &user_raw)
    }

    /// Metadata section bytes: the stored bytes while they still decode to
    /// the current system container, otherwise a fresh encoding.
    pub fn system_bytes(&self) -> ModelResult<Cow<'_, [u8]>> {
        if let Some(raw) = &self.system_raw {
            if SystemContainer::load(raw).ok().as_ref() == Some(&self.system) {
                return Ok(Cow::Borrowed(raw));
            }
        }
        Ok(Cow::Owned(self.system.dump()?))
    }

    /// Payload bytes: the stored raw bytes, or a fresh encoding of the
    /// decoded user container when none are stored.
    pub fn user_bytes(&self) -> ModelResult<Cow<'_, [u8]>> {
        match &self.user_raw {
            Some(raw) => Ok(Cow::Borrowed(raw)),
            None => {
                tracing::warn!(
                    "conversion from decoded user data to binary model format may generate corrupt model"
                );
                Ok(Cow::Owned(self.user.dump()?))
            }
        }
    }

    /// Payload bytes exactly as loaded, if known.
    pub fn user_raw(&self) -> Option<&[u8]> {
        self.user_raw.as_deref()
    }

    /// Replace the payload bytes; the user container is decoded from them.
    /// Leaves the header stale.
    pub fn set_user_raw(&mut self, raw: Vec<u8>) -> ModelResult<()> {
        self.user = UserContainer::load(&raw)?;
        self.user_raw = Some(raw);
        Ok(())
    }

    /// Shortcut for `user.user_data`.
    pub fn data(&self) -> &Value {
        &self.user.user_data
    }

    /// Parsed `system.config`.
    pub fn config(&self) -> ModelResult<serde_json::Value> {
        self.system.config_json()
    }

    /// Replace `system.config` with new JSON text. Leaves the header stale.
    pub fn replace_config(&mut self, config: impl Into<String>) {
        self.system.config = config.into().into_bytes();
    }

    /// Replace the engine version in the header. Leaves the CRC32 stale.
    pub fn replace_version(&mut self, version: EngineVersion) {
        self.header.engine_version_major = version.major;
        self.header.engine_version_minor = version.minor;
        self.header.engine_version_maint = version.maint;
    }

    /// Decode an arbitrary payload buffer as a user container.
    pub fn decode_user(raw: &[u8]) -> ModelResult<UserContainer> {
        UserContainer::load(raw)
    }

    /// Encode a raw payload from the generic `[version, [parts...]]` shape,
    /// splicing each part's bytes in verbatim.
    pub fn encode_user_parts(version: u64, parts: &[&[u8]]) -> ModelResult<Vec<u8>> {
        let mut buf = Vec::new();
        msgpack::write_array_len(&mut buf, 2)?;
        msgpack::write_uint(&mut buf, version)?;
        msgpack::write_array_len(&mut buf, parts.len())?;
        for part in parts {
            buf.extend_from_slice(part);
        }
        Ok(buf)
    }
}
