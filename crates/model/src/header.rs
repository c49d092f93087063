//! Model file header.
//!
//! # Binary Format (48 bytes)
//!
//! ```text
//! magic("jubatus\0", 8) + format_version(8) + version_major(4)
//! + version_minor(4) + version_maint(4) + crc32(4)
//! + system_data_size(8) + user_data_size(8) = 48 bytes
//! ```
//!
//! All integers are big-endian. The CRC32 field is excluded from the
//! checksum input, so [`Header::to_bytes`] can render the header without it.

use crate::error::{ModelError, ModelResult};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

/// Magic bytes at the start of every binary model file.
pub const MODEL_MAGIC: &[u8; 8] = b"jubatus\0";

/// Container format revision written by current engines.
pub const MODEL_FORMAT_VERSION: u64 = 1;

/// Total size of the binary header, magic included.
pub const HEADER_SIZE: usize = 48;

/// Size of the header as fed into the checksum (CRC32 field skipped).
pub const HEADER_SIZE_WITHOUT_CHECKSUM: usize = HEADER_SIZE - 4;

/// Byte offset of the CRC32 field within the header.
pub const CRC32_OFFSET: usize = 28;

/// Fixed-size header of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Container format revision
    pub format_version: u64,
    /// Major version of the engine that wrote the file
    #[serde(rename = "jubatus_version_major", alias = "engine_version_major")]
    pub engine_version_major: u32,
    /// Minor version of the engine that wrote the file
    #[serde(rename = "jubatus_version_minor", alias = "engine_version_minor")]
    pub engine_version_minor: u32,
    /// Maintenance version of the engine that wrote the file
    #[serde(rename = "jubatus_version_maint", alias = "engine_version_maint")]
    pub engine_version_maint: u32,
    /// CRC32 over header (without this field), system and user sections
    pub crc32: u32,
    /// Byte length of the system section
    pub system_data_size: u64,
    /// Byte length of the user section
    pub user_data_size: u64,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            format_version: MODEL_FORMAT_VERSION,
            engine_version_major: 0,
            engine_version_minor: 0,
            engine_version_maint: 0,
            crc32: 0,
            system_data_size: 0,
            user_data_size: 0,
        }
    }
}

/// Read exactly `N` bytes for header field `name`, reporting short reads as
/// an invalid format.
fn read_field<R: Read, const N: usize>(r: &mut R, name: &str) -> ModelResult<[u8; N]> {
    let mut buf = Vec::with_capacity(N);
    r.by_ref().take(N as u64).read_to_end(&mut buf)?;
    <[u8; N]>::try_from(buf.as_slice()).map_err(|_| {
        ModelError::InvalidFormat(format!(
            "failed to read {} in header (expected {} bytes, got {} bytes)",
            name,
            N,
            buf.len()
        ))
    })
}

impl Header {
    /// Read a header from the start of `r`.
    pub fn read_from<R: Read>(r: &mut R) -> ModelResult<Self> {
        let magic: [u8; 8] = read_field(r, "magic")?;
        if &magic != MODEL_MAGIC {
            return Err(ModelError::InvalidFormat(format!(
                "invalid magic value: {:?}",
                String::from_utf8_lossy(&magic)
            )));
        }

        let format_version = BigEndian::read_u64(&read_field::<_, 8>(r, "format_version")?);
        let engine_version_major =
            BigEndian::read_u32(&read_field::<_, 4>(r, "jubatus_version_major")?);
        let engine_version_minor =
            BigEndian::read_u32(&read_field::<_, 4>(r, "jubatus_version_minor")?);
        let engine_version_maint =
            BigEndian::read_u32(&read_field::<_, 4>(r, "jubatus_version_maint")?);
        let crc32 = BigEndian::read_u32(&read_field::<_, 4>(r, "crc32")?);
        let system_data_size = BigEndian::read_u64(&read_field::<_, 8>(r, "system_data_size")?);
        let user_data_size = BigEndian::read_u64(&read_field::<_, 8>(r, "user_data_size")?);

        Ok(Header {
            format_version,
            engine_version_major,
            engine_version_minor,
            engine_version_maint,
            crc32,
            system_data_size,
            user_data_size,
        })
    }

    /// Write the header to `w`. With `include_checksum == false` the CRC32
    /// field is left out entirely; that is the form fed into the checksum.
    pub fn write_to<W: Write>(&self, w: &mut W, include_checksum: bool) -> ModelResult<()> {
        self.write_fields(w, include_checksum)?;
        Ok(())
    }

    /// Serialize the header, optionally without the CRC32 field.
    pub fn to_bytes(&self, include_checksum: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        // io::Write for Vec<u8> never fails
        let _ = self.write_fields(&mut buf, include_checksum);
        buf
    }

    fn write_fields<W: Write>(&self, w: &mut W, include_checksum: bool) -> io::Result<()> {
        w.write_all(MODEL_MAGIC)?;
        w.write_u64::<BigEndian>(self.format_version)?;
        w.write_u32::<BigEndian>(self.engine_version_major)?;
        w.write_u32::<BigEndian>(self.engine_version_minor)?;
        w.write_u32::<BigEndian>(self.engine_version_maint)?;
        if include_checksum {
            w.write_u32::<BigEndian>(self.crc32)?;
        }
        w.write_u64::<BigEndian>(self.system_data_size)?;
        w.write_u64::<BigEndian>(self.user_data_size)
    }

    /// Engine version as a `(major, minor, maint)` triple.
    pub fn engine_version(&self) -> (u32, u32, u32) {
        (
            self.engine_version_major,
            self.engine_version_minor,
            self.engine_version_maint,
        )
    }

    /// `(key, value)` rows in declared field order, for the text dump.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("format_version", self.format_version.to_string()),
            ("jubatus_version_major", self.engine_version_major.to_string()),
            ("jubatus_version_minor", self.engine_version_minor.to_string()),
            ("jubatus_version_maint", self.engine_version_maint.to_string()),
            ("crc32", self.crc32.to_string()),
            ("system_data_size", self.system_data_size.to_string()),
            ("user_data_size", self.user_data_size.to_string()),
        ]
    }
}

/// Engine version triple, written `MAJOR.MINOR.MAINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Maintenance version
    pub maint: u32,
}

impl EngineVersion {
    /// Create a version triple.
    pub fn new(major: u32, minor: u32, maint: u32) -> Self {
        EngineVersion {
            major,
            minor,
            maint,
        }
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.maint)
    }
}

impl FromStr for EngineVersion {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ModelError::InvalidFormat(format!(
                "invalid version `{}`: expected MAJOR.MINOR.MAINT",
                s
            ))
        };
        let parts = s
            .split('.')
            .map(|p| p.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [major, minor, maint] => Ok(EngineVersion::new(*major, *minor, *maint)),
            _ => Err(invalid()),
        }
    }
}
