//! CRC32 over a model file.
//!
//! The checksum covers the header with its own CRC32 field removed, followed
//! by the system section and the user section, in that order.

use crate::error::{ModelError, ModelResult};
use crate::header::Header;
use crc32fast::Hasher;

/// Compute the model checksum from its three parts.
pub fn compute(header_without_checksum: &[u8], system_bytes: &[u8], user_bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(header_without_checksum);
    hasher.update(system_bytes);
    hasher.update(user_bytes);
    hasher.finalize()
}

/// Checksum that `header` should carry for the given sections.
pub fn compute_for(header: &Header, system_bytes: &[u8], user_bytes: &[u8]) -> u32 {
    compute(&header.to_bytes(false), system_bytes, user_bytes)
}

/// Verify `header.crc32` against the sections.
pub fn validate(header: &Header, system_bytes: &[u8], user_bytes: &[u8]) -> ModelResult<()> {
    let computed = compute_for(header, system_bytes, user_bytes);
    if computed != header.crc32 {
        return Err(ModelError::ChecksumMismatch {
            stored: header.crc32,
            computed,
        });
    }
    Ok(())
}
