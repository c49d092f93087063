//! Corruption Tests
//!
//! Truncated and bit-flipped model files must be rejected under validation,
//! and must still be loadable for inspection when validation is disabled.

use crate::common::*;

fn is_detected(err: &ModelError) -> bool {
    matches!(
        err,
        ModelError::UnexpectedEof { .. }
            | ModelError::ChecksumMismatch { .. }
            | ModelError::InvalidFormat(_)
    )
}

#[test]
fn every_truncation_is_detected() {
    let bytes = to_binary(&perceptron_classifier());
    for cut in 1..=bytes.len() {
        let short = &bytes[..bytes.len() - cut];
        let err = from_binary(short, LoadOptions::default()).unwrap_err();
        assert!(is_detected(&err), "cut {} bytes: {:?}", cut, err);
        if short.len() >= HEADER_SIZE {
            assert!(
                matches!(err, ModelError::UnexpectedEof { .. }),
                "cut {} bytes: {:?}",
                cut,
                err
            );
        }
    }
}

#[test]
fn truncated_file_reports_sizes() {
    let dir = temp_dir();
    let path = write_model(dir.path(), "model.jubatus", &perceptron_classifier());
    let size = file_size(&path);
    truncate_file(&path, size - 10);

    let err = Model::load_binary_file(&path, LoadOptions::default()).unwrap_err();
    match err {
        ModelError::UnexpectedEof {
            section,
            expected,
            actual,
        } => {
            assert_eq!(section, "user_data");
            assert_eq!(expected - actual, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn every_payload_byte_flip_is_detected() {
    let model = perceptron_classifier();
    let bytes = to_binary(&model);
    for offset in HEADER_SIZE..bytes.len() {
        let mut corrupt = bytes.clone();
        corrupt[offset] ^= 0xff;
        // sizes and CRC32 are checked before either section is decoded
        match from_binary(&corrupt, LoadOptions::default()) {
            Err(ModelError::ChecksumMismatch { stored, computed }) => {
                assert_eq!(stored, model.header.crc32);
                assert_ne!(computed, stored);
            }
            other => panic!("flip at {}: {:?}", offset, other),
        }
    }
}

#[test]
fn header_version_flip_is_detected() {
    let dir = temp_dir();
    let path = write_model(dir.path(), "model.jubatus", &perceptron_classifier());
    corrupt_file_at_offset(&path, 23, &[0x09]);

    let err = Model::load_binary_file(&path, LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::ChecksumMismatch { .. }));
}

#[test]
fn bad_magic_is_invalid_format() {
    let mut bytes = to_binary(&perceptron_classifier());
    bytes[0] = b'J';
    let err = from_binary(&bytes, LoadOptions::no_validate()).unwrap_err();
    assert!(matches!(err, ModelError::InvalidFormat(_)));
}

#[test]
fn bad_checksum_loads_without_validation() {
    let dir = temp_dir();
    let model = perceptron_classifier();
    let path = write_model(dir.path(), "model.jubatus", &model);
    corrupt_file_at_offset(&path, 28, &[0, 0, 0, 0]);

    assert!(Model::load_binary_file(&path, LoadOptions::default()).is_err());
    let loaded = Model::load_binary_file(&path, LoadOptions::no_validate()).unwrap();
    assert_eq!(loaded.header.crc32, 0);
    assert_eq!(loaded.system, model.system);
    assert_eq!(loaded.user, model.user);
}
