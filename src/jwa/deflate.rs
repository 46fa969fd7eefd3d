use alloc::vec::Vec;

use miniz_oxide::inflate::TINFLStatus;

use super::CompressionError;

/// The most bytes a compressed payload may inflate to.
const MAX_DECOMPRESSED_SIZE: usize = 10 * 1024 * 1024;

pub(super) fn compress(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec(data, 6)
}

pub(super) fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    miniz_oxide::inflate::decompress_to_vec_with_limit(data, MAX_DECOMPRESSED_SIZE).map_err(|e| {
        if e.status == TINFLStatus::HasMoreOutput {
            CompressionError::TooLarge
        } else {
            CompressionError::Malformed
        }
    })
}
