//! Little-endian f32 blob encoding for stored vectors.

use ndarray::Array1;
use prospect_core::{Error, Result};

/// Encode a vector as little-endian f32 bytes.
pub fn encode_f32(embedding: &Array1<f32>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for v in embedding.iter() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into a vector.
pub fn decode_f32(bytes: &[u8]) -> Result<Array1<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::Storage(format!(
            "Embedding blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_roundtrip_exact() {
        let original = array![0.1, -0.5, 3.25, 0.0];
        let restored = decode_f32(&encode_f32(&original)).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_corrupt_blob() {
        assert!(decode_f32(&[1, 2, 3]).is_err());
    }
}
