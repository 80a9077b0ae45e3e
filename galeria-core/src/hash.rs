use sha2::{Digest, Sha256};

/// Compute the cache-validation token for encoded image bytes.
///
/// The digest covers the final encoded bytes rather than pixel data, so the
/// token changes whenever the bytes served to the client change.
pub fn validation_token(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::validation_token;

    #[test]
    fn token_is_lowercase_sha256_hex() {
        assert_eq!(
            validation_token(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(validation_token(&[]).len(), 64);
    }

    #[test]
    fn token_is_deterministic() {
        let data = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert_eq!(validation_token(&data), validation_token(&data));
    }

    #[test]
    fn single_byte_difference_changes_token() {
        let original = vec![7u8; 4096];
        let mut changed = original.clone();
        changed[2048] ^= 0x01;
        assert_ne!(validation_token(&original), validation_token(&changed));
    }
}
