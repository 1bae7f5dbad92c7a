use sha2::{Digest, Sha256};

/// SHA-256 of `data`, rendered as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        // sha256("GENESIS")
        assert_eq!(
            sha256_hex(b"GENESIS"),
            "901131d838b17aac0f7885b81e03cbdc9f5157a00343d30ab22083685ed1416a"
        );
    }
}
