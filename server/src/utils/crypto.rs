//! Hashing and secret comparison helpers

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compare a presented secret against the expected one without early exit
pub fn constant_time_eq(presented: &str, expected: &str) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Lowercase hex SHA-256 of a string
pub fn sha256_hex(data: &str) -> String {
    format!("{:x}", Sha256::digest(data.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("S", "S"));
        assert!(!constant_time_eq("S", "T"));
        assert!(!constant_time_eq("S", "SS"));
        assert!(!constant_time_eq("", "S"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex("").len(), 64);
    }
}
