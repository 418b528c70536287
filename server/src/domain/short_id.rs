//! Short identifier encoding
//!
//! Maps an integer seed onto a compact URL-safe string. The alphabet leaves
//! out `0`, `O`, `I` and `l` and is shuffled so that consecutive seeds do not
//! read as sequential ids.

/// Symbols used for encoding, most-significant digit first.
///
/// The first symbol doubles as the encoding of zero.
pub const ALPHABET: &[u8; 60] = b"DnBhsvXH1LRC9W_tNgPpKYVjo-yrJ2fazdF8qkcmGwTU63EZxeQ7bu54iSAM";

/// Encode a seed as a short identifier.
///
/// Positional digit extraction in base `ALPHABET.len()`, no padding.
/// Distinct seeds always produce distinct strings.
pub fn encode(mut n: u64) -> String {
    let base = ALPHABET.len() as u64;
    if n == 0 {
        return char::from(ALPHABET[0]).to_string();
    }

    // u64::MAX needs 11 base-60 digits
    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(ALPHABET[(n % base) as usize]);
        n /= base;
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}

/// Generate an identifier from the sub-second part of the wall clock.
///
/// Collisions are possible; the repository reports them as `AlreadyExists`.
pub fn generate() -> String {
    let nanos = chrono::Utc::now().timestamp_subsec_nanos();
    encode(u64::from(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_zero_is_sentinel() {
        assert_eq!(encode(0), "D");
        assert!(ALPHABET[0].is_ascii_alphanumeric());
    }

    #[test]
    fn test_single_digit_range() {
        assert_eq!(encode(1), "n");
        assert_eq!(encode(59), "M");
        assert_eq!(encode(60), "nD");
        assert_eq!(encode(61), "nn");
    }

    #[test]
    fn test_encode_injective() {
        let mut seen = HashSet::new();
        for n in 0..10_000u64 {
            assert!(seen.insert(encode(n)), "duplicate encoding for {}", n);
        }
    }

    #[test]
    fn test_alphabet_is_unique_and_url_safe() {
        let unique: HashSet<u8> = ALPHABET.iter().copied().collect();
        assert_eq!(unique.len(), ALPHABET.len());
        for b in ALPHABET {
            assert!(b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_');
            assert!(!b"0OIl".contains(b));
        }
    }

    #[test]
    fn test_encode_max() {
        let id = encode(u64::MAX);
        assert_eq!(id.len(), 11);
    }

    #[test]
    fn test_generate_is_short() {
        // nanos < 1e9 < 60^6
        let id = generate();
        assert!(!id.is_empty());
        assert!(id.len() <= 6);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }
}
