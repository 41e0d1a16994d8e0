//! Text <-> integer codec
//!
//! Messages are UTF-8; the byte string is read as one big-endian unsigned integer.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{Result, SimError};
use crate::protocol::Stage;

/// Encode text as the big-endian integer of its UTF-8 bytes.
pub fn encode_text(text: &str) -> BigUint {
    BigUint::from_bytes_be(text.as_bytes())
}

/// Decode an integer back into text, using `ceil(bits / 8)` bytes.
pub fn decode_text(value: &BigUint, stage: Stage) -> Result<String> {
    // to_bytes_be() yields [0] for zero, which would decode to "\0"
    let bytes = if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    };

    String::from_utf8(bytes).map_err(|source| SimError::Decode {
        stage,
        value: value.clone(),
        source,
    })
}

/// Fails with `MessageTooLarge` unless `encoded < modulus`.
pub fn ensure_below(encoded: &BigUint, modulus: &BigUint, stage: Stage) -> Result<()> {
    if encoded >= modulus {
        return Err(SimError::MessageTooLarge {
            stage,
            encoded: encoded.clone(),
            modulus: modulus.clone(),
        });
    }
    Ok(())
}

/// Strip everything but ASCII letters and digits from each token, drop empty
/// tokens, and join the rest with single spaces.
pub fn sanitize_message<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|token| {
            token
                .as_ref()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use quickcheck::quickcheck;

    #[test]
    fn test_encode_known_value() {
        // 'A' = 0x41
        assert_eq!(encode_text("A"), BigUint::from(65u32));
        assert_eq!(encode_text("AB"), BigUint::from(0x4142u32));
    }

    #[test]
    fn test_empty_text_is_zero() {
        assert!(encode_text("").is_zero());
        assert_eq!(decode_text(&BigUint::zero(), Stage::Decrypted).unwrap(), "");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = decode_text(&BigUint::from(0xFFu32), Stage::Decrypted).unwrap_err();
        assert!(matches!(err, SimError::Decode { ref value, .. } if *value == BigUint::from(0xFFu32)));
    }

    #[test]
    fn test_ensure_below_boundary() {
        let n = BigUint::from(3233u32);
        assert!(ensure_below(&BigUint::from(3232u32), &n, Stage::PlaintextEncoded).is_ok());
        assert!(matches!(
            ensure_below(&n, &n, Stage::PlaintextEncoded),
            Err(SimError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_sanitize_message() {
        let tokens = ["attack!", "at", "--", "d@wn"];
        assert_eq!(sanitize_message(&tokens), "attack at dwn");
        assert_eq!(sanitize_message::<&str>(&[]), "");
    }

    quickcheck! {
        fn prop_text_round_trip(text: String) -> bool {
            // Leading NUL bytes vanish in the integer form
            let text = text.trim_start_matches('\0').to_string();
            decode_text(&encode_text(&text), Stage::Decrypted).unwrap() == text
        }

        fn prop_sanitized_is_alphanumeric(tokens: Vec<String>) -> bool {
            sanitize_message(&tokens)
                .split(' ')
                .all(|t| t.chars().all(|c| c.is_ascii_alphanumeric()))
        }
    }
}
