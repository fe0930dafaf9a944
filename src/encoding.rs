//! Textual encoding for keys, nonces and ciphertexts
//!
//! Every string crossing the library boundary is standard base64 (RFC 4648
//! alphabet) with `=` padding. Encoding and decoding share one engine so
//! that anything produced here decodes back byte-for-byte.
//!
//! Decoding is strict: non-canonical padding, whitespace and characters
//! outside the alphabet are all rejected.

use crate::error::{ErrorCategory, ErrorKind, GcmboxError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Encode bytes as padded standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode padded standard base64.
///
/// `what` names the field being decoded ("key", "nonce", ...) and is only
/// used in the error message.
pub fn decode(encoded: &str, what: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        GcmboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidEncoding,
            format!("{} is not valid base64: {}", what, e),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes() {
        let encoded = encode(b"");
        assert_eq!(encoded, "");
        assert_eq!(decode(&encoded, "test").unwrap(), b"");
    }

    #[test]
    fn test_padding_is_emitted() {
        assert_eq!(encode(b"a"), "YQ==");
        assert_eq!(encode(b"ab"), "YWI=");
        assert_eq!(encode(b"abc"), "YWJj");
    }

    #[test]
    fn test_all_byte_values() {
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = encode(&bytes);

        // Standard alphabet, not the URL-safe one.
        assert!(encoded.contains('+'));
        assert!(encoded.contains('/'));
        assert!(!encoded.contains('-'));
        assert!(!encoded.contains('_'));

        assert_eq!(decode(&encoded, "test").unwrap(), bytes);
    }

    #[test]
    fn test_missing_padding_rejected() {
        let err = decode("YQ", "test").expect_err("expected padding error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEncoding));
        assert_eq!(err.category, ErrorCategory::User);
    }

    #[test]
    fn test_bad_characters_rejected() {
        let err = decode("not-base64!!", "key").expect_err("expected decode error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEncoding));
        assert!(err.to_string().starts_with("key is not valid base64"));
    }

    #[test]
    fn test_url_safe_alphabet_rejected() {
        let err = decode("-_-_", "test").expect_err("expected alphabet error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEncoding));
    }

    #[test]
    fn test_whitespace_rejected() {
        let err = decode("YWJj\n", "test").expect_err("expected whitespace error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEncoding));
    }
}
