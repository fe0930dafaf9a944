//! Symmetric key lifecycle: generation, export and import
//!
//! A [`Key`] is 256 bits of secret material for AES-256-GCM. Its exported
//! form is padded standard base64 of the raw bytes, so
//! `import_key(&export_key(&k))` always yields a key equal to `k`.
//!
//! Keys are never printed. `Debug` is redacted, there is no `Display`, and
//! the backing array is wiped when the key is dropped.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::encoding;
use crate::error::{ErrorCategory, ErrorKind, GcmboxError, Result};

/// Length of a key in bytes (256 bits)
pub const KEY_LEN: usize = 32;

/// An AES-256 key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key {
    bytes: [u8; KEY_LEN],
}

impl Key {
    /// Wrap raw key material.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Borrow the raw key material.
    ///
    /// Use [`export_key`] when the key has to leave the process.
    pub fn expose_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}

// No early exit, so comparison time does not depend on where keys differ.
impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for Key {}

impl FromStr for Key {
    type Err = GcmboxError;

    fn from_str(s: &str) -> Result<Self> {
        import_key(s)
    }
}

/// Generate a fresh random key from the operating system's CSPRNG.
///
/// # Panics
///
/// Panics if the OS random source is unavailable. There is no sensible
/// recovery from that.
pub fn generate_key() -> Key {
    let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(&mut *bytes);
    debug!("generated new key");
    Key::from_bytes(*bytes)
}

/// Export a key as padded standard base64.
pub fn export_key(key: &Key) -> String {
    encoding::encode(key.expose_bytes())
}

/// Import a key from padded standard base64.
///
/// The decoded length must be exactly [`KEY_LEN`]; shorter or longer input
/// is rejected rather than padded or truncated.
pub fn import_key(encoded: &str) -> Result<Key> {
    let decoded = Zeroizing::new(encoding::decode(encoded, "key")?);
    let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
        GcmboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidKeyLength,
            format!(
                "key must be {} bytes, got {} bytes",
                KEY_LEN,
                decoded.len()
            ),
        )
    })?;
    Ok(Key::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_import_roundtrip() {
        let key = generate_key();
        let imported = import_key(&export_key(&key)).unwrap();
        assert_eq!(key, imported);
        assert_eq!(key.expose_bytes(), imported.expose_bytes());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = generate_key();
        let b = generate_key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_export_is_padded_base64_of_raw_bytes() {
        let key = Key::from_bytes([0u8; KEY_LEN]);
        assert_eq!(
            export_key(&key),
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
        );

        let bytes: [u8; KEY_LEN] = core::array::from_fn(|i| i as u8);
        let key = Key::from_bytes(bytes);
        assert_eq!(
            export_key(&key),
            "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8="
        );
    }

    #[test]
    fn test_import_not_base64() {
        let err = import_key("not-base64!!").expect_err("expected encoding error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEncoding));
        assert_eq!(err.category, ErrorCategory::User);
    }

    #[test]
    fn test_import_short_key() {
        let encoded = encoding::encode(&[7u8; 16]);
        let err = import_key(&encoded).expect_err("expected length error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidKeyLength));
        assert!(err.to_string().contains("got 16 bytes"));
    }

    #[test]
    fn test_import_long_key() {
        let encoded = encoding::encode(&[7u8; KEY_LEN + 1]);
        let err = import_key(&encoded).expect_err("expected length error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidKeyLength));
    }

    #[test]
    fn test_import_empty() {
        let err = import_key("").expect_err("expected length error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidKeyLength));
    }

    #[test]
    fn test_from_str() {
        let key = generate_key();
        let parsed: Key = export_key(&key).parse().unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = Key::from_bytes([0x41u8; KEY_LEN]);
        let debug = format!("{:?}", key);
        assert_eq!(debug, "Key([REDACTED])");
        assert!(!debug.contains(&export_key(&key)));
    }

    #[test]
    fn test_keys_differing_in_last_byte_are_unequal() {
        let mut bytes = [9u8; KEY_LEN];
        let a = Key::from_bytes(bytes);
        bytes[KEY_LEN - 1] ^= 1;
        let b = Key::from_bytes(bytes);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Key>();
    }
}
