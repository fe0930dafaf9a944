//! Authenticated encryption of text using AES-256-GCM
//!
//! Each call to [`encrypt`] draws a fresh 96-bit nonce from the OS CSPRNG
//! and returns it next to the ciphertext. The ciphertext is the GCM output
//! as-is: encrypted payload followed by the 16-byte tag. No associated
//! data is used.
//!
//! [`decrypt`] only ever interprets bytes as UTF-8 after the tag has
//! verified; a bad tag is reported as an authentication failure and no
//! plaintext is released.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key as GcmKey, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::encoding;
use crate::error::{ErrorCategory, ErrorKind, GcmboxError, Result};
use crate::key::Key;

/// Length of nonce in bytes (96 bits)
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes (128 bits)
pub const TAG_LEN: usize = 16;

/// Output of a single [`encrypt`] call, both fields padded standard base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResult {
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: String,
    /// The nonce the ciphertext was sealed under.
    pub nonce: String,
}

fn new_cipher(key: &Key) -> Aes256Gcm {
    Aes256Gcm::new(GcmKey::<Aes256Gcm>::from_slice(key.expose_bytes()))
}

/// Seal `plaintext` under an explicit nonce.
///
/// Kept private: nonces for encryption always come from [`encrypt`].
fn seal_with_nonce(key: &Key, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    new_cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| {
            GcmboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::EncryptionFailure,
                "AES-GCM encryption failed",
            )
        })
}

fn open(key: &Key, nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    new_cipher(key)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| {
            GcmboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailure,
                "authentication failed: wrong key, wrong nonce, or tampered-with ciphertext",
            )
        })
}

/// Encrypt UTF-8 text under `key` with a freshly generated nonce.
pub fn encrypt(plaintext: &str, key: &Key) -> Result<EncryptionResult> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let sealed = seal_with_nonce(key, &nonce, plaintext.as_bytes())?;
    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = sealed.len(),
        "encrypted payload"
    );

    Ok(EncryptionResult {
        ciphertext: encoding::encode(&sealed),
        nonce: encoding::encode(&nonce),
    })
}

/// Decrypt a base64 ciphertext produced by [`encrypt`].
///
/// The nonce is accepted from the caller, so a hand-edited or externally
/// supplied nonce works here. This crate never encrypts under a nonce it
/// did not just generate; a caller that captures a nonce and reuses it to
/// encrypt other plaintexts elsewhere breaks GCM, and nothing here can
/// detect that.
pub fn decrypt(ciphertext: &str, nonce: &str, key: &Key) -> Result<String> {
    let sealed = encoding::decode(ciphertext, "ciphertext")?;
    let nonce_bytes = encoding::decode(nonce, "nonce")?;
    let nonce: [u8; NONCE_LEN] = nonce_bytes.as_slice().try_into().map_err(|_| {
        GcmboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidNonceLength,
            format!(
                "nonce must be {} bytes, got {} bytes",
                NONCE_LEN,
                nonce_bytes.len()
            ),
        )
    })?;

    let plaintext = match open(key, &nonce, &sealed) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            debug!(ciphertext_len = sealed.len(), "authentication failed");
            return Err(e);
        }
    };

    String::from_utf8(plaintext).map_err(|e| {
        let utf8_error = e.utf8_error();
        let mut rejected = e.into_bytes();
        rejected.zeroize();
        GcmboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidUtf8,
            "decrypted data is not valid UTF-8",
            utf8_error,
        )
    })
}

/// Decrypt the pair returned by [`encrypt`].
pub fn decrypt_result(result: &EncryptionResult, key: &Key) -> Result<String> {
    decrypt(&result.ciphertext, &result.nonce, key)
}

/// Same as [`decrypt`], but the plaintext is wiped when dropped.
pub fn decrypt_zeroizing(ciphertext: &str, nonce: &str, key: &Key) -> Result<Zeroizing<String>> {
    decrypt(ciphertext, nonce, key).map(Zeroizing::new)
}
