//! File-level helpers for the command-line front end
//!
//! Encryption results are stored as a small text envelope:
//!
//! ```text
//! ciphertext: <base64>
//! nonce: <base64>
//! ```
//!
//! The envelope only exists so that the CLI can hand a (ciphertext, nonce)
//! pair around as one file; the library API itself deals in the two
//! strings directly.

use crate::cipher::{self, EncryptionResult};
use crate::error::{ErrorCategory, ErrorKind, GcmboxError, Result};
use crate::key_reader::KeyReader;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

const CIPHERTEXT_FIELD: &str = "ciphertext";
const NONCE_FIELD: &str = "nonce";

/// Render an encryption result as an envelope.
pub fn render_envelope(result: &EncryptionResult) -> String {
    format!(
        "{}: {}\n{}: {}\n",
        CIPHERTEXT_FIELD, result.ciphertext, NONCE_FIELD, result.nonce
    )
}

/// Parse an envelope produced by [`render_envelope`].
///
/// Blank lines are skipped and whitespace around names and values is
/// ignored. Unknown, repeated and missing fields are errors.
pub fn parse_envelope(text: &str) -> Result<EncryptionResult> {
    let mut ciphertext = None;
    let mut nonce = None;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| envelope_error(format!("line {}: expected `name: value`", lineno + 1)))?;
        let slot = match name.trim() {
            CIPHERTEXT_FIELD => &mut ciphertext,
            NONCE_FIELD => &mut nonce,
            other => {
                return Err(envelope_error(format!(
                    "line {}: unknown field `{}`",
                    lineno + 1,
                    other
                )));
            }
        };
        if slot.is_some() {
            return Err(envelope_error(format!(
                "line {}: duplicate field `{}`",
                lineno + 1,
                name.trim()
            )));
        }
        *slot = Some(value.trim().to_string());
    }

    match (ciphertext, nonce) {
        (Some(ciphertext), Some(nonce)) => Ok(EncryptionResult { ciphertext, nonce }),
        (None, _) => Err(envelope_error(format!("missing `{}` field", CIPHERTEXT_FIELD))),
        (_, None) => Err(envelope_error(format!("missing `{}` field", NONCE_FIELD))),
    }
}

fn envelope_error(msg: String) -> GcmboxError {
    GcmboxError::with_kind(ErrorCategory::User, ErrorKind::EnvelopeInvalid, msg)
}

/// Encrypt the UTF-8 text in `input_path` with a key from `key_reader`.
///
/// The input is read before the key is requested, so a missing file fails
/// without prompting.
pub fn encrypt_file(input_path: &Path, key_reader: &mut dyn KeyReader) -> Result<EncryptionResult> {
    let plaintext = read_utf8_file(input_path, "input file")?;
    let key = key_reader.read_key()?;
    let result =
        cipher::encrypt(&plaintext, &key).map_err(|e| e.with_context("encryption failed"))?;
    debug!(path = %input_path.display(), "encrypted file");
    Ok(result)
}

/// Decrypt the envelope in `input_path` with a key from `key_reader`.
///
/// `nonce_override` replaces the nonce stored in the envelope.
pub fn decrypt_file(
    input_path: &Path,
    nonce_override: Option<&str>,
    key_reader: &mut dyn KeyReader,
) -> Result<Zeroizing<String>> {
    let text = read_utf8_file(input_path, "envelope file")?;
    let mut envelope = parse_envelope(&text)
        .map_err(|e| e.with_context(format!("failed to parse {}", input_path.display())))?;
    if let Some(nonce) = nonce_override {
        debug!("using nonce supplied on the command line");
        envelope.nonce = nonce.to_string();
    }
    let key = key_reader.read_key()?;
    cipher::decrypt_zeroizing(&envelope.ciphertext, &envelope.nonce, &key)
        .map_err(|e| e.with_context("failed to decrypt"))
}

/// Write `contents` to `path` (mode 0o600 on Unix), or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, contents: &[u8]) -> Result<()> {
    match path {
        Some(path) => write_file_secure(path, contents)
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display()))),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents)
                .and_then(|_| stdout.flush())
                .map_err(|e| {
                    GcmboxError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write to stdout",
                        e,
                    )
                })
        }
    }
}

fn read_utf8_file(path: &Path, what: &str) -> Result<Zeroizing<String>> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        GcmboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} is not valid UTF-8", what),
            e.utf8_error(),
        )
    })?;
    Ok(Zeroizing::new(text))
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                GcmboxError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents).map_err(|e| {
            GcmboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            GcmboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> GcmboxError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    GcmboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
