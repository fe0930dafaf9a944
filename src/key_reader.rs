//! Key input for the command-line front end
//!
//! Readers obtain the base64 key text from somewhere (a terminal prompt,
//! stdin, a fixed value in tests) and import it. Surrounding whitespace is
//! trimmed first since both terminals and pipes tend to add a newline.

use crate::error::{ErrorCategory, ErrorKind, GcmboxError, Result};
use crate::key::{Key, import_key};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for obtaining a key from various sources
pub trait KeyReader {
    /// Read and import a key.
    fn read_key(&mut self) -> Result<Key>;
}

fn import_key_text(text: &str) -> Result<Key> {
    import_key(text.trim()).map_err(|e| e.with_context("failed to import key"))
}

/// Returns a fixed key (for testing)
pub struct ConstantKeyReader {
    encoded: Zeroizing<String>,
}

impl ConstantKeyReader {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self {
            encoded: Zeroizing::new(encoded.into()),
        }
    }
}

impl KeyReader for ConstantKeyReader {
    fn read_key(&mut self) -> Result<Key> {
        import_key_text(&self.encoded)
    }
}

/// Reads the encoded key from any io::Read source until EOF
pub struct ReaderKeyReader {
    reader: Box<dyn Read>,
}

impl ReaderKeyReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl KeyReader for ReaderKeyReader {
    fn read_key(&mut self) -> Result<Key> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            GcmboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::KeyUnavailable,
                format!("error reading key: {}", e),
                e,
            )
        })?;
        let text = std::str::from_utf8(&data).map_err(|e| {
            GcmboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidEncoding,
                "key input is not valid UTF-8",
                e,
            )
        })?;
        import_key_text(text)
    }
}

/// Prompts for the key on the terminal with no echo
pub struct TerminalKeyReader;

impl TerminalKeyReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalKeyReader {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyReader for TerminalKeyReader {
    fn read_key(&mut self) -> Result<Key> {
        if !io::stdin().is_terminal() {
            return Err(GcmboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::KeyUnavailable,
                "cannot read key from terminal - stdin is not a terminal (use --key-stdin)",
            ));
        }

        io::stderr().write_all(b"Key (gcmbox): ").map_err(|e| {
            GcmboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write prompt: {}", e),
                e,
            )
        })?;
        io::stderr().flush().map_err(|e| {
            GcmboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        let encoded = rpassword::read_password().map_err(|e| {
            GcmboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::KeyUnavailable,
                format!("failure reading key: {}", e),
                e,
            )
        })?;
        let encoded = Zeroizing::new(encoded);
        import_key_text(&encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{export_key, generate_key};

    #[test]
    fn test_constant_reader() {
        let key = generate_key();
        let mut reader = ConstantKeyReader::new(export_key(&key));
        assert_eq!(reader.read_key().unwrap(), key);
        assert_eq!(reader.read_key().unwrap(), key);
    }

    #[test]
    fn test_reader_key_reader_trims_newline() {
        let key = generate_key();
        let data = format!("{}\n", export_key(&key)).into_bytes();
        let mut reader = ReaderKeyReader::new(Box::new(std::io::Cursor::new(data)));
        assert_eq!(reader.read_key().unwrap(), key);
    }

    #[test]
    fn test_reader_key_reader_empty() {
        let data: &[u8] = b"";
        let mut reader = ReaderKeyReader::new(Box::new(data));
        let err = reader.read_key().expect_err("expected length error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidKeyLength));
        assert_eq!(err.message(), "failed to import key");
    }

    #[test]
    fn test_reader_key_reader_non_utf8() {
        let data: &[u8] = &[0xff, 0xfe, 0x00, 0x01];
        let mut reader = ReaderKeyReader::new(Box::new(data));
        let err = reader.read_key().expect_err("expected encoding error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEncoding));
    }

    #[test]
    fn test_reader_key_reader_garbage() {
        let data: &[u8] = b"not-base64!!";
        let mut reader = ReaderKeyReader::new(Box::new(data));
        let err = reader.read_key().expect_err("expected encoding error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEncoding));
    }

    /// Tests the terminal reader. This is ignored by default and must be run
    /// explicitly and with human input:
    ///
    /// cargo test test_terminal_reader_interactive -- --ignored --nocapture
    #[test]
    #[ignore]
    fn test_terminal_reader_interactive() {
        let mut reader = TerminalKeyReader::new();
        println!("\nPlease paste a key produced by `gcmbox keygen`:");
        let key = reader.read_key().unwrap();
        println!("Read {:?}", key);
    }
}
