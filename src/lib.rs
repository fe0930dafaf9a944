//! gcmbox - AES-256-GCM key generation and text encryption
//!
//! The library surface is five functions: [`generate_key`], [`export_key`],
//! [`import_key`], [`encrypt`] and [`decrypt`]. Every textual value they
//! accept or return is padded standard base64.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod encoding;
pub mod error;
pub mod file_ops;
pub mod key;
pub mod key_reader;

pub use cipher::{EncryptionResult, NONCE_LEN, TAG_LEN, decrypt, encrypt};
pub use error::{ErrorCategory, ErrorKind, GcmboxError, Result};
pub use key::{KEY_LEN, Key, export_key, generate_key, import_key};
