//! gcmbox CLI - AES-256-GCM text encryption
//!
//! Command-line front end for generating keys and encrypting/decrypting
//! UTF-8 text with AES-256-GCM.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gcmbox::error::{ErrorCategory, GcmboxError, Result};
use gcmbox::file_ops;
use gcmbox::key_reader::{KeyReader, ReaderKeyReader, TerminalKeyReader};

#[derive(Parser)]
#[command(name = "gcmbox")]
#[command(version)]
#[command(about = "AES-256-GCM text encryption.", long_about = None)]
struct Cli {
    /// Read the base64 key from stdin instead of from terminal
    #[arg(long, global = true)]
    key_stdin: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key and print it as base64
    #[command(alias = "k")]
    Keygen,

    /// Encrypt a UTF-8 text file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the ciphertext/nonce envelope to (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decrypt an envelope file, or a ciphertext and nonce given directly
    #[command(alias = "d")]
    Decrypt {
        /// Path to the envelope file written by `encrypt`
        #[arg(
            short,
            long,
            value_name = "FILE",
            required_unless_present = "ciphertext",
            conflicts_with = "ciphertext"
        )]
        input: Option<PathBuf>,

        /// Base64 ciphertext (with tag) to decrypt
        #[arg(long, value_name = "BASE64", requires = "nonce")]
        ciphertext: Option<String>,

        /// Base64 nonce; overrides the one in the envelope file if both are given
        #[arg(long, value_name = "BASE64")]
        nonce: Option<String>,

        /// Path to the file to write the plaintext to (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        debug!(kind = ?e.kind, category = ?e.category, "command failed");
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Keygen => {
            let key = gcmbox::generate_key();
            let encoded = zeroize::Zeroizing::new(format!("{}\n", gcmbox::export_key(&key)));
            file_ops::write_output(None, encoded.as_bytes())
        }
        Commands::Encrypt { input, output } => {
            let mut reader = get_key_reader(cli.key_stdin);
            let result = file_ops::encrypt_file(&input, &mut *reader)?;
            let envelope = file_ops::render_envelope(&result);
            file_ops::write_output(output.as_deref(), envelope.as_bytes())
        }
        Commands::Decrypt {
            input,
            ciphertext,
            nonce,
            output,
        } => {
            let mut reader = get_key_reader(cli.key_stdin);
            let plaintext = match (input, ciphertext, nonce) {
                (Some(input), _, nonce) => {
                    file_ops::decrypt_file(&input, nonce.as_deref(), &mut *reader)?
                }
                (None, Some(ciphertext), Some(nonce)) => {
                    let key = reader.read_key()?;
                    gcmbox::cipher::decrypt_zeroizing(&ciphertext, &nonce, &key)
                        .map_err(|e| e.with_context("failed to decrypt"))?
                }
                _ => {
                    return Err(GcmboxError::new(
                        ErrorCategory::User,
                        "decrypt requires --input, or --ciphertext together with --nonce",
                    ));
                }
            };
            debug!(plaintext_len = plaintext.len(), "decrypted");
            file_ops::write_output(output.as_deref(), plaintext.as_bytes())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Render an error and every source beneath it, outermost first.
fn error_chain(err: &GcmboxError) -> String {
    let mut rendered = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn get_key_reader(use_stdin: bool) -> Box<dyn KeyReader> {
    if use_stdin {
        Box::new(ReaderKeyReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalKeyReader)
    }
}
