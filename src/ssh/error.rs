// ABOUTME: SSH-specific error types.
// ABOUTME: Covers signer loading, dialing, command execution and SFTP failures.

use super::release::CloseError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning a private-key file into a signer.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("get home dir path: home directory could not be determined")]
    HomeDir,

    #[error("read private key {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse private key {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: russh::keys::Error,
    },
}

/// The credential that was offered when a dial failed.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthContext {
    Password(String),
    KeyFile(PathBuf),
}

impl fmt::Display for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthContext::Password(_) => f.write_str("password=<redacted>"),
            AuthContext::KeyFile(path) => write!(f, "keyFile={}", path.display()),
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create SSH signer: {0}")]
    SignerCreation(#[from] SignerError),

    #[error("dial {addr} ({auth}): {reason}")]
    Dial {
        addr: String,
        auth: AuthContext,
        reason: String,
    },

    #[error("open session: {0}")]
    SessionOpen(#[source] russh::Error),

    #[error("execute remotely and get output: {}", render_execution(.reason, .stderr))]
    CommandExecution {
        reason: String,
        /// Captured stderr, present in stdout-only mode.
        stderr: Option<String>,
    },

    #[error("create SFTP client on connection: {0}")]
    Subconnection(String),

    #[error("open SFTP file {path}: {reason}")]
    RemoteOpen { path: String, reason: String },

    #[error("create SFTP file {path}: {source}")]
    RemoteCreate {
        path: String,
        #[source]
        source: russh_sftp::client::error::Error,
    },

    #[error("write SFTP file {path}: {source}")]
    RemoteWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Close(#[from] CloseError),

    #[error("disconnect: {0}")]
    Disconnect(#[source] russh::Error),
}

fn render_execution(reason: &str, stderr: &Option<String>) -> String {
    match stderr.as_deref().map(str::trim) {
        Some(stderr) if !stderr.is_empty() => format!("{reason}: stderr: {stderr}"),
        _ => reason.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
