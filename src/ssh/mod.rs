// ABOUTME: SSH client module for remote command execution and file transfer.
// ABOUTME: Supports password and key-based authentication over russh.

mod client;
mod error;
mod exec;
mod release;
mod sftp;
mod signer;

pub use client::{Client, ExecOptions, connect, connect_with_logger};
pub use error::{AuthContext, Error, Result, SignerError};
pub use exec::{CommandOutput, ExitStatus};
pub use release::{CloseError, ReleaseFailure, Releases};
pub use sftp::RemoteFile;
