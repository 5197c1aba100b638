// ABOUTME: Library root for sshkit - exposes the client, config and logging types.
// ABOUTME: The command-line binary is in main.rs.

pub mod config;
pub mod error;
pub mod logging;
pub mod ssh;
