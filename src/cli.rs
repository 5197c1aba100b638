// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the exec, get and put subcommands and connection options.

use clap::{Args, Parser, Subcommand};
use sshkit::config::{Config, parse_connection_string};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sshkit")]
#[command(about = "Run remote commands and move files over SSH")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command on the remote host and print its output
    Exec {
        #[command(flatten)]
        conn: ConnectArgs,

        /// Print stdout only; stderr is kept for error reports
        #[arg(long)]
        stdout_only: bool,

        /// Do not log the command or its output
        #[arg(short, long)]
        quiet: bool,

        /// Command to run
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// Download a remote file to stdout or a local path
    Get {
        #[command(flatten)]
        conn: ConnectArgs,

        /// Remote file path
        remote: String,

        /// Local destination (stdout if omitted)
        local: Option<PathBuf>,
    },

    /// Upload a local file, creating or truncating the remote file
    Put {
        #[command(flatten)]
        conn: ConnectArgs,

        /// Local file path
        local: PathBuf,

        /// Remote destination path
        remote: String,
    },
}

#[derive(Args)]
pub struct ConnectArgs {
    /// Target as [user[:password]@]host[:port]
    pub target: String,

    /// Private key file (default ~/.ssh/id_rsa)
    #[arg(short = 'i', long = "identity")]
    pub key_file: Option<PathBuf>,

    /// Password; overrides any password in the target
    #[arg(long)]
    pub password: Option<String>,
}

impl ConnectArgs {
    pub fn config(&self) -> sshkit::error::Result<Config> {
        let mut config = parse_connection_string(&self.target)?;
        if let Some(key_file) = &self.key_file {
            config = config.key_file(key_file);
        }
        if let Some(password) = &self.password {
            config = config.password(password);
        }
        Ok(config)
    }
}
