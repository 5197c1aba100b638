// ABOUTME: Entry point for the sshkit CLI application.
// ABOUTME: Parses arguments and dispatches to the SSH client operations.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, ConnectArgs};
use sshkit::error::Result;
use sshkit::ssh::{self, Client};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Exec {
            conn,
            stdout_only,
            quiet,
            command,
        } => {
            let mut client = connect(&conn).await?;
            if stdout_only {
                client = client.with_stdout_only();
            }
            if quiet {
                client = client.with_no_log();
            }
            let output = client.execute(&command.join(" ")).await.map_err(Into::into);
            finish(&client, output).await.map(|out| print!("{out}"))
        }
        Commands::Get {
            conn,
            remote,
            local,
        } => {
            let client = connect(&conn).await?;
            let copied = download(&client, &remote, local.as_deref()).await;
            finish(&client, copied).await
        }
        Commands::Put {
            conn,
            local,
            remote,
        } => {
            let data = tokio::fs::read(&local).await?;
            let client = connect(&conn).await?;
            let created = client.create_file(&remote, &data).await.map_err(Into::into);
            finish(&client, created).await
        }
    }
}

async fn connect(conn: &ConnectArgs) -> Result<Client> {
    Ok(ssh::connect(conn.config()?).await?)
}

/// Copy a remote file to `local`, or to stdout when no path is given.
async fn download(client: &Client, remote: &str, local: Option<&Path>) -> Result<()> {
    let mut file = client.open_file(remote).await?;
    let copied = match local {
        Some(path) => {
            let mut out = tokio::fs::File::create(path).await?;
            tokio::io::copy(&mut file, &mut out).await
        }
        None => {
            let mut out = tokio::io::stdout();
            let copied = tokio::io::copy(&mut file, &mut out).await;
            out.flush().await?;
            copied
        }
    };
    let closed = file.close().await;
    copied?;
    closed.map_err(ssh::Error::from)?;
    Ok(())
}

/// Disconnect, keeping the operation's own error if it failed.
async fn finish<T>(client: &Client, result: Result<T>) -> Result<T> {
    let disconnected = client.disconnect().await;
    let value = result?;
    disconnected?;
    Ok(value)
}
