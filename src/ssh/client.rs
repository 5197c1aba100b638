// ABOUTME: SSH client connection using russh.
// ABOUTME: Handles password or key authentication and per-client log options.

use super::error::{AuthContext, Error, Result};
use super::signer::load_signer;
use crate::config::Config;
use crate::logging::Logger;
use russh::Disconnect;
use russh::client::{self, Handle};
use russh::keys::{PrivateKeyWithHashAlg, ssh_key};
use std::sync::Arc;

/// Per-client switches for command logging and output capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    /// Log each outbound command before it runs.
    pub log_input: bool,
    /// Log output, elapsed time and non-zero exits.
    pub log_output: bool,
    /// Return stdout only; stderr is captured separately for diagnostics.
    pub stdout_only: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            log_input: true,
            log_output: true,
            stdout_only: false,
        }
    }
}

impl ExecOptions {
    /// Whether any record may be emitted for a command.
    pub fn logs_anything(&self) -> bool {
        self.log_input || self.log_output
    }
}

/// russh handler. Host keys are not verified.
pub(crate) struct SshHandler {
    target: String,
    logger: Logger,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(ssh_key::HashAlg::Sha256);
        self.logger.in_scope(|| {
            tracing::debug!(
                target_host = %self.target,
                %fingerprint,
                "accepting host key without verification"
            )
        });
        Ok(true)
    }
}

/// Credential selected from the config. Only one is ever attempted.
enum Auth {
    Password(String),
    Key {
        key: Arc<ssh_key::PrivateKey>,
        path: std::path::PathBuf,
    },
}

impl Auth {
    fn resolve(config: &Config) -> Result<Self> {
        if let Some(password) = config.password_if_set() {
            return Ok(Auth::Password(password.to_string()));
        }
        let signer = load_signer(config.key_file.as_deref())?;
        Ok(Auth::Key {
            key: Arc::new(signer.key),
            path: signer.path,
        })
    }

    fn context(&self) -> AuthContext {
        match self {
            Auth::Password(password) => AuthContext::Password(password.clone()),
            Auth::Key { path, .. } => AuthContext::KeyFile(path.clone()),
        }
    }
}

/// An authenticated SSH connection.
///
/// Cloning is cheap and clones share the transport. The `with_*` methods
/// return a modified copy and leave the original untouched.
#[derive(Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle<SshHandler>>,
    target: String,
    pub(crate) options: ExecOptions,
    pub(crate) logger: Logger,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

/// Connect using the caller's current tracing subscriber for logs.
pub async fn connect(config: Config) -> Result<Client> {
    connect_with_logger(config, Logger::current()).await
}

/// Connect and authenticate, logging through `logger`.
///
/// A non-empty password selects password authentication; otherwise the
/// key file (default `~/.ssh/id_rsa`) is used. Username defaults to `root`
/// and port to 22.
pub async fn connect_with_logger(config: Config, logger: Logger) -> Result<Client> {
    let auth = Auth::resolve(&config)?;
    let user = config.username_or_default().to_string();
    let addr = config.address();
    let target = Config {
        username: Some(user.clone()),
        ..config.clone()
    }
    .what();

    let dial_error = |reason: String| Error::Dial {
        addr: addr.clone(),
        auth: auth.context(),
        reason,
    };

    let handler = SshHandler {
        target: target.clone(),
        logger: logger.clone(),
    };

    let mut handle = client::connect(
        Arc::new(client::Config::default()),
        (config.host.as_str(), config.port_or_default()),
        handler,
    )
    .await
    .map_err(|e| dial_error(e.to_string()))?;

    let authenticated = match &auth {
        Auth::Password(password) => handle
            .authenticate_password(&user, password)
            .await
            .map_err(|e| dial_error(e.to_string()))?
            .success(),
        Auth::Key { key, .. } => {
            let hash_alg = handle
                .best_supported_rsa_hash()
                .await
                .map_err(|e| dial_error(e.to_string()))?
                .flatten();
            handle
                .authenticate_publickey(&user, PrivateKeyWithHashAlg::new(key.clone(), hash_alg))
                .await
                .map_err(|e| dial_error(e.to_string()))?
                .success()
        }
    };
    if !authenticated {
        return Err(dial_error("authentication rejected".to_string()));
    }

    logger.in_scope(|| tracing::debug!(host = %addr, user = %user, "connected to ssh host"));

    Ok(Client {
        handle: Arc::new(handle),
        target,
        options: ExecOptions::default(),
        logger,
    })
}

impl Client {
    /// `user@host[:port]` label of the connected target.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn options(&self) -> ExecOptions {
        self.options
    }

    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_no_log_output(mut self) -> Self {
        self.options.log_output = false;
        self
    }

    pub fn with_no_log_input(mut self) -> Self {
        self.options.log_input = false;
        self
    }

    pub fn with_no_log(mut self) -> Self {
        self.options.log_input = false;
        self.options.log_output = false;
        self
    }

    pub fn with_stdout_only(mut self) -> Self {
        self.options.stdout_only = true;
        self
    }

    /// Replace where this client's log records go.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Whether the transport has shut down.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Send an SSH disconnect. Clones sharing the transport stop working.
    pub async fn disconnect(&self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Disconnect)?;
        if self.options.logs_anything() {
            self.logger
                .in_scope(|| tracing::debug!(target_host = %self.target, "disconnected"));
        }
        Ok(())
    }
}
