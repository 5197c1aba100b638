// ABOUTME: Connection configuration for a single SSH target.
// ABOUTME: Holds host, port, credentials and renders a display label.

mod parse;

pub use parse::{ParseError, parse_connection_string};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 22;

/// Username used at connect time when none is given.
pub const DEFAULT_USERNAME: &str = "root";

/// Where to connect and how to authenticate.
///
/// A non-empty password selects password authentication. Otherwise the
/// private key at `key_file` (or `~/.ssh/id_rsa`) is used.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub key_file: Option<PathBuf>,
}

impl Config {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = non_empty(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = non_empty(password.into());
        self
    }

    pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = Some(path.into());
        self
    }

    /// Port to dial, falling back to 22.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Username to authenticate as, falling back to `root`.
    pub fn username_or_default(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_USERNAME)
    }

    /// Password if one was given and is non-empty.
    pub fn password_if_set(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// `host:port` dial address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port_or_default())
    }

    /// Human-readable `user@host[:port]` label for logs.
    ///
    /// The port is omitted when it is the default and the user segment is
    /// omitted when no username is set. Not meant to be parsed back.
    pub fn what(&self) -> String {
        let mut label = self.host.clone();
        if let Some(port) = self.port.filter(|p| *p != DEFAULT_PORT) {
            label = format!("{label}:{port}");
        }
        match self.username.as_deref() {
            Some(user) if !user.is_empty() => format!("{user}@{label}"),
            _ => label,
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.what())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .finish()
    }
}

impl FromStr for Config {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_connection_string(s)
    }
}
