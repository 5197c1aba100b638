// ABOUTME: Connection string parsing for `[user[:password]@]host[:port]`.
// ABOUTME: Delegates to a URL parser after synthesizing an ssh:// scheme.

use super::{Config, DEFAULT_PORT};
use thiserror::Error;
use url::{Host, Url};

const SCHEME_PREFIX: &str = "ssh://";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed connection string {input:?}: {reason}")]
    Malformed { input: String, reason: String },

    #[error("missing username in connection string {0:?}")]
    MissingUsername(String),

    #[error("missing host in connection string {0:?}")]
    MissingHost(String),
}

/// Parse `[user[:password]@]host[:port]` into a [`Config`].
///
/// A username is required. The port defaults to 22 when absent.
/// User-info is percent-decoded the way URL user-info is.
pub fn parse_connection_string(input: &str) -> Result<Config, ParseError> {
    let with_scheme = if input.starts_with(SCHEME_PREFIX) {
        input.to_string()
    } else {
        format!("{SCHEME_PREFIX}{input}")
    };

    let url = Url::parse(&with_scheme).map_err(|e| match e {
        url::ParseError::EmptyHost => ParseError::MissingHost(input.to_string()),
        other => ParseError::Malformed {
            input: input.to_string(),
            reason: other.to_string(),
        },
    })?;

    let username = decode(url.username(), input)?;
    if username.is_empty() {
        return Err(ParseError::MissingUsername(input.to_string()));
    }
    let password = url.password().map(|p| decode(p, input)).transpose()?;

    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    };
    if host.is_empty() {
        return Err(ParseError::MissingHost(input.to_string()));
    }

    let mut config = Config::new(host)
        .port(url.port().unwrap_or(DEFAULT_PORT))
        .username(username);
    if let Some(password) = password {
        config = config.password(password);
    }
    Ok(config)
}

fn decode(raw: &str, input: &str) -> Result<String, ParseError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|e| ParseError::Malformed {
            input: input.to_string(),
            reason: format!("invalid percent-encoding: {e}"),
        })
}
