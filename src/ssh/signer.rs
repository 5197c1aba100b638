// ABOUTME: Private-key signer loading for public-key authentication.
// ABOUTME: Resolves the default ~/.ssh/id_rsa path when no key file is configured.

use super::error::SignerError;
use russh::keys::{PrivateKey, decode_secret_key};
use std::path::{Path, PathBuf};

/// Key file used when none is configured, relative to the home directory.
const DEFAULT_KEY_FILE: [&str; 2] = [".ssh", "id_rsa"];

/// A parsed private key together with the file it came from.
pub(crate) struct Signer {
    pub key: PrivateKey,
    pub path: PathBuf,
}

/// Load the signer from `key_file`, or from `~/.ssh/id_rsa` when unset.
pub(crate) fn load_signer(key_file: Option<&Path>) -> Result<Signer, SignerError> {
    let path = match key_file {
        Some(path) => path.to_path_buf(),
        None => default_key_path()?,
    };

    let pem = std::fs::read_to_string(&path).map_err(|source| SignerError::Read {
        path: path.clone(),
        source,
    })?;

    let key = decode_secret_key(&pem, None).map_err(|source| SignerError::Parse {
        path: path.clone(),
        source,
    })?;

    Ok(Signer { key, path })
}

fn default_key_path() -> Result<PathBuf, SignerError> {
    let home = dirs::home_dir().ok_or(SignerError::HomeDir)?;
    Ok(DEFAULT_KEY_FILE.iter().fold(home, |path, part| path.join(part)))
}
