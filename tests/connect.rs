// ABOUTME: Integration tests for connection failure paths.
// ABOUTME: Runs without a server: closed ports and bad key files.

use sshkit::config::Config;
use sshkit::ssh::{self, AuthContext, Error, SignerError};
use std::path::PathBuf;

/// Bind then release a local port so nothing is listening on it.
async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn fixture_key() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test_key")
}

/// Test: Password dial to a closed port fails with Dial carrying the password.
#[tokio::test]
async fn refused_password_dial_carries_password_context() {
    let config = Config::new("127.0.0.1")
        .port(closed_port().await)
        .username("tester")
        .password("pw");

    let err = ssh::connect(config).await.unwrap_err();
    match &err {
        Error::Dial { addr, auth, .. } => {
            assert!(addr.starts_with("127.0.0.1:"));
            assert_eq!(auth, &AuthContext::Password("pw".to_string()));
        }
        other => panic!("expected Dial error, got: {other:?}"),
    }
    assert!(err.to_string().contains("password=<redacted>"), "got: {err}");
}

/// Test: Key dial to a closed port fails with Dial carrying the key path.
#[tokio::test]
async fn refused_key_dial_carries_key_file_context() {
    let config = Config::new("127.0.0.1")
        .port(closed_port().await)
        .key_file(fixture_key());

    let err = ssh::connect(config).await.unwrap_err();
    assert!(
        matches!(err, Error::Dial { auth: AuthContext::KeyFile(ref path), .. } if *path == fixture_key()),
        "expected Dial error with key file, got: {err:?}"
    );
}

/// Test: A missing key file fails before any network activity.
#[tokio::test]
async fn missing_key_file_is_signer_error() {
    let config = Config::new("nonexistent.invalid.host.example").key_file("/nonexistent/key/path");

    let err = ssh::connect(config).await.unwrap_err();
    assert!(
        matches!(err, Error::SignerCreation(SignerError::Read { .. })),
        "expected signer read error, got: {err:?}"
    );
    assert!(err.to_string().contains("failed to create SSH signer"));
}

/// Test: A malformed key file is a parse failure naming the file.
#[tokio::test]
async fn malformed_key_file_is_signer_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("id_rsa");
    std::fs::write(&key, "-----BEGIN NOTHING-----\n").unwrap();

    let err = ssh::connect(Config::new("127.0.0.1").key_file(&key))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::SignerCreation(SignerError::Parse { .. })),
        "expected signer parse error, got: {err:?}"
    );
    assert!(err.to_string().contains(&key.display().to_string()));
}

/// Test: Unresolvable host fails with Dial.
#[tokio::test]
async fn invalid_host_is_dial_error() {
    let config = Config::new("nonexistent.invalid.host.example").password("pw");

    let err = ssh::connect(config).await.unwrap_err();
    assert!(
        matches!(err, Error::Dial { .. }),
        "expected Dial error, got: {err:?}"
    );
}
