// ABOUTME: SFTP file access over a dedicated sub-connection per operation.
// ABOUTME: Opens remote files for streaming reads and writes whole buffers.

use super::client::Client;
use super::error::{Error, Result};
use super::release::{CloseError, Releases};
use russh_sftp::client::SftpSession;
use russh_sftp::client::fs::File;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

/// A remote file open for reading, paired with the SFTP session that owns it.
///
/// [`RemoteFile::close`] closes both. Reading after close fails with
/// [`io::ErrorKind::NotConnected`].
pub struct RemoteFile {
    path: String,
    file: Option<File>,
    sftp: Option<SftpSession>,
}

impl std::fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFile")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .finish()
    }
}

impl RemoteFile {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Close the file and its SFTP session.
    ///
    /// Both are always attempted; every failure is reported in the returned
    /// [`CloseError`]. Closing twice reports both resources as already closed.
    pub async fn close(&mut self) -> std::result::Result<(), CloseError> {
        let mut releases = Releases::new();
        match self.file.take() {
            Some(mut file) => releases.record("file", file.shutdown().await),
            None => releases.already_released("file"),
        }
        match self.sftp.take() {
            Some(sftp) => releases.record("sftp session", sftp.close().await),
            None => releases.already_released("sftp session"),
        }
        releases.finish(format!("remote file {}", self.path))
    }
}

impl AsyncRead for RemoteFile {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut().file.as_mut() {
            Some(file) => Pin::new(file).poll_read(cx, buf),
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "remote file is closed",
            ))),
        }
    }
}

impl Client {
    /// Open a new SFTP sub-connection on this transport.
    async fn open_sftp(&self) -> Result<SftpSession> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::Subconnection(format!("failed to open channel: {e}")))?;

        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| Error::Subconnection(format!("failed to request subsystem: {e}")))?;

        SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| Error::Subconnection(format!("failed to initialize session: {e}")))
    }

    /// Open `path` for reading over a fresh SFTP sub-connection.
    ///
    /// If the open fails the sub-connection is closed before returning and
    /// any close failure is included in the error.
    pub async fn open_file(&self, path: &str) -> Result<RemoteFile> {
        let sftp = self.open_sftp().await?;
        match sftp.open(path).await {
            Ok(file) => Ok(RemoteFile {
                path: path.to_string(),
                file: Some(file),
                sftp: Some(sftp),
            }),
            Err(e) => {
                let mut reason = e.to_string();
                let mut releases = Releases::new();
                releases.record("sftp session", sftp.close().await);
                if let Err(close) = releases.finish("sftp session") {
                    reason = format!("{reason}; {close}");
                }
                Err(Error::RemoteOpen {
                    path: path.to_string(),
                    reason,
                })
            }
        }
    }

    /// Create or truncate `path` and write `data` to it.
    ///
    /// The file and sub-connection are closed on every path. Close failures
    /// are logged, not returned.
    pub async fn create_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let sftp = self.open_sftp().await?;
        let mut releases = Releases::new();

        let result = match sftp.create(path).await {
            Ok(mut file) => {
                let written = file.write_all(data).await.map_err(|source| Error::RemoteWrite {
                    path: path.to_string(),
                    source,
                });
                releases.record("file", file.shutdown().await);
                written
            }
            Err(source) => Err(Error::RemoteCreate {
                path: path.to_string(),
                source,
            }),
        };
        releases.record("sftp session", sftp.close().await);

        if self.options.logs_anything() {
            let bytes = data.len();
            self.logger.in_scope(|| match releases.finish(format!("remote file {path}")) {
                Ok(()) => tracing::debug!(path, bytes, "sftp: closed file and connection"),
                Err(e) => tracing::error!(path, error = %e, "sftp: cleanup failed"),
            });
        }

        result
    }
}
