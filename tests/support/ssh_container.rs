// ABOUTME: Disposable openssh-server container shared by the live SSH tests.
// ABOUTME: Accepts the fixture key and a fixed password for one test user.

use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, RemoveContainerOptions, StartContainerOptions,
};
use futures::TryStreamExt;
use sshkit::config::Config;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::OnceCell;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const IMAGE: &str = "lscr.io/linuxserver/openssh-server:latest";
const HOST: &str = "127.0.0.1";
const USER: &str = "testuser";
const PASSWORD: &str = "sshkit-test-password";

static CONTAINER_ID: OnceLock<String> = OnceLock::new();
static SHARED: OnceCell<SshContainer> = OnceCell::const_new();

#[ctor::dtor]
fn remove_container() {
    let Some(id) = CONTAINER_ID.get() else {
        return;
    };
    let Ok(rt) = tokio::runtime::Builder::new_current_thread().enable_all().build() else {
        return;
    };
    rt.block_on(async {
        let Ok(docker) = Docker::connect_with_local_defaults() else {
            return;
        };
        let force = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        let _ = docker.remove_container(id, Some(force)).await;
    });
}

/// The server every test in the binary talks to. Started on first use.
pub async fn shared_container() -> &'static SshContainer {
    SHARED
        .get_or_init(|| async { SshContainer::start().await.expect("start ssh container") })
        .await
}

pub struct SshContainer {
    port: u16,
}

impl SshContainer {
    async fn start() -> Result<Self, BoxError> {
        let docker = Docker::connect_with_local_defaults()?;
        let public_key = std::fs::read_to_string(format!("{}.pub", key_path()))?;

        let pull = CreateImageOptions {
            from_image: Some(IMAGE.to_string()),
            ..Default::default()
        };
        docker.create_image(Some(pull), None, None).try_collect::<Vec<_>>().await?;

        // Bind to port 0 and release it so docker can take the free port.
        let port = TcpListener::bind((HOST, 0)).await?.local_addr()?.port();

        let binding = PortBinding {
            host_ip: Some(HOST.to_string()),
            host_port: Some(port.to_string()),
        };
        let body = ContainerCreateBody {
            image: Some(IMAGE.to_string()),
            env: Some(vec![
                "PUID=1000".to_string(),
                "PGID=1000".to_string(),
                format!("USER_NAME={USER}"),
                format!("PUBLIC_KEY={}", public_key.trim()),
                "PASSWORD_ACCESS=true".to_string(),
                format!("USER_PASSWORD={PASSWORD}"),
            ]),
            host_config: Some(HostConfig {
                port_bindings: Some([("2222/tcp".to_string(), Some(vec![binding]))].into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let name = CreateContainerOptions {
            name: Some(format!("sshkit-test-{}", std::process::id())),
            ..Default::default()
        };

        let id = docker.create_container(Some(name), body).await?.id;
        let _ = CONTAINER_ID.set(id.clone());
        docker.start_container(&id, None::<StartContainerOptions>).await?;

        let container = Self { port };
        container.await_banner().await?;
        Ok(container)
    }

    /// Poll until sshd answers with its version banner.
    async fn await_banner(&self) -> Result<(), BoxError> {
        for _ in 0..60 {
            let mut banner = [0u8; 4];
            if let Ok(mut stream) = TcpStream::connect((HOST, self.port)).await {
                let read = tokio::time::timeout(Duration::from_secs(2), stream.read_exact(&mut banner));
                if matches!(read.await, Ok(Ok(_))) && &banner == b"SSH-" {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        Err(format!("no ssh banner on port {} after 30s", self.port).into())
    }

    fn base(&self) -> Config {
        Config::new(HOST).port(self.port).username(USER)
    }

    /// Key login with `tests/fixtures/test_key`.
    pub fn config(&self) -> Config {
        self.base().key_file(key_path())
    }

    pub fn password_config(&self) -> Config {
        self.base().password(PASSWORD)
    }

    /// `user:password@host:port`, the same login as [`Self::password_config`].
    pub fn connection_string(&self) -> String {
        format!("{USER}:{PASSWORD}@{HOST}:{}", self.port)
    }
}

fn key_path() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/test_key").to_string()
}
