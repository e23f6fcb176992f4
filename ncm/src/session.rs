//! Remote CLI sessions.
//!
//! [`SessionClient`] is the seam between the backup logic and the network:
//! production code uses [`SshSessionClient`], tests substitute an in-memory
//! implementation.

use std::future::Future;
use std::path::PathBuf;

use log::{debug, info};
use ncm_ssh::{CliSession, Dialect, HostKeyPolicy, SshWire, Target};

use crate::credentials::{Credentials, copy_secret};
use crate::error::{Error, Result};
use crate::inventory::DeviceRecord;

/// Runs one command on one device and returns its output.
///
/// Implementations open a fresh session per call and always close it,
/// whether the command succeeded or not.
pub trait SessionClient: Send + Sync {
    fn send_command(
        &self,
        device: &DeviceRecord,
        credentials: &Credentials,
        command: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// [`SessionClient`] backed by an interactive SSH shell.
#[derive(Debug, Clone, Default)]
pub struct SshSessionClient {
    host_keys: HostKeyPolicy,
    known_hosts: Option<PathBuf>,
}

impl SshSessionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host_keys(mut self, policy: HostKeyPolicy) -> Self {
        self.host_keys = policy;
        self
    }

    /// Use this known_hosts file instead of `~/.ssh/known_hosts`.
    pub fn with_known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }

    fn target(
        &self,
        device: &DeviceRecord,
        credentials: &Credentials,
        dialect: &Dialect,
    ) -> Target {
        let mut target = Target::new(
            device.host.as_str(),
            credentials.username.as_str(),
            copy_secret(&credentials.password),
        );
        target.port = device.port();
        target.timeout = device.timeout();
        target.connect_timeout = device.conn_timeout();
        target.host_keys = self.host_keys;
        target.known_hosts = self.known_hosts.clone();
        target.terminal_width = dialect.terminal_width;
        target
    }
}

async fn run(
    session: &mut CliSession<SshWire>,
    device: &DeviceRecord,
    command: &str,
) -> Result<String> {
    let output = session.run(command).await?;
    debug!(
        "{}: '{}' returned {} bytes in {:?}",
        device.name,
        command,
        output.text.len(),
        output.elapsed
    );

    match output.rejection {
        Some(message) => Err(Error::CommandFailed {
            command: command.to_string(),
            message,
        }),
        None => Ok(output.text),
    }
}

impl SessionClient for SshSessionClient {
    async fn send_command(
        &self,
        device: &DeviceRecord,
        credentials: &Credentials,
        command: &str,
    ) -> Result<String> {
        let dialect = ncm_ssh::dialect(&device.device_type)?;
        let target = self.target(device, credentials, dialect);

        info!("Connecting to {} ({})", device.name, target.addr());
        let mut session = CliSession::connect(&target, dialect, credentials.secret.as_ref()).await?;
        let outcome = run(&mut session, device, command).await;
        session.close().await;
        outcome
    }
}
