//! SSH connection setup: TCP connect, host key check, password login and
//! an interactive PTY shell.

mod host_keys;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use secrecy::{ExposeSecret, SecretString};

use crate::channel::Wire;
use crate::error::{Error, Result, Stage};
use host_keys::HostKeyCheck;

/// How server host keys are checked against known_hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Only hosts already listed are accepted.
    Strict,
    /// Unlisted hosts are recorded on first contact; changed keys fail.
    #[default]
    AcceptNew,
    /// No verification.
    Off,
}

/// Where to connect and how to log in.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Bounds TCP connect, key exchange and login together.
    pub connect_timeout: Duration,
    /// SSH inactivity limit, and the prompt wait of sessions built on
    /// this target.
    pub timeout: Duration,
    pub host_keys: HostKeyPolicy,
    /// known_hosts file; `~/.ssh/known_hosts` when unset.
    pub known_hosts: Option<PathBuf>,
    pub terminal_width: u32,
    pub terminal_height: u32,
}

impl Target {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password,
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
            host_keys: HostKeyPolicy::default(),
            known_hosts: None,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A logged-in SSH connection and its shell channel.
pub struct SshWire {
    handle: Handle<HostKeyCheck>,
    channel: Channel<Msg>,
}

impl SshWire {
    /// Connect, verify the host key, log in with the password and start a
    /// shell on a PTY.
    pub async fn open(target: &Target) -> Result<Self> {
        let handle = tokio::time::timeout(target.connect_timeout, login(target))
            .await
            .map_err(|_| Error::Timeout {
                stage: Stage::Connect,
                after: target.connect_timeout,
            })??;

        let channel = handle.channel_open_session().await?;
        channel
            .request_pty(
                true,
                "xterm",
                target.terminal_width,
                target.terminal_height,
                0,
                0,
                &[],
            )
            .await?;
        channel.request_shell(true).await?;

        Ok(Self { handle, channel })
    }
}

async fn login(target: &Target) -> Result<Handle<HostKeyCheck>> {
    let config = Arc::new(client::Config {
        inactivity_timeout: Some(target.timeout),
        ..Default::default()
    });
    let (check, rejection) = HostKeyCheck::new(
        &target.host,
        target.port,
        target.host_keys,
        target.known_hosts.clone(),
    );

    debug!("Connecting to {}", target.addr());
    let connected = client::connect(config, (target.host.as_str(), target.port), check).await;
    let mut handle = match connected {
        Ok(handle) => handle,
        Err(e) => {
            let rejected = rejection.lock().ok().and_then(|mut slot| slot.take());
            if let Some(reason) = rejected {
                return Err(reason.into());
            }
            return Err(match e {
                russh::Error::IO(source) => Error::Unreachable {
                    addr: target.addr(),
                    source,
                },
                other => Error::Ssh(other),
            });
        }
    };

    let auth = handle
        .authenticate_password(&target.username, target.password.expose_secret())
        .await?;
    if !auth.success() {
        return Err(Error::LoginRejected {
            user: target.username.clone(),
        });
    }

    debug!("Logged in to {} as {}", target.addr(), target.username);
    Ok(handle)
}

impl Wire for SshWire {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.channel.data(bytes).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.channel.wait().await? {
                ChannelMsg::Data { data } | ChannelMsg::ExtendedData { data, .. } => {
                    return Some(data.to_vec());
                }
                ChannelMsg::Eof | ChannelMsg::Close => return None,
                _ => {}
            }
        }
    }

    async fn finish(&mut self) {
        if let Err(e) = self.channel.eof().await {
            debug!("Channel EOF failed: {}", e);
        }
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            debug!("Disconnect failed: {}", e);
        }
    }
}
