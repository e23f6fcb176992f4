//! Server key verification against an OpenSSH known_hosts file.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{info, warn};
use russh::client;
use russh::keys::PublicKey;

use super::HostKeyPolicy;
use crate::error::HostKeyError;

/// What to do with a server key once known_hosts has been consulted.
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Accept,
    Learn,
    Reject,
}

/// `known` is `Ok(true)` for a listed, matching key and `Ok(false)` for a
/// host with no entry.
fn verdict(policy: HostKeyPolicy, known: &Result<bool, HostKeyError>) -> Verdict {
    match (policy, known) {
        (HostKeyPolicy::Off, _) => Verdict::Accept,
        (_, Ok(true)) => Verdict::Accept,
        (HostKeyPolicy::AcceptNew, Ok(false)) => Verdict::Learn,
        (HostKeyPolicy::Strict, Ok(false)) => Verdict::Reject,
        (_, Err(_)) => Verdict::Reject,
    }
}

/// russh handler that checks the server key and keeps the reason for a
/// rejection, since russh itself only reports "unknown key".
pub(super) struct HostKeyCheck {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts: Option<PathBuf>,
    rejection: Arc<Mutex<Option<HostKeyError>>>,
}

impl HostKeyCheck {
    pub(super) fn new(
        host: &str,
        port: u16,
        policy: HostKeyPolicy,
        known_hosts: Option<PathBuf>,
    ) -> (Self, Arc<Mutex<Option<HostKeyError>>>) {
        let rejection = Arc::new(Mutex::new(None));
        let check = Self {
            host: host.to_string(),
            port,
            policy,
            known_hosts,
            rejection: rejection.clone(),
        };
        (check, rejection)
    }

    fn lookup(&self, key: &PublicKey) -> Result<bool, HostKeyError> {
        let found = match self.known_hosts {
            Some(ref path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };

        found.map_err(|e| match e {
            russh::keys::Error::KeyChanged { line } => HostKeyError::Mismatch {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            other => HostKeyError::Store(other.to_string()),
        })
    }

    fn learn(&self, key: &PublicKey) {
        let learned = match self.known_hosts {
            Some(ref path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };

        match learned {
            Ok(()) => info!("Added host key for {}:{} to known_hosts", self.host, self.port),
            Err(e) => warn!("Could not save host key for {}: {}", self.host, e),
        }
    }
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(&mut self, key: &PublicKey) -> Result<bool, Self::Error> {
        let known = match self.policy {
            HostKeyPolicy::Off => Ok(true),
            _ => self.lookup(key),
        };

        match verdict(self.policy, &known) {
            Verdict::Accept => Ok(true),
            Verdict::Learn => {
                self.learn(key);
                Ok(true)
            }
            Verdict::Reject => {
                let reason = known.err().unwrap_or_else(|| HostKeyError::Unknown {
                    host: self.host.clone(),
                    port: self.port,
                });
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(reason);
                }
                Ok(false)
            }
        }
    }
}
