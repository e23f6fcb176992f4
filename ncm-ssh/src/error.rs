//! Error types for ncm-ssh.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Where a session was when it ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// TCP connect, key exchange and login.
    Connect,
    /// Waiting for the device prompt after a command.
    Prompt,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Connect => f.write_str("connect"),
            Stage::Prompt => f.write_str("waiting for prompt"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// TCP connect failed (refused, unreachable, DNS).
    #[error("cannot reach {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    /// The server refused the username/password pair.
    #[error("login rejected for user '{user}'")]
    LoginRejected { user: String },

    #[error(transparent)]
    HostKey(#[from] HostKeyError),

    #[error("ssh: {0}")]
    Ssh(#[from] russh::Error),

    /// The shell channel ended while output was still expected.
    #[error("session closed by the device")]
    Closed,

    /// `enable` asked for a password but none was configured.
    #[error("'{command}' asked for a password but no enable secret is set")]
    SecretMissing { command: String },

    /// The device did not reach the privileged prompt after `enable`.
    #[error("'{command}' did not reach the privileged prompt")]
    SecretRejected { command: String },

    /// A command run while preparing the session returned a CLI error.
    #[error("'{command}' failed during session setup: {message}")]
    SetupRejected { command: String, message: String },

    #[error("prompt '{prompt}' is not a {dialect} prompt")]
    UnexpectedPrompt {
        prompt: String,
        dialect: &'static str,
    },

    #[error("unsupported device type '{0}'")]
    UnknownDialect(String),
}

/// Known-hosts verification failures.
#[derive(Error, Debug)]
pub enum HostKeyError {
    #[error("host key for {host}:{port} is not in known_hosts")]
    Unknown { host: String, port: u16 },

    #[error("host key for {host}:{port} does not match known_hosts line {line}")]
    Mismatch { host: String, port: u16, line: usize },

    #[error("known_hosts: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
