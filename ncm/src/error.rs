//! Error types for ncm.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong loading the inventory or talking to a device.
///
/// SSH library errors are classified on conversion so batch summaries can
/// say *why* each device failed.
#[derive(Error, Debug)]
pub enum Error {
    /// Inventory file does not exist
    #[error("Configuration file {} not found", .path.display())]
    ConfigNotFound { path: PathBuf },

    /// Inventory file could not be read or parsed
    #[error("Error parsing {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// Two inventory records share a name
    #[error("Device name '{name}' appears more than once in the inventory")]
    DuplicateDevice { name: String },

    /// Two different names would be written to the same backup file
    #[error("Device names '{existing}' and '{name}' map to the same backup file name")]
    NameClash { name: String, existing: String },

    /// Requested device is not in the inventory
    #[error("Device '{name}' not found in inventory")]
    UnknownDevice { name: String },

    /// No username or password could be found for a device
    #[error("No {what} available for device '{device}'")]
    MissingCredentials { device: String, what: &'static str },

    /// The device rejected our credentials (login or enable)
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// Connect, handshake or prompt wait timed out
    #[error("Timed out: {0}")]
    ConnectTimeout(String),

    /// TCP connection refused or host unreachable
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other SSH, channel, privilege or platform failure
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The device answered with an error marker
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Writing the backup file failed
    #[error("Could not write backup {}: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ConfigNotFound { .. } => "config-not-found",
            Error::ConfigParse { .. } => "config-parse-error",
            Error::DuplicateDevice { .. } | Error::NameClash { .. } => "duplicate-device",
            Error::UnknownDevice { .. } => "unknown-device",
            Error::MissingCredentials { .. } => "missing-credentials",
            Error::AuthFailure(_) => "auth-failure",
            Error::ConnectTimeout(_) => "connect-timeout",
            Error::Connect(_) => "connect-error",
            Error::Protocol(_) => "protocol-error",
            Error::CommandFailed { .. } => "command-failed",
            Error::Backup { .. } => "backup-write-error",
        }
    }
}

impl From<ncm_ssh::Error> for Error {
    fn from(err: ncm_ssh::Error) -> Self {
        use ncm_ssh::Error as Ssh;

        let message = err.to_string();
        match err {
            Ssh::LoginRejected { .. } | Ssh::SecretMissing { .. } | Ssh::SecretRejected { .. } => {
                Error::AuthFailure(message)
            }
            Ssh::Timeout { .. } => Error::ConnectTimeout(message),
            Ssh::Unreachable { .. } => Error::Connect(message),
            _ => Error::Protocol(message),
        }
    }
}

/// Result type alias using ncm's Error.
pub type Result<T> = std::result::Result<T, Error>;
