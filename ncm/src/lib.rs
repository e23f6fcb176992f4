//! # ncm
//!
//! Network Configuration Manager: keeps an inventory of network devices,
//! checks that each one is reachable over SSH, and saves their running
//! configuration to timestamped text files.
//!
//! The SSH work is done by [`ncm_ssh`]; this crate adds the inventory,
//! credential lookup, backup orchestration and the command-line front end.

pub mod app;
pub mod backup;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod inventory;
pub mod session;
pub mod ui;

#[cfg(test)]
mod testing;

pub use backup::{BackupResult, BackupSummary, ConnectionCheck, Orchestrator};
pub use credentials::{CredentialProvider, Credentials, EnvCredentials, PromptCredentials};
pub use error::{Error, Result};
pub use inventory::{DeviceRecord, Inventory};
pub use session::{SessionClient, SshSessionClient};
