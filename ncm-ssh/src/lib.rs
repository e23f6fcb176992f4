//! # ncm-ssh
//!
//! Async SSH CLI sessions for network devices, as used by `ncm`.
//!
//! A session logs in with a password, waits for the device prompt, runs
//! `enable` when the platform needs it, turns paging off, and then returns
//! each command's output without the echoed command or the trailing
//! prompt.
//!
//! - `transport`: russh connection, host key policy, password login
//! - `channel`: the [`Wire`] byte pipe and prompt-terminated reads
//! - `platform`: vendor dialects (`cisco_ios`, `cisco_nxos`, `arista_eos`,
//!   `juniper_junos`)
//! - `session`: [`CliSession`]
//!
//! ```rust,no_run
//! use ncm_ssh::{CliSession, Target, dialect};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ncm_ssh::Error> {
//!     let target = Target::new("192.0.2.1", "admin", SecretString::from("pw"));
//!     let mut session = CliSession::connect(&target, dialect("arista_eos")?, None).await?;
//!
//!     let output = session.run("show version").await?;
//!     println!("{}", output.text);
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod platform;
pub mod session;
pub mod transport;

pub use channel::Wire;
pub use error::{Error, HostKeyError, Result, Stage};
pub use platform::{Dialect, dialect};
pub use session::{CliSession, Output};
pub use transport::{HostKeyPolicy, SshWire, Target};
