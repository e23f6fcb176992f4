use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ncm_ssh::HostKeyPolicy;

#[derive(Parser, Debug)]
#[command(name = "ncm")]
#[command(version)]
#[command(
    about = "Network Configuration Manager: connection tests and config backups over SSH",
    long_about = None
)]
pub struct Cli {
    /// List devices in the inventory
    #[arg(long)]
    pub list: bool,

    /// Test the connection to a device (requires --device)
    #[arg(long)]
    pub test: bool,

    /// Back up running configuration (requires --device or --all)
    #[arg(long)]
    pub backup: bool,

    /// Target device name
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Back up every device in the inventory
    #[arg(long)]
    pub all: bool,

    /// Inventory file
    #[arg(long, env = "NCM_INVENTORY", default_value = "configs/devices.yaml")]
    pub inventory: PathBuf,

    /// Directory backups are written to
    #[arg(long, env = "NCM_BACKUP_DIR", default_value = "backups")]
    pub backup_dir: PathBuf,

    /// Number of devices backed up at once with --all
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Ask for the SSH password instead of reading NCM_PASSWORD
    #[arg(long)]
    pub prompt_password: bool,

    /// How to treat SSH host keys
    #[arg(long, value_enum, default_value_t = HostKeyMode::AcceptNew)]
    pub host_keys: HostKeyMode,

    /// known_hosts file (default: ~/.ssh/known_hosts)
    #[arg(long, env = "NCM_KNOWN_HOSTS", value_name = "PATH")]
    pub known_hosts: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HostKeyMode {
    /// Only connect to hosts already in known_hosts
    Strict,
    /// Record unknown hosts, reject changed keys
    AcceptNew,
    /// Skip verification
    Off,
}

impl From<HostKeyMode> for HostKeyPolicy {
    fn from(mode: HostKeyMode) -> Self {
        match mode {
            HostKeyMode::Strict => HostKeyPolicy::Strict,
            HostKeyMode::AcceptNew => HostKeyPolicy::AcceptNew,
            HostKeyMode::Off => HostKeyPolicy::Off,
        }
    }
}

/// What a backup request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupTarget {
    All,
    Device(String),
    /// Neither `--all` nor `--device` was given.
    Unspecified,
}

/// The single operation an invocation performs.
///
/// When several operation flags are given, `--list` wins over `--test`,
/// which wins over `--backup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Test(Option<String>),
    Backup(BackupTarget),
    Usage,
}

impl Cli {
    pub fn operation(&self) -> Operation {
        if self.list {
            Operation::List
        } else if self.test {
            Operation::Test(self.device.clone())
        } else if self.backup {
            Operation::Backup(match (self.all, &self.device) {
                (true, _) => BackupTarget::All,
                (false, Some(name)) => BackupTarget::Device(name.clone()),
                (false, None) => BackupTarget::Unspecified,
            })
        } else {
            Operation::Usage
        }
    }
}
