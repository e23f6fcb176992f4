//! What the `ncm` binary does with a parsed command line.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use log::warn;

use crate::backup::Orchestrator;
use crate::cli::{BackupTarget, Cli, Operation};
use crate::credentials::CredentialProvider;
use crate::inventory::Inventory;
use crate::session::SessionClient;
use crate::ui;

/// How a run ended, as far as the exit code is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The requested operation ran. A `--backup --all` batch with failed
    /// devices still counts; the summary reports them.
    Success,
    /// The inventory could not be loaded, the named device does not exist,
    /// or a single-device test or backup failed.
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::FAILURE,
        }
    }
}

/// Load the inventory and perform the operation `cli` selects, writing
/// progress and results to `out`.
///
/// `connect` builds the orchestrator. It is only called by operations that
/// talk to devices, so listing never prompts for a password.
pub async fn run<C, P, F>(cli: &Cli, connect: F, out: &mut dyn Write) -> Result<Status>
where
    C: SessionClient,
    P: CredentialProvider,
    F: FnOnce() -> Result<Orchestrator<C, P>>,
{
    ui::banner(out)?;

    let inventory = match Inventory::load(&cli.inventory) {
        Ok(inventory) => inventory,
        Err(e) => {
            ui::error(out, &e)?;
            ui::no_devices(out)?;
            return Ok(Status::Failure);
        }
    };

    if inventory.is_empty() {
        ui::no_devices(out)?;
        return Ok(Status::Success);
    }
    ui::loaded(out, inventory.len())?;

    match cli.operation() {
        Operation::List => {
            ui::inventory(out, &inventory)?;
            Ok(Status::Success)
        }
        Operation::Test(Some(ref name)) => test(&inventory, name, connect, out).await,
        Operation::Test(None) => {
            ui::test_usage(out, &inventory)?;
            Ok(Status::Success)
        }
        Operation::Backup(target) => backup(&inventory, target, connect, out).await,
        Operation::Usage => {
            ui::commands(out)?;
            Ok(Status::Success)
        }
    }
}

async fn test<C, P, F>(
    inventory: &Inventory,
    name: &str,
    connect: F,
    out: &mut dyn Write,
) -> Result<Status>
where
    C: SessionClient,
    P: CredentialProvider,
    F: FnOnce() -> Result<Orchestrator<C, P>>,
{
    let device = match inventory.get(name) {
        Ok(device) => device,
        Err(e) => {
            ui::error(out, &e)?;
            return Ok(Status::Failure);
        }
    };

    writeln!(out, "Testing connection to: {}", device.name)?;
    writeln!(out, "Attempting to connect to {}...", device.host)?;
    match connect()?.test_connection(device).await {
        Ok(check) => {
            ui::connection_ok(out, &check)?;
            Ok(Status::Success)
        }
        Err(e) => {
            ui::connection_failed(out, &e)?;
            Ok(Status::Failure)
        }
    }
}

async fn backup<C, P, F>(
    inventory: &Inventory,
    target: BackupTarget,
    connect: F,
    out: &mut dyn Write,
) -> Result<Status>
where
    C: SessionClient,
    P: CredentialProvider,
    F: FnOnce() -> Result<Orchestrator<C, P>>,
{
    match target {
        BackupTarget::All => {
            let orchestrator = connect()?;
            writeln!(out, "Backing up ALL devices...")?;
            ui::backup_started(out, inventory.len())?;

            let summary = orchestrator
                .backup_all_with(inventory.devices(), |result| {
                    if let Err(e) = ui::backup_result(out, result) {
                        warn!("Could not print result for {}: {}", result.device, e);
                    }
                })
                .await;
            ui::summary(out, &summary)?;
            Ok(Status::Success)
        }
        BackupTarget::Device(name) => {
            let device = match inventory.get(&name) {
                Ok(device) => device,
                Err(e) => {
                    ui::error(out, &e)?;
                    return Ok(Status::Failure);
                }
            };

            writeln!(out, "Backing up device: {}", device.name)?;
            writeln!(out, "Connecting to {}...", device.name)?;
            match connect()?.backup_device(device).await {
                Ok(path) => {
                    ui::success(out, &format!("Backup completed: {}", path.display()))?;
                    Ok(Status::Success)
                }
                Err(e) => {
                    ui::failure(out, &format!("Backup failed for {}: {}", device.name, e))?;
                    Ok(Status::Failure)
                }
            }
        }
        BackupTarget::Unspecified => {
            ui::backup_usage(out, inventory)?;
            Ok(Status::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use tempfile::TempDir;

    use super::*;
    use crate::testing::{FakeClient, StaticCredentials};

    type TestOrchestrator = Orchestrator<FakeClient, StaticCredentials>;

    const INVENTORY: &str = "devices:
  - {name: r1, host: 192.0.2.1, device_type: cisco_ios, description: Core router}
  - {name: r2, host: 192.0.2.2, device_type: cisco_ios}
  - {name: sw1, host: 192.0.2.3, device_type: arista_eos}
";

    struct Fixture {
        dir: TempDir,
        inventory: PathBuf,
    }

    impl Fixture {
        fn new(content: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let inventory = dir.path().join("devices.yaml");
            fs::write(&inventory, content).unwrap();
            Self { dir, inventory }
        }

        fn backups(&self) -> PathBuf {
            self.dir.path().join("backups")
        }

        fn cli(&self, args: &[&str]) -> Cli {
            cli_for(&self.inventory, args)
        }
    }

    fn cli_for(inventory: &Path, args: &[&str]) -> Cli {
        let mut argv = vec!["ncm", "--inventory", inventory.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    async fn run_with(cli: &Cli, client: FakeClient, backups: &Path) -> (Status, String) {
        let mut out = Vec::new();
        let status = run(
            cli,
            || Ok(Orchestrator::new(client, StaticCredentials, backups)),
            &mut out,
        )
        .await
        .unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    /// For operations that must not contact any device.
    async fn run_offline(cli: &Cli) -> (Status, String) {
        let mut out = Vec::new();
        let status = run(
            cli,
            || -> Result<TestOrchestrator> { panic!("no device should be contacted") },
            &mut out,
        )
        .await
        .unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_list() {
        let fixture = Fixture::new(INVENTORY);
        let (status, out) = run_offline(&fixture.cli(&["--list"])).await;

        assert_eq!(status, Status::Success);
        assert!(out.contains("Network Configuration Manager v"));
        assert!(out.contains("Loaded 3 devices from configuration"));
        assert!(out.contains("   Host: 192.0.2.1\n   Type: cisco_ios\n"));
        assert!(out.contains("   Description: Core router"));
        assert!(out.contains("   Description: No description"));
    }

    #[tokio::test]
    async fn test_test_without_device_lists_names() {
        let fixture = Fixture::new(INVENTORY);
        let (status, out) = run_offline(&fixture.cli(&["--test"])).await;

        assert_eq!(status, Status::Success);
        assert!(out.contains("Available devices:\n  - r1\n  - r2\n  - sw1\n"));
        assert!(out.contains("Use --device <name> to test a specific device"));
    }

    #[tokio::test]
    async fn test_backup_without_target_lists_options() {
        let fixture = Fixture::new(INVENTORY);
        let (status, out) = run_offline(&fixture.cli(&["--backup"])).await;

        assert_eq!(status, Status::Success);
        assert!(out.contains("Available devices:\n  - r1\n"));
        assert!(out.contains("  --backup --all            : Backup all devices"));
    }

    #[tokio::test]
    async fn test_no_operation_prints_commands() {
        let fixture = Fixture::new(INVENTORY);
        let (status, out) = run_offline(&fixture.cli(&[])).await;

        assert_eq!(status, Status::Success);
        assert!(out.contains("Available commands:"));
        assert!(out.contains("Use --help for detailed options"));
    }

    #[tokio::test]
    async fn test_missing_inventory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(&dir.path().join("missing.yaml"), &["--list"]);
        let (status, out) = run_offline(&cli).await;

        assert_eq!(status, Status::Failure);
        assert!(out.contains("missing.yaml not found"));
        assert!(out.contains("No devices found. Please check your configuration file."));
    }

    #[tokio::test]
    async fn test_empty_inventory_is_not_an_error() {
        let fixture = Fixture::new("devices:\n");
        let (status, out) = run_offline(&fixture.cli(&["--backup", "--all"])).await;

        assert_eq!(status, Status::Success);
        assert!(out.contains("No devices found."));
        assert!(!out.contains("Loaded"));
    }

    #[tokio::test]
    async fn test_unknown_device_fails() {
        let fixture = Fixture::new(INVENTORY);
        let (status, out) = run_offline(&fixture.cli(&["--test", "--device", "r9"])).await;

        assert_eq!(status, Status::Failure);
        assert!(out.contains("Device 'r9' not found in inventory"));
    }

    #[tokio::test]
    async fn test_single_device_test() {
        let fixture = Fixture::new(INVENTORY);
        let cli = fixture.cli(&["--test", "--device", "r1"]);
        let (status, out) = run_with(&cli, FakeClient::default(), &fixture.backups()).await;

        assert_eq!(status, Status::Success);
        assert!(out.contains("Attempting to connect to 192.0.2.1..."));
        assert!(out.contains("Connection successful!"));
        assert!(out.contains("Device response preview: cisco_ios Software"));

        let (status, out) = run_with(&cli, FakeClient::failing(&["r1"]), &fixture.backups()).await;
        assert_eq!(status, Status::Failure);
        assert!(out.contains("Connection failed: Timed out: 192.0.2.1:22"));
    }

    #[tokio::test]
    async fn test_single_device_backup() {
        let fixture = Fixture::new(INVENTORY);
        let cli = fixture.cli(&["--backup", "--device", "sw1"]);

        let (status, out) = run_with(&cli, FakeClient::default(), &fixture.backups()).await;
        assert_eq!(status, Status::Success);
        assert!(out.contains("Backing up device: sw1"));
        assert!(out.contains("Backup completed: "));
        assert_eq!(fs::read_dir(fixture.backups()).unwrap().count(), 1);

        let (status, out) =
            run_with(&cli, FakeClient::failing(&["sw1"]), &fixture.backups()).await;
        assert_eq!(status, Status::Failure);
        assert!(out.contains("Backup failed for sw1: Timed out"));
    }

    #[tokio::test]
    async fn test_backup_all_summary() {
        let fixture = Fixture::new(INVENTORY);
        let cli = fixture.cli(&["--backup", "--all"]);
        let (status, out) = run_with(&cli, FakeClient::failing(&["r2"]), &fixture.backups()).await;

        assert_eq!(status, Status::Success);
        assert!(out.contains("Backing up ALL devices..."));
        assert!(out.contains("Starting backup for 3 devices..."));
        assert!(out.contains("Backup failed for r2: Timed out: 192.0.2.2:22"));
        assert!(out.contains("Backup Summary:"));
        assert!(out.contains("\nSuccessful backups:\n  r1 -> "));
        assert!(out.contains("\n  sw1 -> "));
        assert!(out.contains("\nFailed backups:\n  r2: Timed out: 192.0.2.2:22"));
        assert!(out.contains("[connect-timeout]"));

        let summary_at = out.find("Backup Summary:").unwrap();
        assert!(out.find("Backup failed for r2").unwrap() < summary_at);
        assert_eq!(fs::read_dir(fixture.backups()).unwrap().count(), 2);
    }
}
