//! Connection tests and configuration backups.
//!
//! [`Orchestrator`] ties a [`SessionClient`] and a [`CredentialProvider`]
//! together. Each operation works on inventory records and reports failures
//! per device; a batch never stops on the first error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use futures_util::stream::{self, StreamExt};
use log::{error, info, warn};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::inventory::{DeviceRecord, sanitize_name};
use crate::session::SessionClient;

/// Characters of status output kept in a [`ConnectionCheck`] preview.
pub const PREVIEW_CHARS: usize = 100;

/// Timestamp format embedded in backup file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const HEADER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of a successful connection test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCheck {
    pub device: String,
    /// Leading part of the status command output.
    pub preview: String,
    /// Whether `preview` was cut short.
    pub truncated: bool,
}

/// Outcome of backing up one device.
#[derive(Debug)]
pub struct BackupResult {
    pub device: String,
    pub outcome: Result<PathBuf>,
}

impl BackupResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-device results of a batch, in inventory order.
#[derive(Debug, Default)]
pub struct BackupSummary {
    pub results: Vec<BackupResult>,
}

impl BackupSummary {
    pub fn successes(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.results.iter().filter_map(|r| match r.outcome {
            Ok(ref path) => Some((r.device.as_str(), path.as_path())),
            Err(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.results.iter().filter_map(|r| match r.outcome {
            Ok(_) => None,
            Err(ref e) => Some((r.device.as_str(), e)),
        })
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Runs connection tests and backups against inventory devices.
pub struct Orchestrator<C, P> {
    client: C,
    credentials: P,
    backup_dir: PathBuf,
    jobs: usize,
}

impl<C: SessionClient, P: CredentialProvider> Orchestrator<C, P> {
    pub fn new(client: C, credentials: P, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            credentials,
            backup_dir: backup_dir.into(),
            jobs: 1,
        }
    }

    /// Number of devices [`backup_all`](Self::backup_all) works on at once.
    /// Values below one are treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Log in and run the platform's status command.
    pub async fn test_connection(&self, device: &DeviceRecord) -> Result<ConnectionCheck> {
        let command = ncm_ssh::dialect(&device.device_type)?.status_command;
        let credentials = self.credentials.credentials(device)?;

        let output = self
            .client
            .send_command(device, &credentials, command)
            .await
            .inspect_err(|e| error!("Connection test failed for {}: {}", device.name, e))?;

        info!("Connection test succeeded for {}", device.name);
        let (preview, truncated) = preview(&output, PREVIEW_CHARS);
        Ok(ConnectionCheck {
            device: device.name.clone(),
            preview,
            truncated,
        })
    }

    /// Fetch the running configuration and write it to a new file in the
    /// backup directory. Returns the file's path.
    pub async fn backup_device(&self, device: &DeviceRecord) -> Result<PathBuf> {
        let command = ncm_ssh::dialect(&device.device_type)?.config_command;
        let credentials = self.credentials.credentials(device)?;

        info!("Backing up {} ({})", device.name, device.host);
        let config = self
            .client
            .send_command(device, &credentials, command)
            .await?;

        let path = write_backup(&self.backup_dir, device, &config, Local::now()).await?;
        info!("Backup of {} saved to {}", device.name, path.display());
        Ok(path)
    }

    /// Back up every device, in order, continuing past failures.
    pub async fn backup_all(&self, devices: &[DeviceRecord]) -> BackupSummary {
        self.backup_all_with(devices, |_| {}).await
    }

    /// Like [`backup_all`](Self::backup_all), calling `on_result` as each
    /// device finishes.
    pub async fn backup_all_with<F>(
        &self,
        devices: &[DeviceRecord],
        mut on_result: F,
    ) -> BackupSummary
    where
        F: FnMut(&BackupResult),
    {
        info!(
            "Backing up {} devices ({} at a time)",
            devices.len(),
            self.jobs
        );

        let results = stream::iter(devices)
            .map(|device| async move {
                let outcome = self.backup_device(device).await;
                if let Err(ref e) = outcome {
                    warn!("Backup failed for {} [{}]: {}", device.name, e.kind(), e);
                }
                BackupResult {
                    device: device.name.clone(),
                    outcome,
                }
            })
            .buffered(self.jobs)
            .inspect(|result| on_result(result))
            .collect::<Vec<_>>()
            .await;

        BackupSummary { results }
    }
}

/// `{name}_{YYYYMMDD_HHMMSS}.txt`
pub fn backup_file_name(device_name: &str, at: &DateTime<Local>) -> String {
    format!(
        "{}_{}.txt",
        sanitize_name(device_name),
        at.format(FILE_TIMESTAMP_FORMAT)
    )
}

fn backup_header(device: &DeviceRecord, at: &DateTime<Local>) -> String {
    format!(
        "# Configuration backup for {}\n# Backup date: {}\n# Device: {}\n#{}\n\n",
        device.name,
        at.format(HEADER_TIMESTAMP_FORMAT),
        device.host,
        "=".repeat(50)
    )
}

/// Write `config` under `dir`, creating the directory if needed. An
/// existing file with the same name is never overwritten.
pub async fn write_backup(
    dir: &Path,
    device: &DeviceRecord,
    config: &str,
    at: DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).await.map_err(|source| Error::Backup {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(backup_file_name(&device.name, &at));
    let content = backup_header(device, &at) + config;

    let written: std::io::Result<()> = async {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await
    }
    .await;

    written.map_err(|source| Error::Backup {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// First `max_chars` characters of `text`, and whether anything was cut.
pub fn preview(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (text[..idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{NaiveDateTime, TimeDelta};

    use super::*;
    use crate::testing::{FakeClient, StaticCredentials, device, devices};

    type TestOrchestrator = Orchestrator<FakeClient, StaticCredentials>;

    fn orchestrator(client: FakeClient, dir: &Path) -> TestOrchestrator {
        Orchestrator::new(client, StaticCredentials, dir)
    }

    fn timestamp_of(path: &Path, device: &str) -> NaiveDateTime {
        let name = path.file_name().unwrap().to_str().unwrap();
        let stamp = name
            .strip_prefix(&format!("{}_", device))
            .and_then(|s| s.strip_suffix(".txt"))
            .unwrap();
        NaiveDateTime::parse_from_str(stamp, FILE_TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let (text, truncated) = preview("short", 100);
        assert_eq!(text, "short");
        assert!(!truncated);

        let long = "é".repeat(150);
        let (text, truncated) = preview(&long, 100);
        assert_eq!(text.chars().count(), 100);
        assert!(truncated);

        let (text, truncated) = preview(&"a".repeat(100), 100);
        assert_eq!(text.len(), 100);
        assert!(!truncated);
    }

    #[tokio::test]
    async fn test_connection_uses_status_command() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::default(), dir.path());

        let check = orch
            .test_connection(&device("router1", "cisco_ios"))
            .await
            .unwrap();
        assert_eq!(check.device, "router1");
        assert!(check.preview.starts_with("cisco_ios Software"));
        assert_eq!(check.preview.chars().count(), PREVIEW_CHARS);
        assert!(check.truncated);

        orch.test_connection(&device("fw1", "juniper_junos"))
            .await
            .unwrap();
        let calls = orch.client.calls();
        assert_eq!(calls[0], ("router1".to_string(), "show version".to_string()));
        assert_eq!(calls[1].0, "fw1");
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::failing(&["router1"]), dir.path());

        let err = orch
            .test_connection(&device("router1", "cisco_ios"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "connect-timeout");
    }

    #[tokio::test]
    async fn test_unknown_platform_not_contacted() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::default(), dir.path());

        let err = orch
            .backup_device(&device("old-switch", "hp_procurve"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "protocol-error");
        assert!(orch.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_backup_device_writes_header_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let backup_dir = dir.path().join("nested").join("backups");
        let orch = orchestrator(FakeClient::default(), &backup_dir);

        let before = Local::now().naive_local() - TimeDelta::seconds(1);
        let path = orch
            .backup_device(&device("router1", "cisco_ios"))
            .await
            .unwrap();
        let after = Local::now().naive_local();

        assert_eq!(path.parent().unwrap(), backup_dir);
        let stamp = timestamp_of(&path, "router1");
        assert!(stamp >= before && stamp <= after);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "# Configuration backup for router1");
        assert!(lines[1].starts_with("# Backup date: "));
        assert_eq!(lines[2], "# Device: 192.0.2.10");
        assert_eq!(lines[3], format!("#{}", "=".repeat(50)));
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "hostname router1");
        assert!(content.ends_with("end\n"));

        let (_, command) = &orch.client.calls()[0];
        assert_eq!(command, "show running-config");
    }

    #[tokio::test]
    async fn test_junos_uses_show_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::default(), dir.path());

        orch.backup_device(&device("fw1", "juniper_junos"))
            .await
            .unwrap();
        assert_eq!(orch.client.calls()[0].1, "show configuration");
    }

    #[tokio::test]
    async fn test_existing_backup_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let record = device("router1", "cisco_ios");
        let at = Local::now();

        let path = write_backup(dir.path(), &record, "first\n", at).await.unwrap();
        let err = write_backup(dir.path(), &record, "second\n", at)
            .await
            .unwrap_err();

        match err {
            Error::Backup { ref source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::fs::read_to_string(path).unwrap().ends_with("first\n"));
    }

    #[tokio::test]
    async fn test_sanitized_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::default(), dir.path());

        let path = orch
            .backup_device(&device("../core rtr", "cisco_ios"))
            .await
            .unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with(".._core_rtr_"));
    }

    #[tokio::test]
    async fn test_backup_all_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::default(), dir.path());
        let names = ["r1", "r2", "sw1"];

        let summary = orch.backup_all(&devices(&names)).await;

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.success_count(), 3);
        assert_eq!(summary.failure_count(), 0);

        let paths: HashSet<_> = summary.successes().map(|(_, p)| p.to_path_buf()).collect();
        assert_eq!(paths.len(), 3);
        for (name, path) in summary.successes() {
            assert!(path.exists());
            timestamp_of(path, name);
        }
    }

    #[tokio::test]
    async fn test_backup_all_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::failing(&["r2"]), dir.path());

        let mut seen = Vec::new();
        let summary = orch
            .backup_all_with(&devices(&["r1", "r2", "r3"]), |r| {
                seen.push((r.device.clone(), r.is_success()))
            })
            .await;

        assert_eq!(
            seen,
            vec![
                ("r1".to_string(), true),
                ("r2".to_string(), false),
                ("r3".to_string(), true),
            ]
        );
        assert_eq!(summary.success_count(), 2);

        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "r2");
        assert_eq!(failures[0].1.kind(), "connect-timeout");

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[tokio::test]
    async fn test_backup_all_concurrent_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::default(), dir.path()).with_jobs(4);
        let names = ["a", "b", "c", "d", "e", "f"];

        let summary = orch.backup_all(&devices(&names)).await;

        let order: Vec<_> = summary.results.iter().map(|r| r.device.as_str()).collect();
        assert_eq!(order, names);
        assert_eq!(summary.success_count(), names.len());
    }

    #[tokio::test]
    async fn test_backup_all_empty() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(FakeClient::default(), dir.path()).with_jobs(0);

        let summary = orch.backup_all(&[]).await;
        assert_eq!(summary.total(), 0);
        assert_eq!(orch.jobs, 1);
    }
}
