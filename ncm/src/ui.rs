//! Terminal output.
//!
//! Everything is written to the caller's writer: stdout for the binary, a
//! byte buffer in tests.

use std::io::{Result, Write};

use colored::Colorize;

use crate::backup::{BackupResult, BackupSummary, ConnectionCheck};
use crate::error::Error;
use crate::inventory::Inventory;

/// Print the banner shown at the start of every run
pub fn banner(out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{}",
        format!("Network Configuration Manager v{}", env!("CARGO_PKG_VERSION")).bold()
    )?;
    writeln!(out, "{}", "=".repeat(50))
}

/// Print a success line
pub fn success(out: &mut dyn Write, msg: &str) -> Result<()> {
    writeln!(out, "{} {}", "✅".green(), msg)
}

/// Print a failure line
pub fn failure(out: &mut dyn Write, msg: &str) -> Result<()> {
    writeln!(out, "{} {}", "❌".red(), msg)
}

/// Print a plain error
pub fn error(out: &mut dyn Write, err: &Error) -> Result<()> {
    writeln!(out, "{} {}", "Error:".red().bold(), err)
}

pub fn no_devices(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "No devices found. Please check your configuration file.")
}

pub fn loaded(out: &mut dyn Write, count: usize) -> Result<()> {
    writeln!(out, "Loaded {} devices from configuration", count)
}

/// Numbered listing of every inventory record
pub fn inventory(out: &mut dyn Write, inventory: &Inventory) -> Result<()> {
    if inventory.is_empty() {
        return writeln!(out, "No devices found in configuration");
    }

    writeln!(out)?;
    writeln!(out, "{}", "Device Inventory:".bold())?;
    writeln!(out, "{}", "-".repeat(50))?;
    for (i, device) in inventory.devices().iter().enumerate() {
        writeln!(out, "{}. Name: {}", i + 1, device.name.cyan())?;
        writeln!(out, "   Host: {}", device.host)?;
        writeln!(out, "   Type: {}", device.device_type)?;
        writeln!(out, "   Description: {}", device.description())?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn available_devices(out: &mut dyn Write, inventory: &Inventory) -> Result<()> {
    writeln!(out, "Available devices:")?;
    for name in inventory.names() {
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

pub fn test_usage(out: &mut dyn Write, inventory: &Inventory) -> Result<()> {
    available_devices(out, inventory)?;
    writeln!(out, "\nUse --device <name> to test a specific device")
}

pub fn backup_usage(out: &mut dyn Write, inventory: &Inventory) -> Result<()> {
    available_devices(out, inventory)?;
    writeln!(out, "\nOptions:")?;
    writeln!(out, "  --backup --device <name>  : Backup specific device")?;
    writeln!(out, "  --backup --all            : Backup all devices")
}

/// Shown when no operation flag is given
pub fn commands(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Available commands:")?;
    writeln!(out, "  --list                    : Show device inventory")?;
    writeln!(out, "  --test --device <name>    : Test connection to device")?;
    writeln!(out, "  --backup --device <name>  : Backup specific device")?;
    writeln!(out, "  --backup --all            : Backup all devices")?;
    writeln!(out, "\nUse --help for detailed options")
}

pub fn connection_ok(out: &mut dyn Write, check: &ConnectionCheck) -> Result<()> {
    success(out, "Connection successful!")?;
    writeln!(
        out,
        "Device response preview: {}{}",
        check.preview.trim_end(),
        if check.truncated { "..." } else { "" }
    )
}

pub fn connection_failed(out: &mut dyn Write, err: &Error) -> Result<()> {
    failure(out, &format!("Connection failed: {}", err))
}

pub fn backup_started(out: &mut dyn Write, count: usize) -> Result<()> {
    writeln!(out, "Starting backup for {} devices...", count)?;
    writeln!(out, "{}", "=".repeat(50))
}

pub fn backup_result(out: &mut dyn Write, result: &BackupResult) -> Result<()> {
    match result.outcome {
        Ok(ref path) => success(out, &format!("Backup completed: {}", path.display())),
        Err(ref e) => failure(out, &format!("Backup failed for {}: {}", result.device, e)),
    }
}

pub fn summary(out: &mut dyn Write, summary: &BackupSummary) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Backup Summary:".bold())?;
    writeln!(out, "{}", "-".repeat(30))?;
    writeln!(out, "Successful: {}", summary.success_count().to_string().green())?;
    let failed = summary.failure_count();
    if failed > 0 {
        writeln!(out, "Failed: {}", failed.to_string().red())?;
    } else {
        writeln!(out, "Failed: {}", failed)?;
    }

    if summary.success_count() > 0 {
        writeln!(out, "\nSuccessful backups:")?;
        for (name, path) in summary.successes() {
            writeln!(out, "  {} -> {}", name, path.display())?;
        }
    }

    if failed > 0 {
        writeln!(out, "\nFailed backups:")?;
        for (name, err) in summary.failures() {
            writeln!(out, "  {}: {} {}", name, err, format!("[{}]", err.kind()).dimmed())?;
        }
    }
    Ok(())
}
