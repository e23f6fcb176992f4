//! Device inventory loading.
//!
//! The inventory is a YAML document with a top-level `devices` list:
//!
//! ```yaml
//! devices:
//!   - name: core-rtr-1
//!     host: 192.0.2.1
//!     device_type: cisco_ios
//!     description: Core router
//!     port: 22
//!     timeout: 10
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use log::info;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default SSH port when the inventory does not set one.
pub const DEFAULT_PORT: u16 = 22;

/// Default prompt timeout when the inventory does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One managed device and its connection parameters.
#[derive(Debug, Deserialize)]
pub struct DeviceRecord {
    /// Unique name within the inventory.
    pub name: String,

    /// Address or hostname to connect to.
    pub host: String,

    /// Platform tag selecting the CLI dialect (e.g. `cisco_ios`).
    pub device_type: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Login user; falls back to the credential provider.
    #[serde(default)]
    pub username: Option<String>,

    /// Login password; falls back to the credential provider.
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Enable password; falls back to the credential provider.
    #[serde(default)]
    pub secret: Option<SecretString>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Prompt wait timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Connect and handshake timeout in seconds; defaults to `timeout`.
    #[serde(default)]
    pub conn_timeout: Option<u64>,
}

impl DeviceRecord {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn conn_timeout(&self) -> Duration {
        self.conn_timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.timeout())
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("No description")
    }
}

#[derive(Debug, Default, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    devices: Option<Vec<DeviceRecord>>,
}

/// Ordered, name-unique list of devices.
#[derive(Debug, Default)]
pub struct Inventory {
    devices: Vec<DeviceRecord>,
}

impl Inventory {
    /// Build an inventory from records.
    ///
    /// Names must be unique, and so must the backup file names derived
    /// from them: `sw 1` and `SW:1` would both be saved as `sw_1_...` on a
    /// case-insensitive filesystem, so they are rejected together.
    pub fn new(devices: Vec<DeviceRecord>) -> Result<Self> {
        check_names(&devices)?;
        Ok(Self { devices })
    }

    /// Load an inventory file.
    ///
    /// A document without a `devices` key, or an empty document, is an
    /// empty inventory rather than an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        if is_blank_document(&content) {
            info!("{} has no devices", path.display());
            return Ok(Self::default());
        }

        let parsed: Option<InventoryFile> =
            serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let devices = parsed.and_then(|f| f.devices).unwrap_or_default();
        let inventory = Self::new(devices)?;
        info!("Loaded {} devices from {}", inventory.len(), path.display());
        Ok(inventory)
    }

    /// Find a device by exact name.
    pub fn find(&self, name: &str) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Like [`find`](Self::find), but a missing device is an error.
    pub fn get(&self, name: &str) -> Result<&DeviceRecord> {
        self.find(name).ok_or_else(|| Error::UnknownDevice {
            name: name.to_string(),
        })
    }

    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn check_names(devices: &[DeviceRecord]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for device in devices {
        let name = device.name.as_str();
        match seen.entry(sanitize_name(name).to_ascii_lowercase()) {
            Entry::Vacant(slot) => {
                slot.insert(name);
            }
            Entry::Occupied(slot) if *slot.get() == name => {
                return Err(Error::DuplicateDevice {
                    name: name.to_string(),
                });
            }
            Entry::Occupied(slot) => {
                return Err(Error::NameClash {
                    name: name.to_string(),
                    existing: slot.get().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Replace anything outside `[A-Za-z0-9._-]` so a device name is safe as
/// part of a file name.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Only whitespace and comments.
fn is_blank_document(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a DeviceRecord;
    type IntoIter = std::slice::Iter<'a, DeviceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}
