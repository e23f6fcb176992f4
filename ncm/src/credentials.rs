//! Credential resolution.
//!
//! Credentials are never stored in code. Each device's username, password
//! and enable secret come from its inventory record when set there, and
//! otherwise from a [`CredentialProvider`] chosen on the command line.

use std::env;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use crate::inventory::DeviceRecord;

/// Environment variable prefix used by [`EnvCredentials`].
pub const ENV_PREFIX: &str = "NCM";

/// Resolved login material for one device.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Enable secret, for platforms that escalate with a password.
    pub secret: Option<SecretString>,
}

/// Supplies credentials for a device at call time.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self, device: &DeviceRecord) -> Result<Credentials>;
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Box<T> {
    fn credentials(&self, device: &DeviceRecord) -> Result<Credentials> {
        (**self).credentials(device)
    }
}

pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret())
}

fn missing(device: &DeviceRecord, what: &'static str) -> Error {
    Error::MissingCredentials {
        device: device.name.clone(),
        what,
    }
}

/// Environment variable suffix for a device name: upper-cased, with
/// anything outside `[A-Z0-9]` replaced by `_`.
pub fn env_suffix(device_name: &str) -> String {
    device_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads `NCM_USERNAME`, `NCM_PASSWORD` and `NCM_SECRET`. A variable set
/// to the empty string counts as unset.
///
/// `NCM_PASSWORD_<DEVICE>` and `NCM_SECRET_<DEVICE>` override the shared
/// values for a single device, e.g. `NCM_PASSWORD_CORE_RTR_1` for
/// `core-rtr-1`.
pub struct EnvCredentials {
    lookup: Lookup,
}

impl EnvCredentials {
    pub fn from_env() -> Self {
        Self::with_lookup(|key| env::var(key).ok())
    }

    /// Use a custom variable source instead of the process environment.
    pub fn with_lookup(
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// The shared `NCM_USERNAME`.
    pub fn username(&self) -> Option<String> {
        self.var("USERNAME")
    }

    fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{}_{}", ENV_PREFIX, name)).filter(|v| !v.is_empty())
    }

    /// Per-device variable first, then the shared one.
    fn device_var(&self, name: &str, device: &DeviceRecord) -> Option<String> {
        self.var(&format!("{}_{}", name, env_suffix(&device.name)))
            .or_else(|| self.var(name))
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self, device: &DeviceRecord) -> Result<Credentials> {
        let username = device
            .username
            .clone()
            .or_else(|| self.username())
            .ok_or_else(|| missing(device, "username"))?;

        let password = match device.password {
            Some(ref password) => copy_secret(password),
            None => self
                .device_var("PASSWORD", device)
                .map(SecretString::from)
                .ok_or_else(|| missing(device, "password"))?,
        };

        let secret = match device.secret {
            Some(ref secret) => Some(copy_secret(secret)),
            None => self.device_var("SECRET", device).map(SecretString::from),
        };

        Ok(Credentials {
            username,
            password,
            secret,
        })
    }
}

/// Asks for the password (and optionally an enable secret) once per run
/// and uses them for every device without its own.
pub struct PromptCredentials {
    username: Option<String>,
    password: SecretString,
    secret: Option<SecretString>,
}

impl PromptCredentials {
    /// Prompt on the terminal. `username` is the fallback for records
    /// without one; when `None` it is read from `NCM_USERNAME` or asked for.
    pub fn ask(username: Option<String>) -> anyhow::Result<Self> {
        let username = match username.or_else(|| EnvCredentials::from_env().username()) {
            Some(name) => name,
            None => dialoguer::Input::<String>::new()
                .with_prompt("SSH username")
                .interact_text()
                .context("reading username")?,
        };

        let password = dialoguer::Password::new()
            .with_prompt(format!("SSH password for {}", username))
            .interact()
            .context("reading password")?;

        let secret = dialoguer::Password::new()
            .with_prompt("Enable secret (empty for none)")
            .allow_empty_password(true)
            .interact()
            .context("reading enable secret")?;

        Ok(Self::new(
            Some(username),
            SecretString::from(password),
            Some(secret).filter(|s| !s.is_empty()).map(SecretString::from),
        ))
    }

    pub fn new(
        username: Option<String>,
        password: SecretString,
        secret: Option<SecretString>,
    ) -> Self {
        Self {
            username,
            password,
            secret,
        }
    }
}

impl CredentialProvider for PromptCredentials {
    fn credentials(&self, device: &DeviceRecord) -> Result<Credentials> {
        let username = device
            .username
            .clone()
            .or_else(|| self.username.clone())
            .ok_or_else(|| missing(device, "username"))?;

        Ok(Credentials {
            username,
            password: copy_secret(device.password.as_ref().unwrap_or(&self.password)),
            secret: device.secret.as_ref().or(self.secret.as_ref()).map(copy_secret),
        })
    }
}
