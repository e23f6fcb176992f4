//! In-memory stand-ins for the network and the credential store.

use std::sync::Mutex;

use secrecy::SecretString;

use crate::credentials::{CredentialProvider, Credentials};
use crate::error::{Error, Result};
use crate::inventory::DeviceRecord;
use crate::session::SessionClient;

/// Answers every command from memory. Devices listed in `fail` time out.
#[derive(Default)]
pub struct FakeClient {
    fail: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeClient {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            fail: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    /// `(device, command)` pairs, in the order they were sent.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl SessionClient for FakeClient {
    async fn send_command(
        &self,
        device: &DeviceRecord,
        _credentials: &Credentials,
        command: &str,
    ) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((device.name.clone(), command.to_string()));

        if self.fail.contains(&device.name) {
            return Err(Error::ConnectTimeout(format!("{}:22", device.host)));
        }
        if command.starts_with("show version") {
            return Ok(format!(
                "{} Software, Version 15.2(4)M7, uptime is 3 weeks, 2 days\n{}",
                device.device_type,
                "x".repeat(200)
            ));
        }
        Ok(format!(
            "hostname {}\n!\ninterface Loopback0\n!\nend\n",
            device.name
        ))
    }
}

pub struct StaticCredentials;

impl CredentialProvider for StaticCredentials {
    fn credentials(&self, _device: &DeviceRecord) -> Result<Credentials> {
        Ok(Credentials {
            username: "netops".to_string(),
            password: SecretString::from("pw"),
            secret: None,
        })
    }
}

pub fn device(name: &str, device_type: &str) -> DeviceRecord {
    serde_yaml::from_str(&format!(
        "{{name: '{}', host: 192.0.2.10, device_type: {}}}",
        name, device_type
    ))
    .unwrap()
}

pub fn devices(names: &[&str]) -> Vec<DeviceRecord> {
    names.iter().map(|n| device(n, "cisco_ios")).collect()
}
