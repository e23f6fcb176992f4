//! Logged-in CLI sessions.

use std::time::{Duration, Instant};

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::channel::{Shell, Wire, last_line};
use crate::error::{Error, Result};
use crate::platform::Dialect;
use crate::transport::{SshWire, Target};

/// One command's output.
#[derive(Debug, Clone)]
pub struct Output {
    pub command: String,
    /// Output without the echoed command or the trailing prompt.
    pub text: String,
    /// The prompt that ended the output.
    pub prompt: String,
    pub elapsed: Duration,
    /// The CLI's error line, when the device rejected the command.
    pub rejection: Option<String>,
}

/// A shell sitting at the dialect's privileged prompt, paging disabled.
pub struct CliSession<W> {
    shell: Shell<W>,
    dialect: &'static Dialect,
}

impl CliSession<SshWire> {
    /// Log in over SSH and prepare the shell. `target.timeout` bounds each
    /// wait for a prompt.
    pub async fn connect(
        target: &Target,
        dialect: &'static Dialect,
        secret: Option<&SecretString>,
    ) -> Result<Self> {
        let wire = SshWire::open(target).await?;
        Self::start(wire, dialect, secret, target.timeout).await
    }
}

impl<W: Wire> CliSession<W> {
    /// Wait for the login prompt, run `enable` if needed, then the
    /// dialect's setup commands.
    ///
    /// On failure the wire is closed before the error is returned.
    pub async fn start(
        wire: W,
        dialect: &'static Dialect,
        secret: Option<&SecretString>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut session = Self {
            shell: Shell::new(wire, timeout),
            dialect,
        };

        match session.prepare(secret).await {
            Ok(()) => Ok(session),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    async fn prepare(&mut self, secret: Option<&SecretString>) -> Result<()> {
        let dialect = self.dialect;
        let greeting = self.shell.read_until(&dialect.prompt).await?;
        let prompt = last_line(&greeting);
        debug!("{}: login prompt '{}'", dialect.name, prompt);

        if !dialect.privileged.is_match(prompt.as_bytes()) {
            self.enable(prompt, secret).await?;
        }

        for command in dialect.setup_commands {
            let output = self.run(command).await?;
            if let Some(message) = output.rejection {
                return Err(Error::SetupRejected {
                    command: command.to_string(),
                    message,
                });
            }
        }
        Ok(())
    }

    async fn enable(&mut self, prompt: &str, secret: Option<&SecretString>) -> Result<()> {
        let dialect = self.dialect;
        let Some(ref enable) = dialect.enable else {
            return Err(Error::UnexpectedPrompt {
                prompt: prompt.to_string(),
                dialect: dialect.name,
            });
        };

        self.shell.write_line(enable.command).await?;
        let mut reply = self.shell.read_until(&enable.until).await?;

        if enable.password_prompt.is_match(last_line(&reply).as_bytes()) {
            let secret = secret.ok_or_else(|| Error::SecretMissing {
                command: enable.command.to_string(),
            })?;
            self.shell.write_hidden(secret.expose_secret()).await?;
            reply = self.shell.read_until(&enable.until).await?;
        }

        if dialect.privileged.is_match(last_line(&reply).as_bytes()) {
            debug!("{}: privileged prompt reached", dialect.name);
            Ok(())
        } else {
            Err(Error::SecretRejected {
                command: enable.command.to_string(),
            })
        }
    }

    /// Send `command` and collect its output up to the next prompt.
    ///
    /// A CLI error is reported in [`Output::rejection`], not as an `Err`.
    pub async fn run(&mut self, command: &str) -> Result<Output> {
        let dialect = self.dialect;
        let started = Instant::now();

        self.shell.write_line(command).await?;
        let raw = self.shell.read_until(&dialect.prompt).await?;
        let (text, prompt) = dialect.clean(&raw, command);

        let rejection = dialect.rejection(&text);
        if let Some(ref message) = rejection {
            warn!("{}: '{}' rejected: {}", dialect.name, command, message);
        }

        Ok(Output {
            command: command.to_string(),
            text,
            prompt,
            elapsed: started.elapsed(),
            rejection,
        })
    }

    pub async fn close(self) {
        self.shell.close().await;
    }
}
