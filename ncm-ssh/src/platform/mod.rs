//! Vendor CLI dialects.
//!
//! A [`Dialect`] knows what a device's prompts look like, how to get from
//! the login prompt to the privileged one, which commands turn paging off,
//! and which commands show the version and the configuration.

mod arista;
mod cisco;
mod juniper;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::error::{Error, Result};

/// How many non-blank output lines are checked for a CLI error.
///
/// Devices report a rejected command right below the echo; anything
/// further down is command output, even if it reads like an error.
pub const ERROR_SCAN_LINES: usize = 5;

static DIALECTS: Lazy<Vec<Dialect>> =
    Lazy::new(|| vec![cisco::ios(), cisco::nxos(), arista::eos(), juniper::junos()]);

/// Look up a dialect by name or alias, ignoring case.
pub fn dialect(name: &str) -> Result<&'static Dialect> {
    DIALECTS
        .iter()
        .find(|d| d.answers_to(name))
        .ok_or_else(|| Error::UnknownDialect(name.to_string()))
}

/// Canonical names of every supported dialect.
pub fn names() -> impl Iterator<Item = &'static str> {
    DIALECTS.iter().map(|d| d.name)
}

/// The command that moves from the login prompt to the privileged prompt.
pub struct Enable {
    pub command: &'static str,
    pub password_prompt: Regex,
    /// Password prompt or any CLI prompt, whichever shows up first.
    pub until: Regex,
}

impl Enable {
    fn new(command: &'static str, password_prompt: &str, prompt: &str) -> Self {
        Self {
            command,
            password_prompt: pattern(password_prompt),
            until: pattern(&format!("(?:{})|(?:{})", password_prompt, prompt)),
        }
    }
}

pub struct Dialect {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Any prompt the session may sit at.
    pub prompt: Regex,
    /// The prompt commands are run from.
    pub privileged: Regex,
    /// `None` when login already lands at the privileged prompt.
    pub enable: Option<Enable>,
    /// Run once after login, before any other command.
    pub setup_commands: &'static [&'static str],
    /// Line prefixes the CLI uses to reject a command.
    pub error_prefixes: &'static [&'static str],
    pub status_command: &'static str,
    pub config_command: &'static str,
    pub terminal_width: u32,
    /// Lines the CLI prints around the prompt that are not output.
    noise: fn(&str) -> bool,
}

impl Dialect {
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Split what was read after sending `command` into the command's
    /// output and the prompt that ended it.
    ///
    /// The echoed command line, the prompt line and vendor noise lines are
    /// dropped. Non-empty output ends with a newline.
    pub fn clean(&self, raw: &str, command: &str) -> (String, String) {
        let mut lines: Vec<&str> = raw.lines().collect();
        let prompt = lines.pop().unwrap_or_default().trim().to_string();

        if lines
            .first()
            .is_some_and(|l| l.trim_end().ends_with(command.trim()))
        {
            lines.remove(0);
        }
        lines.retain(|l| !(self.noise)(*l));

        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        (text, prompt)
    }

    /// The CLI's error line, when `output` starts with one.
    ///
    /// Only the first [`ERROR_SCAN_LINES`] non-blank lines are checked, and
    /// a line counts only when it starts with one of the dialect's error
    /// prefixes, so configuration text quoting an error phrase is not
    /// mistaken for a failure.
    pub fn rejection(&self, output: &str) -> Option<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(ERROR_SCAN_LINES)
            .find(|l| self.error_prefixes.iter().any(|p| l.starts_with(p)))
            .map(str::to_string)
    }
}

fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("builtin prompt pattern is valid")
}

fn no_noise(_line: &str) -> bool {
    false
}
