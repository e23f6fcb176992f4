//! Juniper JunOS.
//!
//! Operational mode already runs every command we need, so there is no
//! enable step. The CLI prints the routing-engine context (`{master:0}`)
//! on its own line above each prompt.

use super::{Dialect, pattern};

const PROMPT: &str = r"(?m)^[\w.\-@/:]{1,63}>\s?$";

pub(super) fn junos() -> Dialect {
    Dialect {
        name: "juniper_junos",
        aliases: &["juniper"],
        prompt: pattern(PROMPT),
        privileged: pattern(PROMPT),
        enable: None,
        setup_commands: &["set cli screen-length 0", "set cli screen-width 511"],
        error_prefixes: &["unknown command", "syntax error", "error:", "missing argument"],
        status_command: "show version",
        config_command: "show configuration",
        terminal_width: 511,
        noise: context_line,
    }
}

/// `{master:0}`, `{primary:node0}` and similar.
fn context_line(line: &str) -> bool {
    let line = line.trim();
    line.len() > 2 && line.starts_with('{') && line.ends_with('}') && !line.contains(' ')
}
