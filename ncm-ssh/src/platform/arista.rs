//! Arista EOS.

use super::{Dialect, Enable, no_noise, pattern};

const PROMPT: &str = r"(?m)^[\w.\-@/:]{1,63}[>#]\s?$";
const PRIVILEGED: &str = r"(?m)^[\w.\-@/:]{1,63}#\s?$";

pub(super) fn eos() -> Dialect {
    Dialect {
        name: "arista_eos",
        aliases: &["eos"],
        prompt: pattern(PROMPT),
        privileged: pattern(PRIVILEGED),
        enable: Some(Enable::new("enable", r"(?mi)^password:\s?$", PROMPT)),
        setup_commands: &["terminal length 0", "terminal width 32767"],
        error_prefixes: &[
            "% Invalid input",
            "% Incomplete command",
            "% Ambiguous command",
            "% Unavailable command",
            "% Authorization denied",
        ],
        status_command: "show version",
        config_command: "show running-config",
        terminal_width: 32767,
        noise: no_noise,
    }
}
