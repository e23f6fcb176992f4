//! Cisco IOS / IOS-XE and NX-OS.

use super::{Dialect, Enable, no_noise, pattern};

const IOS_PROMPT: &str = r"(?m)^[\w.\-@/:]{1,63}[>#]\s?$";
const IOS_PRIVILEGED: &str = r"(?m)^[\w.\-@/:]{1,63}#\s?$";

const NXOS_PROMPT: &str = r"(?m)^[\w.\-]{1,63}(?:\(maint-mode\))?[>#]\s?$";
const NXOS_PRIVILEGED: &str = r"(?m)^[\w.\-]{1,63}(?:\(maint-mode\))?#\s?$";

pub(super) fn ios() -> Dialect {
    Dialect {
        name: "cisco_ios",
        aliases: &["cisco_xe"],
        prompt: pattern(IOS_PROMPT),
        privileged: pattern(IOS_PRIVILEGED),
        enable: Some(Enable::new(
            "enable",
            r"(?mi)^(?:enable\s)?password:\s?$",
            IOS_PROMPT,
        )),
        setup_commands: &["terminal length 0", "terminal width 511"],
        error_prefixes: &[
            "% Invalid",
            "% Incomplete",
            "% Ambiguous",
            "% Unknown command",
            "% Unrecognized",
        ],
        status_command: "show version",
        config_command: "show running-config",
        terminal_width: 511,
        noise: no_noise,
    }
}

pub(super) fn nxos() -> Dialect {
    Dialect {
        name: "cisco_nxos",
        aliases: &["nxos"],
        prompt: pattern(NXOS_PROMPT),
        privileged: pattern(NXOS_PRIVILEGED),
        enable: Some(Enable::new("enable", r"(?mi)^password:\s?$", NXOS_PROMPT)),
        setup_commands: &["terminal length 0", "terminal width 511"],
        error_prefixes: &["% Invalid", "% Incomplete", "% Ambiguous", "% Permission denied"],
        status_command: "show version",
        config_command: "show running-config",
        terminal_width: 511,
        noise: no_noise,
    }
}
