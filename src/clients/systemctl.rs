use super::{ClientError, LoginClient};
use crate::runner;

/// Reboots through `systemctl`, which hands the request to logind
#[derive(Debug, Clone, Copy, Default)]
pub struct Systemctl;

fn reboot_args(interactive: bool) -> Vec<&'static str> {
    let mut args = vec!["reboot"];
    if !interactive {
        args.push("--no-ask-password");
    }
    args
}

impl LoginClient for Systemctl {
    fn reboot(&self, interactive: bool) -> Result<(), ClientError> {
        runner::run("systemctl", &reboot_args(interactive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_reboot() {
        assert_eq!(reboot_args(false), vec!["reboot", "--no-ask-password"]);
        assert_eq!(reboot_args(true), vec!["reboot"]);
    }
}
