use crate::clients::ClientError;
use std::io::Write;
use std::process::{Command, Stdio};

fn describe(cmd: &str, args: &[&str]) -> String {
    if args.is_empty() {
        cmd.to_string()
    } else {
        format!("{} {}", cmd, args.join(" "))
    }
}

/// Run a command and inherit stdio (shows output in real-time)
pub fn run(cmd: &str, args: &[&str]) -> Result<(), ClientError> {
    log::debug!("Running: {}", describe(cmd, args));
    let status = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(ClientError::CommandFailed {
            command: describe(cmd, args),
            stderr: format!("exited with {status}"),
        })
    }
}

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String, ClientError> {
    run_with_input(cmd, args, None)
}

/// Run a command with `input` on stdin and capture output
pub fn run_with_input(
    cmd: &str,
    args: &[&str],
    input: Option<&[u8]>,
) -> Result<String, ClientError> {
    log::debug!("Running: {}", describe(cmd, args));
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(input) = input
        && let Some(mut stdin) = child.stdin.take()
    {
        stdin.write_all(input)?;
    }

    let output = child.wait_with_output()?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(ClientError::CommandFailed {
            command: describe(cmd, args),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
