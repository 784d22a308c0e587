//! Report fatal errors through the container termination log

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write `msg` to the termination log at `path`
///
/// The message is always logged; a failure to write the file is logged too
/// and otherwise ignored, since the process is about to exit anyway.
pub fn write_termination_error(path: &Path, msg: &str) {
    log::error!("Fatal error: {}", msg);

    let result = fs::write(path, msg)
        .and_then(|()| fs::set_permissions(path, fs::Permissions::from_mode(0o644)));
    if let Err(e) = result {
        log::error!(
            "Could not write termination log {}: {}",
            path.display(),
            e
        );
    }
}
