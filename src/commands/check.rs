//! `mcd check`: classify a config transition without touching the node

use anyhow::Result;

use crate::Context;
use crate::cli::CheckArgs;
use crate::daemon::{Error, NodeContext, OperatingSystem, classify};
use crate::ui;

pub fn run(ctx: &Context, args: CheckArgs) -> Result<()> {
    let (old, new) = super::load_snapshots(&args.snapshots)?;

    // Classification only looks at the configs and the run mode.
    let node = NodeContext {
        node_name: ctx.config.node_name.clone().unwrap_or_default(),
        booted_os_image_url: None,
        operating_system: OperatingSystem::Other(String::new()),
        run_mode: super::run_mode(args.once),
    };
    let verdict = classify(&node, &old, &new);

    if !ctx.quiet {
        ui::header("Config transition");
        ui::kv("From", old.display_name());
        ui::kv("To", new.display_name());
        if !verdict.ssh_changed_users.is_empty() {
            let users: Vec<&str> = verdict
                .ssh_changed_users
                .iter()
                .filter_map(|&i| new.spec.config.passwd.users.get(i))
                .map(|u| u.name.as_str())
                .collect();
            ui::kv("SSH keys", &users.join(", "));
        }
        println!();
    }

    if verdict.reconcilable {
        ui::success(&verdict.reason);
        Ok(())
    } else {
        Err(Error::Irreconcilable {
            reason: verdict.reason,
        }
        .into())
    }
}
