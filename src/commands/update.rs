//! `mcd update`: run one update cycle against this node

use anyhow::Result;
use dialoguer::Confirm;

use crate::Context;
use crate::cli::UpdateArgs;
use crate::clients::RpmOstree;
use crate::daemon::{NodeContext, UpdateOptions};
use crate::ui;

pub fn run(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let (old, new) = super::load_snapshots(&args.snapshots)?;
    let node_name = ctx.config.node_name(args.node.as_deref())?;
    let run_mode = super::run_mode(args.once);

    let node = NodeContext::detect(
        &node_name,
        run_mode,
        &super::paths(ctx),
        &RpmOstree::new(ctx.config.pivot.clone()),
    );

    if !ctx.quiet {
        ui::header("Machine config update");
        ui::kv("Node", &node.node_name);
        ui::kv("From", old.display_name());
        ui::kv("To", new.display_name());
        ui::kv("OS", &node.operating_system.to_string());
        if let Some(url) = &node.booted_os_image_url {
            ui::kv("Booted image", url);
        }
        ui::kv("Root", &ctx.config.root_mount.display().to_string());
        println!();
    }

    if args.dry_run {
        ui::warn("Dry run - no changes will be made");
    } else if !args.yes && !confirm_proceed()? {
        ui::info("Cancelled");
        return Ok(());
    }

    let daemon = super::build_daemon(ctx, run_mode);
    let opts = UpdateOptions {
        dry_run: args.dry_run,
        verbose: ctx.verbose > 0,
    };
    daemon.update_with(&node, &old, &new, &opts)?;

    // Only a dry run comes back without an error.
    ui::success("Dry run complete");
    Ok(())
}

fn confirm_proceed() -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt("Apply the config and reboot the node?")
        .default(false)
        .interact()?;
    Ok(confirmed)
}
