//! `mcd diff`: preview the file and unit changes of a new config

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{DiffSummary, ResourceDiff, ResourceState, compute_diffs, group_by_type};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use crate::Context;
use crate::cli::DiffArgs;
use crate::daemon::{RunMode, reconcile::ssh_only_changes};
use crate::ui;

#[derive(Serialize)]
struct DiffReport<'a> {
    old: &'a str,
    new: &'a str,
    changes: &'a [ResourceDiff],
    ssh_changed_users: Vec<&'a str>,
}

pub fn run(ctx: &Context, args: DiffArgs) -> Result<()> {
    let (old, new) = super::load_snapshots(&args.snapshots)?;
    let daemon = super::build_daemon(ctx, RunMode::Once);

    let plan = daemon.plan(&new);
    let diffs = compute_diffs(&plan.resources).context("Could not inspect the node")?;

    let users = &new.spec.config.passwd.users;
    let ssh_changed_users: Vec<&str> = ssh_only_changes(&old.spec.config.passwd.users, users)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|i| users.get(i))
        .map(|u| u.name.as_str())
        .collect();

    if args.json {
        let report = DiffReport {
            old: old.display_name(),
            new: new.display_name(),
            changes: &diffs,
            ssh_changed_users,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ui::header(&format!(
        "{} -> {}",
        old.display_name(),
        new.display_name()
    ));

    let summary = DiffSummary::from_diffs(&diffs);
    if !summary.has_changes() && ssh_changed_users.is_empty() {
        ui::success("Node already matches the new config");
        return Ok(());
    }

    for (resource_type, group) in group_by_type(&diffs) {
        ui::section(&resource_type);
        for diff in group {
            print_diff(diff, ctx.verbose > 0);
        }
    }

    if !ssh_changed_users.is_empty() {
        ui::section("ssh_keys");
        for user in &ssh_changed_users {
            println!("  {} {}", "~".yellow(), user);
        }
    }

    println!();
    ui::info(&format!(
        "{} to add, {} to change",
        summary.additions,
        summary.modifications + ssh_changed_users.len()
    ));
    Ok(())
}

fn print_diff(diff: &ResourceDiff, show_content: bool) {
    match &diff.current {
        ResourceState::Absent => println!("  {} {}", "+".green(), diff.resource_id),
        ResourceState::Modified { from, to } => {
            println!("  {} {}", "~".yellow(), diff.resource_id);
            if show_content || from.starts_with("mode ") {
                print_unified(from, to);
            }
        }
        _ => println!("  {} {}", "~".yellow(), diff.resource_id),
    }
}

fn print_unified(from: &str, to: &str) {
    let diff = TextDiff::from_lines(from, to);
    for change in diff.iter_all_changes() {
        let line = change.value().trim_end_matches('\n');
        match change.tag() {
            ChangeTag::Delete => println!("    {}", format!("-{}", line).red()),
            ChangeTag::Insert => println!("    {}", format!("+{}", line).green()),
            ChangeTag::Equal => {}
        }
    }
}
