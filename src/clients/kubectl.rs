//! Cluster access through the kubectl binary

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use super::{ClientError, DrainOptions, Drainer, EventType, Node, NodeApi, ObjectRef};
use crate::runner;

/// Component name events are reported under
const EVENT_SOURCE: &str = "machine-config-daemon";

#[derive(Debug, Clone)]
pub struct Kubectl {
    bin: String,
}

impl Kubectl {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

/// `kubectl drain` arguments for a node list and policy
fn drain_args(nodes: &[Node], opts: &DrainOptions) -> Vec<String> {
    let mut args = vec!["drain".to_string()];
    args.extend(nodes.iter().map(|n| n.name().to_string()));
    if opts.force {
        args.push("--force".into());
    }
    if opts.delete_local_data {
        args.push("--delete-emptydir-data".into());
    }
    if opts.ignore_daemonsets {
        args.push("--ignore-daemonsets".into());
    }
    args.push(format!("--grace-period={}", opts.grace_period_seconds));
    args
}

/// Event manifest for `kubectl create -f -`
fn event_manifest(object: &ObjectRef, event_type: EventType, reason: &str, message: &str) -> Value {
    let now = Utc::now();
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let name = format!(
        "{}.{:x}",
        object.name,
        now.timestamp_nanos_opt().unwrap_or_default()
    );
    json!({
        "apiVersion": "v1",
        "kind": "Event",
        "metadata": { "name": name, "namespace": "default" },
        "involvedObject": {
            "kind": object.kind,
            "name": object.name,
            "uid": object.uid,
        },
        "type": event_type.as_str(),
        "reason": reason,
        "message": message,
        "source": { "component": EVENT_SOURCE },
        "firstTimestamp": timestamp,
        "lastTimestamp": timestamp,
        "count": 1,
    })
}

impl NodeApi for Kubectl {
    fn get_node(&self, name: &str) -> Result<Node, ClientError> {
        let out = runner::run_capture(&self.bin, &["get", "node", name, "-o", "json"]).map_err(
            |e| match e {
                ClientError::CommandFailed { ref stderr, .. } if stderr.contains("NotFound") => {
                    ClientError::NotFound(format!("node {name}"))
                }
                other => other,
            },
        )?;
        Ok(serde_json::from_str(&out)?)
    }

    fn record_event(&self, object: &ObjectRef, event_type: EventType, reason: &str, message: &str) {
        let manifest = event_manifest(object, event_type, reason, message);
        let body = manifest.to_string();
        if let Err(e) = runner::run_with_input(&self.bin, &["create", "-f", "-"], Some(body.as_bytes()))
        {
            log::warn!("Failed to record {} event {}: {}", event_type, reason, e);
        }
    }
}

impl Drainer for Kubectl {
    fn drain(&self, nodes: &[Node], opts: &DrainOptions) -> Result<(), ClientError> {
        let args = drain_args(nodes, opts);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        runner::run(&self.bin, &args)
    }
}
