//! OS image transitions via `pivot`, booted image via `rpm-ostree status`

use serde::Deserialize;

use super::{ClientError, OsUpdater};
use crate::runner;

const PIVOT_PREFIX: &str = "pivot://";

#[derive(Debug, Clone)]
pub struct RpmOstree {
    pivot: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    deployments: Vec<Deployment>,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    #[serde(default)]
    booted: bool,
    #[serde(default, rename = "custom-origin")]
    custom_origin: Vec<String>,
}

impl RpmOstree {
    pub fn new(pivot: impl Into<String>) -> Self {
        Self {
            pivot: pivot.into(),
        }
    }

    /// Image URL of the booted deployment; empty when it was not pivoted
    pub fn booted_image_url(&self) -> Result<String, ClientError> {
        let out = runner::run_capture("rpm-ostree", &["status", "--json"])?;
        parse_booted_image(&out)
    }
}

impl Default for RpmOstree {
    fn default() -> Self {
        Self::new("pivot")
    }
}

fn parse_booted_image(status_json: &str) -> Result<String, ClientError> {
    let status: Status = serde_json::from_str(status_json)?;
    let booted = status
        .deployments
        .into_iter()
        .find(|d| d.booted)
        .ok_or_else(|| ClientError::NotFound("booted deployment".into()))?;

    Ok(booted
        .custom_origin
        .into_iter()
        .next()
        .map(|url| match url.strip_prefix(PIVOT_PREFIX) {
            Some(image) => image.to_string(),
            None => url,
        })
        .unwrap_or_default())
}

impl OsUpdater for RpmOstree {
    fn apply_image(&self, image: &str) -> Result<(), ClientError> {
        runner::run(&self.pivot, &[image])
    }
}
