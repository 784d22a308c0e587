//! # Ignition
//!
//! The machine configuration model consumed by the node agent.
//!
//! This crate provides:
//! - The `MachineConfig` envelope and the node config it carries (files,
//!   systemd units, users and groups, storage layout, network units)
//! - Schema versions as a closed enum, each with its own validator
//! - Decoding of inline file contents (data URLs, optional gzip)
//!
//! ## Example
//!
//! ```no_run
//! use ignition::MachineConfig;
//! use std::path::Path;
//!
//! let mc = MachineConfig::from_path(Path::new("rendered-worker.json"))?;
//! mc.validate()?;
//!
//! for file in &mc.spec.config.storage.files {
//!     let bytes = file.decoded_contents()?;
//!     println!("{} ({} bytes)", file.path, bytes.len());
//! }
//! # Ok::<(), ignition::Error>(())
//! ```

pub mod dataurl;
mod error;
mod types;
pub mod version;

pub use error::{Error, Result};
pub use types::{
    COMPRESSION_GZIP, Config, Dropin, File, FileContents, Ignition, MachineConfig,
    MachineConfigSpec, Networkd, NodeGroup, NodeUser, ObjectMeta, Passwd,
    PasswdGroup, PasswdUser, Storage, Systemd, Unit,
};
pub use version::SchemaVersion;
