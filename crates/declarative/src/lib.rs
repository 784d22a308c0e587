//! # Declarative
//!
//! A framework for declarative resource management.
//!
//! This crate provides the core abstractions for declaring desired state,
//! detecting current state, and converging a system to match it.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (files, units, keys)
//! - **ResourceState**: The current or desired state of a resource
//! - **ExecutionPlan**: An ordered list of resources
//! - **Executor**: Applies resources strictly in order, stopping at the first failure
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecutionPlan, ExecuteOptions, NoProgress, execute};
//!
//! let mut plan = ExecutionPlan::new();
//! plan.add_resource(Box::new(Motd { content: "hello".into() }));
//!
//! let summary = execute(&plan, &ExecuteOptions::default(), &mut NoProgress)?;
//! println!("{} changes", summary.total_changes());
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//!
//! This allows the crate to be used without hard dependencies on a
//! specific UI or logging setup.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, NoProgress, ProgressCallback};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use executor::execute;
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceState};
