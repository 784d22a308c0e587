//! Resource trait for declarative state management
//!
//! A Resource represents something that can be in a certain state,
//! and can be changed to reach a desired state.

use crate::context::ApplyContext;
use crate::types::{ApplyResult, ResourceState};
use std::fmt;

/// Core trait for declarative resources
///
/// Every resource provides:
/// - Identity (id, description, type)
/// - State detection (current vs desired)
/// - State convergence (apply)
///
/// The error type is chosen by the implementor so that callers can act on
/// typed failures instead of strings.
///
/// # Example
///
/// ```ignore
/// use declarative::{Resource, ResourceState, ApplyResult, ApplyContext};
///
/// #[derive(Debug)]
/// struct Motd {
///     content: String,
/// }
///
/// impl Resource for Motd {
///     type Error = std::io::Error;
///
///     fn id(&self) -> String {
///         "/etc/motd".into()
///     }
///
///     fn description(&self) -> String {
///         "Write /etc/motd".into()
///     }
///
///     fn resource_type(&self) -> &'static str {
///         "file"
///     }
///
///     fn current_state(&self) -> Result<ResourceState, Self::Error> {
///         match std::fs::read_to_string("/etc/motd") {
///             Ok(c) if c == self.content => Ok(ResourceState::Present { details: None }),
///             Ok(_) => Ok(ResourceState::Modified { from: "old".into(), to: "new".into() }),
///             Err(_) => Ok(ResourceState::Absent),
///         }
///     }
///
///     fn desired_state(&self) -> ResourceState {
///         ResourceState::Present { details: None }
///     }
///
///     fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult, Self::Error> {
///         if ctx.dry_run {
///             return Ok(ApplyResult::Skipped { reason: "Dry run".into() });
///         }
///         std::fs::write("/etc/motd", &self.content)?;
///         Ok(ApplyResult::Modified)
///     }
/// }
/// ```
pub trait Resource: fmt::Debug {
    /// Error produced when state detection or apply fails
    type Error;

    /// Unique identifier for this resource
    ///
    /// This should be stable and uniquely identify the resource
    /// within its type, e.g. the absolute path of a file.
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping and display
    fn resource_type(&self) -> &'static str;

    /// Detect the current state of this resource
    fn current_state(&self) -> Result<ResourceState, Self::Error>;

    /// Get the desired state for this resource
    fn desired_state(&self) -> ResourceState;

    /// Check if the resource needs changes to reach desired state
    ///
    /// Default implementation compares current and desired states.
    fn needs_apply(&self) -> Result<bool, Self::Error> {
        let current = self.current_state()?;
        let desired = self.desired_state();
        Ok(current != desired)
    }

    /// Apply changes to reach the desired state
    ///
    /// This method should respect `ctx.dry_run` (return `Skipped`), make
    /// the necessary changes and return the appropriate `ApplyResult`.
    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult, Self::Error>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource<E> = Box<dyn Resource<Error = E>>;
