//! Execution engine - applies resources one at a time, in plan order
//!
//! The first failure stops execution: later resources are not attempted and
//! nothing already applied is rolled back.

use crate::context::{ApplyContext, ProgressCallback};
use crate::planner::ExecutionPlan;
use crate::types::{ExecuteOptions, ExecuteSummary};
use std::fmt::Display;

/// Execute a plan with the given options and progress callback
///
/// # Returns
/// Summary of execution results, or the error of the first resource that
/// failed to apply.
pub fn execute<E, P>(
    plan: &ExecutionPlan<E>,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<ExecuteSummary, E>
where
    E: Display,
    P: ProgressCallback,
{
    let mut summary = ExecuteSummary::default();
    if plan.is_empty() {
        return Ok(summary);
    }

    let ctx = ApplyContext::new(opts.dry_run, opts.verbose);

    progress.on_batch_start(plan.len());
    for resource in &plan.resources {
        let id = resource.id();
        progress.on_resource_start(&id, &resource.description());

        match resource.apply(&ctx) {
            Ok(result) => {
                progress.on_resource_complete(&id, &result);
                summary.add_result(&result);
            }
            Err(e) => {
                progress.on_resource_failed(&id, &e.to_string());
                return Err(e);
            }
        }
    }
    progress.on_batch_complete();

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::resource::Resource;
    use crate::types::{ApplyResult, ResourceState};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct TestResource {
        id: String,
        fail: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Resource for TestResource {
        type Error = String;

        fn id(&self) -> String {
            self.id.clone()
        }

        fn description(&self) -> String {
            format!("Test resource {}", self.id)
        }

        fn resource_type(&self) -> &'static str {
            "test"
        }

        fn current_state(&self) -> Result<ResourceState, String> {
            Ok(ResourceState::Absent)
        }

        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }

        fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult, String> {
            if ctx.dry_run {
                return Ok(ApplyResult::Skipped {
                    reason: "Dry run".into(),
                });
            }
            if self.fail {
                return Err(format!("{} failed", self.id));
            }
            self.log.borrow_mut().push(self.id.clone());
            Ok(ApplyResult::Created)
        }
    }

    fn build_plan(spec: &[(&str, bool)], log: &Rc<RefCell<Vec<String>>>) -> ExecutionPlan<String> {
        let mut plan = ExecutionPlan::new();
        for (id, fail) in spec {
            plan.add_resource(Box::new(TestResource {
                id: (*id).to_string(),
                fail: *fail,
                log: Rc::clone(log),
            }));
        }
        plan
    }

    #[test]
    fn test_execute_empty_plan() {
        let plan: ExecutionPlan<String> = ExecutionPlan::new();
        let result = execute(&plan, &ExecuteOptions::default(), &mut NoProgress).unwrap();
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn test_execute_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let plan = build_plan(&[("a", false), ("b", false), ("c", false)], &log);

        let result = execute(&plan, &ExecuteOptions::default(), &mut NoProgress).unwrap();
        assert_eq!(result.created, 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_execute_stops_at_first_failure() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let plan = build_plan(&[("a", false), ("b", true), ("c", false)], &log);

        let err = execute(&plan, &ExecuteOptions::default(), &mut NoProgress).unwrap_err();
        assert_eq!(err, "b failed");
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_execute_dry_run() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let plan = build_plan(&[("a", false), ("b", true)], &log);

        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = execute(&plan, &opts, &mut NoProgress).unwrap();
        assert_eq!(result.skipped, 2);
        assert!(log.borrow().is_empty());
    }
}
