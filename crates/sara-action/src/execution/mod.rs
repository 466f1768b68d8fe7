//! Sequential, fail-fast plan execution.
//!
//! Each action is checked against the security gate, dispatched to its
//! handler, and audited exactly once. The first denial or failure halts the
//! plan; earlier successful actions are not rolled back.

pub mod state_machine;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::context::ContextStore;
use crate::error::ActionError;
use crate::handler::ActionRegistry;
use crate::security::SecurityGate;
use crate::types::{Action, ActionOutput, ExecutionResult, Plan, PlanStatus};
pub use state_machine::{validate_transition, PlanRun};

const DEFAULT_SUCCESS: &str = "Done";

/// Runs plans against the handler registry.
pub struct Executor {
    registry: ActionRegistry,
    security: Arc<SecurityGate>,
    context: Arc<ContextStore>,
}

impl Executor {
    pub fn new(
        registry: ActionRegistry,
        security: Arc<SecurityGate>,
        context: Arc<ContextStore>,
    ) -> Self {
        Self {
            registry,
            security,
            context,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Execute `plan` and report the outcome.
    ///
    /// Never panics and never returns early without an audit entry for the
    /// action that stopped the plan.
    pub async fn execute(&self, plan: &Plan) -> ExecutionResult {
        let mut run = PlanRun::new(plan.id());
        if let Err(e) = run.advance(PlanStatus::Running) {
            error!(plan_id = %plan.id(), error = %e, "Plan could not start");
            return ExecutionResult::failed(e.to_string());
        }
        info!(plan_id = %plan.id(), description = %plan.description(), "Executing plan");

        let mut data: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        let mut last_message: Option<String> = None;

        for (index, action) in plan.actions().iter().enumerate() {
            if !self
                .security
                .check_permission(&action.description, action.permission_level)
            {
                let message = format!("Permission denied for: {}", action.description);
                error!(plan_id = %plan.id(), step = index, "{}", message);
                self.security.log_action(
                    &action.description,
                    action.permission_level,
                    false,
                    Some("Permission denied"),
                );
                return self.finish(&mut run, plan, ExecutionResult::failed(message));
            }

            match self.dispatch(action).await {
                Ok(output) => {
                    self.security.log_action(
                        &action.description,
                        action.permission_level,
                        true,
                        Some("Success"),
                    );
                    data.extend(output.data);
                    if let Some(message) = output.message.filter(|m| !m.is_empty()) {
                        last_message = Some(message);
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(
                        plan_id = %plan.id(),
                        step = index,
                        action = %action.kind,
                        error = %message,
                        "Action failed, halting plan"
                    );
                    self.security.log_action(
                        &action.description,
                        action.permission_level,
                        true,
                        Some(&message),
                    );
                    let mut result = ExecutionResult::failed(message);
                    result.data = data;
                    return self.finish(&mut run, plan, result);
                }
            }
        }

        let message = plan
            .success_message()
            .map(str::to_string)
            .or(last_message)
            .unwrap_or_else(|| DEFAULT_SUCCESS.to_string());
        let mut result = ExecutionResult::succeeded(message);
        result.data = data;
        self.finish(&mut run, plan, result)
    }

    async fn dispatch(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let handler = self
            .registry
            .get(action.kind)
            .ok_or(ActionError::UnregisteredHandler(action.kind))?;
        info!(action = %action.kind, what = %handler.describe(action), "Executing action");
        handler.execute(action).await
    }

    fn finish(&self, run: &mut PlanRun, plan: &Plan, result: ExecutionResult) -> ExecutionResult {
        let status = if result.success {
            PlanStatus::Succeeded
        } else {
            PlanStatus::Failed
        };
        if let Err(e) = run.advance(status) {
            error!(plan_id = %plan.id(), error = %e, "Plan lifecycle violated");
        }

        self.context.set_variable("last_plan", plan.description());
        self.context.set_variable("last_status", status.to_string());
        info!(plan_id = %plan.id(), status = %status, "Plan finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::SimulatedAutomation;
    use crate::security::{JsonLinesAuditStore, SecurityPolicy};
    use crate::types::{ActionKind, PermissionLevel};

    struct Fixture {
        executor: Executor,
        automation: Arc<SimulatedAutomation>,
        security: Arc<SecurityGate>,
        context: Arc<ContextStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture_with_policy(policy: SecurityPolicy) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let automation = Arc::new(SimulatedAutomation::new());
        let security = Arc::new(SecurityGate::new(
            policy,
            Box::new(JsonLinesAuditStore::new(dir.path().join("audit.jsonl"))),
        ));
        let context = Arc::new(ContextStore::new(50));
        let executor = Executor::new(
            ActionRegistry::with_automation(automation.clone()),
            security.clone(),
            context.clone(),
        );
        Fixture {
            executor,
            automation,
            security,
            context,
            _dir: dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_policy(SecurityPolicy::default())
    }

    fn open_app(name: &str) -> Action {
        Action::new(
            ActionKind::AppOpen,
            PermissionLevel::Medium,
            format!("Open {}", name),
        )
        .with_param("app_name", name)
    }

    #[tokio::test]
    async fn test_single_action_success_audited() {
        let f = fixture();
        let plan = Plan::new("open notepad", open_app("notepad"));
        let result = f.executor.execute(&plan).await;

        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Opened notepad"));
        let entries = f.security.all_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "Open notepad");
        assert!(entries[0].approved);
        assert_eq!(entries[0].result.as_deref(), Some("Success"));
    }

    #[tokio::test]
    async fn test_success_message_wins_over_action_message() {
        let f = fixture();
        let plan = Plan::new("open notepad", open_app("notepad")).with_success_message("All set");
        let result = f.executor.execute(&plan).await;
        assert_eq!(result.message.as_deref(), Some("All set"));
    }

    #[tokio::test]
    async fn test_fail_fast_skips_remaining_actions() {
        let f = fixture();
        f.automation.fail_on(ActionKind::AppClose);

        let plan = Plan::new("three steps", open_app("a"))
            .then(
                Action::new(ActionKind::AppClose, PermissionLevel::Medium, "Close b")
                    .with_param("app_name", "b"),
            )
            .then(
                Action::new(ActionKind::SystemLock, PermissionLevel::Medium, "Lock screen"),
            );
        let result = f.executor.execute(&plan).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Simulated failure for app_close"));
        assert_eq!(f.automation.call_count(ActionKind::AppOpen), 1);
        assert_eq!(f.automation.call_count(ActionKind::AppClose), 1);
        assert_eq!(f.automation.call_count(ActionKind::SystemLock), 0);

        let entries = f.security.all_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].result.as_deref(), Some("Simulated failure for app_close"));
    }

    #[tokio::test]
    async fn test_permission_denied_halts_and_logs() {
        let f = fixture_with_policy(SecurityPolicy {
            max_level: PermissionLevel::Low,
        });
        let plan = Plan::new("open then speak", open_app("notepad")).then(
            Action::new(ActionKind::Speak, PermissionLevel::Observe, "Say hi")
                .with_param("text", "hi"),
        );
        let result = f.executor.execute(&plan).await;

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Permission denied for: Open notepad")
        );
        assert_eq!(f.automation.call_count(ActionKind::AppOpen), 0);

        let entries = f.security.all_entries();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].approved);
        assert_eq!(entries[0].result.as_deref(), Some("Permission denied"));
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_error_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let security = Arc::new(SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(JsonLinesAuditStore::new(dir.path().join("audit.jsonl"))),
        ));
        let executor = Executor::new(
            ActionRegistry::new(),
            security.clone(),
            Arc::new(ContextStore::new(10)),
        );
        let plan = Plan::new(
            "speak",
            Action::new(ActionKind::Speak, PermissionLevel::Observe, "Say hi"),
        );
        let result = executor.execute(&plan).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Action kind not registered: speak")
        );
        assert_eq!(security.len(), 1);
    }

    #[tokio::test]
    async fn test_data_is_merged_across_actions() {
        let f = fixture();
        let plan = Plan::new(
            "folder then search",
            Action::new(ActionKind::FolderCreate, PermissionLevel::Medium, "Create folder")
                .with_param("folder_name", "Docs"),
        )
        .then(
            Action::new(ActionKind::WebSearch, PermissionLevel::Low, "Search")
                .with_param("query", "rust"),
        );
        let result = f.executor.execute(&plan).await;
        assert!(result.success);
        assert!(result.data.contains_key("path"));
        assert!(result.data.contains_key("url"));
        assert_eq!(result.message.as_deref(), Some("Searching for: rust"));
    }

    #[tokio::test]
    async fn test_empty_message_falls_back_to_done() {
        let f = fixture();
        let plan = Plan::new(
            "say nothing",
            Action::new(ActionKind::Speak, PermissionLevel::Observe, "Say nothing"),
        );
        let result = f.executor.execute(&plan).await;
        assert_eq!(result.message.as_deref(), Some("Done"));
    }

    #[tokio::test]
    async fn test_context_variables_record_last_plan() {
        let f = fixture();
        f.automation.fail_on(ActionKind::AppOpen);
        let plan = Plan::new("open notepad", open_app("notepad"));
        f.executor.execute(&plan).await;
        assert_eq!(f.context.get_variable("last_plan", ""), "open notepad");
        assert_eq!(f.context.get_variable("last_status", ""), "failed");
    }
}
