//! Command pipeline orchestrator.
//!
//! Coordinates one utterance end to end: classification, planning, the
//! confirmation gate for high-risk plans, execution, and the spoken reply.
//! All state lives in explicit instances so separate assistants never share
//! history or audit trails.

use std::collections::BTreeMap;
use std::sync::Arc;

use sara_core::config::SaraConfig;
use tracing::info;

use crate::automation::Automation;
use crate::confirmation::{ConfirmationChannel, ConfirmationDecision, ConfirmationGate};
use crate::context::ContextStore;
use crate::execution::{Executor, PlanRun};
use crate::handler::ActionRegistry;
use crate::intent::IntentClassifier;
use crate::planner::PlanBuilder;
use crate::security::{open_store, SecurityGate, SecurityPolicy};
use crate::types::{ExecutionResult, Intent, PlanStatus, Role};

const CANCELLED_REPLY: &str = "Action cancelled.";
const EXECUTING_REPLY: &str = "Executing...";
const DONE_REPLY: &str = "Done!";

/// Fire-and-forget output to the user.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str);
}

/// What happened to the plan built for a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The plan ran; the result says whether every action succeeded.
    Completed(ExecutionResult),
    /// The plan was never started.
    Cancelled(ConfirmationDecision),
}

/// Everything the caller needs to know about one processed command.
#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub intent: Intent,
    pub outcome: CommandOutcome,
    /// The final line spoken to the user.
    pub reply: String,
}

impl CommandResponse {
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, CommandOutcome::Completed(r) if r.success)
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Cancelled(_))
    }
}

/// The assistant pipeline.
pub struct Assistant {
    classifier: IntentClassifier,
    planner: PlanBuilder,
    confirmation: ConfirmationGate,
    executor: Executor,
    security: Arc<SecurityGate>,
    context: Arc<ContextStore>,
}

impl Assistant {
    /// Assemble an assistant from already-built parts.
    pub fn new(
        confirmation: ConfirmationGate,
        registry: ActionRegistry,
        security: Arc<SecurityGate>,
        context: Arc<ContextStore>,
    ) -> Self {
        let executor = Executor::new(registry, security.clone(), context.clone());
        Self {
            classifier: IntentClassifier::new(),
            planner: PlanBuilder::new(),
            confirmation,
            executor,
            security,
            context,
        }
    }

    /// Build an assistant from configuration, driving `automation`.
    ///
    /// Loads the audit history from the configured store.
    pub fn from_config(config: &SaraConfig, automation: Arc<dyn Automation>) -> Self {
        let store = open_store(config.audit.format, config.audit_path());
        let security = Arc::new(SecurityGate::new(
            SecurityPolicy::from_config(&config.pipeline),
            store,
        ));
        let context = Arc::new(ContextStore::new(config.context.max_history));
        Self::new(
            ConfirmationGate::from_config(&config.pipeline),
            ActionRegistry::with_automation(automation),
            security,
            context,
        )
    }

    pub fn security(&self) -> &Arc<SecurityGate> {
        &self.security
    }

    pub fn context(&self) -> &Arc<ContextStore> {
        &self.context
    }

    /// Run one utterance through the pipeline.
    ///
    /// Never fails: every problem ends up as a failed or cancelled outcome
    /// with a reply explaining it, and the assistant is ready for the next
    /// command afterwards.
    pub async fn process_command(
        &self,
        text: &str,
        channel: &dyn ConfirmationChannel,
        sink: &dyn SpeechSink,
    ) -> CommandResponse {
        let intent = self.classifier.classify(text);
        let mut metadata = BTreeMap::new();
        metadata.insert("intent".to_string(), intent.kind.to_string());
        self.context.add_message(Role::User, text, metadata);

        let plan = self.planner.build(&intent);
        info!(
            intent = %intent.kind,
            confidence = intent.confidence,
            plan_id = %plan.id(),
            "Processing command"
        );

        if plan.requires_confirmation() {
            let decision = self.confirmation.confirm(channel, &plan).await;
            if !decision.is_approved() {
                let mut run = PlanRun::new(plan.id());
                if let Err(e) = run.advance(PlanStatus::Cancelled) {
                    tracing::error!(plan_id = %plan.id(), error = %e, "Plan lifecycle violated");
                }
                info!(plan_id = %plan.id(), decision = %decision, "User cancelled action");
                return self.respond(
                    intent,
                    CommandOutcome::Cancelled(decision),
                    CANCELLED_REPLY.to_string(),
                    sink,
                );
            }
        }

        sink.speak(plan.before_message().unwrap_or(EXECUTING_REPLY));
        let result = self.executor.execute(&plan).await;

        let reply = if result.success {
            result
                .message
                .clone()
                .unwrap_or_else(|| DONE_REPLY.to_string())
        } else {
            format!(
                "Sorry, {}",
                result.error.as_deref().unwrap_or("something went wrong")
            )
        };
        self.respond(intent, CommandOutcome::Completed(result), reply, sink)
    }

    fn respond(
        &self,
        intent: Intent,
        outcome: CommandOutcome,
        reply: String,
        sink: &dyn SpeechSink,
    ) -> CommandResponse {
        sink.speak(&reply);
        self.context.add_assistant_message(&reply);
        CommandResponse {
            intent,
            outcome,
            reply,
        }
    }
}
