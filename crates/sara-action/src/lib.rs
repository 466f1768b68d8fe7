//! Command pipeline for the SARA desktop assistant.
//!
//! Turns a transcribed utterance into an intent, builds a plan of typed
//! actions, gates them through permission checks and human confirmation,
//! executes them through pluggable handlers, and keeps an audit trail and a
//! bounded conversation history.

pub mod automation;
pub mod confirmation;
pub mod context;
pub mod error;
pub mod execution;
pub mod handler;
pub mod intent;
pub mod orchestrator;
pub mod planner;
pub mod security;
pub mod types;

pub use automation::{Automation, SimulatedAutomation};
pub use confirmation::{ConfirmationChannel, ConfirmationDecision, ConfirmationGate};
pub use context::ContextStore;
pub use error::{ActionError, AuditError, PlanError};
pub use execution::{Executor, PlanRun};
pub use handler::{ActionHandler, ActionRegistry};
pub use intent::IntentClassifier;
pub use orchestrator::{Assistant, CommandOutcome, CommandResponse, SpeechSink};
pub use planner::PlanBuilder;
pub use security::{open_store, AuditStore, SecurityGate, SecurityPolicy};
pub use types::{
    Action, ActionKind, ActionOutput, Adjustment, AuditEntry, ContextEntry, ExecutionResult,
    InfoKind, Intent, IntentKind, PermissionLevel, Plan, PlanStatus, Role,
};
