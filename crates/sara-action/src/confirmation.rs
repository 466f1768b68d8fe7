//! Human confirmation for high-risk plans.
//!
//! A plan that needs confirmation is suspended at this gate until the
//! operator answers or the timeout elapses. Only an explicit affirmative reply
//! approves it. Silence, a closed channel, a negative word, or anything
//! ambiguous cancels the plan before any action runs.

use std::time::Duration;

use async_trait::async_trait;
use sara_core::config::PipelineConfig;
use tracing::{info, warn};

use crate::types::Plan;

/// Anything that can put a yes/no question to the operator.
#[async_trait]
pub trait ConfirmationChannel: Send + Sync {
    /// Pose `prompt` and wait for a reply. `None` means the channel closed.
    async fn ask(&self, prompt: &str) -> Option<String>;
}

/// How a confirmation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationDecision {
    Approved,
    Rejected,
    TimedOut,
}

impl ConfirmationDecision {
    pub fn is_approved(self) -> bool {
        self == ConfirmationDecision::Approved
    }
}

impl std::fmt::Display for ConfirmationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationDecision::Approved => write!(f, "approved"),
            ConfirmationDecision::Rejected => write!(f, "rejected"),
            ConfirmationDecision::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Lowercase, with typographic apostrophes folded to `'`.
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Gate that asks for and interprets confirmations.
pub struct ConfirmationGate {
    timeout: Duration,
    affirmative: Vec<String>,
    negative: Vec<String>,
}

impl ConfirmationGate {
    pub fn new(timeout: Duration, affirmative: Vec<String>, negative: Vec<String>) -> Self {
        Self {
            timeout,
            affirmative: affirmative.iter().map(|w| normalize(w)).collect(),
            negative: negative.iter().map(|w| normalize(w)).collect(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Duration::from_secs(config.confirmation_timeout_secs),
            config.affirmative_words.clone(),
            config.negative_words.clone(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The question put to the operator for `plan`.
    pub fn prompt_for(plan: &Plan) -> String {
        format!("This will {}. Confirm?", plan.description())
    }

    /// Whether `reply` approves. Negative words win over affirmative ones.
    pub fn interpret(&self, reply: &str) -> bool {
        let lowered = normalize(reply);
        let words: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let said = |list: &[String]| words.iter().any(|w| list.iter().any(|l| l == w));
        !said(self.negative.as_slice()) && said(self.affirmative.as_slice())
    }

    /// Ask `channel` to confirm `plan` within the timeout.
    pub async fn confirm(
        &self,
        channel: &dyn ConfirmationChannel,
        plan: &Plan,
    ) -> ConfirmationDecision {
        let prompt = Self::prompt_for(plan);
        info!(plan_id = %plan.id(), prompt = %prompt, "Requesting confirmation");

        let decision = match tokio::time::timeout(self.timeout, channel.ask(&prompt)).await {
            Err(_) => ConfirmationDecision::TimedOut,
            Ok(None) => ConfirmationDecision::Rejected,
            Ok(Some(reply)) if self.interpret(&reply) => ConfirmationDecision::Approved,
            Ok(Some(_)) => ConfirmationDecision::Rejected,
        };

        if decision.is_approved() {
            info!(plan_id = %plan.id(), "Plan confirmed");
        } else {
            warn!(plan_id = %plan.id(), decision = %decision, "Plan not confirmed");
        }
        decision
    }
}
