//! Speak handler.
//!
//! Produces text for the speech sink. Nothing is spoken here; the
//! orchestrator delivers the result message to the user.

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{Action, ActionKind, ActionOutput};

pub struct SpeakHandler;

#[async_trait]
impl ActionHandler for SpeakHandler {
    fn action_kind(&self) -> ActionKind {
        ActionKind::Speak
    }

    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let text = action.param("text").unwrap_or("");
        Ok(ActionOutput::message(text))
    }

    fn describe(&self, action: &Action) -> String {
        format!("Say: {}", action.param("text").unwrap_or(""))
    }
}
