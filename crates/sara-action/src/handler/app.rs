//! Application open/close handler.

use std::sync::Arc;

use async_trait::async_trait;

use crate::automation::Automation;
use crate::error::ActionError;
use crate::handler::{required_param, ActionHandler};
use crate::types::{Action, ActionKind, ActionOutput};

/// Opens or closes an application by name.
pub struct AppHandler {
    kind: ActionKind,
    automation: Arc<dyn Automation>,
}

impl AppHandler {
    pub fn new(kind: ActionKind, automation: Arc<dyn Automation>) -> Self {
        Self { kind, automation }
    }
}

#[async_trait]
impl ActionHandler for AppHandler {
    fn action_kind(&self) -> ActionKind {
        self.kind
    }

    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let name = required_param(action, "app_name")?;
        let message = match self.kind {
            ActionKind::AppOpen => {
                self.automation.open_app(name).await?;
                format!("Opened {}", name)
            }
            ActionKind::AppClose => {
                self.automation.close_app(name).await?;
                format!("Closed {}", name)
            }
            other => return Err(ActionError::UnregisteredHandler(other)),
        };
        tracing::info!(app = %name, kind = %self.kind, "Application handled");
        Ok(ActionOutput::message(message))
    }

    fn describe(&self, action: &Action) -> String {
        let verb = if self.kind == ActionKind::AppOpen {
            "Open"
        } else {
            "Close"
        };
        format!("{} {}", verb, action.param("app_name").unwrap_or("<no app>"))
    }
}
