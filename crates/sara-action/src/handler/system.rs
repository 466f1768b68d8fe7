//! System handlers: info queries, volume and brightness, power control.

use std::sync::Arc;

use async_trait::async_trait;

use crate::automation::Automation;
use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{Action, ActionKind, ActionOutput, Adjustment, InfoKind};

/// Answers time, date, and system-load queries.
pub struct SystemInfoHandler {
    automation: Arc<dyn Automation>,
}

impl SystemInfoHandler {
    pub fn new(automation: Arc<dyn Automation>) -> Self {
        Self { automation }
    }
}

fn info_kind(action: &Action) -> Result<InfoKind, ActionError> {
    action
        .param("info_type")
        .unwrap_or("system")
        .parse()
        .map_err(ActionError::InvalidParameters)
}

#[async_trait]
impl ActionHandler for SystemInfoHandler {
    fn action_kind(&self) -> ActionKind {
        ActionKind::SystemInfo
    }

    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let kind = info_kind(action)?;
        let answer = self.automation.system_info(kind).await?;
        Ok(ActionOutput::message(answer)
            .with_data("info_type", serde_json::Value::String(kind.to_string())))
    }

    fn describe(&self, action: &Action) -> String {
        format!("Report {}", action.param("info_type").unwrap_or("system"))
    }
}

/// Volume or brightness adjustment.
pub struct LevelHandler {
    kind: ActionKind,
    automation: Arc<dyn Automation>,
}

impl LevelHandler {
    pub fn volume(automation: Arc<dyn Automation>) -> Self {
        Self {
            kind: ActionKind::VolumeSet,
            automation,
        }
    }

    pub fn brightness(automation: Arc<dyn Automation>) -> Self {
        Self {
            kind: ActionKind::BrightnessSet,
            automation,
        }
    }

    fn target(&self) -> &'static str {
        if self.kind == ActionKind::VolumeSet {
            "Volume"
        } else {
            "Brightness"
        }
    }
}

fn past_tense(adjustment: Adjustment) -> &'static str {
    match adjustment {
        Adjustment::Increase => "increased",
        Adjustment::Decrease => "decreased",
        Adjustment::Mute => "muted",
        Adjustment::Unmute => "unmuted",
    }
}

#[async_trait]
impl ActionHandler for LevelHandler {
    fn action_kind(&self) -> ActionKind {
        self.kind
    }

    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let adjustment: Adjustment = action
            .param("action")
            .unwrap_or("increase")
            .parse()
            .map_err(ActionError::InvalidParameters)?;

        if self.kind == ActionKind::VolumeSet {
            self.automation.adjust_volume(adjustment).await?;
        } else {
            if matches!(adjustment, Adjustment::Mute | Adjustment::Unmute) {
                return Err(ActionError::InvalidParameters(format!(
                    "brightness cannot be {}d",
                    adjustment
                )));
            }
            self.automation.adjust_brightness(adjustment).await?;
        }

        Ok(ActionOutput::message(format!(
            "{} {}",
            self.target(),
            past_tense(adjustment)
        )))
    }

    fn describe(&self, action: &Action) -> String {
        format!(
            "{} {}",
            action.param("action").unwrap_or("increase"),
            self.target().to_lowercase()
        )
    }
}

/// Shutdown, restart, and screen lock.
pub struct PowerHandler {
    kind: ActionKind,
    automation: Arc<dyn Automation>,
}

impl PowerHandler {
    /// `kind` must be one of the power tags.
    pub fn new(kind: ActionKind, automation: Arc<dyn Automation>) -> Self {
        debug_assert!(matches!(
            kind,
            ActionKind::SystemShutdown | ActionKind::SystemRestart | ActionKind::SystemLock
        ));
        Self { kind, automation }
    }
}

#[async_trait]
impl ActionHandler for PowerHandler {
    fn action_kind(&self) -> ActionKind {
        self.kind
    }

    async fn execute(&self, _action: &Action) -> Result<ActionOutput, ActionError> {
        let message = match self.kind {
            ActionKind::SystemShutdown => {
                self.automation.shutdown().await?;
                "Shutting down"
            }
            ActionKind::SystemRestart => {
                self.automation.restart().await?;
                "Restarting"
            }
            ActionKind::SystemLock => {
                self.automation.lock_screen().await?;
                "Screen locked"
            }
            other => return Err(ActionError::UnregisteredHandler(other)),
        };
        Ok(ActionOutput::message(message))
    }

    fn describe(&self, _action: &Action) -> String {
        match self.kind {
            ActionKind::SystemShutdown => "Shut down the computer".to_string(),
            ActionKind::SystemRestart => "Restart the computer".to_string(),
            _ => "Lock the screen".to_string(),
        }
    }
}
