//! Action handler registry and trait definition.
//!
//! Defines the `ActionHandler` async trait and the registry the executor uses
//! to route each action tag to exactly one handler.

pub mod app;
pub mod file;
pub mod speak;
pub mod system;
pub mod web;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::automation::Automation;
use crate::error::ActionError;
use crate::types::{Action, ActionKind, ActionOutput};

/// Executes one kind of action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action tag this handler serves.
    fn action_kind(&self) -> ActionKind;

    /// Run the action. The error string is what the user is told.
    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError>;

    /// Short description of what `execute` would do, for logs.
    fn describe(&self, action: &Action) -> String;
}

/// Fetch a required, non-empty parameter.
pub(crate) fn required_param<'a>(action: &'a Action, key: &str) -> Result<&'a str, ActionError> {
    action
        .param(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ActionError::InvalidParameters(format!("missing {}", key)))
}

/// Tag-to-handler dispatch table.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every action tag, backed by `automation`.
    pub fn with_automation(automation: Arc<dyn Automation>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(system::SystemInfoHandler::new(automation.clone())));
        registry.register(Arc::new(system::LevelHandler::volume(automation.clone())));
        registry.register(Arc::new(system::LevelHandler::brightness(automation.clone())));
        for kind in [
            ActionKind::SystemShutdown,
            ActionKind::SystemRestart,
            ActionKind::SystemLock,
        ] {
            registry.register(Arc::new(system::PowerHandler::new(kind, automation.clone())));
        }
        for kind in [ActionKind::AppOpen, ActionKind::AppClose] {
            registry.register(Arc::new(app::AppHandler::new(kind, automation.clone())));
        }
        for kind in [
            ActionKind::FolderCreate,
            ActionKind::FolderDelete,
            ActionKind::FileCreate,
            ActionKind::FileDelete,
            ActionKind::FileSearch,
        ] {
            registry.register(Arc::new(file::FileSystemHandler::new(kind, automation.clone())));
        }
        registry.register(Arc::new(web::WebSearchHandler::new(automation.clone())));
        registry.register(Arc::new(web::WeatherHandler::new(automation)));
        registry.register(Arc::new(speak::SpeakHandler));
        registry
    }

    /// Register a handler, replacing any previous one for the same tag.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.action_kind(), handler);
    }

    pub fn get(&self, kind: ActionKind) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::SimulatedAutomation;
    use crate::types::PermissionLevel;

    #[test]
    fn test_with_automation_covers_every_kind() {
        let registry = ActionRegistry::with_automation(Arc::new(SimulatedAutomation::new()));
        assert_eq!(registry.len(), ActionKind::ALL.len());
        for kind in ActionKind::ALL {
            let handler = registry.get(kind).unwrap();
            assert_eq!(handler.action_kind(), kind);
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ActionRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains(ActionKind::Speak));
        assert!(registry.get(ActionKind::Speak).is_none());
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(speak::SpeakHandler));
        registry.register(Arc::new(speak::SpeakHandler));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_required_param() {
        let action = Action::new(ActionKind::AppOpen, PermissionLevel::Medium, "Open")
            .with_param("app_name", "  notepad ")
            .with_param("blank", "   ");
        assert_eq!(required_param(&action, "app_name").unwrap(), "notepad");

        let err = required_param(&action, "blank").unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters: missing blank");
        assert!(required_param(&action, "absent").is_err());
    }
}
