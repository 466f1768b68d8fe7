//! Web search and weather handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::automation::Automation;
use crate::error::ActionError;
use crate::handler::{required_param, ActionHandler};
use crate::types::{Action, ActionKind, ActionOutput};

/// Opens a browser search for the `query` parameter.
pub struct WebSearchHandler {
    automation: Arc<dyn Automation>,
}

impl WebSearchHandler {
    pub fn new(automation: Arc<dyn Automation>) -> Self {
        Self { automation }
    }
}

#[async_trait]
impl ActionHandler for WebSearchHandler {
    fn action_kind(&self) -> ActionKind {
        ActionKind::WebSearch
    }

    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let query = required_param(action, "query")?;
        let url = self.automation.web_search(query).await?;
        Ok(ActionOutput::message(format!("Searching for: {}", query))
            .with_data("url", serde_json::Value::String(url)))
    }

    fn describe(&self, action: &Action) -> String {
        format!(
            "Search web for '{}'",
            action.param("query").unwrap_or("<no query>")
        )
    }
}

/// Reports the weather, optionally for a named `location`.
pub struct WeatherHandler {
    automation: Arc<dyn Automation>,
}

impl WeatherHandler {
    pub fn new(automation: Arc<dyn Automation>) -> Self {
        Self { automation }
    }
}

#[async_trait]
impl ActionHandler for WeatherHandler {
    fn action_kind(&self) -> ActionKind {
        ActionKind::Weather
    }

    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let location = action.param("location").filter(|l| !l.trim().is_empty());
        let report = self.automation.weather(location).await?;
        Ok(ActionOutput::message(report))
    }

    fn describe(&self, action: &Action) -> String {
        match action.param("location") {
            Some(location) => format!("Weather in {}", location),
            None => "Local weather".to_string(),
        }
    }
}
