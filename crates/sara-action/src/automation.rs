//! Automation capability contract.
//!
//! The executor never touches the operating system directly. Every action
//! handler calls into an [`Automation`] implementation, which is either the
//! real desktop driver supplied by the application or the
//! [`SimulatedAutomation`] recorder used in tests and dry runs.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use sara_core::config::AutomationConfig;
use tracing::info;

use crate::error::ActionError;
use crate::types::{ActionKind, Adjustment, InfoKind};

/// One function per system capability the pipeline can drive.
#[async_trait]
pub trait Automation: Send + Sync {
    /// Human-readable answer to a time, date, or system-load query.
    async fn system_info(&self, kind: InfoKind) -> Result<String, ActionError>;

    async fn adjust_volume(&self, adjustment: Adjustment) -> Result<(), ActionError>;

    async fn adjust_brightness(&self, adjustment: Adjustment) -> Result<(), ActionError>;

    async fn open_app(&self, name: &str) -> Result<(), ActionError>;

    async fn close_app(&self, name: &str) -> Result<(), ActionError>;

    /// Create a folder and return where it was created.
    async fn create_folder(&self, name: &str) -> Result<PathBuf, ActionError>;

    async fn delete_folder(&self, name: &str) -> Result<PathBuf, ActionError>;

    async fn create_file(&self, name: &str) -> Result<PathBuf, ActionError>;

    async fn delete_file(&self, name: &str) -> Result<PathBuf, ActionError>;

    /// Paths whose file name contains `pattern`, case-insensitively.
    async fn search_files(&self, pattern: &str) -> Result<Vec<PathBuf>, ActionError>;

    /// Run a web search and return the URL that was opened.
    async fn web_search(&self, query: &str) -> Result<String, ActionError>;

    async fn weather(&self, location: Option<&str>) -> Result<String, ActionError>;

    async fn shutdown(&self) -> Result<(), ActionError>;

    async fn restart(&self) -> Result<(), ActionError>;

    async fn lock_screen(&self) -> Result<(), ActionError>;
}

/// Format a clock reading the way the assistant speaks it.
///
/// Returns `None` for [`InfoKind::System`], which needs live load figures.
pub fn clock_reading<Tz>(kind: InfoKind, now: &DateTime<Tz>) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match kind {
        InfoKind::Time => Some(now.format("The current time is %I:%M %p").to_string()),
        InfoKind::Date => Some(now.format("Today is %A, %B %d, %Y").to_string()),
        InfoKind::System => None,
    }
}

/// Format load percentages for a system-info answer.
pub fn load_summary(cpu: f32, memory: f32, disk: f32) -> String {
    format!(
        "CPU usage: {:.1}%, Memory usage: {:.1}%, Disk usage: {:.1}%",
        cpu, memory, disk
    )
}

/// Fill the `{query}` slot of a search URL template with the encoded query.
pub fn search_url(template: &str, query: &str) -> String {
    template.replace("{query}", &urlencoding::encode(query.trim()))
}

/// Reject names that could escape the workspace directory.
pub fn validate_entry_name(name: &str) -> Result<&str, ActionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ActionError::InvalidParameters(
            "name must not be empty".to_string(),
        ));
    }
    if name == "." || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ActionError::InvalidParameters(format!(
            "'{}' is not a plain file or folder name",
            name
        )));
    }
    Ok(name)
}

// =============================================================================
// Simulated
// =============================================================================

#[derive(Default)]
struct SimulatedState {
    calls: Vec<(ActionKind, String)>,
    failing: HashSet<ActionKind>,
    folders: BTreeSet<String>,
    files: BTreeSet<String>,
}

/// Automation that records every call instead of touching the system.
///
/// Folder and file operations act on an in-memory workspace so "already
/// exists" and "not found" behave as they would on disk. Any capability can
/// be forced to fail with [`SimulatedAutomation::fail_on`].
pub struct SimulatedAutomation {
    root: PathBuf,
    search_url: String,
    state: Mutex<SimulatedState>,
}

impl Default for SimulatedAutomation {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAutomation {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/simulated/workspace"),
            search_url: AutomationConfig::default().search_url,
            state: Mutex::new(SimulatedState::default()),
        }
    }

    /// Build search URLs from `template` instead of the default engine.
    pub fn with_search_url(mut self, template: impl Into<String>) -> Self {
        self.search_url = template.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every later call to `kind`'s capability fail.
    pub fn fail_on(&self, kind: ActionKind) {
        self.state().failing.insert(kind);
    }

    /// Every capability call so far, in order, with its target.
    pub fn calls(&self) -> Vec<(ActionKind, String)> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, kind: ActionKind) -> usize {
        self.state().calls.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Record the call and decide whether it should fail.
    fn invoke(
        &self,
        kind: ActionKind,
        target: &str,
    ) -> Result<MutexGuard<'_, SimulatedState>, ActionError> {
        let mut state = self.state();
        state.calls.push((kind, target.to_string()));
        info!(capability = %kind, target, "Simulated capability call");
        if state.failing.contains(&kind) {
            return Err(ActionError::CapabilityFailed(format!(
                "Simulated failure for {}",
                kind
            )));
        }
        Ok(state)
    }
}

#[async_trait]
impl Automation for SimulatedAutomation {
    async fn system_info(&self, kind: InfoKind) -> Result<String, ActionError> {
        self.invoke(ActionKind::SystemInfo, &kind.to_string())?;
        Ok(clock_reading(kind, &chrono::Local::now())
            .unwrap_or_else(|| load_summary(12.5, 41.0, 63.2)))
    }

    async fn adjust_volume(&self, adjustment: Adjustment) -> Result<(), ActionError> {
        self.invoke(ActionKind::VolumeSet, &adjustment.to_string())?;
        Ok(())
    }

    async fn adjust_brightness(&self, adjustment: Adjustment) -> Result<(), ActionError> {
        self.invoke(ActionKind::BrightnessSet, &adjustment.to_string())?;
        Ok(())
    }

    async fn open_app(&self, name: &str) -> Result<(), ActionError> {
        self.invoke(ActionKind::AppOpen, name)?;
        Ok(())
    }

    async fn close_app(&self, name: &str) -> Result<(), ActionError> {
        self.invoke(ActionKind::AppClose, name)?;
        Ok(())
    }

    async fn create_folder(&self, name: &str) -> Result<PathBuf, ActionError> {
        let mut state = self.invoke(ActionKind::FolderCreate, name)?;
        let name = validate_entry_name(name)?;
        if state.folders.contains(name) || state.files.contains(name) {
            return Err(ActionError::CapabilityFailed(format!(
                "Folder '{}' already exists",
                name
            )));
        }
        state.folders.insert(name.to_string());
        Ok(self.root.join(name))
    }

    async fn delete_folder(&self, name: &str) -> Result<PathBuf, ActionError> {
        let mut state = self.invoke(ActionKind::FolderDelete, name)?;
        let name = validate_entry_name(name)?;
        if !state.folders.remove(name) {
            return Err(ActionError::CapabilityFailed(format!(
                "Folder '{}' does not exist",
                name
            )));
        }
        Ok(self.root.join(name))
    }

    async fn create_file(&self, name: &str) -> Result<PathBuf, ActionError> {
        let mut state = self.invoke(ActionKind::FileCreate, name)?;
        let name = validate_entry_name(name)?;
        if state.files.contains(name) || state.folders.contains(name) {
            return Err(ActionError::CapabilityFailed(format!(
                "File '{}' already exists",
                name
            )));
        }
        state.files.insert(name.to_string());
        Ok(self.root.join(name))
    }

    async fn delete_file(&self, name: &str) -> Result<PathBuf, ActionError> {
        let mut state = self.invoke(ActionKind::FileDelete, name)?;
        let name = validate_entry_name(name)?;
        if !state.files.remove(name) {
            return Err(ActionError::CapabilityFailed(format!(
                "File '{}' does not exist",
                name
            )));
        }
        Ok(self.root.join(name))
    }

    async fn search_files(&self, pattern: &str) -> Result<Vec<PathBuf>, ActionError> {
        let state = self.invoke(ActionKind::FileSearch, pattern)?;
        let needle = pattern.to_lowercase();
        Ok(state
            .files
            .iter()
            .filter(|f| f.to_lowercase().contains(&needle))
            .map(|f| self.root.join(f))
            .collect())
    }

    async fn web_search(&self, query: &str) -> Result<String, ActionError> {
        self.invoke(ActionKind::WebSearch, query)?;
        Ok(search_url(&self.search_url, query))
    }

    async fn weather(&self, location: Option<&str>) -> Result<String, ActionError> {
        self.invoke(ActionKind::Weather, location.unwrap_or(""))?;
        Ok(format!(
            "Showing the weather for {}",
            location.unwrap_or("your area")
        ))
    }

    async fn shutdown(&self) -> Result<(), ActionError> {
        self.invoke(ActionKind::SystemShutdown, "")?;
        Ok(())
    }

    async fn restart(&self) -> Result<(), ActionError> {
        self.invoke(ActionKind::SystemRestart, "")?;
        Ok(())
    }

    async fn lock_screen(&self) -> Result<(), ActionError> {
        self.invoke(ActionKind::SystemLock, "")?;
        Ok(())
    }
}
