//! Core types and value objects for the command pipeline.
//!
//! Defines intents, actions, plans, execution results, audit entries, and
//! context entries together with their supporting enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub use sara_core::types::PermissionLevel;

// =============================================================================
// Enums
// =============================================================================

/// Intent tags the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Time,
    Date,
    OpenApp,
    CloseApp,
    VolumeControl,
    BrightnessControl,
    Shutdown,
    Restart,
    Lock,
    SystemInfo,
    CreateFolder,
    DeleteFolder,
    CreateFile,
    DeleteFile,
    SearchFile,
    SearchWeb,
    Joke,
    Weather,
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Time => "time",
            IntentKind::Date => "date",
            IntentKind::OpenApp => "open_app",
            IntentKind::CloseApp => "close_app",
            IntentKind::VolumeControl => "volume_control",
            IntentKind::BrightnessControl => "brightness_control",
            IntentKind::Shutdown => "shutdown",
            IntentKind::Restart => "restart",
            IntentKind::Lock => "lock",
            IntentKind::SystemInfo => "system_info",
            IntentKind::CreateFolder => "create_folder",
            IntentKind::DeleteFolder => "delete_folder",
            IntentKind::CreateFile => "create_file",
            IntentKind::DeleteFile => "delete_file",
            IntentKind::SearchFile => "search_file",
            IntentKind::SearchWeb => "search_web",
            IntentKind::Joke => "joke",
            IntentKind::Weather => "weather",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability tags an action can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SystemInfo,
    VolumeSet,
    BrightnessSet,
    SystemShutdown,
    SystemRestart,
    SystemLock,
    AppOpen,
    AppClose,
    FolderCreate,
    FolderDelete,
    FileCreate,
    FileDelete,
    FileSearch,
    WebSearch,
    Weather,
    Speak,
}

impl ActionKind {
    /// Every action tag, in declaration order.
    pub const ALL: [ActionKind; 16] = [
        ActionKind::SystemInfo,
        ActionKind::VolumeSet,
        ActionKind::BrightnessSet,
        ActionKind::SystemShutdown,
        ActionKind::SystemRestart,
        ActionKind::SystemLock,
        ActionKind::AppOpen,
        ActionKind::AppClose,
        ActionKind::FolderCreate,
        ActionKind::FolderDelete,
        ActionKind::FileCreate,
        ActionKind::FileDelete,
        ActionKind::FileSearch,
        ActionKind::WebSearch,
        ActionKind::Weather,
        ActionKind::Speak,
    ];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::SystemInfo => write!(f, "system_info"),
            ActionKind::VolumeSet => write!(f, "volume_set"),
            ActionKind::BrightnessSet => write!(f, "brightness_set"),
            ActionKind::SystemShutdown => write!(f, "system_shutdown"),
            ActionKind::SystemRestart => write!(f, "system_restart"),
            ActionKind::SystemLock => write!(f, "system_lock"),
            ActionKind::AppOpen => write!(f, "app_open"),
            ActionKind::AppClose => write!(f, "app_close"),
            ActionKind::FolderCreate => write!(f, "folder_create"),
            ActionKind::FolderDelete => write!(f, "folder_delete"),
            ActionKind::FileCreate => write!(f, "file_create"),
            ActionKind::FileDelete => write!(f, "file_delete"),
            ActionKind::FileSearch => write!(f, "file_search"),
            ActionKind::WebSearch => write!(f, "web_search"),
            ActionKind::Weather => write!(f, "weather"),
            ActionKind::Speak => write!(f, "speak"),
        }
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| format!("Unknown action kind: {}", s))
    }
}

/// What a `SystemInfo` action should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoKind {
    Time,
    Date,
    System,
}

impl fmt::Display for InfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoKind::Time => write!(f, "time"),
            InfoKind::Date => write!(f, "date"),
            InfoKind::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for InfoKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(InfoKind::Time),
            "date" => Ok(InfoKind::Date),
            "system" => Ok(InfoKind::System),
            _ => Err(format!("Unknown info type: {}", s)),
        }
    }
}

/// Direction of a volume or brightness change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Increase,
    Decrease,
    Mute,
    Unmute,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Increase => write!(f, "increase"),
            Adjustment::Decrease => write!(f, "decrease"),
            Adjustment::Mute => write!(f, "mute"),
            Adjustment::Unmute => write!(f, "unmute"),
        }
    }
}

impl std::str::FromStr for Adjustment {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(Adjustment::Increase),
            "decrease" => Ok(Adjustment::Decrease),
            "mute" => Ok(Adjustment::Mute),
            "unmute" => Ok(Adjustment::Unmute),
            _ => Err(format!("Unknown adjustment: {}", s)),
        }
    }
}

/// Lifecycle of a single plan execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl PlanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PlanStatus::Succeeded | PlanStatus::Failed | PlanStatus::Cancelled
        )
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStatus::Pending => write!(f, "pending"),
            PlanStatus::Running => write!(f, "running"),
            PlanStatus::Succeeded => write!(f, "succeeded"),
            PlanStatus::Failed => write!(f, "failed"),
            PlanStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Speaker of a context entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// The classified purpose of an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub entities: BTreeMap<String, String>,
    pub confidence: f32,
    /// The input exactly as received, before trimming or lower-casing.
    pub raw_text: String,
}

impl Intent {
    /// The fallback intent for input no rule recognises.
    pub fn unknown(raw_text: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Unknown,
            entities: BTreeMap::new(),
            confidence: 0.0,
            raw_text: raw_text.into(),
        }
    }

    pub fn entity(&self, key: &str) -> Option<&str> {
        self.entities.get(key).map(String::as_str)
    }
}

/// A single capability invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub parameters: BTreeMap<String, String>,
    pub permission_level: PermissionLevel,
    pub description: String,
}

impl Action {
    pub fn new(
        kind: ActionKind,
        permission_level: PermissionLevel,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            parameters: BTreeMap::new(),
            permission_level,
            description: description.into(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// An ordered, non-empty list of actions derived from one intent.
///
/// `requires_confirmation` is derived from the actions and cannot be set
/// independently: it is true exactly when some action carries a tier that
/// needs human approval. Plans serialize for logs and dumps but are only
/// ever built through [`Plan::new`] and [`Plan::then`].
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    id: Uuid,
    actions: Vec<Action>,
    description: String,
    requires_confirmation: bool,
    before_message: Option<String>,
    success_message: Option<String>,
}

impl Plan {
    /// Start a plan with its first action.
    pub fn new(description: impl Into<String>, first: Action) -> Self {
        let requires_confirmation = first.permission_level.requires_confirmation();
        Self {
            id: Uuid::new_v4(),
            actions: vec![first],
            description: description.into(),
            requires_confirmation,
            before_message: None,
            success_message: None,
        }
    }

    /// Append another action to run after the existing ones.
    pub fn then(mut self, action: Action) -> Self {
        self.requires_confirmation |= action.permission_level.requires_confirmation();
        self.actions.push(action);
        self
    }

    pub fn with_before_message(mut self, message: impl Into<String>) -> Self {
        self.before_message = Some(message.into());
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    pub fn before_message(&self) -> Option<&str> {
        self.before_message.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    /// The riskiest tier among the plan's actions.
    pub fn highest_permission(&self) -> PermissionLevel {
        self.actions
            .iter()
            .map(|a| a.permission_level)
            .max()
            .unwrap_or(PermissionLevel::Observe)
    }
}

/// What a capability handler reports back on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionOutput {
    pub message: Option<String>,
    pub data: BTreeMap<String, serde_json::Value>,
}

impl ActionOutput {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }
}

/// Outcome of executing a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub data: BTreeMap<String, serde_json::Value>,
}

impl ExecutionResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// One record of the audit trail.
///
/// The field names are the on-disk schema and must stay stable so logs
/// written by earlier runs keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub permission_level: PermissionLevel,
    pub approved: bool,
    #[serde(default)]
    pub result: Option<String>,
}

/// One turn of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

// =============================================================================
// Tests
// =============================================================================
