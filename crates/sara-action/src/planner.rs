//! Plan construction from classified intents.
//!
//! Each intent tag maps to exactly one template. Templates tag every action
//! with a permission tier and fill the user-facing messages from the intent's
//! entities. Building a plan never touches the system.

use tracing::debug;

use crate::types::{Action, ActionKind, Intent, IntentKind, PermissionLevel, Plan};

const JOKES: [&str; 4] = [
    "Why did the programmer quit his job? Because he didn't get arrays!",
    "There are only 10 kinds of people: those who understand binary and those who don't.",
    "A SQL query walks into a bar, goes up to two tables and asks: can I join you?",
    "Why do programmers prefer dark mode? Because light attracts bugs.",
];

/// Translates intents into executable plans.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanBuilder;

impl PlanBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the plan for `intent`.
    pub fn build(&self, intent: &Intent) -> Plan {
        let plan = match intent.kind {
            IntentKind::Time => Plan::new(
                "tell you the current time",
                info_action("time", "Get current time"),
            ),
            IntentKind::Date => Plan::new(
                "tell you the current date",
                info_action("date", "Get current date"),
            ),
            IntentKind::SystemInfo => Plan::new(
                "get system information",
                info_action("system", "Get system information"),
            ),
            IntentKind::OpenApp => {
                let app = entity(intent, "app_name");
                Plan::new(
                    format!("open {}", app),
                    Action::new(
                        ActionKind::AppOpen,
                        PermissionLevel::Medium,
                        format!("Open {}", app),
                    )
                    .with_param("app_name", app),
                )
                .with_before_message(format!("Opening {}", app))
            }
            IntentKind::CloseApp => {
                let app = entity(intent, "app_name");
                Plan::new(
                    format!("close {}", app),
                    Action::new(
                        ActionKind::AppClose,
                        PermissionLevel::Medium,
                        format!("Close {}", app),
                    )
                    .with_param("app_name", app),
                )
                .with_before_message(format!("Closing {}", app))
            }
            IntentKind::VolumeControl => adjustment_plan(intent, ActionKind::VolumeSet, "volume"),
            IntentKind::BrightnessControl => {
                adjustment_plan(intent, ActionKind::BrightnessSet, "brightness")
            }
            IntentKind::Shutdown => Plan::new(
                "shutdown your computer",
                Action::new(
                    ActionKind::SystemShutdown,
                    PermissionLevel::High,
                    "Shutdown computer",
                ),
            )
            .with_before_message("Shutting down now"),
            IntentKind::Restart => Plan::new(
                "restart your computer",
                Action::new(
                    ActionKind::SystemRestart,
                    PermissionLevel::High,
                    "Restart computer",
                ),
            )
            .with_before_message("Restarting now"),
            IntentKind::Lock => Plan::new(
                "lock your screen",
                Action::new(ActionKind::SystemLock, PermissionLevel::Medium, "Lock screen"),
            )
            .with_before_message("Locking screen"),
            IntentKind::CreateFolder => {
                let name = entity(intent, "folder_name");
                Plan::new(
                    format!("create a folder named {}", name),
                    Action::new(
                        ActionKind::FolderCreate,
                        PermissionLevel::Medium,
                        format!("Create folder '{}'", name),
                    )
                    .with_param("folder_name", name),
                )
                .with_success_message(format!("Folder {} created successfully", name))
            }
            IntentKind::DeleteFolder => {
                let name = entity(intent, "folder_name");
                Plan::new(
                    format!("delete the folder named {}", name),
                    Action::new(
                        ActionKind::FolderDelete,
                        PermissionLevel::High,
                        format!("Delete folder '{}'", name),
                    )
                    .with_param("folder_name", name),
                )
                .with_success_message(format!("Folder {} deleted", name))
            }
            IntentKind::CreateFile => {
                let name = entity(intent, "file_name");
                Plan::new(
                    format!("create a file named {}", name),
                    Action::new(
                        ActionKind::FileCreate,
                        PermissionLevel::Medium,
                        format!("Create file '{}'", name),
                    )
                    .with_param("file_name", name),
                )
                .with_success_message(format!("File {} created successfully", name))
            }
            IntentKind::DeleteFile => {
                let name = entity(intent, "file_name");
                Plan::new(
                    format!("delete the file named {}", name),
                    Action::new(
                        ActionKind::FileDelete,
                        PermissionLevel::High,
                        format!("Delete file '{}'", name),
                    )
                    .with_param("file_name", name),
                )
                .with_success_message(format!("File {} deleted", name))
            }
            IntentKind::SearchFile => {
                let name = entity(intent, "file_name");
                Plan::new(
                    format!("look for files matching {}", name),
                    Action::new(
                        ActionKind::FileSearch,
                        PermissionLevel::Observe,
                        format!("Search files for '{}'", name),
                    )
                    .with_param("file_name", name),
                )
            }
            IntentKind::SearchWeb => {
                let query = entity(intent, "query");
                Plan::new(
                    format!("search for {}", query),
                    Action::new(
                        ActionKind::WebSearch,
                        PermissionLevel::Low,
                        format!("Search web for '{}'", query),
                    )
                    .with_param("query", query),
                )
                .with_before_message(format!("Searching for {}", query))
            }
            IntentKind::Weather => {
                let mut action = Action::new(
                    ActionKind::Weather,
                    PermissionLevel::Observe,
                    "Get weather report",
                );
                let description = match intent.entity("location") {
                    Some(location) => {
                        action = action.with_param("location", location);
                        format!("check the weather in {}", location)
                    }
                    None => "check the weather".to_string(),
                };
                Plan::new(description, action)
            }
            IntentKind::Joke => {
                let joke = JOKES[intent.raw_text.len() % JOKES.len()];
                Plan::new(
                    "tell you a joke",
                    Action::new(ActionKind::Speak, PermissionLevel::Observe, "Tell a joke")
                        .with_param("text", joke),
                )
            }
            IntentKind::Unknown => Plan::new(
                "respond that I don't understand",
                Action::new(
                    ActionKind::Speak,
                    PermissionLevel::Observe,
                    "Respond to unknown command",
                )
                .with_param(
                    "text",
                    format!("I'm not sure how to help with: {}", intent.raw_text.trim()),
                ),
            ),
        };

        debug!(
            intent = %intent.kind,
            plan_id = %plan.id(),
            actions = plan.actions().len(),
            requires_confirmation = plan.requires_confirmation(),
            "Plan built"
        );
        plan
    }
}

fn entity<'a>(intent: &'a Intent, key: &str) -> &'a str {
    intent.entity(key).unwrap_or("")
}

fn info_action(info_type: &str, description: &str) -> Action {
    Action::new(ActionKind::SystemInfo, PermissionLevel::Observe, description)
        .with_param("info_type", info_type)
}

fn adjustment_plan(intent: &Intent, kind: ActionKind, target: &str) -> Plan {
    let direction = intent.entity("action").unwrap_or("increase");
    Plan::new(
        format!("{} the {}", direction, target),
        Action::new(
            kind,
            PermissionLevel::Low,
            format!("{} {}", capitalize(direction), target),
        )
        .with_param("action", direction),
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
