//! File and folder handler.
//!
//! Creation, deletion, and search inside the automation workspace. Names are
//! plain entry names; anything that looks like a path is rejected by the
//! automation layer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::automation::Automation;
use crate::error::ActionError;
use crate::handler::{required_param, ActionHandler};
use crate::types::{Action, ActionKind, ActionOutput};

pub struct FileSystemHandler {
    kind: ActionKind,
    automation: Arc<dyn Automation>,
}

impl FileSystemHandler {
    pub fn new(kind: ActionKind, automation: Arc<dyn Automation>) -> Self {
        Self { kind, automation }
    }

    fn param_key(&self) -> &'static str {
        match self.kind {
            ActionKind::FolderCreate | ActionKind::FolderDelete => "folder_name",
            _ => "file_name",
        }
    }
}

fn path_value(path: &std::path::Path) -> Value {
    Value::String(path.display().to_string())
}

#[async_trait]
impl ActionHandler for FileSystemHandler {
    fn action_kind(&self) -> ActionKind {
        self.kind
    }

    async fn execute(&self, action: &Action) -> Result<ActionOutput, ActionError> {
        let name = required_param(action, self.param_key())?;
        let output = match self.kind {
            ActionKind::FolderCreate => {
                let path = self.automation.create_folder(name).await?;
                ActionOutput::message(format!("Created folder: {}", name))
                    .with_data("path", path_value(&path))
            }
            ActionKind::FolderDelete => {
                let path = self.automation.delete_folder(name).await?;
                ActionOutput::message(format!("Deleted folder: {}", name))
                    .with_data("path", path_value(&path))
            }
            ActionKind::FileCreate => {
                let path = self.automation.create_file(name).await?;
                ActionOutput::message(format!("Created file: {}", name))
                    .with_data("path", path_value(&path))
            }
            ActionKind::FileDelete => {
                let path = self.automation.delete_file(name).await?;
                ActionOutput::message(format!("Deleted file: {}", name))
                    .with_data("path", path_value(&path))
            }
            ActionKind::FileSearch => {
                let matches = self.automation.search_files(name).await?;
                let message = match matches.len() {
                    0 => format!("No files found matching '{}'", name),
                    1 => format!("Found 1 file matching '{}'", name),
                    n => format!("Found {} files matching '{}'", n, name),
                };
                ActionOutput::message(message).with_data(
                    "matches",
                    Value::Array(matches.iter().map(|p| path_value(p)).collect()),
                )
            }
            other => return Err(ActionError::UnregisteredHandler(other)),
        };
        Ok(output)
    }

    fn describe(&self, action: &Action) -> String {
        let name = action.param(self.param_key()).unwrap_or("<unnamed>");
        match self.kind {
            ActionKind::FolderCreate => format!("Create folder '{}'", name),
            ActionKind::FolderDelete => format!("Delete folder '{}'", name),
            ActionKind::FileCreate => format!("Create file '{}'", name),
            ActionKind::FileDelete => format!("Delete file '{}'", name),
            _ => format!("Search files for '{}'", name),
        }
    }
}
