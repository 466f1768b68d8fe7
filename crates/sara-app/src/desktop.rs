//! Real desktop automation.
//!
//! System load comes from `sysinfo`, browser work goes through `webbrowser`,
//! and volume, power, and app launching shell out to the platform's own
//! tools. File and folder commands are confined to the configured workspace
//! directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sara_action::automation::{
    clock_reading, load_summary, search_url, validate_entry_name, Automation,
};
use sara_action::{ActionError, Adjustment, InfoKind};
use sara_core::config::{expand_home, AutomationConfig};
use sysinfo::{Disks, ProcessesToUpdate, System};
use tokio::process::Command;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Cap on file search results; the walk stops once it is reached.
const MAX_SEARCH_RESULTS: usize = 10;

pub struct DesktopAutomation {
    workspace: PathBuf,
    search_url: String,
}

impl DesktopAutomation {
    pub fn new(workspace: impl Into<PathBuf>, search_url: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            search_url: search_url.into(),
        }
    }

    pub fn from_config(config: &AutomationConfig) -> Self {
        Self::new(expand_home(&config.workspace_dir), config.search_url.clone())
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// The search URL for `query`, percent-encoded into the template.
    pub fn search_url_for(&self, query: &str) -> String {
        search_url(&self.search_url, query)
    }

    fn entry(&self, name: &str) -> Result<PathBuf, ActionError> {
        Ok(self.workspace.join(validate_entry_name(name)?))
    }

    async fn ensure_workspace(&self) -> Result<(), ActionError> {
        tokio::fs::create_dir_all(&self.workspace).await?;
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), ActionError> {
        info!(url, "Opening browser");
        webbrowser::open(url)
            .map_err(|e| ActionError::CapabilityFailed(format!("Could not open browser: {}", e)))
    }
}

/// Run a platform tool to completion and fail on a non-zero exit.
async fn run(program: &str, args: &[&str]) -> Result<(), ActionError> {
    info!(program, ?args, "Running system command");
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| ActionError::CapabilityFailed(format!("Failed to run {}: {}", program, e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(ActionError::CapabilityFailed(format!(
            "{} exited with {}",
            program, status
        )))
    }
}

/// Platform command for a volume change, if the platform has one.
fn volume_command(adjustment: Adjustment) -> Option<(&'static str, Vec<&'static str>)> {
    if cfg!(target_os = "windows") {
        let args = match adjustment {
            Adjustment::Increase => vec!["changesysvolume", "2000"],
            Adjustment::Decrease => vec!["changesysvolume", "-2000"],
            Adjustment::Mute => vec!["mutesysvolume", "1"],
            Adjustment::Unmute => vec!["mutesysvolume", "0"],
        };
        Some(("nircmd.exe", args))
    } else if cfg!(target_os = "macos") {
        let script = match adjustment {
            Adjustment::Increase => {
                "set volume output volume ((output volume of (get volume settings)) + 10)"
            }
            Adjustment::Decrease => {
                "set volume output volume ((output volume of (get volume settings)) - 10)"
            }
            Adjustment::Mute => "set volume with output muted",
            Adjustment::Unmute => "set volume without output muted",
        };
        Some(("osascript", vec!["-e", script]))
    } else if cfg!(target_os = "linux") {
        let arg = match adjustment {
            Adjustment::Increase => "5%+",
            Adjustment::Decrease => "5%-",
            Adjustment::Mute => "mute",
            Adjustment::Unmute => "unmute",
        };
        Some(("amixer", vec!["-q", "set", "Master", arg]))
    } else {
        None
    }
}

fn power_command(action: &str) -> Option<(&'static str, Vec<&'static str>)> {
    let command = match (action, std::env::consts::OS) {
        ("shutdown", "windows") => ("shutdown", vec!["/s", "/t", "5"]),
        ("shutdown", _) => ("shutdown", vec!["-h", "now"]),
        ("restart", "windows") => ("shutdown", vec!["/r", "/t", "5"]),
        ("restart", _) => ("shutdown", vec!["-r", "now"]),
        ("lock", "windows") => ("rundll32.exe", vec!["user32.dll,LockWorkStation"]),
        ("lock", "macos") => ("pmset", vec!["displaysleepnow"]),
        ("lock", "linux") => ("xdg-screensaver", vec!["lock"]),
        _ => return None,
    };
    Some(command)
}

async fn run_power(action: &str) -> Result<(), ActionError> {
    let (program, args) = power_command(action).ok_or_else(|| {
        ActionError::Unsupported(format!("{} on {}", action, std::env::consts::OS))
    })?;
    run(program, &args).await
}

/// Depth-first walk of `root` collecting files whose name contains `needle`.
fn find_files(root: &Path, needle: &str, limit: usize) -> Vec<PathBuf> {
    let needle = needle.trim().to_lowercase();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(&needle)
        })
        .map(|entry| entry.into_path())
        .take(limit)
        .collect()
}

fn sample_load() -> String {
    let mut system = System::new();
    system.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_usage();
    system.refresh_memory();

    let memory = percent(system.used_memory(), system.total_memory());
    let disks = Disks::new_with_refreshed_list();
    let (total, available) = disks.list().iter().fold((0u64, 0u64), |(t, a), d| {
        (t + d.total_space(), a + d.available_space())
    });
    let disk = percent(total.saturating_sub(available), total);

    load_summary(system.global_cpu_usage(), memory, disk)
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

fn blocking_failed(e: tokio::task::JoinError) -> ActionError {
    ActionError::CapabilityFailed(format!("Background task failed: {}", e))
}

#[async_trait]
impl Automation for DesktopAutomation {
    async fn system_info(&self, kind: InfoKind) -> Result<String, ActionError> {
        if let Some(reading) = clock_reading(kind, &chrono::Local::now()) {
            return Ok(reading);
        }
        tokio::task::spawn_blocking(sample_load)
            .await
            .map_err(blocking_failed)
    }

    async fn adjust_volume(&self, adjustment: Adjustment) -> Result<(), ActionError> {
        let (program, args) = volume_command(adjustment)
            .ok_or_else(|| ActionError::Unsupported("volume control".to_string()))?;
        run(program, &args).await
    }

    async fn adjust_brightness(&self, adjustment: Adjustment) -> Result<(), ActionError> {
        if !cfg!(target_os = "linux") {
            return Err(ActionError::Unsupported("brightness control".to_string()));
        }
        let arg = match adjustment {
            Adjustment::Increase => "10%+",
            Adjustment::Decrease => "10%-",
            Adjustment::Mute | Adjustment::Unmute => {
                return Err(ActionError::InvalidParameters(format!(
                    "brightness cannot be set to {}",
                    adjustment
                )))
            }
        };
        run("brightnessctl", &["set", arg]).await
    }

    async fn open_app(&self, name: &str) -> Result<(), ActionError> {
        let name = name.trim();
        info!(app = name, "Launching application");
        let mut command = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", name]);
            c
        } else if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.args(["-a", name]);
            c
        } else {
            Command::new(name)
        };
        command
            .spawn()
            .map(|_| ())
            .map_err(|e| ActionError::CapabilityFailed(format!("Could not open {}: {}", name, e)))
    }

    async fn close_app(&self, name: &str) -> Result<(), ActionError> {
        let needle = name.trim().to_lowercase();
        let label = name.trim().to_string();
        let killed = tokio::task::spawn_blocking(move || {
            let mut system = System::new();
            system.refresh_processes(ProcessesToUpdate::All, true);
            system
                .processes()
                .values()
                .filter(|p| p.name().to_string_lossy().to_lowercase().contains(&needle))
                .filter(|p| p.kill())
                .count()
        })
        .await
        .map_err(blocking_failed)?;

        if killed == 0 {
            return Err(ActionError::CapabilityFailed(format!(
                "No running process matches '{}'",
                label
            )));
        }
        info!(app = %label, processes = killed, "Application closed");
        Ok(())
    }

    async fn create_folder(&self, name: &str) -> Result<PathBuf, ActionError> {
        let path = self.entry(name)?;
        self.ensure_workspace().await?;
        match tokio::fs::create_dir(&path).await {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ActionError::CapabilityFailed(
                format!("Folder '{}' already exists", name.trim()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_folder(&self, name: &str) -> Result<PathBuf, ActionError> {
        let path = self.entry(name)?;
        if !path.is_dir() {
            return Err(ActionError::CapabilityFailed(format!(
                "Folder '{}' does not exist",
                name.trim()
            )));
        }
        tokio::fs::remove_dir_all(&path).await?;
        Ok(path)
    }

    async fn create_file(&self, name: &str) -> Result<PathBuf, ActionError> {
        let path = self.entry(name)?;
        self.ensure_workspace().await?;
        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match created {
            Ok(_) => Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ActionError::CapabilityFailed(
                format!("File '{}' already exists", name.trim()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_file(&self, name: &str) -> Result<PathBuf, ActionError> {
        let path = self.entry(name)?;
        if !path.is_file() {
            return Err(ActionError::CapabilityFailed(format!(
                "File '{}' does not exist",
                name.trim()
            )));
        }
        tokio::fs::remove_file(&path).await?;
        Ok(path)
    }

    async fn search_files(&self, pattern: &str) -> Result<Vec<PathBuf>, ActionError> {
        let root = self.workspace.clone();
        let pattern = pattern.to_string();
        tokio::task::spawn_blocking(move || find_files(&root, &pattern, MAX_SEARCH_RESULTS))
            .await
            .map_err(blocking_failed)
    }

    async fn web_search(&self, query: &str) -> Result<String, ActionError> {
        let url = self.search_url_for(query);
        self.open_url(&url)?;
        Ok(url)
    }

    async fn weather(&self, location: Option<&str>) -> Result<String, ActionError> {
        let query = match location {
            Some(location) => format!("weather in {}", location),
            None => "weather".to_string(),
        };
        self.open_url(&self.search_url_for(&query))?;
        Ok(format!(
            "Showing the weather for {}",
            location.unwrap_or("your area")
        ))
    }

    async fn shutdown(&self) -> Result<(), ActionError> {
        run_power("shutdown").await
    }

    async fn restart(&self) -> Result<(), ActionError> {
        run_power("restart").await
    }

    async fn lock_screen(&self) -> Result<(), ActionError> {
        run_power("lock").await
    }
}
