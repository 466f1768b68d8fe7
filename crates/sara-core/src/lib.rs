pub mod config;
pub mod error;
pub mod types;

pub use config::{
    expand_home, AuditConfig, AuditFormat, AutomationConfig, AutomationMode, ContextConfig,
    GeneralConfig, PipelineConfig, SaraConfig,
};
pub use error::{Result, SaraError};
pub use types::PermissionLevel;
