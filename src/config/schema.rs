//! Configuration schema for replug
//!
//! Configuration is stored at `~/.config/replug/config.toml`, optionally
//! overlaid by a project-local `.replug.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Control-plane CLI settings
    pub control_plane: ControlPlaneConfig,

    /// Detach/reattach cycle settings
    pub cycle: CycleConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            audit_log: true,
        }
    }
}

/// Control-plane CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// CLI binary to invoke
    pub cli: String,

    /// Named cloud passed as --os-cloud (empty = ambient session)
    pub cloud: Option<String>,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            cli: "openstack".to_string(),
            cloud: None,
        }
    }
}

/// Detach/reattach cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Root device path excluded from the inventory
    pub root_device: String,

    /// Policy when a detach or attach call fails: "continue" or "abort"
    pub on_failure: String,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            root_device: "/dev/vda".to_string(),
            on_failure: "continue".to_string(),
        }
    }
}
