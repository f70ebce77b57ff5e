//! OpenStack CLI control-plane client
//!
//! Implements the ControlPlane trait by spawning the `openstack` binary.
//! Authentication is ambient: whatever session the calling shell carries
//! (sourced openrc or clouds.yaml) scopes every call.

use crate::config::Config;
use crate::control_plane::ControlPlane;
use crate::driver::Direction;
use crate::error::{ReplugError, ReplugResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Control plane backed by the OpenStack client CLI
pub struct OpenStackCli {
    cli: String,
    cloud: Option<String>,
}

impl OpenStackCli {
    /// Create a client from config
    pub fn new(config: &Config) -> Self {
        Self {
            cli: config.control_plane.cli.clone(),
            cloud: config.control_plane.cloud.clone(),
        }
    }

    /// Render the full command line for an argument list, for display
    pub fn render_command(&self, args: &[&str]) -> String {
        let mut parts = vec![self.cli.as_str()];
        if let Some(cloud) = &self.cloud {
            parts.push("--os-cloud");
            parts.push(cloud);
        }
        parts.extend_from_slice(args);
        parts.join(" ")
    }

    /// Execute a CLI command and return the output
    async fn exec(&self, args: &[&str]) -> ReplugResult<std::process::Output> {
        let mut command = Command::new(&self.cli);
        if let Some(cloud) = &self.cloud {
            command.args(["--os-cloud", cloud]);
        }
        command.args(args);

        debug!("Executing: {} {:?}", self.cli, args);

        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ReplugError::command_failed(format!("{} {:?}", self.cli, args), e))
    }
}

#[async_trait]
impl ControlPlane for OpenStackCli {
    async fn is_available(&self) -> bool {
        Command::new(&self.cli)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn version(&self) -> ReplugResult<String> {
        let output = self.exec(&["--version"]).await?;
        let text = String::from_utf8_lossy(&output.stdout);
        // Some client versions print the version line on stderr
        let line = text
            .lines()
            .next()
            .map(str::to_string)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| {
                String::from_utf8_lossy(&output.stderr)
                    .lines()
                    .next()
                    .unwrap_or("unknown")
                    .to_string()
            });
        Ok(line)
    }

    async fn list_volumes(&self) -> ReplugResult<String> {
        let output = self.exec(&["volume", "list", "-f", "csv"]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReplugError::query(format!(
                "volume list exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn detach(&self, instance_id: &str, volume_id: &str) -> ReplugResult<()> {
        self.server_volume_call(Direction::Remove, instance_id, volume_id)
            .await
    }

    async fn attach(&self, instance_id: &str, volume_id: &str) -> ReplugResult<()> {
        self.server_volume_call(Direction::Add, instance_id, volume_id)
            .await
    }

    fn render_call(&self, direction: Direction, instance_id: &str, volume_id: &str) -> String {
        self.render_command(&["server", direction.verb(), "volume", instance_id, volume_id])
    }
}

impl OpenStackCli {
    async fn server_volume_call(
        &self,
        direction: Direction,
        instance_id: &str,
        volume_id: &str,
    ) -> ReplugResult<()> {
        let output = self
            .exec(&["server", direction.verb(), "volume", instance_id, volume_id])
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ReplugError::CallFailure {
                direction,
                instance_id: instance_id.to_string(),
                volume_id: volume_id.to_string(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_cloud(cloud: Option<&str>) -> OpenStackCli {
        let mut config = Config::default();
        config.control_plane.cloud = cloud.map(str::to_string);
        OpenStackCli::new(&config)
    }

    #[test]
    fn render_command_plain() {
        let client = client_with_cloud(None);
        assert_eq!(
            client.render_command(&["server", "remove", "volume", "i-1", "v-1"]),
            "openstack server remove volume i-1 v-1"
        );
    }

    #[test]
    fn render_command_with_cloud() {
        let client = client_with_cloud(Some("staging"));
        assert_eq!(
            client.render_command(&["volume", "list", "-f", "csv"]),
            "openstack --os-cloud staging volume list -f csv"
        );
    }
}
