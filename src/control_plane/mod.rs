//! Control-plane access for volume operations
//!
//! Provides a trait over the compute/storage control plane so the
//! inventory builder and driver stay independent of the `openstack`
//! binary. One live implementation exists; tests use a recording mock.

mod openstack;

pub use openstack::OpenStackCli;

use crate::driver::Direction;
use crate::error::ReplugResult;
use async_trait::async_trait;

/// Abstract control-plane interface
///
/// Every method maps to one blocking CLI invocation. Calls are issued
/// strictly one at a time; nothing here retries, times out, or verifies
/// that a previous mutation has settled.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Check if the control-plane CLI is available on this system
    async fn is_available(&self) -> bool;

    /// Get the CLI version line for display
    async fn version(&self) -> ReplugResult<String>;

    /// List all volumes visible to the calling session, as raw CSV text
    async fn list_volumes(&self) -> ReplugResult<String>;

    /// Detach a volume from an instance
    async fn detach(&self, instance_id: &str, volume_id: &str) -> ReplugResult<()>;

    /// Attach a volume to an instance
    ///
    /// The device path is deliberately not passed; the control plane
    /// picks (or reassigns) the guest device path on reattachment.
    async fn attach(&self, instance_id: &str, volume_id: &str) -> ReplugResult<()>;

    /// Render the exact command line a detach or attach call will issue,
    /// printed before each call for operator auditability
    fn render_call(&self, direction: Direction, instance_id: &str, volume_id: &str) -> String;
}
