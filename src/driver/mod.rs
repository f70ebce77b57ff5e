//! Ordered detach/reattach driver
//!
//! Runs one pass over the inventory per direction. Both passes sort each
//! instance's attachments ascending by device path and walk them in that
//! same order; the add pass is deliberately NOT the reverse of the remove
//! pass. Instance-to-instance ordering is unspecified since operations on
//! different instances are independent.
//!
//! Device-path preservation is best effort: the attach call carries only
//! the instance and volume ids, and the control plane picks the guest
//! device path on reattachment. Issuing attaches in the original
//! ascending device order is what restores sequential naming.

use crate::audit::AuditLog;
use crate::control_plane::ControlPlane;
use crate::error::{ReplugError, ReplugResult};
use crate::inventory::Inventory;
use console::style;
use serde::Serialize;
use tracing::warn;

/// Which pass is being driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Detach pass
    Remove,
    /// Attach pass
    Add,
}

impl Direction {
    /// The control-plane verb for this direction
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::Add => "add",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

/// What to do when a detach or attach call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep issuing calls
    Continue,
    /// Stop the pass at the first failure
    Abort,
}

impl FailurePolicy {
    /// Parse a config value ("continue" or "abort")
    pub fn parse(value: &str) -> ReplugResult<Self> {
        match value {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(ReplugError::User(format!(
                "Invalid on_failure policy: {}. Use continue or abort",
                other
            ))),
        }
    }
}

/// Outcome of one issued (or planned) call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "outcome", content = "detail")]
pub enum CallOutcome {
    /// Call returned success
    Succeeded,
    /// Call returned non-zero; detail is the failure message
    Failed(String),
    /// Dry run, call was printed but not issued
    Planned,
}

/// Record of one call in a pass, in issue order
#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    pub direction: Direction,
    pub instance_id: String,
    pub volume_id: String,
    pub device_path: String,
    pub command: String,
    #[serde(flatten)]
    pub outcome: CallOutcome,
}

/// Result of one full pass over the inventory
#[derive(Debug, Default, Serialize)]
pub struct PassReport {
    pub calls: Vec<CallReport>,
}

impl PassReport {
    /// Number of calls that returned non-zero
    pub fn failure_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c.outcome, CallOutcome::Failed(_)))
            .count()
    }

    /// Number of calls recorded, issued or planned
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

/// Options for a single pass
#[derive(Debug, Clone, Copy)]
pub struct PassOptions {
    /// Print commands without issuing them
    pub dry_run: bool,
    /// Continue-or-abort policy for failed calls
    pub policy: FailurePolicy,
}

/// Run one pass in the given direction over the whole inventory.
///
/// Prints the exact command line before each call so the operator can
/// audit (or replay) the sequence. Every call's outcome is recorded in
/// the returned report and in the audit log; under `FailurePolicy::Abort`
/// the first failure ends the pass with a `CallFailure`.
pub async fn run_pass(
    direction: Direction,
    inventory: &Inventory,
    client: &dyn ControlPlane,
    options: PassOptions,
    audit: &AuditLog,
) -> ReplugResult<PassReport> {
    let mut report = PassReport::default();

    for instance_id in inventory.instance_ids() {
        for attachment in inventory.sorted_attachments(instance_id) {
            let command = client.render_call(direction, instance_id, &attachment.volume_id);

            if options.dry_run {
                println!("{} {}", style("[plan]").dim(), command);
                report.calls.push(CallReport {
                    direction,
                    instance_id: instance_id.to_string(),
                    volume_id: attachment.volume_id.clone(),
                    device_path: attachment.device_path.clone(),
                    command,
                    outcome: CallOutcome::Planned,
                });
                continue;
            }

            println!("{}", command);

            let result = match direction {
                Direction::Remove => client.detach(instance_id, &attachment.volume_id).await,
                Direction::Add => client.attach(instance_id, &attachment.volume_id).await,
            };

            let outcome = match result {
                Ok(()) => {
                    audit
                        .log(
                            "call.succeeded",
                            &serde_json::json!({
                                "direction": direction,
                                "instance_id": instance_id,
                                "volume_id": attachment.volume_id,
                                "device_path": attachment.device_path,
                            }),
                        )
                        .await;
                    CallOutcome::Succeeded
                }
                Err(e) => {
                    audit
                        .log(
                            "call.failed",
                            &serde_json::json!({
                                "direction": direction,
                                "instance_id": instance_id,
                                "volume_id": attachment.volume_id,
                                "device_path": attachment.device_path,
                                "error": e.to_string(),
                            }),
                        )
                        .await;

                    if matches!(options.policy, FailurePolicy::Abort) {
                        return Err(e);
                    }

                    warn!(
                        "{} volume failed for {} / {}: {}",
                        direction, instance_id, attachment.volume_id, e
                    );
                    println!(
                        "  {} {}",
                        style("[FAIL]").red(),
                        style(e.to_string()).dim()
                    );
                    CallOutcome::Failed(e.to_string())
                }
            };

            report.calls.push(CallReport {
                direction,
                instance_id: instance_id.to_string(),
                volume_id: attachment.volume_id.clone(),
                device_path: attachment.device_path.clone(),
                command,
                outcome,
            });
        }
    }

    Ok(report)
}
