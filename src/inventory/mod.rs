//! Attachment inventory
//!
//! Builds the instance-to-volumes mapping from one volume listing. The
//! inventory is constructed once per run, never mutated afterwards, and
//! consumed read-only by both driver passes. Per-instance collections are
//! stored unordered; callers re-sort deterministically at use time so both
//! passes observe identical ordering.

mod parse;

pub use parse::{parse_attachment, parse_row, AttachmentTarget, VolumeRow};

use crate::error::{ReplugError, ReplugResult};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// One non-root volume attachment
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Attachment {
    /// Volume identifier, unique per volume
    pub volume_id: String,
    /// Volume display name, carried for output only
    pub volume_name: String,
    /// Guest-visible device path at the time of the listing
    pub device_path: String,
}

/// Mapping from instance id to its non-root attachments
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    instances: HashMap<String, Vec<Attachment>>,
}

impl Inventory {
    /// Build the inventory from raw listing text.
    ///
    /// Skips the header row, rows without an attachment descriptor, rows
    /// without a `/dev/` path, and rows attached at `root_device`. Fails
    /// fast on the first malformed row; nothing has been mutated at that
    /// point, so a parse failure is always safe.
    pub fn from_listing(listing: &str, root_device: &str) -> ReplugResult<Self> {
        if listing.trim().is_empty() {
            return Err(ReplugError::query("volume listing output was empty"));
        }

        let mut inventory = Self::default();

        for line in listing.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            let row = parse_row(line)?;
            let Some(target) = parse_attachment(&row.attached_to)? else {
                continue;
            };

            if target.device_path == root_device {
                debug!(
                    "Skipping root device {} on {}",
                    target.device_path, target.instance_id
                );
                continue;
            }

            inventory
                .instances
                .entry(target.instance_id)
                .or_default()
                .push(Attachment {
                    volume_id: row.volume_id,
                    volume_name: row.volume_name,
                    device_path: target.device_path,
                });
        }

        Ok(inventory)
    }

    /// Iterate instance ids in unspecified order
    pub fn instance_ids(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    /// Instance ids sorted for stable display
    pub fn instance_ids_sorted(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.instances.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// An instance's attachments sorted ascending by device path.
    ///
    /// Sorting happens here, at use time, so every consumer observes the
    /// same order regardless of listing order.
    pub fn sorted_attachments(&self, instance_id: &str) -> Vec<&Attachment> {
        let mut attachments: Vec<&Attachment> = self
            .instances
            .get(instance_id)
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        attachments.sort_by(|a, b| a.device_path.cmp(&b.device_path));
        attachments
    }

    /// Restrict the inventory to the given instance ids
    pub fn retain_instances(&mut self, keep: &[String]) {
        self.instances.retain(|id, _| keep.contains(id));
    }

    /// Number of instances with at least one non-root attachment
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Total number of attachments across all instances
    pub fn attachment_count(&self) -> usize {
        self.instances.values().map(Vec::len).sum()
    }

    /// True when no non-root attachments were found
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#""ID","Display Name","Status","Size","Attached to""#;

    fn listing(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn empty_listing_is_query_failure() {
        let err = Inventory::from_listing("", "/dev/vda").unwrap_err();
        assert!(matches!(err, ReplugError::QueryFailure { .. }));
    }

    #[test]
    fn header_only_listing_is_empty_inventory() {
        let inventory = Inventory::from_listing(HEADER, "/dev/vda").unwrap();
        assert!(inventory.is_empty());
        assert_eq!(inventory.attachment_count(), 0);
    }

    #[test]
    fn root_device_rows_are_excluded() {
        let text = listing(&[
            r#""vol-root","os","in-use","40","Attached to inst-1 on /dev/vda ""#,
            r#""vol-1","data","in-use","20","Attached to inst-1 on /dev/vdb ""#,
        ]);
        let inventory = Inventory::from_listing(&text, "/dev/vda").unwrap();
        assert_eq!(inventory.attachment_count(), 1);
        assert_eq!(
            inventory.sorted_attachments("inst-1")[0].volume_id,
            "vol-1"
        );
    }

    #[test]
    fn unattached_rows_are_excluded() {
        let text = listing(&[
            r#""vol-free","spare","available","10","""#,
            r#""vol-1","data","in-use","20","Attached to inst-1 on /dev/vdb ""#,
        ]);
        let inventory = Inventory::from_listing(&text, "/dev/vda").unwrap();
        assert_eq!(inventory.attachment_count(), 1);
    }

    #[test]
    fn configured_root_device_is_honored() {
        let text = listing(&[
            r#""vol-root","os","in-use","40","Attached to inst-1 on /dev/sda ""#,
        ]);
        let inventory = Inventory::from_listing(&text, "/dev/sda").unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn attachments_sort_ascending_by_device_path() {
        let text = listing(&[
            r#""vol-b","b","in-use","10","Attached to inst-1 on /dev/vdb ""#,
            r#""vol-d","d","in-use","10","Attached to inst-1 on /dev/vdd ""#,
            r#""vol-c","c","in-use","10","Attached to inst-1 on /dev/vdc ""#,
        ]);
        let inventory = Inventory::from_listing(&text, "/dev/vda").unwrap();
        let devices: Vec<&str> = inventory
            .sorted_attachments("inst-1")
            .iter()
            .map(|a| a.device_path.as_str())
            .collect();
        assert_eq!(devices, vec!["/dev/vdb", "/dev/vdc", "/dev/vdd"]);
    }

    #[test]
    fn instances_group_independently() {
        let text = listing(&[
            r#""v1","a","in-use","10","Attached to inst-a on /dev/vdb ""#,
            r#""v2","b","in-use","10","Attached to inst-b on /dev/vdb ""#,
        ]);
        let inventory = Inventory::from_listing(&text, "/dev/vda").unwrap();
        assert_eq!(inventory.instance_count(), 2);
        assert_eq!(inventory.sorted_attachments("inst-a").len(), 1);
        assert_eq!(inventory.sorted_attachments("inst-b").len(), 1);
    }

    #[test]
    fn malformed_row_fails_fast() {
        let text = listing(&[r#""vol-1","too","few""#]);
        let err = Inventory::from_listing(&text, "/dev/vda").unwrap_err();
        assert!(matches!(err, ReplugError::ParseFailure { .. }));
    }

    #[test]
    fn retain_instances_filters() {
        let text = listing(&[
            r#""v1","a","in-use","10","Attached to inst-a on /dev/vdb ""#,
            r#""v2","b","in-use","10","Attached to inst-b on /dev/vdb ""#,
        ]);
        let mut inventory = Inventory::from_listing(&text, "/dev/vda").unwrap();
        inventory.retain_instances(&["inst-b".to_string()]);
        assert_eq!(inventory.instance_ids_sorted(), vec!["inst-b"]);
    }
}
