//! Listing-row parsing
//!
//! The volume listing arrives as comma-separated lines with a header row
//! and quoted fields: `"ID","Display Name","Status","Size","Attached to"`.
//! The last field is free text of the form
//! `Attached to <instance_id> on <device_path>`.

use crate::error::{ReplugError, ReplugResult};

/// One raw listing row, fields in listing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRow {
    pub volume_id: String,
    pub volume_name: String,
    pub status: String,
    pub size: String,
    pub attached_to: String,
}

/// Instance/device pair extracted from an attachment descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentTarget {
    pub instance_id: String,
    pub device_path: String,
}

/// Number of fields every listing row must carry
const FIELD_COUNT: usize = 5;

/// Token positions inside the attachment descriptor. The descriptor reads
/// `Attached to <instance_id> on <device_path>`; the control plane's text
/// format fixes instance id at token 2 and device path at token 4.
const INSTANCE_TOKEN: usize = 2;
const DEVICE_TOKEN: usize = 4;

/// Parse one listing row into its five fields.
///
/// Splitting is quote-aware: commas inside quoted fields do not split, and
/// doubled quotes inside a quoted field unescape to one quote. Any other
/// field count than five is a `ParseFailure` naming the line.
pub fn parse_row(line: &str) -> ReplugResult<VolumeRow> {
    let fields = split_fields(line)?;

    match <[String; FIELD_COUNT]>::try_from(fields) {
        Ok([volume_id, volume_name, status, size, attached_to]) => Ok(VolumeRow {
            volume_id,
            volume_name,
            status,
            size,
            attached_to,
        }),
        Err(fields) => Err(ReplugError::parse(
            line,
            format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        )),
    }
}

/// Extract the instance id and device path from an attachment descriptor.
///
/// Returns `None` for rows that are not attached at a guest device: an
/// empty descriptor, one without the `Attached to` marker, or one whose
/// text carries no `/dev/` path. A descriptor that claims an attachment
/// but is too short for the fixed token positions is a `ParseFailure`.
pub fn parse_attachment(descriptor: &str) -> ReplugResult<Option<AttachmentTarget>> {
    let descriptor = descriptor.trim();

    if descriptor.is_empty() || !descriptor.contains("Attached to") {
        return Ok(None);
    }
    if !descriptor.contains("/dev/") {
        return Ok(None);
    }

    let tokens: Vec<&str> = descriptor.split_whitespace().collect();
    if tokens.len() <= DEVICE_TOKEN {
        return Err(ReplugError::parse(
            descriptor,
            format!(
                "attachment descriptor has {} tokens, need at least {}",
                tokens.len(),
                DEVICE_TOKEN + 1
            ),
        ));
    }

    Ok(Some(AttachmentTarget {
        instance_id: tokens[INSTANCE_TOKEN].to_string(),
        device_path: tokens[DEVICE_TOKEN].to_string(),
    }))
}

/// Split a CSV line into unquoted fields.
///
/// Handles both quoted and bare fields; an unterminated quote is an error.
fn split_fields(line: &str) -> ReplugResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(ReplugError::parse(line, "unterminated quoted field"));
    }

    fields.push(current);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_row() {
        let row = parse_row(
            r#""vol-1","data-disk","in-use","20","Attached to inst-1 on /dev/vdb ""#,
        )
        .unwrap();
        assert_eq!(row.volume_id, "vol-1");
        assert_eq!(row.volume_name, "data-disk");
        assert_eq!(row.status, "in-use");
        assert_eq!(row.size, "20");
        assert_eq!(row.attached_to.trim(), "Attached to inst-1 on /dev/vdb");
    }

    #[test]
    fn parses_bare_numeric_field() {
        let row = parse_row(r#""vol-1","db","in-use",20,"Attached to i on /dev/vdc ""#).unwrap();
        assert_eq!(row.size, "20");
    }

    #[test]
    fn comma_inside_quotes_does_not_split() {
        let row =
            parse_row(r#""vol-1","db, primary","in-use","20","Attached to i on /dev/vdb ""#)
                .unwrap();
        assert_eq!(row.volume_name, "db, primary");
    }

    #[test]
    fn doubled_quote_unescapes() {
        let row = parse_row(r#""vol-1","say ""hi""","in-use","20","""#).unwrap();
        assert_eq!(row.volume_name, "say \"hi\"");
    }

    #[test]
    fn wrong_field_count_is_parse_failure() {
        let err = parse_row(r#""vol-1","name","in-use""#).unwrap_err();
        assert!(err.to_string().contains("expected 5 fields"));
    }

    #[test]
    fn unterminated_quote_is_parse_failure() {
        let err = parse_row(r#""vol-1,"name","in-use","20",""#).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn attachment_extracts_positional_tokens() {
        let target = parse_attachment("Attached to inst-42 on /dev/vdc ")
            .unwrap()
            .unwrap();
        assert_eq!(target.instance_id, "inst-42");
        assert_eq!(target.device_path, "/dev/vdc");
    }

    #[test]
    fn unattached_descriptor_is_none() {
        assert!(parse_attachment("").unwrap().is_none());
        assert!(parse_attachment("   ").unwrap().is_none());
    }

    #[test]
    fn descriptor_without_dev_path_is_none() {
        // The header row's column name lands here too
        assert!(parse_attachment("Attached to").unwrap().is_none());
        assert!(parse_attachment("Attached to inst-1 on cdrom").unwrap().is_none());
    }

    #[test]
    fn short_attachment_claim_is_parse_failure() {
        let err = parse_attachment("Attached to /dev/vdb").unwrap_err();
        assert!(err.to_string().contains("tokens"));
    }
}
