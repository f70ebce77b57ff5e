//! Plan command - show the inventory without mutating anything

use crate::cli::args::{OutputFormat, PlanArgs};
use crate::config::Config;
use crate::control_plane::{ControlPlane, OpenStackCli};
use crate::error::{ReplugError, ReplugResult};
use crate::inventory::{Attachment, Inventory};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

/// Execute the plan command
pub async fn execute(args: PlanArgs, config: &Config) -> ReplugResult<()> {
    let client = OpenStackCli::new(config);

    if !client.is_available().await {
        return Err(ReplugError::CliNotFound {
            name: config.control_plane.cli.clone(),
            hint: "not found on PATH".to_string(),
        });
    }

    let listing = client.list_volumes().await?;
    let mut inventory = Inventory::from_listing(&listing, &config.cycle.root_device)?;

    if !args.instance.is_empty() {
        inventory.retain_instances(&args.instance);
    }

    if inventory.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No non-root attachments found");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&inventory),
        OutputFormat::Json => print_json(&inventory)?,
        OutputFormat::Plain => print_plain(&inventory),
    }

    Ok(())
}

/// One instance's planned processing order, for JSON output
#[derive(Serialize)]
struct InstancePlan<'a> {
    instance_id: &'a str,
    attachments: Vec<&'a Attachment>,
}

fn print_table(inventory: &Inventory) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Attachment inventory");

    println!(
        "{:<38} {:<12} {:<38} {:<20}",
        style("INSTANCE").bold(),
        style("DEVICE").bold(),
        style("VOLUME ID").bold(),
        style("NAME").bold()
    );
    println!("{}", "-".repeat(108));

    for instance_id in inventory.instance_ids_sorted() {
        for attachment in inventory.sorted_attachments(instance_id) {
            println!(
                "{:<38} {:<12} {:<38} {:<20}",
                instance_id, attachment.device_path, attachment.volume_id, attachment.volume_name
            );
        }
    }

    println!();
    println!(
        "{} attachment(s) on {} instance(s); each instance processed in the device order shown",
        inventory.attachment_count(),
        inventory.instance_count()
    );
}

fn print_json(inventory: &Inventory) -> ReplugResult<()> {
    let plans: Vec<InstancePlan> = inventory
        .instance_ids_sorted()
        .into_iter()
        .map(|instance_id| InstancePlan {
            instance_id,
            attachments: inventory.sorted_attachments(instance_id),
        })
        .collect();

    let json = serde_json::to_string_pretty(&plans)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(inventory: &Inventory) {
    for instance_id in inventory.instance_ids_sorted() {
        for attachment in inventory.sorted_attachments(instance_id) {
            println!(
                "{} {} {}",
                instance_id, attachment.device_path, attachment.volume_id
            );
        }
    }
}
