//! Cycle command - detach then reattach all non-root volumes
//!
//! The inventory is built once before any mutation, so query and parse
//! failures always abort with zero state changed. Both passes consume
//! the same inventory; the add pass repeats the remove pass's ascending
//! device order.

use crate::audit::AuditLog;
use crate::cli::args::{CycleArgs, OnFailure};
use crate::config::Config;
use crate::control_plane::{ControlPlane, OpenStackCli};
use crate::driver::{run_pass, Direction, FailurePolicy, PassOptions, PassReport};
use crate::error::{ReplugError, ReplugResult};
use crate::inventory::Inventory;
use crate::ui::{self, TaskSpinner, UiContext};
use tracing::info;

/// Execute the cycle command
pub async fn execute(args: CycleArgs, config: &Config) -> ReplugResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let client = OpenStackCli::new(config);

    ui::intro(&ctx, "replug cycle");

    if !client.is_available().await {
        return Err(ReplugError::CliNotFound {
            name: config.control_plane.cli.clone(),
            hint: "not found on PATH".to_string(),
        });
    }

    let policy = resolve_policy(args.on_failure, config)?;
    let inventory = build_inventory(&ctx, &client, config, &args.instance).await?;

    if inventory.is_empty() {
        ui::outro_warn(&ctx, "No non-root attachments found; nothing to do");
        return Ok(());
    }

    ui::step_info(
        &ctx,
        &format!(
            "{} volume(s) across {} instance(s)",
            inventory.attachment_count(),
            inventory.instance_count()
        ),
    );

    if args.dry_run {
        return dry_run(&ctx, &inventory, &client, policy).await;
    }

    // Last stop before mutating the control plane
    let proceed = ui::confirm(
        &ctx,
        &format!(
            "Detach and reattach {} volume(s) on {} instance(s)?",
            inventory.attachment_count(),
            inventory.instance_count()
        ),
        false,
    )
    .await?;

    if !proceed {
        ui::outro_warn(&ctx, "Cancelled; no calls issued");
        return Ok(());
    }

    let audit = AuditLog::new(config);
    audit
        .log(
            "run.started",
            &serde_json::json!({
                "instances": inventory.instance_count(),
                "volumes": inventory.attachment_count(),
                "policy": config.cycle.on_failure,
            }),
        )
        .await;

    let options = PassOptions {
        dry_run: false,
        policy,
    };

    let remove_report = checked_pass(Direction::Remove, &inventory, &client, options, &audit).await?;
    let add_report = checked_pass(Direction::Add, &inventory, &client, options, &audit).await?;

    let failures = remove_report.failure_count() + add_report.failure_count();
    audit
        .log(
            "run.finished",
            &serde_json::json!({
                "calls": remove_report.call_count() + add_report.call_count(),
                "failures": failures,
            }),
        )
        .await;

    info!(
        "Cycle finished: {} calls, {} failures",
        remove_report.call_count() + add_report.call_count(),
        failures
    );

    if failures > 0 {
        ui::outro_error(
            &ctx,
            &format!("Cycle finished with {} failed call(s)", failures),
        );
        return Err(ReplugError::User(format!(
            "{} call(s) failed; see output above and the audit log",
            failures
        )));
    }

    ui::outro_success(
        &ctx,
        &format!(
            "Reattached {} volume(s) in device order",
            inventory.attachment_count()
        ),
    );
    Ok(())
}

/// Build the inventory from one live listing, with spinner feedback
async fn build_inventory(
    ctx: &UiContext,
    client: &OpenStackCli,
    config: &Config,
    instance_filter: &[String],
) -> ReplugResult<Inventory> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Querying volume listing...");

    let listing = match client.list_volumes().await {
        Ok(listing) => listing,
        Err(e) => {
            spinner.stop_error("Volume listing failed");
            return Err(e);
        }
    };

    let mut inventory = match Inventory::from_listing(&listing, &config.cycle.root_device) {
        Ok(inventory) => inventory,
        Err(e) => {
            spinner.stop_error("Volume listing unparseable");
            return Err(e);
        }
    };

    if !instance_filter.is_empty() {
        inventory.retain_instances(instance_filter);
    }

    spinner.stop(&format!(
        "Inventory built: {} attachment(s)",
        inventory.attachment_count()
    ));

    Ok(inventory)
}

/// Run one pass, recording an abort in the audit log before propagating
async fn checked_pass(
    direction: Direction,
    inventory: &Inventory,
    client: &dyn ControlPlane,
    options: PassOptions,
    audit: &AuditLog,
) -> ReplugResult<PassReport> {
    match run_pass(direction, inventory, client, options, audit).await {
        Ok(report) => Ok(report),
        Err(e) => {
            audit
                .log(
                    "run.aborted",
                    &serde_json::json!({
                        "direction": direction,
                        "error": e.to_string(),
                    }),
                )
                .await;
            Err(e)
        }
    }
}

/// Print both passes without issuing anything
async fn dry_run(
    ctx: &UiContext,
    inventory: &Inventory,
    client: &OpenStackCli,
    policy: FailurePolicy,
) -> ReplugResult<()> {
    let options = PassOptions {
        dry_run: true,
        policy,
    };
    let audit = AuditLog::disabled();

    let remove = run_pass(Direction::Remove, inventory, client, options, &audit).await?;
    let add = run_pass(Direction::Add, inventory, client, options, &audit).await?;

    ui::outro_success(
        ctx,
        &format!(
            "Dry run: {} call(s) planned, none issued",
            remove.call_count() + add.call_count()
        ),
    );
    Ok(())
}

/// Flag wins over config; the config string is validated either way
fn resolve_policy(flag: Option<OnFailure>, config: &Config) -> ReplugResult<FailurePolicy> {
    match flag {
        Some(OnFailure::Continue) => Ok(FailurePolicy::Continue),
        Some(OnFailure::Abort) => Ok(FailurePolicy::Abort),
        None => FailurePolicy::parse(&config.cycle.on_failure),
    }
}
