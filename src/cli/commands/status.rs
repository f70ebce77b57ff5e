//! Status command - check control-plane CLI, session, and configuration

use crate::config::{Config, ConfigManager, LOCAL_CONFIG_NAME};
use crate::control_plane::{ControlPlane, OpenStackCli};
use crate::error::ReplugResult;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> ReplugResult<()> {
    println!("{}", style("replug System Status").bold().cyan());
    println!();

    let client = OpenStackCli::new(config);
    let mut all_ok = true;

    all_ok &= check_cli(&client, config).await;
    all_ok &= check_session(&client).await;
    check_configuration(config);

    println!();
    if all_ok {
        println!("{}", style("All critical checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details")
                .yellow()
                .bold()
        );
    }

    Ok(())
}

async fn check_cli(client: &OpenStackCli, config: &Config) -> bool {
    println!("{}", style("Control-plane CLI:").bold());

    if !client.is_available().await {
        println!(
            "  {} {} - Install: pip install python-openstackclient",
            CROSS,
            style(format!("{} not found", config.control_plane.cli)).red()
        );
        return false;
    }

    match client.version().await {
        Ok(version) => println!("  {} {}", CHECK, style(version).green()),
        Err(_) => println!("  {} {}", CHECK, style("Installed").green()),
    }

    if let Some(cloud) = &config.control_plane.cloud {
        println!("  {} Cloud: {}", CHECK, cloud);
    }

    true
}

async fn check_session(client: &OpenStackCli) -> bool {
    println!();
    println!("{}", style("Session:").bold());

    match client.list_volumes().await {
        Ok(listing) => {
            let rows = listing.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
            println!(
                "  {} {} ({} volume(s) visible)",
                CHECK,
                style("Listing succeeded").green(),
                rows
            );
            true
        }
        Err(e) => {
            println!(
                "  {} {} - {}",
                WARN,
                style("Listing failed").yellow(),
                e
            );
            println!("  {} Source your openrc or set control_plane.cloud", WARN);
            false
        }
    }
}

fn check_configuration(config: &Config) {
    println!();
    println!("{}", style("Configuration:").bold());

    let global = ConfigManager::default_config_path();
    if global.exists() {
        println!("  {} Global: {}", CHECK, global.display());
    } else {
        println!(
            "  {} Global: {} (defaults in effect)",
            WARN,
            global.display()
        );
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    match ConfigManager::find_local_config(&cwd) {
        Some(path) => println!("  {} Local: {}", CHECK, path.display()),
        None => println!("  {} Local: no {} found", WARN, LOCAL_CONFIG_NAME),
    }

    println!("  {} Root device: {}", CHECK, config.cycle.root_device);
    println!("  {} On failure: {}", CHECK, config.cycle.on_failure);
}
