// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{BusinessCommands, Cli, Commands, ConfigCommands, GatewayCommands};
use telagent_config::TenantRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Gateway { command } => run_gateway_command(command).await,
        Commands::Config { command } => run_config_command(command).await,
        Commands::Business { command } => run_business_command(command).await,
        Commands::Completions { shell } => {
            cli::print_completions(*shell);
            Ok(())
        }
    }
}

async fn run_gateway_command(cmd: &GatewayCommands) -> anyhow::Result<()> {
    match cmd {
        GatewayCommands::Start { config: config_path } => {
            let gw_config = telagent_config::load_gateway_config(config_path.as_deref())
                .context("loading gateway config")?;
            let registry_file = telagent_config::load_registry(None)
                .context("loading tenant registry")?;
            let registry = TenantRegistry::new(registry_file)
                .context("validating tenant registry")?;
            telagent_gateway::run(gw_config, registry).await
        }
        GatewayCommands::ShowConfig { config: config_path } => {
            let gw_config = telagent_config::load_gateway_config(config_path.as_deref())
                .context("loading gateway config")?;
            println!("{}", serde_yaml::to_string(&gw_config).unwrap_or_default());
            Ok(())
        }
    }
}

async fn run_config_command(cmd: &ConfigCommands) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show { config: config_path } => {
            let gw_config = telagent_config::load_gateway_config(config_path.as_deref())
                .context("loading gateway config")?;
            println!("{}", serde_yaml::to_string(&gw_config).unwrap_or_default());
            Ok(())
        }
        ConfigCommands::Validate { config: config_path, registry } => {
            let gw_config = telagent_config::load_gateway_config(config_path.as_deref())
                .context("loading gateway config")?;
            let registry_file = telagent_config::load_registry(registry.as_deref())
                .context("loading tenant registry")?;
            let reg = TenantRegistry::new(registry_file).context("validating tenant registry")?;
            println!(
                "gateway config OK (bind {}), {} tenant(s) in registry",
                gw_config.http.bind,
                reg.tenant_ids().len()
            );
            Ok(())
        }
    }
}

async fn run_business_command(cmd: &BusinessCommands) -> anyhow::Result<()> {
    match cmd {
        BusinessCommands::List { registry, json } => {
            let registry_file = telagent_config::load_registry(registry.as_deref())
                .context("loading tenant registry")?;
            let reg = TenantRegistry::new(registry_file).context("validating tenant registry")?;
            let ids = reg.tenant_ids();
            if *json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                for id in ids {
                    println!("{id}");
                }
            }
            Ok(())
        }
        BusinessCommands::Show { id, registry } => {
            let registry_file = telagent_config::load_registry(registry.as_deref())
                .context("loading tenant registry")?;
            let reg = TenantRegistry::new(registry_file).context("validating tenant registry")?;
            let business = reg.get_config(id)?;
            println!("{}", serde_yaml::to_string(&business).unwrap_or_default());
            Ok(())
        }
    }
}

/// `telagent` is always a background/daemon-style process (no TUI to
/// corrupt), so tracing always goes to stderr, gated by verbosity and
/// `RUST_LOG`.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
