// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

/// `telagent gateway` subcommands.
#[derive(Subcommand, Debug)]
pub enum GatewayCommands {
    /// Start the gateway: carrier media endpoint, realtime-session bridge,
    /// and post-call notifier.
    Start {
        /// Path to the gateway config file.
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Print the effective gateway configuration and exit.
    ShowConfig {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

/// `telagent config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate the gateway config and tenant registry, reporting any
    /// errors without starting the gateway.
    Validate {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        #[arg(long, short = 'r')]
        registry: Option<PathBuf>,
    },
    /// Print the effective gateway configuration and exit.
    Show {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

/// `telagent business` subcommands.
#[derive(Subcommand, Debug)]
pub enum BusinessCommands {
    /// List configured tenants (businesses) in the registry.
    List {
        #[arg(long, short = 'r')]
        registry: Option<PathBuf>,
        /// Output as JSON instead of a formatted table.
        #[arg(long)]
        json: bool,
    },
    /// Show the full configuration for a single tenant.
    Show {
        /// Tenant id as it appears in the registry.
        id: String,
        #[arg(long, short = 'r')]
        registry: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Gateway: start the voice agent gateway or inspect its config.
    Gateway {
        #[command(subcommand)]
        command: GatewayCommands,
    },
    /// Config: validate or print the effective gateway configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Business: inspect the multi-tenant registry.
    Business {
        #[command(subcommand)]
        command: BusinessCommands,
    },
    /// Generate shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = "telagent",
    about = "Multi-tenant real-time voice agent gateway",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v = debug, -vv = trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "telagent", &mut std::io::stdout());
}
