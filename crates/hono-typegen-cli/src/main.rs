// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand, ValueEnum};
use hono_typegen::HostCommand;
use hono_typegen_cli::commands;
use hono_typegen_cli::config::CONFIG_FILE;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hono-typegen")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "Keeps Hono client type declarations in sync with server sources", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CommandArg {
    Build,
    Serve,
}

impl From<CommandArg> for HostCommand {
    fn from(arg: CommandArg) -> Self {
        match arg {
            CommandArg::Build => HostCommand::Build,
            CommandArg::Serve => HostCommand::Serve,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Watch sources and regenerate declarations on change
    Dev {
        /// Mode passed to the plugins
        #[arg(long, default_value = "development")]
        mode: String,
    },
    /// Run a build; `--mode typegen` emits declarations
    Build {
        /// Build mode
        #[arg(long, default_value = "production")]
        mode: String,
    },
    /// Print the configuration override for a command and mode
    Config {
        /// Host command
        #[arg(long, value_enum, default_value = "build")]
        command: CommandArg,
        /// Host mode
        #[arg(long, default_value = "typegen")]
        mode: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Dev { mode } => {
            commands::dev::run(&cli.config, &cwd, &mode, cli.quiet).await
        }
        Commands::Build { mode } => {
            commands::build::run(&cli.config, &cwd, &mode).await
        }
        Commands::Config { command, mode } => {
            commands::config::run(&cli.config, &cwd, command.into(), &mode)
        }
    }
}
