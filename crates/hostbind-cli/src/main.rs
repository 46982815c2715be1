use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;

use config::HostbindConfig;

#[derive(Parser)]
#[command(
    name = "hostbind",
    about = "hostbind: match resource requirements against host inventories",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to hostbind.toml (default: built-in settings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a requirement against a single host and print the partition.
    ///
    /// The host's remaining capacity per leaf is printed alongside the
    /// partition. Exits non-zero when the host cannot satisfy the
    /// requirement.
    Bind {
        /// Requirement document (.json or .toml)
        #[arg(short, long)]
        requirement: PathBuf,
        /// Host specification document (.json or .toml)
        #[arg(long)]
        host: PathBuf,
        /// Work tags visible to where-conditions
        #[arg(short, long)]
        tags: Option<PathBuf>,
    },
    /// Search a host inventory for a unit of work and print bind records.
    Search {
        /// Work document (.json or .toml)
        #[arg(short, long)]
        work: PathBuf,
        /// Host inventory document with a `hosts` list
        #[arg(long)]
        hosts: PathBuf,
        /// Hosts fetched per page (overrides [search].page_size)
        #[arg(short, long)]
        page_size: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hostbind=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = HostbindConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Bind { requirement, host, tags } => {
            commands::bind::bind(&requirement, &host, tags.as_deref(), &config)
        }
        Commands::Search { work, hosts, page_size } => {
            commands::search::search(&work, &hosts, page_size, &config)
        }
    }
}
