use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "exlibris",
    about = "exlibris: federated reading log, storage-side tools",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with `scheme` and `domain`. Without it, SCHEME and DOMAIN
    /// are read from the environment.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify an IRI
    Resolve(ResolveArgs),
    /// Check whether this deployment hosts an IRI
    Owns(OwnsArgs),
    /// Mint a new read id for a user
    NewId(NewIdArgs),
    /// Show the effective configuration
    Config,
    /// Publish a read through an in-memory store and show the result
    Demo(DemoArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    pub iri: String,
}

#[derive(Args)]
pub struct OwnsArgs {
    pub iri: String,
}

#[derive(Args)]
pub struct NewIdArgs {
    #[arg(short, long)]
    pub user: String,
}

#[derive(Args)]
pub struct DemoArgs {
    #[arg(short, long, default_value = "reader")]
    pub user: String,
    /// Open Library work id
    #[arg(long, default_value = "OL893415W")]
    pub work: String,
    #[arg(long, default_value = "Dune")]
    pub title: String,
    #[arg(long)]
    pub year: Option<i32>,
    /// Author name; repeat for several
    #[arg(long)]
    pub author: Vec<String>,
}
