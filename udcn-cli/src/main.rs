use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

/// uDCN forwarding core command-line interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a FIB from the given routes and print its longest-prefix-match
    /// table. The table exists only for this invocation: there is no
    /// persistent forwarding daemon in this workspace.
    Fib {
        /// A route to register, as "<prefix>:<face>[:<cost>]" (cost defaults
        /// to 10). Repeat to register more than one route.
        #[clap(long = "route", value_name = "PREFIX:FACE[:COST]")]
        routes: Vec<String>,

        /// After registering the routes above, look up this name and print
        /// the next hops it resolves to.
        #[clap(long)]
        lookup: Option<String>,
    },

    /// Run a self-contained demo of Interest/Data forwarding and
    /// in-network variant derivation over in-memory faces.
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    match cli.command {
        Commands::Fib { routes, lookup } => commands::fib::handle_command(routes, lookup)?,
        Commands::Demo => commands::demo::run()?,
    }

    Ok(())
}
