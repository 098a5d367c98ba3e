//! pfconf CLI
//!
//! Command-line front end for reconciling pfSense configuration entries.
//!
//! # Commands
//!
//! - `ldap` - Ensure an LDAP authentication server is present or absent
//! - `list` - List the authentication servers in the configuration
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// pfconf command-line configuration tools.
#[derive(Parser)]
#[command(name = "pfconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration document
    #[arg(global = true, short, long, default_value = "/conf/config.xml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure an LDAP authentication server is present or absent
    Ldap(commands::ldap::LdapArgs),

    /// List authentication servers
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ldap(args) => {
            commands::ldap::run(&cli.config, &args)?;
        }
        Commands::List { format } => {
            commands::list::run(&cli.config, &format)?;
        }
        Commands::Version => {
            println!("pfconf CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("pfconf Core v{}", pfconf_core::VERSION);
        }
    }

    Ok(())
}
