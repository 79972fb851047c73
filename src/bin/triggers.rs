//! Canonicalises trigger descriptors
//!
//! ```text
//! $ triggers "button1 CTRL" "a shift"
//! ctrl button1
//! shift A
//! ```

use std::io::{self, BufRead};
use std::process::ExitCode;

use anyhow::Context;
use behaviour_bindings::build_info;
use behaviour_bindings::config::BindingsConfig;
use behaviour_bindings::logging;
use behaviour_bindings::trigger::Trigger;
use clap::Parser;
use colored::Colorize;
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(name = "triggers", about = "Parse and canonicalise trigger descriptors")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Descriptors to canonicalise; read one per line from stdin when empty
    descriptors: Vec<String>,

    /// Also print the mask bits and held keys of each trigger
    #[arg(short, long)]
    explain: bool,

    /// Configuration profile (defaults to BINDINGS_PROFILE or "release")
    #[arg(short, long)]
    profile: Option<String>,

    /// Print build information and exit
    #[arg(short = 'V', long)]
    version: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if cli.version {
        println!("triggers {}", build_info::version_string());
        println!("{}", build_info::detailed_info());
        return Ok(ExitCode::SUCCESS);
    }

    let loaded = match &cli.profile {
        Some(profile) => BindingsConfig::load(profile),
        None => BindingsConfig::load_from_env(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("{} {e}, using defaults", "warning:".yellow().bold());
        BindingsConfig::default()
    });
    logging::init(&config.logging);
    debug!(profile = %config.profile, "Loaded configuration");

    let descriptors = if cli.descriptors.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .context("reading descriptors from stdin")?
    } else {
        cli.descriptors
    };

    let mut failed = 0usize;
    for descriptor in descriptors.iter().filter(|line| !line.trim().is_empty()) {
        match Trigger::parse(descriptor) {
            Ok(trigger) => {
                println!("{}", trigger.format());
                if cli.explain {
                    println!("  mask: {:?}", trigger.mask());
                    println!("  keys: {:?}", trigger.keys());
                }
            }
            Err(e) => {
                warn!(descriptor = %descriptor, error = %e, "Rejected descriptor");
                eprintln!("{} {e}", "error:".red().bold());
                failed += 1;
            }
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
