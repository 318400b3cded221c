// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marhaba - WhatsApp support concierge for a Dubai luxury real-estate
//! brokerage.
//!
//! This is the binary entry point for the concierge service.

use clap::{Parser, Subcommand};

mod serve;

/// Marhaba - WhatsApp support concierge.
#[derive(Parser, Debug)]
#[command(name = "marhaba", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server and message pipeline.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match marhaba_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            marhaba_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("marhaba serve failed: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("marhaba: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Config loads with defaults, no config file needed.
        let config =
            marhaba_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "marhaba");
    }
}
