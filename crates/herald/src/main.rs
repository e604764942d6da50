// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - an always-on voice assistant that places outbound calls.
//!
//! This is the binary entry point for the Herald service.

use clap::{Parser, Subcommand};

mod serve;

/// Herald - an always-on voice assistant that places outbound calls.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Herald call pipeline and HTTP surface.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match herald_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("herald: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    eprintln!("herald: failed to render config: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = herald_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.agent.name, "herald");
    }

    #[test]
    fn default_config_renders_as_toml() {
        let config = herald_config::HeraldConfig::default();
        let rendered = toml::to_string_pretty(&config).expect("config must serialize");
        assert!(rendered.contains("[scheduler]"));
        assert!(rendered.contains("poll_interval_secs = 10"));
    }
}
