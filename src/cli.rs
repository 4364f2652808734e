//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// uxlog - waitlist analytics backend
#[derive(Parser)]
#[command(name = "uxlog")]
#[command(version)]
#[command(about = "Buffered page-view tracking and waitlist statistics", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Drain the tracking buffer once and exit
    ///
    /// Do not run while a server is draining the same buffer.
    Drain,

    /// Generate example configuration file
    GenerateConfig {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_serve() {
        let cli = Cli::try_parse_from(["uxlog"]).unwrap();
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::try_parse_from(["uxlog", "drain", "-c", "/etc/uxlog.toml"]).unwrap();
        assert_eq!(cli.config, "/etc/uxlog.toml");
        assert_eq!(cli.command, Some(Commands::Drain));
    }

    #[test]
    fn test_generate_config_output() {
        let cli = Cli::try_parse_from(["uxlog", "generate-config", "out.toml"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::GenerateConfig {
                output_path: Some("out.toml".to_string())
            })
        );
    }
}
