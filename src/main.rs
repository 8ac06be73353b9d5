#![cfg_attr(not(test), deny(clippy::panic))]

use bidchess_server::{config, logging, server};
use clap::Parser;

/// bidchess-server -- real-time multiplayer chess with a blind bid-for-color
/// pre-game phase.
#[derive(Parser, Debug)]
#[command(name = "bidchess-server")]
#[command(about = "A real-time multiplayer chess server with bid-for-color matchmaking")]
#[command(version)]
struct Cli {
    /// Load configuration and exit without starting the server. Useful for
    /// CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit. Useful
    /// for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    if cli.validate_config {
        println!("Configuration loaded successfully");
        println!();
        println!("Configuration summary:");
        println!("  Bind address: {}", cfg.server.bind_addr);
        println!(
            "  Supported time controls (ms): {:?}",
            cfg.server.supported_time_controls_ms
        );
        println!("  Default main time (ms): {}", cfg.server.default_main_time_ms);
        println!("  Disconnect timeout (ms): {}", cfg.server.disconnect_timeout_ms);
        return Ok(());
    }

    logging::init_with_config(&cfg.logging);

    server::run(cfg.server).await
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn test_cli_default_no_flags() {
        let cli = Cli::try_parse_from(["bidchess-server"]).unwrap();
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_validate_config_long() {
        let cli = Cli::try_parse_from(["bidchess-server", "--validate-config"]).unwrap();
        assert!(cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_validate_config_short() {
        let cli = Cli::try_parse_from(["bidchess-server", "-c"]).unwrap();
        assert!(cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_print_config() {
        let cli = Cli::try_parse_from(["bidchess-server", "--print-config"]).unwrap();
        assert!(!cli.validate_config);
        assert!(cli.print_config);
    }

    #[test]
    fn test_cli_validate_and_print_config_conflict() {
        let result = Cli::try_parse_from(["bidchess-server", "--validate-config", "--print-config"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("cannot be used with"));
    }

    #[test]
    fn test_cli_help_contains_flags() {
        let result = Cli::try_parse_from(["bidchess-server", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        let help_text = err.to_string();
        assert!(help_text.contains("--validate-config"));
        assert!(help_text.contains("--print-config"));
        assert!(help_text.contains("-c"));
    }

    #[test]
    fn test_cli_version() {
        let result = Cli::try_parse_from(["bidchess-server", "--version"]);
        assert!(result.is_err());
    }
}
