//! Command-line configuration

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::instruments::DEFAULT_POINTS_ID;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Tenderplan configuration
#[derive(Debug, Parser)]
#[command(
    name = "tenderplan",
    about = "Allocate payment instruments to orders for the maximum discount",
    long_about = None
)]
pub struct Config {
    /// Orders file (JSON or YAML)
    pub orders: PathBuf,

    /// Payment methods file (JSON or YAML)
    pub instruments: PathBuf,

    /// Id of the points instrument
    #[arg(long, env = "TENDERPLAN_POINTS_ID", default_value = DEFAULT_POINTS_ID)]
    pub points_id: String,

    /// ISO code of the currency all amounts are in
    #[arg(long, env = "TENDERPLAN_CURRENCY", default_value = "PLN")]
    pub currency: String,

    /// Render assignments and totals as tables
    #[arg(long)]
    pub table: bool,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn positional_paths_and_defaults() -> TestResult {
        let config = Config::try_parse_from(["tenderplan", "orders.json", "paymentmethods.yml"])?;

        assert_eq!(config.orders, PathBuf::from("orders.json"));
        assert_eq!(config.instruments, PathBuf::from("paymentmethods.yml"));
        assert!(!config.table);

        Ok(())
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let config = Config::try_parse_from([
            "tenderplan",
            "o.json",
            "p.json",
            "--points-id",
            "BONUS",
            "--currency",
            "EUR",
            "--log-format",
            "json",
            "--log-level",
            "debug",
            "--table",
        ])?;

        assert_eq!(config.points_id, "BONUS");
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.logging.log_format, LogFormat::Json);
        assert_eq!(config.logging.log_level, "debug");
        assert!(config.table);

        Ok(())
    }

    #[test]
    fn both_paths_are_required() {
        assert!(Config::try_parse_from(["tenderplan", "orders.json"]).is_err());
    }
}
