//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// NetAuditor - Wi-Fi device auditor for the 7SIGNAL Eyeris API
///
/// Runs the Roaming, Coverage, Congestion, and Interference analyses
/// across an organization's monitored devices and renders the findings
/// as a Markdown/JSON report or an HTML dashboard.
///
/// Examples:
///   netauditor --client-id ID --client-secret SECRET
///   netauditor --device 8f3a --device 77c1 --format json -o audit.json
///   netauditor --seen-today --concurrency 2 --fail-on-issues
///   netauditor --dry-run
///   netauditor --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// OAuth2 client id for the 7SIGNAL API
    #[arg(
        long,
        value_name = "ID",
        env = "SEVENSIGNAL_CLIENT_ID",
        required_unless_present = "init_config"
    )]
    pub client_id: Option<String>,

    /// OAuth2 client secret for the 7SIGNAL API
    #[arg(
        long,
        value_name = "SECRET",
        env = "SEVENSIGNAL_CLIENT_SECRET",
        hide_env_values = true,
        required_unless_present = "init_config"
    )]
    pub client_secret: Option<String>,

    /// Base URL of the Eyeris API environment
    #[arg(
        long,
        default_value = "https://api-v2.7signal.com",
        env = "SEVENSIGNAL_API_URL",
        value_name = "URL"
    )]
    pub api_url: String,

    /// Output file path for the report
    #[arg(short, long, default_value = "netaudit_report.md", value_name = "FILE")]
    pub output: PathBuf,

    /// Output format (markdown, json, html)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Analyze only this device id (repeatable)
    ///
    /// When omitted, every device matching the license/recency filters
    /// is analyzed.
    #[arg(short, long = "device", value_name = "ID")]
    pub devices: Vec<String>,

    /// Include devices without a license
    #[arg(long)]
    pub include_unlicensed: bool,

    /// Only analyze devices whose last test was seen today
    #[arg(long)]
    pub seen_today: bool,

    /// Number of devices analyzed concurrently
    ///
    /// Each device issues up to eight requests; the default keeps one
    /// device in flight so the request budget is spent predictably.
    #[arg(long, default_value = "1", value_name = "NUM")]
    pub concurrency: usize,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Attempts per request before giving up
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .netauditor.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List matching devices without submitting any analysis
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .netauditor.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Fail with exit code 2 when any device is non-compliant
    ///
    /// Useful for CI/monitoring pipelines.
    #[arg(long)]
    pub fail_on_issues: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// HTML dashboard
    Html,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Client id, validated to be present before use.
    pub fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or("")
    }

    /// Client secret, validated to be present before use.
    pub fn client_secret(&self) -> &str {
        self.client_secret.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("API URL must start with 'http://' or 'https://'".to_string());
        }

        if self.client_id().is_empty() || self.client_secret().is_empty() {
            return Err("Both --client-id and --client-secret are required".to_string());
        }

        if self.concurrency == 0 {
            return Err("Concurrency must be at least 1".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(retries) = self.retries {
            if retries == 0 {
                return Err("Retries must be at least 1".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            api_url: "https://api-v2.7signal.com".to_string(),
            output: PathBuf::from("report.md"),
            format: OutputFormat::Markdown,
            devices: Vec::new(),
            include_unlicensed: false,
            seen_today: false,
            concurrency: 1,
            timeout: None,
            retries: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
            fail_on_issues: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.api_url = "api-v2.7signal.com".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_credentials() {
        let mut args = make_args();
        args.client_secret = None;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let mut args = make_args();
        args.concurrency = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.init_config = true;
        args.client_id = None;
        args.client_secret = None;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
