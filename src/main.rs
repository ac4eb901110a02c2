//! NetAuditor - Wi-Fi Device Auditor
//!
//! A CLI tool that drives the 7SIGNAL Eyeris analysis API: it submits the
//! four client analyses for each monitored device, polls the results under
//! a strict request-rate budget, and renders an audit report.
//!
//! Exit codes:
//!   0 - Success (all devices compliant, or no --fail-on-issues set)
//!   1 - Runtime error (authentication, config, connectivity, etc.)
//!   2 - Non-compliant devices found with --fail-on-issues

mod analysis;
mod api;
mod cli;
mod config;
mod devices;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use analysis::{DevicePipeline, OrgOrchestrator};
use api::{EyerisClient, HttpTransport, RateLimiter, RequestExecutor};
use cli::{Args, OutputFormat};
use config::Config;
use devices::{select_devices, DeviceFilter, SelectedDevice};
use models::{AnalysisKind, ReportMetadata};
use report::{digest_org, ComplianceSummary};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("NetAuditor v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the audit
    match run_audit(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Audit failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .netauditor.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".netauditor.toml");

    if path.exists() {
        eprintln!("⚠️  .netauditor.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .netauditor.toml")?;

    println!("✅ Created .netauditor.toml with default settings.");
    println!("   Edit it to customize the API environment, rate budget, and retries.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete audit workflow. Returns exit code (0 or 2).
async fn run_audit(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // One limiter, one connection pool, one client per run; everything
    // outbound shares the same request budget
    let limiter = Arc::new(RateLimiter::with_pacing(
        config.rate_limit.rate,
        config.rate_limit.capacity,
        Duration::from_millis(config.rate_limit.pacing_ms),
    ));
    let transport = Arc::new(HttpTransport::new(Duration::from_secs(
        config.api.timeout_seconds,
    ))?);
    let executor =
        RequestExecutor::with_policy(transport, limiter, config.api.retries, config.api.backoff_factor);
    let client = Arc::new(EyerisClient::new(executor, config.api.base_url.clone()));

    // Step 1: Authenticate
    println!("🔐 Authenticating with {}", config.api.base_url);
    let token = client
        .authenticate(args.client_id(), args.client_secret())
        .await
        .context("Authentication failed")?;
    info!("Authenticated successfully");

    // Step 2: Fetch and filter the device inventory
    println!("📡 Fetching device inventory...");
    let agents = client
        .fetch_agents(&token)
        .await
        .context("Failed to fetch agents")?;

    let filter = DeviceFilter {
        licensed_only: !args.include_unlicensed,
        seen_today: args.seen_today,
        ids: args.devices.clone(),
    };
    let selected = select_devices(&agents, &filter);

    if selected.is_empty() {
        println!("   No matching devices found. Check your filters or account.");
        return Ok(0);
    }
    println!(
        "   Found {} matching devices ({} in inventory)",
        selected.len(),
        agents.len()
    );

    // Handle --dry-run: list devices and exit
    if args.dry_run {
        return handle_dry_run(&selected);
    }

    // Step 3: Run the governed org-wide analysis
    println!(
        "\n🔬 Running analyses ({} devices × {} kinds, {} at a time)...",
        selected.len(),
        AnalysisKind::ALL.len(),
        config.analysis.concurrency
    );

    let pipeline = DevicePipeline::new(client.clone(), config.analysis.window_hours);
    let orchestrator = OrgOrchestrator::new(pipeline, config.analysis.concurrency);
    let device_ids: Vec<String> = selected.iter().map(|d| d.id.clone()).collect();

    let bar = ProgressBar::new(device_ids.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} devices")
            .unwrap()
            .progress_chars("#>-"),
    );

    let org = orchestrator
        .analyze_all(&device_ids, &token, |update| {
            bar.set_position(update.completed as u64);
        })
        .await;
    bar.finish();

    // Step 4: Digest the outcomes and build the report
    println!("\n📝 Generating report...");
    let findings = digest_org(&selected, &org);
    let summary = ComplianceSummary::from_findings(&findings);

    let metadata = ReportMetadata {
        api_url: config.api.base_url.clone(),
        analysis_date: Utc::now(),
        devices_analyzed: org.len(),
        devices_non_compliant: summary.non_compliant(),
        analyses_failed: summary.analyses_failed,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let output = match args.format {
        OutputFormat::Markdown => report::generate_markdown_report(&metadata, &findings),
        OutputFormat::Json => report::generate_json_report(&metadata, &selected, &org)?,
        OutputFormat::Html => report::generate_html_dashboard(&findings),
    };

    std::fs::write(&args.output, &output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    // Step 5: Print summary; individual failures are warnings, never fatal
    println!("\n📊 Analysis Summary:");
    println!(
        "   Devices: ✅ {} compliant | ⚠️ {} with issues | ❌ {} with failed analyses",
        summary.compliant, summary.with_issues, summary.with_failures
    );
    println!("   Issues reported: {}", summary.total_issues);
    println!("   Duration: {:.1}s", metadata.duration_seconds);

    for device in findings.iter().filter(|d| !d.is_compliant()) {
        for line in device.issue_lines() {
            warn!("{}: {}", device.device.label(), line);
            println!("   ⚠️  {}: {}", device.device.label(), line);
        }
    }

    println!(
        "\n✅ Audit complete! Report saved to: {}",
        args.output.display()
    );

    // Check --fail-on-issues threshold
    if args.fail_on_issues && summary.non_compliant() > 0 {
        eprintln!(
            "\n⛔ {} non-compliant device(s) found. Failing (exit code 2).",
            summary.non_compliant()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: list matching devices, no analysis submitted.
fn handle_dry_run(selected: &[SelectedDevice]) -> Result<i32> {
    println!("\n🔍 Dry run: listing devices (no analysis submitted)...\n");

    for device in selected {
        println!("     📶 {}", device.label());
    }
    println!("\n   Total: {} devices", selected.len());

    println!("\n✅ Dry run complete. No analyses were submitted.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .netauditor.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
