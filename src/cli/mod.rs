//! CLI argument parsing and command dispatch

mod output;
mod run;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reco_bench_core::{RunConfig, SamplingStrategy};
use reco_bench_samplers::ParameterDomains;

#[derive(Parser)]
#[command(name = "reco-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send sampled requests to the recommendation endpoint
    Run(RunArgs),
    /// Resolve and validate the configuration without sending requests
    Validate(RunArgs),
}

/// Run settings; flags override values from `--config`
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON run configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file with parameter domains
    #[arg(long)]
    pub domains: Option<PathBuf>,

    /// Sampling strategy: cartesian, random, stratified
    #[arg(short, long, env = "RECO_SAMPLING_STRATEGY")]
    pub strategy: Option<SamplingStrategy>,

    /// Maximum number of requests
    #[arg(short = 'n', long, env = "RECO_MAX_REQUESTS")]
    pub max_requests: Option<usize>,

    /// Request starts per minute
    #[arg(long, env = "REQUESTS_PER_MINUTE")]
    pub rate_limit: Option<u32>,

    /// Maximum in-flight requests
    #[arg(long, env = "MAX_CONCURRENT")]
    pub concurrency: Option<usize>,

    /// Token bucket capacity (default: twice the concurrency)
    #[arg(long)]
    pub burst: Option<usize>,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Retries after the first attempt
    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Base retry delay in milliseconds
    #[arg(long, env = "RETRY_DELAY_BASE")]
    pub retry_base_ms: Option<u64>,

    /// Retry delay cap in milliseconds
    #[arg(long)]
    pub retry_max_ms: Option<u64>,

    /// Disable retry jitter
    #[arg(long)]
    pub no_jitter: bool,

    #[arg(long = "retry-jitter", env = "RETRY_JITTER", hide = true)]
    pub retry_jitter: Option<bool>,

    /// Do not retry HTTP 429 responses
    #[arg(long = "no-retry-on-429")]
    pub no_retry_on_429: bool,

    /// API base URL
    #[arg(long, env = "API_BASE_URL")]
    pub base_url: Option<String>,

    /// Endpoint path
    #[arg(long)]
    pub endpoint: Option<String>,

    /// CSV output file
    #[arg(short, long, env = "CSV_OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Summary log file; statistics JSON is written next to it
    #[arg(long, env = "LOG_OUTPUT_PATH")]
    pub summary: Option<PathBuf>,

    /// Seed for the random strategy
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop launching requests after this many seconds
    #[arg(long)]
    pub max_duration_secs: Option<u64>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl RunArgs {
    /// Build the run configuration from `--config` and flag overrides
    pub fn resolve_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RunConfig::default(),
        };

        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(max_requests) = self.max_requests {
            config.max_requests = max_requests;
        }
        if let Some(rpm) = self.rate_limit {
            config.requests_per_minute = rpm;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent = concurrency;
        }
        if let Some(burst) = self.burst {
            config.burst_capacity = Some(burst);
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(ms) = self.retry_base_ms {
            config.retry_backoff_base = Duration::from_millis(ms);
        }
        if let Some(ms) = self.retry_max_ms {
            config.retry_backoff_max = Duration::from_millis(ms);
        }
        if let Some(jitter) = self.retry_jitter {
            config.retry_jitter = jitter;
        }
        if self.no_jitter {
            config.retry_jitter = false;
        }
        if self.no_retry_on_429 {
            config.retry_on_rate_limited = false;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint_path = endpoint.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(summary) = &self.summary {
            config.summary_path = summary.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// Load parameter domains from `--domains`, or the defaults
    pub fn load_domains(&self) -> Result<ParameterDomains> {
        match &self.domains {
            Some(path) => ParameterDomains::from_json_file(path)
                .with_context(|| format!("failed to load domains from {}", path.display())),
            None => Ok(ParameterDomains::default()),
        }
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

/// Execute the parsed command
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Validate(args) => run::validate(args),
    }
}
