//! `run` and `validate` commands

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reco_bench_client::RetryingClient;
use reco_bench_core::OrchestratorBuilder;
use reco_bench_report::{statistics_path_for, write_statistics_json, write_summary_log};
use reco_bench_samplers::ParameterSampler;
use reco_bench_storage::CsvResultSink;

use super::output;
use super::RunArgs;

/// Sample, execute and report one run
pub async fn execute(args: RunArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let domains = args.load_domains()?;

    output::print_banner(&config);

    let params = ParameterSampler::new(domains)
        .with_seed(config.seed)
        .sample(config.strategy, config.max_requests);
    println!("Generated {} parameter combinations", params.len());

    let client = RetryingClient::from_config(&config).context("failed to create HTTP client")?;
    let sink = CsvResultSink::create(&config.output_path).with_context(|| {
        format!(
            "failed to open result file {}",
            config.output_path.display()
        )
    })?;

    let orchestrator = OrchestratorBuilder::new()
        .config(config.clone())
        .client(Arc::new(client))
        .sink(Arc::new(sink))
        .show_progress(!args.no_progress)
        .build()?;

    let report = match args.max_duration_secs {
        Some(secs) => {
            orchestrator
                .run_with_timeout(params, Duration::from_secs(secs))
                .await
        }
        None => orchestrator.run_with_signal_handling(params).await,
    }
    .context("run aborted")?;

    write_summary_log(&report.statistics, &config.summary_path)
        .context("failed to write summary log")?;
    let statistics_path = statistics_path_for(&config.summary_path);
    write_statistics_json(&report.statistics, &statistics_path)
        .context("failed to write statistics")?;

    output::print_results(&report, &config, &statistics_path);
    Ok(())
}

/// Resolve everything a run needs, print it, and stop
pub fn validate(args: RunArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let domains = args.load_domains()?;
    let sampler = ParameterSampler::new(domains);

    output::print_banner(&config);

    let planned = match sampler.upper_bound(config.strategy) {
        Some(bound) => bound.min(config.max_requests),
        None => config.max_requests,
    };
    println!("Planned requests: {planned}");
    println!(
        "Cartesian product size: {}",
        sampler.domains().cartesian_size()
    );
    println!("Configuration is valid");

    tracing::debug!(config = ?config, "Resolved configuration");
    Ok(())
}
