//! Console output

use std::path::Path;

use reco_bench_core::{RunConfig, RunReport};

pub fn print_banner(config: &RunConfig) {
    println!("Starting dish-categories/recommendations functional test");
    println!("Configuration:");
    println!("   Strategy: {}", config.strategy);
    println!("   Max Requests: {}", config.max_requests);
    println!("   Rate Limit: {}/min", config.requests_per_minute);
    println!(
        "   Concurrency: {} (burst {})",
        config.max_concurrent,
        config.burst_capacity()
    );
    println!(
        "   Retries: {} (base {:?}, max {:?}, jitter {})",
        config.max_retries,
        config.retry_backoff_base,
        config.retry_backoff_max,
        if config.retry_jitter { "on" } else { "off" }
    );
    println!("   Endpoint: {}", config.endpoint_url());
    println!("   Output: {}", config.output_path.display());
    println!();
}

pub fn print_results(report: &RunReport, config: &RunConfig, statistics_path: &Path) {
    let stats = &report.statistics;

    println!();
    println!("Test execution completed");
    println!("{:<24} {:>12}", "Metric", "Value");
    println!("{}", "-".repeat(37));
    println!("{:<24} {:>12}", "Total requests", stats.total);
    println!("{:<24} {:>12}", "Successful", stats.successful);
    println!("{:<24} {:>12}", "Failed", stats.failed);
    println!("{:<24} {:>12}", "Timed out", stats.timed_out);
    println!(
        "{:<24} {:>11.2}%",
        "Success rate",
        stats.success_rate * 100.0
    );
    println!(
        "{:<24} {:>10.2}ms",
        "Avg response time", stats.average_elapsed_ms
    );
    println!("{:<24} {:>10.2}ms", "p95 response time", stats.elapsed.p95);
    println!("{:<24} {:>12.2}", "Avg item count", stats.average_item_count);
    println!("{:<24} {:>12}", "Unique categories", stats.unique_categories);
    println!("{:<24} {:>12}", "Retried", stats.retried);
    println!(
        "{:<24} {:>11.2}s",
        "Total time",
        stats.wall_clock_ms as f64 / 1000.0
    );
    println!(
        "{:<24} {:>12.2}",
        "Requests/sec",
        report.requests_per_second()
    );

    if !stats.errors_by_type.is_empty() {
        println!();
        println!("Errors:");
        for (kind, count) in &stats.errors_by_type {
            println!("   {kind}: {count}");
        }
    }

    println!();
    println!("Results saved to: {}", config.output_path.display());
    println!("Summary saved to: {}", config.summary_path.display());
    println!("Statistics saved to: {}", statistics_path.display());
}
