use anyhow::Context;
use clap::Parser;
use record_etl::config::LogFormat;
use record_etl::utils::error::ErrorSeverity;
use record_etl::utils::logger;
use record_etl::{run_pipeline, CliConfig, TracingObserver};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    match config.log_format {
        LogFormat::Compact => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(config.verbose),
    }

    tracing::info!("Starting record-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let pipeline_file = config
        .pipeline_file()
        .context("failed to load pipeline definition")?;

    match run_pipeline(&pipeline_file, Arc::new(TracingObserver)).await {
        Ok(summary) => {
            tracing::info!(
                pipeline = %summary.pipeline,
                extracted = summary.extracted,
                transformed = summary.transformed,
                skipped = summary.skipped,
                "✅ ETL process completed successfully"
            );
            println!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {}", summary.output);
            if summary.skipped > 0 {
                println!("⚠️  Skipped {} invalid records", summary.skipped);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
