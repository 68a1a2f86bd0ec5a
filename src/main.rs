use clap::Parser;
use profile_enricher::core::ConfigProvider;
use profile_enricher::utils::error::{EtlError, ErrorSeverity};
use profile_enricher::utils::{logger, validation::Validate};
use profile_enricher::{CliConfig, EnrichmentPipeline, EtlEngine, LocalStorage, TomlConfig};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse().with_env_fallback();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting profile-enricher");

    let result = match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(&path) {
                Ok(config) => run(config).await,
                Err(e) => Err(e),
            }
        }
        None => run(cli).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Enrichment failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
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

async fn run<C>(config: C) -> Result<(), EtlError>
where
    C: ConfigProvider + Validate + 'static,
{
    config.validate().inspect_err(|e| {
        tracing::error!("❌ Configuration validation failed: {}", e);
    })?;

    tracing::info!(
        "⚙️ {} workers, batches of {}, {} requests/min",
        config.concurrency(),
        config.batch_size(),
        config.max_requests_per_minute()
    );

    let pipeline = EnrichmentPipeline::from_config(LocalStorage::current_dir(), config)?;
    let report = EtlEngine::new(pipeline).run().await?;

    println!("💾 Results saved to {}", report.output_path);
    println!("\n✅ Done! {}", report.summary.summary_line());
    Ok(())
}
