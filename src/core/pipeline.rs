use crate::core::aggregator::{collect_enriched, merge_all, redeem_all};
use crate::core::client::HttpContactClient;
use crate::core::rate_limiter::RateLimiter;
use crate::core::table::{read_rows, write_rows};
use crate::core::worker_pool::WorkerPool;
use crate::core::{ConfigProvider, ContactApi, Pipeline, Record, Storage, TransformResult};
use crate::domain::model::{redeem_id_of, EnrichOutcome, RunSummary};
use crate::utils::error::Result;
use std::sync::Arc;

/// Enrich → batch-redeem → merge/flatten pipeline over one input table.
pub struct EnrichmentPipeline<S: Storage, C: ConfigProvider, A: ContactApi> {
    storage: S,
    config: C,
    api: Arc<A>,
}

impl<S: Storage, C: ConfigProvider> EnrichmentPipeline<S, C, HttpContactClient> {
    /// Builds the HTTP client and its rate limiter from the configuration.
    pub fn from_config(storage: S, config: C) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.max_requests_per_minute()));
        let api = HttpContactClient::from_config(&config, limiter)?;
        Ok(Self::new(storage, config, Arc::new(api)))
    }
}

impl<S: Storage, C: ConfigProvider, A: ContactApi + 'static> EnrichmentPipeline<S, C, A> {
    pub fn new(storage: S, config: C, api: Arc<A>) -> Self {
        Self {
            storage,
            config,
            api,
        }
    }

    async fn enrich_rows(&self, rows: Vec<Record>) -> Vec<(usize, Record, EnrichOutcome)> {
        let pool = WorkerPool::new(self.config.concurrency());
        tracing::info!(
            "🔄 Starting enrichment of {} rows with {} workers",
            rows.len(),
            pool.workers()
        );

        let api = self.api.clone();
        pool.run(
            "Enrichment",
            rows.into_iter().enumerate().collect(),
            move |(position, row): (usize, Record)| {
                let api = api.clone();
                async move {
                    let outcome = match row.profile_url() {
                        Some(url) => api.enrich(url).await,
                        None => EnrichOutcome::Failed {
                            reason: "missing profile URL".to_string(),
                        },
                    };
                    (position, row, outcome)
                }
            },
        )
        .await
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, A: ContactApi + 'static> Pipeline
    for EnrichmentPipeline<S, C, A>
{
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::info!("📥 Loading input rows from {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;
        read_rows(&data)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let mut summary = RunSummary {
            total_rows: data.len(),
            ..RunSummary::default()
        };

        let outcomes = self.enrich_rows(data).await;
        let mut items = collect_enriched(outcomes, &mut summary);

        tracing::info!("🔄 Starting batch redemption");
        summary.redeemed = redeem_all(self.api.as_ref(), &mut items, self.config.batch_size()).await;

        tracing::info!("🔄 Merging and flattening results...");
        let records = merge_all(items);
        summary.successful = records
            .iter()
            .filter(|record| redeem_id_of(&record.data).is_some())
            .count();

        Ok(TransformResult { records, summary })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.config.output_path().to_string();
        tracing::info!(
            "💾 Saving {} records to {} ...",
            result.records.len(),
            output_path
        );

        let data = write_rows(&result.records)?;
        self.storage.write_file(&output_path, &data).await?;

        tracing::debug!("Wrote {} bytes", data.len());
        Ok(output_path)
    }
}
