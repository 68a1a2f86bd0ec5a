use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub summary: RunSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn elapsed_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        tracing::info!("🚀 Starting enrichment run at {}", started_at.to_rfc3339());

        // Extract
        let rows = self.pipeline.extract().await?;
        tracing::info!("📥 Loaded {} input rows", rows.len());

        // Transform
        let transformed = self.pipeline.transform(rows).await?;
        let summary = transformed.summary.clone();
        tracing::info!(
            "Enriched {} rows ({} no match, {} failed), redeemed {}",
            summary.enriched,
            summary.no_match,
            summary.failed,
            summary.redeemed
        );

        // Load
        let output_path = self.pipeline.load(transformed).await?;

        let report = RunReport {
            output_path,
            summary,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            "✅ Done in {:.1}s! {}",
            report.elapsed_seconds(),
            report.summary.summary_line()
        );
        Ok(report)
    }
}
