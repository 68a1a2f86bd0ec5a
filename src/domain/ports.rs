use crate::domain::model::{EnrichOutcome, Record, RedeemedRecord, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn enrich_endpoint(&self) -> &str;
    fn redeem_endpoint(&self) -> &str;
    fn concurrency(&self) -> usize;
    fn batch_size(&self) -> usize;
    fn max_requests_per_minute(&self) -> usize;
    fn request_timeout(&self) -> Option<Duration>;
}

/// The enrich and redeem calls of the contact API. Implementations never fail:
/// problems are logged and reported as `Failed`/`NoMatch` or an empty batch.
#[async_trait]
pub trait ContactApi: Send + Sync {
    async fn enrich(&self, profile_url: &str) -> EnrichOutcome;
    async fn redeem(&self, redeem_ids: &[String]) -> Vec<RedeemedRecord>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
