use crate::core::rate_limiter::RateLimiter;
use crate::domain::model::{EnrichOutcome, Enrichment, RedeemedRecord};
use crate::domain::ports::{ConfigProvider, ContactApi};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Serialize)]
struct EnrichRequest<'a> {
    #[serde(rename = "linkedinUrl")]
    linkedin_url: &'a str,
}

#[derive(Serialize)]
struct RedeemRequest<'a> {
    #[serde(rename = "redeemIds")]
    redeem_ids: &'a [String],
}

#[derive(Deserialize)]
struct ResultsEnvelope {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

/// reqwest client for the enrich and redeem endpoints.
///
/// Every request first passes through the shared [`RateLimiter`].
pub struct HttpContactClient {
    client: Client,
    api_key: String,
    enrich_endpoint: String,
    redeem_endpoint: String,
    limiter: Arc<RateLimiter>,
}

impl HttpContactClient {
    pub fn new(
        api_key: impl Into<String>,
        enrich_endpoint: impl Into<String>,
        redeem_endpoint: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self::with_client(
            Client::new(),
            api_key,
            enrich_endpoint,
            redeem_endpoint,
            limiter,
        )
    }

    pub fn with_client(
        client: Client,
        api_key: impl Into<String>,
        enrich_endpoint: impl Into<String>,
        redeem_endpoint: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            enrich_endpoint: enrich_endpoint.into(),
            redeem_endpoint: redeem_endpoint.into(),
            limiter,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C, limiter: Arc<RateLimiter>) -> Result<Self> {
        let api_key = config.api_key();
        let api_key = validate_required_field("api_key", &api_key)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(
            builder.build()?,
            *api_key,
            config.enrich_endpoint(),
            config.redeem_endpoint(),
            limiter,
        ))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// `Ok(None)` means the API answered 200 without any result.
    pub async fn try_enrich(&self, profile_url: &str) -> Result<Option<Enrichment>> {
        self.limiter.acquire().await;

        tracing::debug!("Enriching {}", profile_url);
        let results = self
            .post_for_results(
                &self.enrich_endpoint,
                &EnrichRequest {
                    linkedin_url: profile_url,
                },
            )
            .await?;

        match results.into_iter().next() {
            Some(Value::Object(fields)) => Ok(Some(Enrichment::from_fields(fields))),
            Some(other) => Err(EtlError::ProcessingError {
                message: format!("enrich result is not an object: {}", other),
            }),
            None => Ok(None),
        }
    }

    pub async fn try_redeem(&self, redeem_ids: &[String]) -> Result<Vec<RedeemedRecord>> {
        self.limiter.acquire().await;

        tracing::debug!("Redeeming batch of {} ids", redeem_ids.len());
        let results = self
            .post_for_results(&self.redeem_endpoint, &RedeemRequest { redeem_ids })
            .await?;

        Ok(results
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(fields) => Some(RedeemedRecord::from_fields(fields)),
                other => {
                    tracing::debug!("Skipping non-object redeem result: {}", other);
                    None
                }
            })
            .collect())
    }

    async fn post_for_results<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Vec<Value>> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(EtlError::ApiStatusError {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let envelope: ResultsEnvelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.results.unwrap_or_default())
    }
}

#[async_trait]
impl ContactApi for HttpContactClient {
    async fn enrich(&self, profile_url: &str) -> EnrichOutcome {
        match self.try_enrich(profile_url).await {
            Ok(Some(enrichment)) => EnrichOutcome::Enriched(enrichment),
            Ok(None) => {
                tracing::warn!("⚠️ Enrich API returned no results for {}", profile_url);
                EnrichOutcome::NoMatch
            }
            Err(EtlError::ApiStatusError { status, .. }) => {
                tracing::warn!("⚠️ Enrich API error {} for {}", status, profile_url);
                EnrichOutcome::Failed {
                    reason: format!("HTTP {}", status),
                }
            }
            Err(e) => {
                tracing::error!("❌ Exception during enrich for {}: {}", profile_url, e);
                EnrichOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn redeem(&self, redeem_ids: &[String]) -> Vec<RedeemedRecord> {
        match self.try_redeem(redeem_ids).await {
            Ok(records) => records,
            Err(EtlError::ApiStatusError { status, .. }) => {
                tracing::warn!(
                    "⚠️ Redeem API error {} for batch of {}",
                    status,
                    redeem_ids.len()
                );
                Vec::new()
            }
            Err(e) => {
                tracing::error!("❌ Exception during redeem batch: {}", e);
                Vec::new()
            }
        }
    }
}
