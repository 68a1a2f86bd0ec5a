use crate::core::flatten::flatten;
use crate::domain::model::{EnrichOutcome, EnrichedItem, Record, RunSummary, REDEEM_ID_FIELD};
use crate::domain::ports::ContactApi;
use crate::utils::progress::Progress;
use std::collections::HashMap;

pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Keeps the rows whose enrichment succeeded and counts the rest.
pub fn collect_enriched(
    outcomes: Vec<(usize, Record, EnrichOutcome)>,
    summary: &mut RunSummary,
) -> Vec<EnrichedItem> {
    let mut items = Vec::with_capacity(outcomes.len());
    for (position, row, outcome) in outcomes {
        match outcome {
            EnrichOutcome::Enriched(enrichment) => {
                summary.enriched += 1;
                if enrichment.redeem_id.is_some() {
                    summary.with_redeem_id += 1;
                }
                items.push(EnrichedItem {
                    position,
                    row,
                    enrichment,
                    redeemed: None,
                });
            }
            EnrichOutcome::NoMatch => {
                summary.no_match += 1;
                tracing::warn!("⚠️ Row {} dropped: no enrichment match", position + 1);
            }
            EnrichOutcome::Failed { reason } => {
                summary.failed += 1;
                tracing::warn!("⚠️ Row {} dropped: {}", position + 1, reason);
            }
        }
    }
    items
}

/// Redemption tokens of the enriched items, unique and in first-seen order,
/// each pointing at every item that carries it.
#[derive(Debug, Default)]
pub struct RedemptionPlan {
    tokens: Vec<String>,
    holders: HashMap<String, Vec<usize>>,
}

impl RedemptionPlan {
    pub fn build(items: &[EnrichedItem]) -> Self {
        let mut plan = Self::default();
        for (index, item) in items.iter().enumerate() {
            let Some(token) = item.enrichment.redeem_id.as_ref() else {
                continue;
            };
            plan.holders
                .entry(token.clone())
                .or_insert_with(|| {
                    plan.tokens.push(token.clone());
                    Vec::new()
                })
                .push(index);
        }
        plan
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn batches(&self, batch_size: usize) -> std::slice::Chunks<'_, String> {
        self.tokens.chunks(batch_size.max(1))
    }

    pub fn holders(&self, token: &str) -> &[usize] {
        self.holders.get(token).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Redeems the plan one batch at a time and attaches each redeemed record to
/// the items carrying its token. Returns how many items were redeemed.
pub async fn redeem_all<A: ContactApi + ?Sized>(
    api: &A,
    items: &mut [EnrichedItem],
    batch_size: usize,
) -> usize {
    let plan = RedemptionPlan::build(items);
    if plan.is_empty() {
        tracing::info!("No redemption tokens to redeem");
        return 0;
    }

    let batch_count = plan.tokens().len().div_ceil(batch_size.max(1));
    let mut progress = Progress::new("Redemption", batch_count);
    let mut redeemed = 0;

    for batch in plan.batches(batch_size) {
        for record in api.redeem(batch).await {
            let Some(token) = record.redeem_id.as_deref() else {
                tracing::debug!("Redeemed record without {}", REDEEM_ID_FIELD);
                continue;
            };
            let holders = plan.holders(token);
            if holders.is_empty() {
                tracing::debug!("Redeemed unknown token {}", token);
                continue;
            }
            for &index in holders {
                if items[index].redeemed.is_none() {
                    redeemed += 1;
                }
                items[index].redeemed = Some(record.clone());
            }
        }
        progress.tick();
    }
    progress.finish();

    redeemed
}

/// Row, then enrichment, then redemption; later sources win on key collision.
pub fn merge(item: &EnrichedItem) -> Record {
    let mut merged = item.row.data.clone();
    for (key, value) in &item.enrichment.fields {
        merged.insert(key.clone(), value.clone());
    }
    if let Some(redeemed) = &item.redeemed {
        for (key, value) in &redeemed.fields {
            merged.insert(key.clone(), value.clone());
        }
    }
    Record::new(flatten(&merged))
}

/// Merged and flattened records, ordered by input position.
pub fn merge_all(mut items: Vec<EnrichedItem>) -> Vec<Record> {
    items.sort_by_key(|item| item.position);
    items.iter().map(merge).collect()
}
