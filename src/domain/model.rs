use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column holding the profile URL in the input table.
pub const PROFILE_URL_FIELD: &str = "linkedinurl";
/// Field carrying the redemption token in enrich and redeem payloads.
pub const REDEEM_ID_FIELD: &str = "redeemId";

/// One ordered row of key/value data, used for input rows and output rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    pub fn profile_url(&self) -> Option<&str> {
        self.data
            .get(PROFILE_URL_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// First result of a successful enrich call.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub fields: Map<String, Value>,
    pub redeem_id: Option<String>,
}

impl Enrichment {
    /// Empty-string tokens count as missing.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let redeem_id = redeem_id_of(&fields);
        Self { fields, redeem_id }
    }
}

pub fn redeem_id_of(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get(REDEEM_ID_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Typed result of one enrich call.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichOutcome {
    Enriched(Enrichment),
    /// HTTP 200 with an empty or missing `results` list.
    NoMatch,
    Failed { reason: String },
}

/// Redeemed contact details, correlated to an enrichment by its token.
#[derive(Debug, Clone, PartialEq)]
pub struct RedeemedRecord {
    pub redeem_id: Option<String>,
    pub fields: Map<String, Value>,
}

impl RedeemedRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let redeem_id = redeem_id_of(&fields);
        Self { redeem_id, fields }
    }
}

/// A row that survived the enrich phase, waiting for redemption and merge.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedItem {
    pub position: usize,
    pub row: Record,
    pub enrichment: Enrichment,
    pub redeemed: Option<RedeemedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub enriched: usize,
    pub no_match: usize,
    pub failed: usize,
    pub with_redeem_id: usize,
    pub redeemed: usize,
    pub successful: usize,
}

impl RunSummary {
    /// Percentage of input rows that produced a redeemable enrichment; 0 for empty input.
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total_rows as f64 * 100.0
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Processed: {}, Successful enrichments: {}, Success rate: {:.2}%",
            self.total_rows,
            self.successful,
            self.success_rate()
        )
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub records: Vec<Record>,
    pub summary: RunSummary,
}
