use async_trait::async_trait;
use profile_enricher::config::toml_config::{ApiConfig, IoConfig, LimitsConfig};
use profile_enricher::core::{ContactApi, Pipeline, Storage};
use profile_enricher::domain::model::{EnrichOutcome, Enrichment, RedeemedRecord};
use profile_enricher::utils::error::{EtlError, Result};
use profile_enricher::{EnrichmentPipeline, EtlEngine, TomlConfig};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockStorage {
    fn with_input(csv: &str) -> Self {
        let mut files = HashMap::new();
        files.insert("input.csv".to_string(), csv.as_bytes().to_vec());
        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    async fn output(&self) -> Option<String> {
        let files = self.files.lock().await;
        files
            .get("enriched.csv")
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }
}

impl Storage for MockStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            EtlError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

/// Deterministic API: profile URLs ending in `/missing` fail, `/nobody`
/// has no match, everything else enriches with a token derived from the URL.
#[derive(Default)]
struct FakeApi {
    enrich_calls: AtomicUsize,
    redeem_calls: AtomicUsize,
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[async_trait]
impl ContactApi for FakeApi {
    async fn enrich(&self, profile_url: &str) -> EnrichOutcome {
        self.enrich_calls.fetch_add(1, Ordering::SeqCst);
        let handle = profile_url.rsplit('/').next().unwrap_or_default();
        match handle {
            "missing" => EnrichOutcome::Failed {
                reason: "HTTP 404".to_string(),
            },
            "nobody" => EnrichOutcome::NoMatch,
            _ => EnrichOutcome::Enriched(Enrichment::from_fields(object(json!({
                "redeemId": format!("r-{}", handle),
                "profile": {"handle": handle, "languages": ["en", "fr"]}
            })))),
        }
    }

    async fn redeem(&self, redeem_ids: &[String]) -> Vec<RedeemedRecord> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        redeem_ids
            .iter()
            .map(|id| {
                RedeemedRecord::from_fields(object(json!({
                    "redeemId": id,
                    "email": format!("{}@example.com", id.trim_start_matches("r-"))
                })))
            })
            .collect()
    }
}

fn config(batch_size: usize) -> TomlConfig {
    TomlConfig {
        io: IoConfig {
            input_path: "input.csv".to_string(),
            output_path: "enriched.csv".to_string(),
        },
        api: ApiConfig {
            api_key: Some("unused".to_string()),
            ..ApiConfig::default()
        },
        limits: LimitsConfig {
            concurrency: 3,
            batch_size,
            max_requests_per_minute: 250,
        },
    }
}

#[tokio::test]
async fn test_pipeline_with_in_memory_api() {
    let storage = MockStorage::with_input(
        "team,linkedinurl\n\
         core,https://linkedin.com/in/ada\n\
         core,https://linkedin.com/in/missing\n\
         ops,\n\
         ops,https://linkedin.com/in/nobody\n\
         ops,https://linkedin.com/in/alan\n",
    );
    let api = Arc::new(FakeApi::default());
    let pipeline = EnrichmentPipeline::new(storage.clone(), config(1), api.clone());

    let report = EtlEngine::new(pipeline).run().await.unwrap();

    // the row without a URL never reaches the API
    assert_eq!(api.enrich_calls.load(Ordering::SeqCst), 4);
    assert_eq!(api.redeem_calls.load(Ordering::SeqCst), 2);

    let summary = &report.summary;
    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.enriched, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.no_match, 1);
    assert_eq!(summary.redeemed, 2);
    assert_eq!(
        summary.summary_line(),
        "Processed: 5, Successful enrichments: 2, Success rate: 40.00%"
    );

    let output = storage.output().await.unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "\"team\",\"linkedinurl\",\"redeemId\",\"profile_handle\",\"profile_languages_0\",\"profile_languages_1\",\"email\"",
            "\"core\",\"https://linkedin.com/in/ada\",\"r-ada\",\"ada\",\"en\",\"fr\",\"ada@example.com\"",
            "\"ops\",\"https://linkedin.com/in/alan\",\"r-alan\",\"alan\",\"en\",\"fr\",\"alan@example.com\"",
        ]
    );
}

#[tokio::test]
async fn test_transform_keeps_input_order_regardless_of_completion() {
    let csv: String = std::iter::once("linkedinurl".to_string())
        .chain((0..30).map(|i| format!("https://linkedin.com/in/p{:02}", i)))
        .collect::<Vec<_>>()
        .join("\n");
    let storage = MockStorage::with_input(&csv);
    let pipeline = EnrichmentPipeline::new(storage, config(7), Arc::new(FakeApi::default()));

    let rows = pipeline.extract().await.unwrap();
    let result = pipeline.transform(rows).await.unwrap();

    let handles: Vec<String> = result
        .records
        .iter()
        .map(|record| record.data["profile_handle"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (0..30).map(|i| format!("p{:02}", i)).collect();
    assert_eq!(handles, expected);
    assert_eq!(result.summary.successful, 30);
}

#[tokio::test]
async fn test_missing_input_file_is_io_error() {
    let storage = MockStorage::default();
    let pipeline = EnrichmentPipeline::new(storage, config(20), Arc::new(FakeApi::default()));

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, EtlError::IoError(_)));
}

#[tokio::test]
async fn test_short_row_fails_alone() {
    let storage = MockStorage::with_input(
        "team,linkedinurl\n\
         core,https://linkedin.com/in/ada\n\
         ops\n\
         ops,https://linkedin.com/in/alan\n",
    );
    let api = Arc::new(FakeApi::default());
    let pipeline = EnrichmentPipeline::new(storage.clone(), config(20), api.clone());

    let report = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(api.enrich_calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.summary.total_rows, 3);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.successful, 2);

    let output = storage.output().await.unwrap();
    assert_eq!(output.lines().count(), 3);
    assert!(!output.contains("\"ops\",\"\""));
}
