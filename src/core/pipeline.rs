use crate::core::{airings, timefmt, xmltv};
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::model::{AiringOutcome, ChannelLineup};
use crate::utils::error::{EpgError, Result};
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::Client;
use serde_json::Value;
use std::io::Write;

pub struct EpgPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    lineup: ChannelLineup,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> EpgPipeline<S, C> {
    pub fn new(storage: S, config: C, lineup: ChannelLineup) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.request_timeout());
        if config.insecure_tls() {
            tracing::warn!("⚠️ TLS certificate verification disabled by configuration");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build()?;
        Ok(Self {
            storage,
            config,
            lineup,
            client,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for EpgPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Value>> {
        let window = self.config.window().resolve(Utc::now());
        tracing::debug!(
            "Query window: {} to {}",
            timefmt::format_query(window.start),
            timefmt::format_query(window.end)
        );

        let mut request = self.client.get(self.config.api_endpoint()).query(&[
            ("start", timefmt::format_query(window.start)),
            ("end", timefmt::format_query(window.end)),
            ("reg", self.config.region().to_string()),
            ("dt", self.config.device_type().to_string()),
            ("client", self.config.client_tag().to_string()),
            ("pageNumber", self.config.page_number().to_string()),
            ("pageSize", self.config.page_size().to_string()),
        ]);
        if let Some(headers) = self.config.request_headers() {
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        tracing::debug!("Making API request to: {}", self.config.api_endpoint());
        let response = request.send().await?.error_for_status()?;
        tracing::debug!("API response status: {}", response.status());

        let body = response.text().await?;
        let mut payload: Value = serde_json::from_str(&body)?;
        let entries_field = self.config.fields().entries.as_str();
        match payload.get_mut(entries_field).map(Value::take) {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(EpgError::ShapeError {
                message: format!("top-level '{}' field is missing or not a list", entries_field),
            }),
        }
    }

    async fn transform(&self, entries: Vec<Value>) -> Result<TransformResult> {
        let fields = self.config.fields();
        let mut result = TransformResult::default();

        for (index, entry) in entries.iter().enumerate() {
            let Some(entry_airings) = airings::entry_airings(entry, fields) else {
                tracing::warn!(
                    "⚠️ Guide entry {} has no '{}' list, skipping it",
                    index,
                    fields.airings
                );
                continue;
            };

            for airing in entry_airings {
                match airings::airing_outcome(airing, fields) {
                    AiringOutcome::Programme(programme) => {
                        if self.lineup.contains_id(&programme.channel_id) {
                            result.programmes.push(programme);
                        } else {
                            tracing::debug!(
                                "Dropping programme for channel '{}' not in the lineup",
                                programme.channel_id
                            );
                            result.unmatched += 1;
                        }
                    }
                    AiringOutcome::Skip(reason) => {
                        tracing::warn!("❌ Skipping airing: {}", reason);
                        result.skipped += 1;
                    }
                }
            }
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let document =
            xmltv::render_document(&self.lineup, &result.programmes, self.config.timezone())?;

        let filename = self.config.output_filename();
        tracing::debug!("Writing XMLTV document ({} bytes) to storage", document.len());
        self.storage.write_file(filename, &document).await?;

        if self.config.gzip_output() {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&document)?;
            let compressed = encoder.finish()?;
            let gz_filename = format!("{}.gz", filename);
            tracing::debug!("Writing gzip duplicate ({} bytes)", compressed.len());
            self.storage.write_file(&gz_filename, &compressed).await?;
        }

        Ok(format!("{}/{}", self.config.output_path(), filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FieldMap, WindowPolicy};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EpgError::IoError(std::io::Error::new(
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

    struct MockConfig {
        api_endpoint: String,
        fields: FieldMap,
        gzip: bool,
    }

    impl MockConfig {
        fn new(api_endpoint: String) -> Self {
            Self {
                api_endpoint,
                fields: FieldMap::default(),
                gzip: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn region(&self) -> &str {
            "ph"
        }

        fn device_type(&self) -> &str {
            "all"
        }

        fn client_tag(&self) -> &str {
            "pldt-cignal-web"
        }

        fn page_number(&self) -> u32 {
            1
        }

        fn page_size(&self) -> u32 {
            100
        }

        fn request_headers(&self) -> Option<&BTreeMap<String, String>> {
            None
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(5)
        }

        fn insecure_tls(&self) -> bool {
            false
        }

        fn window(&self) -> WindowPolicy {
            WindowPolicy {
                anchor_hour_utc: Some(16),
                duration_hours: 24,
            }
        }

        fn fields(&self) -> &FieldMap {
            &self.fields
        }

        fn timezone(&self) -> chrono_tz::Tz {
            chrono_tz::Asia::Manila
        }

        fn output_path(&self) -> &str {
            "test-output"
        }

        fn output_filename(&self) -> &str {
            "epg.xml"
        }

        fn gzip_output(&self) -> bool {
            self.gzip
        }
    }

    fn lineup() -> ChannelLineup {
        let mut names = BTreeMap::new();
        names.insert("HBO".to_string(), "cg_hbohd".to_string());
        ChannelLineup::new(names, BTreeMap::new())
    }

    fn pipeline(endpoint: String) -> EpgPipeline<MockStorage, MockConfig> {
        EpgPipeline::new(MockStorage::new(), MockConfig::new(endpoint), lineup()).unwrap()
    }

    fn airing(cid: &str, start: &str, end: &str, title: &str) -> Value {
        json!({
            "cid": cid,
            "sc_st_dt": start,
            "sc_ed_dt": end,
            "pgm": {"lod": [{"n": title}], "lon": [{"n": "A feature presentation"}]}
        })
    }

    #[tokio::test]
    async fn test_extract_returns_the_entry_list() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/content/epg");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"data": [{"airing": []}, {"airing": []}]}));
        });

        let entries = pipeline(server.url("/content/epg")).extract().await.unwrap();

        api_mock.assert();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_sends_the_fixed_query_parameters() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/content/epg")
                .query_param("reg", "ph")
                .query_param("dt", "all")
                .query_param("client", "pldt-cignal-web")
                .query_param("pageNumber", "1")
                .query_param("pageSize", "100")
                .query_param_exists("start")
                .query_param_exists("end");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"data": []}));
        });

        pipeline(server.url("/content/epg")).extract().await.unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_extract_surfaces_http_errors() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/content/epg");
            then.status(500);
        });

        let error = pipeline(server.url("/content/epg")).extract().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(error, EpgError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_extract_surfaces_undecodable_bodies() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/content/epg");
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<html>maintenance</html>");
        });

        let error = pipeline(server.url("/content/epg")).extract().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(error, EpgError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_extract_rejects_unexpected_payload_shapes() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/content/epg");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"data": "not-a-list"}));
        });

        let error = pipeline(server.url("/content/epg")).extract().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(error, EpgError::ShapeError { .. }));
    }

    #[tokio::test]
    async fn test_transform_counts_programmes_skips_and_unmatched() {
        let pipeline = pipeline("http://unused.test".to_string());
        let entries = vec![json!({
            "airing": [
                airing("cg_hbohd", "2024-01-15T08:00:00Z", "2024-01-15T09:00:00Z", "Movie Night"),
                airing("cg_hbohd", "not-a-timestamp", "2024-01-15T09:00:00Z", "Broken"),
                json!({"cid": "cg_hbohd", "sc_ed_dt": "2024-01-15T09:00:00Z"}),
                airing("cg_unlisted", "2024-01-15T08:00:00Z", "2024-01-15T09:00:00Z", "Elsewhere"),
            ]
        })];

        let result = pipeline.transform(entries).await.unwrap();

        assert_eq!(result.programmes.len(), 1);
        assert_eq!(result.programmes[0].title, "Movie Night");
        assert_eq!(result.skipped, 2);
        assert_eq!(result.unmatched, 1);
    }

    #[tokio::test]
    async fn test_transform_tolerates_entries_without_airing_lists() {
        let pipeline = pipeline("http://unused.test".to_string());
        let entries = vec![
            json!({"cs": "metadata-only"}),
            json!({"airing": "mistyped"}),
            json!({"airing": [airing(
                "cg_hbohd",
                "2024-01-15T08:00:00Z",
                "2024-01-15T09:00:00Z",
                "Movie Night"
            )]}),
        ];

        let result = pipeline.transform(entries).await.unwrap();

        assert_eq!(result.programmes.len(), 1);
        assert_eq!(result.skipped, 0);
    }

    #[tokio::test]
    async fn test_load_writes_the_document_through_storage() {
        let storage = MockStorage::new();
        let pipeline = EpgPipeline::new(
            storage.clone(),
            MockConfig::new("http://unused.test".to_string()),
            lineup(),
        )
        .unwrap();

        let entries = vec![json!({"airing": [airing(
            "cg_hbohd",
            "2024-01-15T08:00:00Z",
            "2024-01-15T09:00:00Z",
            "Movie Night"
        )]})];
        let result = pipeline.transform(entries).await.unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "test-output/epg.xml");

        let document = String::from_utf8(storage.get_file("epg.xml").await.unwrap()).unwrap();
        assert!(document.contains("<channel id=\"cg_hbohd\">"));
        assert!(document.contains(
            "<programme start=\"20240115160000 +0800\" stop=\"20240115170000 +0800\" channel=\"cg_hbohd\">"
        ));
        assert!(document.contains("<title lang=\"en\">Movie Night</title>"));
    }

    #[tokio::test]
    async fn test_load_writes_a_gzip_duplicate_when_enabled() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new("http://unused.test".to_string());
        config.gzip = true;
        let pipeline = EpgPipeline::new(storage.clone(), config, lineup()).unwrap();

        pipeline.load(TransformResult::default()).await.unwrap();

        let document = storage.get_file("epg.xml").await.unwrap();
        let compressed = storage.get_file("epg.xml.gz").await.unwrap();

        let mut decoder = flate2::read::GzDecoder::new(compressed.as_slice());
        let mut decompressed = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut decompressed).unwrap();
        assert_eq!(decompressed, document);
    }
}
