use crate::domain::model::{FieldMap, TransformResult, WindowPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono_tz::Tz;
use std::collections::BTreeMap;
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
    fn api_endpoint(&self) -> &str;
    fn region(&self) -> &str;
    fn device_type(&self) -> &str;
    fn client_tag(&self) -> &str;
    fn page_number(&self) -> u32;
    fn page_size(&self) -> u32;
    fn request_headers(&self) -> Option<&BTreeMap<String, String>>;
    fn request_timeout(&self) -> Duration;
    fn insecure_tls(&self) -> bool;
    fn window(&self) -> WindowPolicy;
    fn fields(&self) -> &FieldMap;
    fn timezone(&self) -> Tz;
    fn output_path(&self) -> &str;
    fn output_filename(&self) -> &str;
    fn gzip_output(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<serde_json::Value>>;
    async fn transform(&self, entries: Vec<serde_json::Value>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
