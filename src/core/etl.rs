use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting EPG conversion...");

        tracing::info!("Fetching guide data...");
        let entries = self.pipeline.extract().await?;
        tracing::info!("Fetched {} guide entries", entries.len());

        tracing::info!("Extracting programmes...");
        let result = self.pipeline.transform(entries).await?;
        tracing::info!(
            "📺 {} programmes added, {} skipped, {} without a known channel",
            result.programmes.len(),
            result.skipped,
            result.unmatched
        );

        tracing::info!("Writing XMLTV output...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
