use crate::config::channel_map;
use crate::core::ConfigProvider;
use crate::domain::model::{ChannelLineup, FieldMap, WindowPolicy};
use crate::utils::error::{EpgError, Result};
use crate::utils::validation::Validate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub region: String,
    pub client: String,
    pub device_type: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub insecure_tls: Option<bool>,
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowConfig {
    pub anchor_hour_utc: Option<u32>,
    pub duration_hours: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    pub map_file: String,
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub fields: FieldMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub filename: Option<String>,
    pub timezone: Option<String>,
    pub gzip: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EpgError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EpgError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Substitute `${VAR_NAME}` references from the environment; unknown
    /// variables are left as-is so validation can point at them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("source.endpoint", &self.source.endpoint)?;
        crate::utils::validation::validate_non_empty_string("source.region", &self.source.region)?;
        crate::utils::validation::validate_non_empty_string("source.client", &self.source.client)?;
        crate::utils::validation::validate_positive_number(
            "source.page_size",
            self.page_size() as usize,
            1,
        )?;
        crate::utils::validation::validate_positive_number(
            "source.timeout_seconds",
            self.source.timeout_seconds.unwrap_or(30) as usize,
            1,
        )?;

        crate::utils::validation::validate_range(
            "window.duration_hours",
            self.window.duration_hours.unwrap_or(24),
            1,
            168,
        )?;
        if let Some(anchor) = self.window.anchor_hour_utc {
            crate::utils::validation::validate_range("window.anchor_hour_utc", anchor, 0, 23)?;
        }

        crate::utils::validation::validate_path("channels.map_file", &self.channels.map_file)?;
        crate::utils::validation::validate_path("load.output_path", &self.load.output_path)?;
        crate::utils::validation::validate_non_empty_string(
            "load.filename",
            self.output_filename(),
        )?;

        let timezone = self.load.timezone.as_deref().unwrap_or("UTC");
        if timezone.parse::<Tz>().is_err() {
            return Err(EpgError::InvalidConfigValueError {
                field: "load.timezone".to_string(),
                value: timezone.to_string(),
                reason: "Not a known IANA timezone name".to_string(),
            });
        }

        Ok(())
    }

    /// Read the channel lineup the config points at.
    pub fn load_lineup(&self) -> Result<ChannelLineup> {
        channel_map::load(&self.channels.map_file, &self.channels.urls)
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn region(&self) -> &str {
        &self.source.region
    }

    fn device_type(&self) -> &str {
        self.source.device_type.as_deref().unwrap_or("all")
    }

    fn client_tag(&self) -> &str {
        &self.source.client
    }

    fn page_number(&self) -> u32 {
        self.source.page_number.unwrap_or(1)
    }

    fn page_size(&self) -> u32 {
        self.source.page_size.unwrap_or(100)
    }

    fn request_headers(&self) -> Option<&BTreeMap<String, String>> {
        self.source.headers.as_ref()
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds.unwrap_or(30))
    }

    fn insecure_tls(&self) -> bool {
        self.source.insecure_tls.unwrap_or(false)
    }

    fn window(&self) -> WindowPolicy {
        WindowPolicy {
            anchor_hour_utc: self.window.anchor_hour_utc,
            duration_hours: self.window.duration_hours.unwrap_or(24),
        }
    }

    fn fields(&self) -> &FieldMap {
        &self.extract.fields
    }

    fn timezone(&self) -> Tz {
        // unknown names are rejected during validation
        self.load
            .timezone
            .as_deref()
            .unwrap_or("UTC")
            .parse()
            .unwrap_or(chrono_tz::UTC)
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_filename(&self) -> &str {
        self.load.filename.as_deref().unwrap_or("epg.xml")
    }

    fn gzip_output(&self) -> bool {
        self.load.gzip.unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
