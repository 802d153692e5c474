use crate::domain::model::ChannelLineup;
use crate::utils::error::{EpgError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Load the channel lineup from a JSON file shaped like
/// `{"HBO": "cg_hbohd", ...}`. Any problem here is fatal for the run:
/// without channels there is nothing to emit.
pub fn load<P: AsRef<Path>>(path: P, urls: &BTreeMap<String, String>) -> Result<ChannelLineup> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| EpgError::ConfigError {
        message: format!("channel map '{}' is unreadable: {}", path.display(), e),
    })?;

    let names: BTreeMap<String, String> =
        serde_json::from_str(&content).map_err(|e| EpgError::ConfigError {
            message: format!(
                "channel map '{}' is not a flat name-to-id JSON object: {}",
                path.display(),
                e
            ),
        })?;

    if names.is_empty() {
        return Err(EpgError::ConfigError {
            message: format!("channel map '{}' lists no channels", path.display()),
        });
    }

    Ok(ChannelLineup::new(names, urls.clone()))
}
