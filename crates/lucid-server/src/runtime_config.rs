use lucid_core::config::{ServerConfig, ENV_API_URL, ENV_ASSET_BUCKET};
use serde_json::json;

/// Deployment settings handed to the browser bundle through `/config.js`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_url: String,
    pub asset_bucket: String,
}

impl RuntimeConfig {
    pub fn new(api_url: impl Into<String>, asset_bucket: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            asset_bucket: asset_bucket.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.api_url.clone(), config.asset_bucket.clone())
    }

    pub fn script(&self) -> String {
        let payload = json!({
            ENV_API_URL: self.api_url,
            ENV_ASSET_BUCKET: self.asset_bucket,
        });
        format!("window.__APP_CONFIG__ = {};", payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_with_empty_values() {
        assert_eq!(
            RuntimeConfig::default().script(),
            r#"window.__APP_CONFIG__ = {"VITE_API_URL":"","VITE_ASSET_BUCKET":""};"#
        );
    }

    #[test]
    fn test_script_escapes_values() {
        let config = RuntimeConfig::new(r#"https://api.example.com/"; alert(1); ""#, "bucket");
        let script = config.script();
        let json = script
            .strip_prefix("window.__APP_CONFIG__ = ")
            .and_then(|s| s.strip_suffix(';'))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(parsed["VITE_API_URL"], config.api_url);
        assert_eq!(parsed["VITE_ASSET_BUCKET"], "bucket");
    }
}
