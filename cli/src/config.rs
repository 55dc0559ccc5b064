use eyre::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The [stack] section of user-manager.toml
///
/// Every field has a sensible default so the file is optional: the stack
/// name falls back to "user-manager", account and region are resolved from
/// the AWS credentials when not pinned here. The assets bucket has no
/// default and is required for deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default = "default_stack_name")]
    pub name: String,

    pub account: Option<String>,
    pub region: Option<String>,
    pub assets_bucket: Option<String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            name: default_stack_name(),
            account: None,
            region: None,
            assets_bucket: None,
        }
    }
}

fn default_stack_name() -> String {
    "user-manager".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stack: StackConfig,
}

impl Config {
    pub fn from_path(path: PathBuf) -> eyre::Result<Self> {
        let config_toml_path = path.join("user-manager.toml");

        if let Ok(toml_string) = std::fs::read_to_string(&config_toml_path) {
            let config =
                toml::from_str(&toml_string).wrap_err("Failed to parse user-manager.toml")?;
            Ok(config)
        } else {
            // Just use a default config if user-manager.toml is not found
            Ok(Config::default())
        }
    }

    pub fn from_current_dir() -> eyre::Result<Self> {
        Self::from_path(std::env::current_dir().wrap_err("Failed to get current dir")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::from_path(std::env::temp_dir().join("nonexistent")).unwrap();

        assert_eq!(config.stack.name, "user-manager");
        assert!(config.stack.assets_bucket.is_none());
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let config: Config = toml::from_str(
            r#"
            [stack]
            assets_bucket = "my-assets"
            region = "eu-central-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.stack.name, "user-manager");
        assert_eq!(config.stack.assets_bucket.as_deref(), Some("my-assets"));
        assert_eq!(config.stack.region.as_deref(), Some("eu-central-1"));
        assert!(config.stack.account.is_none());
    }
}
