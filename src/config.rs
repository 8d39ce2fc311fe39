//! Configuration loader for the equipment payment portal.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Endpoint joined onto the payment base URL when none is configured.
pub const DEFAULT_PAYMENT_ENDPOINT: &str = "request-payment";

/// Root configuration struct mirroring the YAML schema exactly.
///
/// Every value may be absent or empty at load time. Each component checks
/// the values it needs at first use, so a deployment that only serves the
/// proxy can run without the payment pair and vice versa.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub hris: Upstream,
    #[serde(default)]
    pub post: Upstream,
    #[serde(default)]
    pub payment: PaymentApi,
}

/// Base URL and bearer token pair for one proxied upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Upstream {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
}

/// Settings for the payment API the submission form talks to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentApi {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    /// Path segment appended to `base_url` when posting payment requests.
    #[serde(default = "default_payment_endpoint")]
    pub endpoint: String,
}

fn default_payment_endpoint() -> String {
    DEFAULT_PAYMENT_ENDPOINT.to_string()
}

impl Default for PaymentApi {
    fn default() -> Self {
        PaymentApi {
            base_url: String::new(),
            token: String::new(),
            endpoint: default_payment_endpoint(),
        }
    }
}

impl Upstream {
    /// True when both halves of the pair are present.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.token.trim().is_empty()
    }
}

impl Config {
    /// Read all values from process environment variables. Absent variables
    /// become empty strings; nothing is validated here.
    pub fn from_env() -> Config {
        Config::from_env_fn(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but with an injectable lookup.
    pub fn from_env_fn(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let var = |key: &str| lookup(key).unwrap_or_default();
        Config {
            hris: Upstream {
                base_url: var("HRIS_API_URL"),
                token: var("HRIS_BEARER_TOKEN"),
            },
            post: Upstream {
                base_url: var("POST_API_URL"),
                token: var("POST_BEARER_TOKEN"),
            },
            payment: PaymentApi {
                base_url: var("PAYMENT_API_URL"),
                token: var("PAYMENT_BEARER_TOKEN"),
                endpoint: lookup("PAYMENT_ENDPOINT")
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(default_payment_endpoint),
            },
        }
    }
}

/// Load configuration from a YAML file.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Returns example YAML content matching the schema.
pub fn example() -> &'static str {
    r#"hris:
  base_url: "https://hris.example.com/api/v1/employee-data"
  token: "YOUR_HRIS_BEARER_TOKEN"

post:
  base_url: "https://equipment-api.example.com/api/v1/requests"
  token: "YOUR_POST_BEARER_TOKEN"

payment:
  base_url: "https://equipment-api.example.com/api/v1/"
  token: "YOUR_PAYMENT_BEARER_TOKEN"
  endpoint: "request-payment"
"#
}
