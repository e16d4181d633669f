//! CLI configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pharma_data::DEFAULT_BASE_URL;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "PHARMA_API_URL";
/// Environment variable overriding `api.token`.
pub const ENV_TOKEN: &str = "PHARMA_TOKEN";
/// Environment variable overriding `api.admin_token`.
pub const ENV_ADMIN_TOKEN: &str = "PHARMA_ADMIN_TOKEN";

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub cart: CartConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Apply `PHARMA_*` overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.api.token = Some(token);
        }
        if let Some(token) = get(ENV_ADMIN_TOKEN) {
            self.api.admin_token = Some(token);
        }
        self
    }
}

/// REST endpoint and bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Customer bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Admin bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            admin_token: None,
        }
    }
}

/// Where the durable cart lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    /// Directory for the cart store (default: `$HOME/.local/share/pharma/cart`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,

    #[serde(default = "default_cart_key")]
    pub key: String,

    /// Re-price an existing line from the catalog when more is added.
    #[serde(default)]
    pub reprice_on_add: bool,
}

fn default_cart_key() -> String {
    "cart".to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            key: default_cart_key(),
            reprice_on_add: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    60
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Who is signed in, and the contact details copied into new orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,

    /// `customer` or `admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Generate a default pharma.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# Pharmacy storefront client configuration

[api]
base_url = "{base_url}"
# token = "<customer bearer token>"
# admin_token = "<admin bearer token>"

[cart]
# store_dir = "/home/me/.local/share/pharma/cart"
key = "cart"
reprice_on_add = false

[dashboard]
ttl_secs = 60

[session]
# user_id = "7"
# admin_id = "1"
# role = "customer"
# name = "Rahim Uddin"
# phone = "01700000000"
# email = "rahim@example.com"
"#,
        base_url = DEFAULT_BASE_URL
    )
}
