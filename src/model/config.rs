use serde::{Deserialize, Serialize};

/// Top-level configuration (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[api]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the todo backend, e.g. `http://localhost:5000/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// `[auth]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token presented to the backend. `TK_TOKEN` overrides this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Apply environment-style overrides. Pure so it can be tested without
    /// touching the process environment; callers pass the actual env values.
    pub fn apply_overrides(&mut self, base_url: Option<String>, token: Option<String>) {
        if let Some(url) = base_url {
            self.api.base_url = url;
        }
        if let Some(token) = token {
            self.auth.token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout_secs, 10);
        assert!(config.auth.token.is_none());
    }

    #[test]
    fn partial_sections_fill_in() {
        let config: Config = toml::from_str(
            r#"[api]
base_url = "https://todos.example.com/api"
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://todos.example.com/api");
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config: Config = toml::from_str(
            r#"[auth]
token = "from-file"
"#,
        )
        .unwrap();
        config.apply_overrides(Some("http://10.0.0.2/api".into()), Some("from-env".into()));
        assert_eq!(config.api.base_url, "http://10.0.0.2/api");
        assert_eq!(config.auth.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn none_overrides_change_nothing() {
        let mut config = Config::default();
        let before = config.clone();
        config.apply_overrides(None, None);
        assert_eq!(config, before);
    }
}
