use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const ENV_BASE_URL: &str = "BOOK_STORE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "BOOK_STORE_TIMEOUT_SECS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("base URL must not be empty")]
    EmptyBaseUrl,
    #[error("invalid BOOK_STORE_TIMEOUT_SECS '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// リモートAPIへの接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `/books` を除いたホスト部分（例: `http://localhost:5000`）
    pub base_url: String,
    /// リクエスト単位のタイムアウト。Noneならトランスポート任せ。
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// CLI引数 → 環境変数 → 既定値 の順で解決する。
    pub fn from_env(arg: Option<String>) -> Result<Self, ConfigError> {
        Self::resolve(
            arg,
            std::env::var(ENV_BASE_URL).ok(),
            std::env::var(ENV_TIMEOUT_SECS).ok(),
        )
    }

    pub fn resolve(
        arg: Option<String>,
        env_url: Option<String>,
        env_timeout: Option<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = arg
            .or(env_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim().to_string();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let timeout = env_timeout
            .map(|raw| parse_timeout(&raw))
            .transpose()?;

        Ok(Self { base_url, timeout })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
