pub mod timeout;

pub use timeout::{clamp_timeout, default_timeout, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};

use crate::error::{DracoonError, Result};
use std::time::Duration;
use url::Url;

const ENV_BASE_URL: &str = "DRACOON_BASE_URL";
const ENV_CLIENT_ID: &str = "DRACOON_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "DRACOON_CLIENT_SECRET";
const ENV_REDIRECT_URI: &str = "DRACOON_REDIRECT_URI";
const ENV_TIMEOUT_SECS: &str = "DRACOON_TIMEOUT_SECS";

/// 连接某个 DRACOON 实例所需的全部配置。
/// `base_url` 只包含协议与主机（例如 `https://dracoon.team`），API 前缀由客户端拼接。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DracoonConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub timeout: Duration,
}

impl DracoonConfig {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(DracoonError::InvalidConfig(
                "client id is required".to_string(),
            ));
        }
        Ok(DracoonConfig {
            base_url,
            client_id,
            client_secret: client_secret.into(),
            redirect_uri: None,
            timeout: default_timeout(),
        })
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = clamp_timeout(timeout);
        self
    }

    /// 从进程环境变量读取配置。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构造配置，便于测试时注入变量。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| DracoonError::InvalidConfig(format!("{key} is not set")))
        };

        let mut config = DracoonConfig::new(
            required(ENV_BASE_URL)?,
            required(ENV_CLIENT_ID)?,
            lookup(ENV_CLIENT_SECRET).unwrap_or_default(),
        )?;

        if let Some(uri) = lookup(ENV_REDIRECT_URI).filter(|v| !v.trim().is_empty()) {
            config.redirect_uri = Some(uri);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout = timeout::parse_timeout(&raw)?;
        }
        Ok(config)
    }
}

/// 校验 base URL 并去掉末尾的 `/`，避免拼接出 `//api/v4`。
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(DracoonError::InvalidConfig(
            "base url is required".to_string(),
        ));
    }
    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(DracoonError::InvalidConfig(format!(
            "unsupported url scheme {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(DracoonError::InvalidConfig(format!(
            "base url {trimmed} has no host"
        )));
    }
    Ok(trimmed.to_string())
}
