use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DracoonError>;

/// DRACOON 在非 2xx 响应中返回的错误体。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub debug_info: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Error)]
pub enum DracoonError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not connected to DRACOON; please sign in first")]
    NotConnected,
    #[error("connection to DRACOON failed: {0}")]
    Connection(#[from] reqwest::Error),
    /// 非 2xx 响应。`body` 为响应体文本；非 UTF-8 字节按 U+FFFD 替换，其余内容不做修改。
    #[error("DRACOON returned HTTP {status} for {url}")]
    Http {
        status: StatusCode,
        url: String,
        error: Option<ApiErrorResponse>,
        body: String,
    },
    #[error("OAuth error {error}: {description}")]
    OAuth { error: String, description: String },
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("token storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DracoonError {
    /// 由原始响应体构造 HTTP 错误，响应体保持原样。
    pub(crate) fn from_response(status: StatusCode, url: impl Into<String>, body: String) -> Self {
        let error = serde_json::from_str::<ApiErrorResponse>(&body).ok();
        DracoonError::Http {
            status,
            url: url.into(),
            error,
            body,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DracoonError::Http { status, .. } => Some(*status),
            DracoonError::Connection(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn api_error(&self) -> Option<&ApiErrorResponse> {
        match self {
            DracoonError::Http { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DracoonError {
    fn from(err: rusqlite::Error) -> Self {
        DracoonError::Storage(err.to_string())
    }
}
