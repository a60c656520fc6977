use super::session::Session;
use crate::api::client::build_blocking_client;
use crate::config::DracoonConfig;
use crate::error::{DracoonError, Result};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use url::Url;

const TOKEN_PATH: &str = "oauth/token";
const AUTHORIZE_PATH: &str = "oauth/authorize";
const REVOKE_PATH: &str = "oauth/revoke";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
    token_type: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// OAuth 授权方式。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grant {
    Password {
        username: String,
        password: String,
    },
    AuthorizationCode {
        code: String,
        redirect_uri: String,
        code_verifier: Option<String>,
    },
    RefreshToken {
        refresh_token: String,
    },
}

impl Grant {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Grant::Password { .. } => "password",
            Grant::AuthorizationCode { .. } => "authorization_code",
            Grant::RefreshToken { .. } => "refresh_token",
        }
    }

    pub(crate) fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("grant_type", self.name().to_string())];
        match self {
            Grant::Password { username, password } => {
                params.push(("username", username.clone()));
                params.push(("password", password.clone()));
            }
            Grant::AuthorizationCode {
                code,
                redirect_uri,
                code_verifier,
            } => {
                params.push(("code", code.clone()));
                params.push(("redirect_uri", redirect_uri.clone()));
                if let Some(verifier) = code_verifier {
                    params.push(("code_verifier", verifier.clone()));
                }
            }
            Grant::RefreshToken { refresh_token } => {
                params.push(("refresh_token", refresh_token.clone()));
            }
        }
        params
    }
}

pub(crate) fn token_url(config: &DracoonConfig) -> String {
    format!("{}/{TOKEN_PATH}", config.base_url)
}

fn revoke_url(config: &DracoonConfig) -> String {
    format!("{}/{REVOKE_PATH}", config.base_url)
}

/// 通过阻塞式客户端向 `/oauth/token` 申请令牌。客户端凭据走 HTTP Basic。
pub(crate) fn request_token_blocking(config: &DracoonConfig, grant: &Grant) -> Result<Session> {
    let client = build_blocking_client(config.timeout)?;
    let url = token_url(config);
    debug!(grant = grant.name(), %url, "requesting OAuth token");

    let response = client
        .post(&url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&grant.form_params())
        .send()?;

    let status = response.status();
    let body = response.text()?;
    session_from_token_response(status, &url, &body)
}

pub(crate) async fn request_token_async(
    http: &reqwest::Client,
    config: &DracoonConfig,
    grant: &Grant,
) -> Result<Session> {
    let url = token_url(config);
    debug!(grant = grant.name(), %url, "requesting OAuth token");

    let response = http
        .post(&url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&grant.form_params())
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    session_from_token_response(status, &url, &body)
}

/// 解析 token 端点响应。OAuth 错误体优先于 HTTP 状态码。
pub(crate) fn session_from_token_response(
    status: StatusCode,
    url: &str,
    body: &str,
) -> Result<Session> {
    let payload: TokenResponse = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(_) if !status.is_success() => {
            return Err(DracoonError::from_response(status, url, body.to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(error) = payload.error {
        let description = payload.error_description.unwrap_or_default();
        warn!(%status, %error, "token endpoint rejected the request");
        return Err(DracoonError::OAuth { error, description });
    }

    if !status.is_success() {
        return Err(DracoonError::from_response(status, url, body.to_string()));
    }

    let access_token = payload.access_token.ok_or_else(|| DracoonError::OAuth {
        error: "invalid_response".to_string(),
        description: "missing access_token in response".to_string(),
    })?;

    Ok(Session {
        access_token,
        refresh_token: payload.refresh_token,
        token_type: payload.token_type,
        scope: payload.scope,
        expires_at: payload
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}

/// `token_type_hint` 为 `access_token` 或 `refresh_token`。
pub(crate) fn revoke_token_blocking(
    config: &DracoonConfig,
    token: &str,
    token_type_hint: &str,
) -> Result<()> {
    let client = build_blocking_client(config.timeout)?;
    let url = revoke_url(config);
    let response = client
        .post(&url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[("token", token), ("token_type_hint", token_type_hint)])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(DracoonError::from_response(status, url, body));
    }
    Ok(())
}

pub(crate) async fn revoke_token_async(
    http: &reqwest::Client,
    config: &DracoonConfig,
    token: &str,
    token_type_hint: &str,
) -> Result<()> {
    let url = revoke_url(config);
    let response = http
        .post(&url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[("token", token), ("token_type_hint", token_type_hint)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DracoonError::from_response(status, url, body));
    }
    Ok(())
}

/// 构造 `/oauth/authorize` 地址，供浏览器打开。
pub fn build_authorize_url(
    config: &DracoonConfig,
    redirect_uri: &str,
    state: &str,
    code_challenge: Option<&str>,
) -> Result<String> {
    let mut url = Url::parse(&format!("{}/{AUTHORIZE_PATH}", config.base_url))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("response_type", "code")
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state);
        if let Some(challenge) = code_challenge {
            pairs
                .append_pair("code_challenge", challenge)
                .append_pair("code_challenge_method", "S256");
        }
    }
    Ok(url.into())
}

pub(crate) fn build_code_verifier() -> String {
    random_string(64)
}

pub(crate) fn build_code_challenge(code_verifier: &str) -> String {
    let digest = Sha256::digest(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

pub(crate) fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
