use super::account;
use super::auth::{
    authenticate_via_browser, build_authorize_url, refresh_session_async,
    refresh_session_blocking, request_token_async, request_token_blocking, revoke_token_async,
    revoke_token_blocking, Grant, Session, REFRESH_MARGIN_SECS,
};
use super::endpoint::Endpoint;
use crate::config::DracoonConfig;
use crate::db::TokenStore;
use crate::error::{DracoonError, Result};

use parking_lot::RwLock;
use reqwest::{blocking, header::ACCEPT, redirect::Policy, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const API_PATH: &str = "/api/v4";

/// 构建一个带有统一超时与重定向策略的阻塞式 HTTP 客户端。
/// 阻塞客户端不能在异步运行时中析构，因此每次同步调用单独构建。
pub(crate) fn build_blocking_client(timeout: Duration) -> Result<blocking::Client> {
    Ok(blocking::Client::builder()
        .timeout(timeout)
        .redirect(Policy::limited(10))
        .build()?)
}

pub(crate) fn build_async_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .redirect(Policy::limited(10))
        .build()?)
}

/// DRACOON 实例的客户端：持有配置与当前会话，负责附加 bearer token 并发送请求。
/// 所有请求既有同步版本，也有 `_async` 版本。
pub struct DracoonClient {
    config: DracoonConfig,
    http: reqwest::Client,
    session: RwLock<Option<Session>>,
    store: Option<TokenStore>,
}

impl DracoonClient {
    pub fn new(config: DracoonConfig) -> Result<Self> {
        let http = build_async_client(config.timeout)?;
        Ok(DracoonClient {
            config,
            http,
            session: RwLock::new(None),
            store: None,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(DracoonConfig::from_env()?)
    }

    /// 登录/刷新后自动把会话写入该存储，登出时清除。
    pub fn with_token_store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &DracoonConfig {
        &self.config
    }

    pub fn api_base(&self) -> String {
        format!("{}{API_PATH}", self.config.base_url)
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn set_session(&self, session: Session) {
        self.persist(&session);
        *self.session.write() = Some(session);
    }

    /// 有会话且令牌仍有效（或可刷新）。
    pub fn is_connected(&self) -> bool {
        self.session
            .read()
            .as_ref()
            .map(|s| !s.is_expired() || s.refresh_token.is_some())
            .unwrap_or(false)
    }

    /// 从令牌存储恢复上次的会话；没有存储或没有记录时返回 false。
    pub fn restore_session(&self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        match store.load_session(&self.config.base_url)? {
            Some(record) => {
                debug!(base_url = %self.config.base_url, "restored persisted session");
                *self.session.write() = Some(Session::from(record));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn persist(&self, session: &Session) {
        if let Some(store) = &self.store {
            if let Err(err) = store.upsert_session(&session.to_record(&self.config.base_url)) {
                warn!(error = %err, "failed to persist DRACOON session");
            }
        }
    }

    fn forget(&self) -> Option<Session> {
        if let Some(store) = &self.store {
            if let Err(err) = store.clear_session(&self.config.base_url) {
                warn!(error = %err, "failed to clear persisted DRACOON session");
            }
        }
        self.session.write().take()
    }

    fn password_grant(username: &str, password: &str) -> Result<Grant> {
        if username.trim().is_empty() {
            return Err(DracoonError::InvalidArgument(
                "username is required".to_string(),
            ));
        }
        Ok(Grant::Password {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn code_grant(&self, code: &str) -> Result<Grant> {
        let redirect_uri = self.config.redirect_uri.clone().ok_or_else(|| {
            DracoonError::InvalidConfig(
                "redirect uri is required for the authorization code flow".to_string(),
            )
        })?;
        Ok(Grant::AuthorizationCode {
            code: code.to_string(),
            redirect_uri,
            code_verifier: None,
        })
    }

    pub fn connect_password(&self, username: &str, password: &str) -> Result<()> {
        let grant = Self::password_grant(username, password)?;
        let session = request_token_blocking(&self.config, &grant)?;
        info!(base_url = %self.config.base_url, "connected to DRACOON (password flow)");
        self.set_session(session);
        Ok(())
    }

    pub async fn connect_password_async(&self, username: &str, password: &str) -> Result<()> {
        let grant = Self::password_grant(username, password)?;
        let session = request_token_async(&self.http, &self.config, &grant).await?;
        info!(base_url = %self.config.base_url, "connected to DRACOON (password flow)");
        self.set_session(session);
        Ok(())
    }

    /// 用带外获得的授权码登录，例如用户把 [`Self::authorize_url`] 的结果粘贴回来。
    pub fn connect_authorization_code(&self, code: &str) -> Result<()> {
        let grant = self.code_grant(code)?;
        let session = request_token_blocking(&self.config, &grant)?;
        info!(base_url = %self.config.base_url, "connected to DRACOON (authorization code)");
        self.set_session(session);
        Ok(())
    }

    pub async fn connect_authorization_code_async(&self, code: &str) -> Result<()> {
        let grant = self.code_grant(code)?;
        let session = request_token_async(&self.http, &self.config, &grant).await?;
        info!(base_url = %self.config.base_url, "connected to DRACOON (authorization code)");
        self.set_session(session);
        Ok(())
    }

    /// 打开系统浏览器完成授权码流程（阻塞直到浏览器重定向回来）。
    pub fn connect_browser(&self) -> Result<()> {
        let session = authenticate_via_browser(&self.config)?;
        info!(base_url = %self.config.base_url, "connected to DRACOON (browser)");
        self.set_session(session);
        Ok(())
    }

    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let redirect_uri = self.config.redirect_uri.as_deref().ok_or_else(|| {
            DracoonError::InvalidConfig(
                "redirect uri is required for the authorization code flow".to_string(),
            )
        })?;
        build_authorize_url(&self.config, redirect_uri, state, None)
    }

    pub fn refresh(&self) -> Result<Session> {
        let current = self.session().ok_or(DracoonError::NotConnected)?;
        let refreshed = refresh_session_blocking(&self.config, &current)?;
        info!("refreshed DRACOON access token");
        self.set_session(refreshed.clone());
        Ok(refreshed)
    }

    pub async fn refresh_async(&self) -> Result<Session> {
        let current = self.session().ok_or(DracoonError::NotConnected)?;
        let refreshed = refresh_session_async(&self.http, &self.config, &current).await?;
        info!("refreshed DRACOON access token");
        self.set_session(refreshed.clone());
        Ok(refreshed)
    }

    /// 撤销访问令牌与刷新令牌；本地会话无论撤销是否成功都会被清除。
    /// 两个令牌都会尝试撤销，返回第一个失败。
    pub fn logout(&self) -> Result<()> {
        let Some(session) = self.forget() else {
            return Ok(());
        };
        let access = revoke_token_blocking(&self.config, &session.access_token, "access_token");
        let refresh = session
            .refresh_token
            .as_deref()
            .map(|token| revoke_token_blocking(&self.config, token, "refresh_token"))
            .transpose();
        finish_logout(access, refresh)
    }

    pub async fn logout_async(&self) -> Result<()> {
        let Some(session) = self.forget() else {
            return Ok(());
        };
        let access =
            revoke_token_async(&self.http, &self.config, &session.access_token, "access_token")
                .await;
        let refresh = match session.refresh_token.as_deref() {
            Some(token) => revoke_token_async(&self.http, &self.config, token, "refresh_token")
                .await
                .map(Some),
            None => Ok(None),
        };
        finish_logout(access, refresh)
    }

    /// 通过 `GET /user/account` 检查令牌是否仍被接受。
    pub fn test_connection(&self) -> Result<bool> {
        connection_state(self.send(account::get_account()))
    }

    pub async fn test_connection_async(&self) -> Result<bool> {
        connection_state(self.send_async(account::get_account()).await)
    }

    fn access_token_blocking(&self) -> Result<String> {
        let session = self.session().ok_or(DracoonError::NotConnected)?;
        if session.expires_within(REFRESH_MARGIN_SECS) {
            if session.refresh_token.is_some() {
                debug!("access token expiring soon, refreshing");
                return Ok(self.refresh()?.access_token);
            }
            if session.is_expired() {
                warn!("access token expired and no refresh token available");
                return Err(DracoonError::NotConnected);
            }
        }
        Ok(session.access_token)
    }

    async fn access_token_async(&self) -> Result<String> {
        let session = self.session().ok_or(DracoonError::NotConnected)?;
        if session.expires_within(REFRESH_MARGIN_SECS) {
            if session.refresh_token.is_some() {
                debug!("access token expiring soon, refreshing");
                return Ok(self.refresh_async().await?.access_token);
            }
            if session.is_expired() {
                warn!("access token expired and no refresh token available");
                return Err(DracoonError::NotConnected);
            }
        }
        Ok(session.access_token)
    }

    /// 同步发送一个请求描述并解析响应。
    pub fn send<T: DeserializeOwned>(&self, endpoint: Endpoint<T>) -> Result<T> {
        let token = if endpoint.is_authenticated() {
            Some(self.access_token_blocking()?)
        } else {
            None
        };
        let url = endpoint.url(&self.api_base())?;
        debug!(method = %endpoint.method(), %url, "sending DRACOON request");

        let client = build_blocking_client(self.config.timeout)?;
        let mut request = client
            .request(endpoint.method().clone(), url.clone())
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = endpoint.body() {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.bytes()?;
        decode_response(status, url.as_str(), &body)
    }

    pub async fn send_async<T: DeserializeOwned>(&self, endpoint: Endpoint<T>) -> Result<T> {
        let token = if endpoint.is_authenticated() {
            Some(self.access_token_async().await?)
        } else {
            None
        };
        let url = endpoint.url(&self.api_base())?;
        debug!(method = %endpoint.method(), %url, "sending DRACOON request");

        let mut request = self
            .http
            .request(endpoint.method().clone(), url.clone())
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = endpoint.body() {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        decode_response(status, url.as_str(), &body)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.send(with_query(Endpoint::get(path), query))
    }

    pub fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Endpoint::post(path).json(body)?)
    }

    pub fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Endpoint::put(path).json(body)?)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Endpoint::delete(path))
    }

    pub async fn get_async<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.send_async(with_query(Endpoint::get(path), query)).await
    }

    pub async fn post_async<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_async(Endpoint::post(path).json(body)?).await
    }

    pub async fn put_async<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_async(Endpoint::put(path).json(body)?).await
    }

    pub async fn delete_async<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_async(Endpoint::delete(path)).await
    }
}

fn with_query<T>(endpoint: Endpoint<T>, query: &[(&str, &str)]) -> Endpoint<T> {
    query
        .iter()
        .fold(endpoint, |endpoint, (key, value)| endpoint.query(*key, value))
}

fn finish_logout(access: Result<()>, refresh: Result<Option<()>>) -> Result<()> {
    access?;
    refresh?;
    info!("signed out of DRACOON");
    Ok(())
}

/// 自动刷新被拒（OAuth 错误）同样视为会话不可用。
fn connection_state<T>(result: Result<T>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(DracoonError::NotConnected) => Ok(false),
        Err(DracoonError::OAuth { error, .. }) => {
            debug!(%error, "token refresh rejected while testing connection");
            Ok(false)
        }
        Err(err) if err.is_unauthorized() => Ok(false),
        Err(err) => Err(err),
    }
}

/// 2xx 时解析 JSON（空响应体按 `null` 解析，对应 `()`）；否则原样返回状态码与响应体。
fn decode_response<T: DeserializeOwned>(status: StatusCode, url: &str, body: &[u8]) -> Result<T> {
    if !status.is_success() {
        warn!(%status, %url, "DRACOON request failed");
        return Err(DracoonError::from_response(
            status,
            url,
            String::from_utf8_lossy(body).into_owned(),
        ));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("null")?);
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::groups::Group;

    fn client() -> DracoonClient {
        DracoonClient::new(DracoonConfig::new("https://dracoon.team", "id", "secret").unwrap())
            .unwrap()
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        decode_response::<()>(StatusCode::NO_CONTENT, "u", b"").unwrap();
        decode_response::<()>(StatusCode::OK, "u", b"  \n").unwrap();
    }

    #[test]
    fn empty_body_for_typed_response_is_json_error() {
        let result: Result<Group> = decode_response(StatusCode::OK, "u", b"");
        assert!(matches!(result, Err(DracoonError::Json(_))));
    }

    #[test]
    fn non_success_is_passed_through() {
        let result: Result<()> =
            decode_response(StatusCode::FORBIDDEN, "u", br#"{"code":403,"message":"Forbidden"}"#);
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.api_error().unwrap().message.as_deref(), Some("Forbidden"));
    }

    #[test]
    fn non_utf8_error_body_is_replaced_lossily() {
        let result: Result<()> =
            decode_response(StatusCode::BAD_GATEWAY, "u", b"upstream \xff failed");
        match result.unwrap_err() {
            DracoonError::Http { body, error, .. } => {
                assert_eq!(body, "upstream \u{FFFD} failed");
                assert!(error.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejected_refresh_means_not_connected() {
        let rejected: Result<()> = Err(DracoonError::OAuth {
            error: "invalid_grant".to_string(),
            description: "Invalid refresh token".to_string(),
        });
        assert!(!connection_state(rejected).unwrap());

        let server_error: Result<()> =
            Err(DracoonError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "u", String::new()));
        assert!(connection_state(server_error).is_err());
    }

    #[test]
    fn logout_reports_first_revoke_failure() {
        assert!(matches!(
            finish_logout(Err(DracoonError::NotConnected), Ok(Some(()))),
            Err(DracoonError::NotConnected)
        ));
        assert!(finish_logout(Ok(()), Err(DracoonError::NotConnected)).is_err());
        finish_logout(Ok(()), Ok(None)).unwrap();
    }

    #[test]
    fn api_base_appends_version_prefix() {
        assert_eq!(client().api_base(), "https://dracoon.team/api/v4");
    }

    #[test]
    fn not_connected_without_session() {
        let client = client();
        assert!(!client.is_connected());
        assert!(matches!(
            client.send(account::get_account()),
            Err(DracoonError::NotConnected)
        ));
        assert!(!client.test_connection().unwrap());
    }

    #[test]
    fn expired_session_without_refresh_token_is_not_connected() {
        let client = client();
        client.set_session(Session::new("stale").expiring_in(-10));
        assert!(!client.is_connected());
        assert!(matches!(
            client.access_token_blocking(),
            Err(DracoonError::NotConnected)
        ));
    }

    #[test]
    fn code_flow_requires_redirect_uri() {
        let client = client();
        assert!(matches!(
            client.connect_authorization_code("code"),
            Err(DracoonError::InvalidConfig(_))
        ));
        assert!(client.authorize_url("state").is_err());
    }

    #[test]
    fn logout_without_session_is_noop() {
        client().logout().unwrap();
    }
}
