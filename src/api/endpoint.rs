use crate::error::Result;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use url::Url;

/// 单次 API 调用的请求描述：方法、相对 `/api/v4` 的路径、查询参数与 JSON 请求体。
/// `T` 为期望的响应类型，同一个描述既可同步发送，也可异步发送。
pub struct Endpoint<T> {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    authenticated: bool,
    _response: PhantomData<fn() -> T>,
}

impl<T> Endpoint<T> {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Endpoint {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            _response: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// 仅在值存在时追加查询参数。
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// 不附带 bearer token 发送（`/public/...` 接口）。
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// 拼接完整 URL；`api_base` 形如 `https://host/api/v4`。
    pub fn url(&self, api_base: &str) -> Result<Url> {
        let path = self.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{path}", api_base.trim_end_matches('/')))?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}

impl<T> fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

/// 列表接口通用的分页/过滤参数。DRACOON 单页最多返回 500 条。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: u64,
    pub limit: Option<u64>,
    pub filter: Option<String>,
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// offset 总是发送；其余参数仅在设置时发送。
    pub(crate) fn apply<T>(&self, endpoint: Endpoint<T>) -> Endpoint<T> {
        endpoint
            .query("offset", self.offset)
            .query_opt("filter", self.filter.as_deref())
            .query_opt("limit", self.limit)
            .query_opt("sort", self.sort.as_deref())
    }
}
