//! DRACOON REST API 客户端。
//!
//! 每个接口函数返回一个 [`Endpoint`] 请求描述，通过 [`DracoonClient::send`]（同步）
//! 或 [`DracoonClient::send_async`]（异步）发送。非 2xx 响应以
//! [`DracoonError::Http`] 原样返回状态码与响应体，不做重试。

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use api::{DracoonClient, Endpoint, ListQuery};
pub use config::DracoonConfig;
pub use db::TokenStore;
pub use error::{ApiErrorResponse, DracoonError, Result};
