use crate::error::{DracoonError, Result};
use std::time::Duration;

pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 默认的请求超时时间。
pub fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

/// 把任意超时限制在 [MIN, MAX] 区间内。
pub fn clamp_timeout(value: Duration) -> Duration {
    Duration::from_secs(value.as_secs().clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}

/// 解析环境变量中的秒数；无法解析时返回错误，越界时截断。
pub fn parse_timeout(raw: &str) -> Result<Duration> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| DracoonError::InvalidConfig(format!("invalid timeout value {raw:?}: {e}")))?;
    Ok(clamp_timeout(Duration::from_secs(parsed)))
}
