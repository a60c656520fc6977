use crate::db::SessionRecord;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// 已登录的 OAuth 会话。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Session {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: None,
            scope: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn expiring_in(mut self, seconds: i64) -> Self {
        self.expires_at = Some(Utc::now() + Duration::seconds(seconds));
        self
    }

    /// 未提供过期时间的令牌视为永不过期。
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| Utc::now() >= expires_at)
            .unwrap_or(false)
    }

    pub fn expires_within(&self, seconds: i64) -> bool {
        self.expires_at
            .map(|expires_at| Utc::now() + Duration::seconds(seconds) >= expires_at)
            .unwrap_or(false)
    }

    pub(crate) fn to_record(&self, base_url: &str) -> SessionRecord {
        SessionRecord {
            base_url: base_url.to_string(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_type: self.token_type.clone(),
            scope: self.scope.clone(),
            expires_at: self.expires_at.map(|at| at.timestamp()),
            updated_at_millis: 0,
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Session {
            access_token: record.access_token,
            refresh_token: record.refresh_token,
            token_type: record.token_type,
            scope: record.scope,
            expires_at: record
                .expires_at
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_without_expiry_never_expires() {
        let session = Session::new("token");
        assert!(!session.is_expired());
        assert!(!session.expires_within(3600));
    }

    #[test]
    fn expiry_window() {
        let session = Session::new("token").expiring_in(30);
        assert!(!session.is_expired());
        assert!(session.expires_within(60));
        assert!(!session.expires_within(10));

        let expired = Session::new("token").expiring_in(-5);
        assert!(expired.is_expired());
    }

    #[test]
    fn record_conversion_keeps_second_precision() {
        let session = Session::new("token")
            .with_refresh_token("refresh")
            .expiring_in(3600);
        let restored = Session::from(session.to_record("https://dracoon.team"));

        assert_eq!(restored.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(
            restored.expires_at.unwrap().timestamp(),
            session.expires_at.unwrap().timestamp()
        );
    }
}
