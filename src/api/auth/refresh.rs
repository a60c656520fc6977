use super::oauth::{request_token_async, request_token_blocking, Grant};
use super::session::Session;
use crate::config::DracoonConfig;
use crate::error::{DracoonError, Result};

/// 距离过期不足该秒数时提前刷新。
pub const REFRESH_MARGIN_SECS: i64 = 60;

fn refresh_grant(session: &Session) -> Result<Grant> {
    let refresh_token = session
        .refresh_token
        .clone()
        .ok_or(DracoonError::NotConnected)?;
    Ok(Grant::RefreshToken { refresh_token })
}

/// 服务端未轮换 refresh token 或未返回 scope 时沿用旧值。
fn merge_refreshed(previous: &Session, refreshed: Session) -> Session {
    Session {
        refresh_token: refreshed
            .refresh_token
            .or_else(|| previous.refresh_token.clone()),
        scope: refreshed.scope.or_else(|| previous.scope.clone()),
        token_type: refreshed
            .token_type
            .or_else(|| previous.token_type.clone()),
        ..refreshed
    }
}

pub(crate) fn refresh_session_blocking(config: &DracoonConfig, session: &Session) -> Result<Session> {
    let grant = refresh_grant(session)?;
    let refreshed = request_token_blocking(config, &grant)?;
    Ok(merge_refreshed(session, refreshed))
}

pub(crate) async fn refresh_session_async(
    http: &reqwest::Client,
    config: &DracoonConfig,
    session: &Session,
) -> Result<Session> {
    let grant = refresh_grant(session)?;
    let refreshed = request_token_async(http, config, &grant).await?;
    Ok(merge_refreshed(session, refreshed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_without_token_is_not_connected() {
        let session = Session::new("access");
        assert!(matches!(
            refresh_grant(&session),
            Err(DracoonError::NotConnected)
        ));
    }

    #[test]
    fn merge_keeps_previous_refresh_token() {
        let mut previous = Session::new("old").with_refresh_token("refresh-1");
        previous.scope = Some("all".to_string());
        let refreshed = Session::new("new").expiring_in(3600);

        let merged = merge_refreshed(&previous, refreshed);
        assert_eq!(merged.access_token, "new");
        assert_eq!(merged.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(merged.scope.as_deref(), Some("all"));
        assert!(merged.expires_at.is_some());
    }

    #[test]
    fn merge_prefers_rotated_refresh_token() {
        let previous = Session::new("old").with_refresh_token("refresh-1");
        let refreshed = Session::new("new").with_refresh_token("refresh-2");
        assert_eq!(
            merge_refreshed(&previous, refreshed).refresh_token.as_deref(),
            Some("refresh-2")
        );
    }
}
