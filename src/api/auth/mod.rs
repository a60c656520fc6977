mod browser;
mod oauth;
mod refresh;
mod session;

pub use oauth::{build_authorize_url, Grant};
pub use refresh::REFRESH_MARGIN_SECS;
pub use session::Session;

pub(crate) use browser::authenticate_via_browser;
pub(crate) use oauth::{
    request_token_async, request_token_blocking, revoke_token_async, revoke_token_blocking,
};
pub(crate) use refresh::{refresh_session_async, refresh_session_blocking};
