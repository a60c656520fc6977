#![allow(dead_code)]

use dracoon::api::auth::Session;
use dracoon::{DracoonClient, DracoonConfig};

pub const ACCESS_TOKEN: &str = "access-token";
pub const REFRESH_TOKEN: &str = "refresh-token";
/// base64("client:secret")
pub const BASIC_AUTH: &str = "Basic Y2xpZW50OnNlY3JldA==";

pub fn config(server_url: &str) -> DracoonConfig {
    DracoonConfig::new(server_url, "client", "secret").unwrap()
}

pub fn client(server_url: &str) -> DracoonClient {
    DracoonClient::new(config(server_url)).unwrap()
}

pub fn connected_client(server_url: &str) -> DracoonClient {
    let client = client(server_url);
    client.set_session(
        Session::new(ACCESS_TOKEN)
            .with_refresh_token(REFRESH_TOKEN)
            .expiring_in(3600),
    );
    client
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn token_body(access_token: &str, refresh_token: &str) -> String {
    format!(
        r#"{{"access_token":"{access_token}","refresh_token":"{refresh_token}","token_type":"bearer","expires_in":28800,"scope":"all"}}"#
    )
}

pub fn group_body(id: i64, name: &str) -> String {
    format!(r#"{{"id":{id},"name":"{name}","cntUsers":0}}"#)
}

pub fn user_page(offset: u64, total: u64) -> String {
    format!(
        r#"{{"range":{{"offset":{offset},"limit":500,"total":{total}}},"items":[{{"id":{offset},"userName":"user{offset}"}}]}}"#
    )
}
