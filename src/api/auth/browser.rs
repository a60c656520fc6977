use super::oauth::{
    build_authorize_url, build_code_challenge, build_code_verifier, random_string,
    request_token_blocking, Grant,
};
use super::session::Session;
use crate::config::DracoonConfig;
use crate::error::{DracoonError, Result};

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use url::Url;

/// 授权码流程：打开系统浏览器登录，在本地回环端口接收重定向，再用授权码换取令牌。
/// 若配置了 `redirect_uri`（必须指向 localhost / 127.0.0.1），则监听其端口；否则使用随机端口。
pub(crate) fn authenticate_via_browser(config: &DracoonConfig) -> Result<Session> {
    let (listener, redirect_uri) = bind_redirect_listener(config.redirect_uri.as_deref())?;

    let code_verifier = build_code_verifier();
    let code_challenge = build_code_challenge(&code_verifier);
    let state = random_string(32);

    let authorize_url = build_authorize_url(config, &redirect_uri, &state, Some(&code_challenge))?;
    info!(%redirect_uri, "opening browser for DRACOON sign-in");
    webbrowser::open(&authorize_url)?;

    let (code, received_state) = wait_for_code(listener)?;
    if received_state.as_deref() != Some(state.as_str()) {
        return Err(DracoonError::OAuth {
            error: "state_mismatch".to_string(),
            description: "state mismatch in authorization response".to_string(),
        });
    }

    request_token_blocking(
        config,
        &Grant::AuthorizationCode {
            code,
            redirect_uri,
            code_verifier: Some(code_verifier),
        },
    )
}

fn bind_redirect_listener(configured: Option<&str>) -> Result<(TcpListener, String)> {
    match configured {
        Some(raw) => {
            let url = Url::parse(raw)?;
            let host = url.host_str().unwrap_or_default();
            if host != "localhost" && host != "127.0.0.1" {
                return Err(DracoonError::InvalidConfig(format!(
                    "redirect uri {raw} is not a loopback address"
                )));
            }
            let port = url.port_or_known_default().ok_or_else(|| {
                DracoonError::InvalidConfig(format!("redirect uri {raw} has no port"))
            })?;
            let listener = TcpListener::bind(("127.0.0.1", port))?;
            Ok((listener, raw.to_string()))
        }
        None => {
            let listener = TcpListener::bind(("127.0.0.1", 0))?;
            let port = listener.local_addr()?.port();
            Ok((listener, format!("http://localhost:{port}")))
        }
    }
}

/// 接收一次重定向请求，解析 `code` / `state`，并给浏览器回一个简单页面。
pub(crate) fn wait_for_code(listener: TcpListener) -> Result<(String, Option<String>)> {
    let (mut stream, _) = listener.accept()?;

    let mut buffer = [0_u8; 4096];
    let read = stream.read(&mut buffer)?;
    let request = String::from_utf8_lossy(&buffer[..read]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| DracoonError::OAuth {
            error: "invalid_redirect".to_string(),
            description: "failed to parse HTTP request line".to_string(),
        })?;

    let redirect_url = Url::parse(&format!("http://localhost{path}"))?;
    let mut code: Option<String> = None;
    let mut state: Option<String> = None;

    for (key, value) in redirect_url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                send_browser_response(
                    &mut stream,
                    "Authentication Failed",
                    "We were unable to complete sign-in. You can close this window.",
                )?;
                warn!(error = %value, "authorization redirect carried an error");
                return Err(DracoonError::OAuth {
                    error: value.into_owned(),
                    description: "authorization was denied".to_string(),
                });
            }
            _ => {}
        }
    }

    let code = code.ok_or_else(|| DracoonError::OAuth {
        error: "invalid_redirect".to_string(),
        description: "authorization code missing in redirect".to_string(),
    })?;

    send_browser_response(
        &mut stream,
        "Authentication Complete",
        "You can close this window and return to your application.",
    )?;

    Ok((code, state))
}

fn send_browser_response(stream: &mut TcpStream, title: &str, message: &str) -> Result<()> {
    let body = format!(
        "<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{message}</p></body></html>"
    );
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    Ok(())
}
