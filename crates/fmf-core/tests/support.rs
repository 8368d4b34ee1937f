//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use fmf_core::config::Config;
use fmf_core::cookies::CookieJar;
use fmf_core::services::Services;
use fmf_core::theme::ThemeStore;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// `{status: "success", data}` with HTTP 200.
pub fn success(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "success", "data": data}))
}

/// Error envelope with a single field error.
pub fn failure(http_status: u16, tag: &str, field: Option<&str>, message: &str) -> ResponseTemplate {
    let mut error = json!({"message": message});
    if let Some(field) = field {
        error["field"] = json!(field);
    }
    ResponseTemplate::new(http_status).set_body_json(json!({"status": tag, "errors": [error]}))
}

pub fn user_json(id: &str, roles: &[&str]) -> Value {
    json!({
        "id": id,
        "email": format!("{id}@example.com"),
        "roles": roles,
        "firstName": "Ada",
        "lastName": "Lovelace"
    })
}

pub fn auth_payload(token: &str, roles: &[&str]) -> Value {
    json!({"accessToken": token, "user": user_json("u1", roles)})
}

/// Unsigned token carrying `claims`.
pub fn token_with(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.sig")
}

pub fn config_with_refresh_timeout(secs: u32) -> Config {
    let mut config = Config::default();
    config.api.refresh_timeout_secs = secs;
    config.api.request_timeout_secs = 10;
    config
}

pub fn server_url(server: &MockServer) -> url::Url {
    url::Url::parse(&server.uri()).unwrap()
}

pub fn services(server: &MockServer) -> Services {
    services_with(server, &config_with_refresh_timeout(15), CookieJar::in_memory())
}

pub fn services_with(server: &MockServer, config: &Config, cookies: CookieJar) -> Services {
    Services::from_parts(config, &server.uri(), cookies, ThemeStore::in_memory()).unwrap()
}

/// Mounts a login endpoint handing out `token` and signs in.
pub async fn sign_in(server: &MockServer, services: &Services, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            success(auth_payload(token, &["USER"]))
                .insert_header("set-cookie", "refreshToken=r1; Path=/; HttpOnly"),
        )
        .mount(server)
        .await;

    services
        .auth
        .login(&fmf_core::models::Credentials {
            email: "u1@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
}

pub fn slow(template: ResponseTemplate, millis: u64) -> ResponseTemplate {
    template.set_delay(Duration::from_millis(millis))
}
