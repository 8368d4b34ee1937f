//! End-to-end session flows against a mock backend.

use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn success(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "success", "data": data}))
}

fn token(sub: &str, roles: &[&str]) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let claims = json!({"sub": sub, "email": format!("{sub}@example.com"), "roles": roles});
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("{header}.{payload}.sig")
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "secret"})))
        .respond_with(
            success(json!({
                "accessToken": token("u1", &["USER"]),
                "user": {"id": "u1", "email": "ada@example.com", "roles": ["USER"], "firstName": "Ada", "lastName": "Lovelace"}
            }))
            .insert_header("set-cookie", "refreshToken=r1; Path=/; HttpOnly; Max-Age=3600"),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn fmf(home: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fmf");
    cmd.env("FMF_HOME", home.path())
        .env("FMF_API_BASE_URL", server.uri())
        .env_remove("FMF_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Test: a login in one process is restored by the next through the refresh cookie.
#[tokio::test]
async fn test_login_then_whoami_restores_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(header("cookie", "refreshToken=r1"))
        .respond_with(success(json!({"accessToken": token("u1", &["USER"])})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/profile"))
        .respond_with(success(json!({"firstName": "Augusta", "lastName": "King"})))
        .expect(1)
        .mount(&server)
        .await;

    fmf(&home, &server)
        .args(["login", "--email", "ada@example.com"])
        .env("FMF_PASSWORD", "secret")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ada Lovelace"));

    assert!(home.path().join("cookies.json").exists());

    fmf(&home, &server)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"firstName\": \"Augusta\""))
        .stdout(predicate::str::contains("u1@example.com"));
}

/// Test: logout forgets the stored session even when the backend fails.
#[tokio::test]
async fn test_logout_forgets_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(header("cookie", "refreshToken=r1"))
        .respond_with(success(json!({"accessToken": token("u1", &["USER"])})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    fmf(&home, &server)
        .args(["login", "--email", "ada@example.com", "--password", "secret"])
        .assert()
        .success();

    fmf(&home, &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));

    fmf(&home, &server)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

/// Test: a rejected login surfaces the server's field message.
#[tokio::test]
async fn test_login_failure_shows_server_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "unauthorized",
            "errors": [{"message": "Bad credentials"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    fmf(&home, &server)
        .args(["login", "--email", "ada@example.com", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad credentials"));
}

/// Test: protected routes send anonymous users to the login page.
#[tokio::test]
async fn test_route_requires_login() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    fmf(&home, &server)
        .args(["route", "/admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/login?redirect=%2Fadmin"));

    fmf(&home, &server)
        .args(["route", "/projects"])
        .assert()
        .success()
        .stdout(predicate::str::contains("allow projects"));
}

/// Test: feature flags are read from the public settings endpoint.
#[tokio::test]
async fn test_settings_enabled() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(success(json!({"SHOW_SKILLS": "true", "SHOW_PROJECTS": "TRUE"})))
        .mount(&server)
        .await;

    fmf(&home, &server)
        .args(["settings", "enabled", "SHOW_SKILLS"])
        .assert()
        .success()
        .stdout(predicate::str::diff("true\n"));

    fmf(&home, &server)
        .args(["settings", "enabled", "SHOW_PROJECTS"])
        .assert()
        .success()
        .stdout(predicate::str::diff("false\n"));
}
