use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use rolekit_api::config::ApiConfig;
use rolekit_auth::JwtClaims;
use rolekit_core::UserId;

const SECRET: &str = "test-secret";
const ADMIN: &str = "admin";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, bound to an ephemeral port.
        let config = ApiConfig {
            jwt_secret: SECRET.to_string(),
            bootstrap_admin: Some(UserId::parse(ADMIN).unwrap()),
            ..ApiConfig::default()
        };
        let app = rolekit_api::app::build_app(&config).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, user: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(mint_jwt(user))
            .send()
            .await
            .unwrap()
    }

    async fn send_json(&self, method: reqwest::Method, path: &str, user: &str, body: Value) -> reqwest::Response {
        self.client
            .request(method, self.url(path))
            .bearer_auth(mint_jwt(user))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Create a role as the admin and return its id.
    async fn create_role(&self, name: &str, permissions: Value) -> String {
        let res = self
            .send_json(
                reqwest::Method::POST,
                "/roles",
                ADMIN,
                json!({ "name": name, "permissions": permissions }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn assign(&self, user: &str, role_id: Value) -> reqwest::Response {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/users/{user}/role"),
            ADMIN,
            json!({ "role_id": role_id }),
        )
        .await
    }

    async fn check(&self, user: &str, body: Value) -> Value {
        let res = self
            .send_json(reqwest::Method::POST, "/authz/check", user, body)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user: &str) -> String {
    mint_jwt_with(SECRET, user, ChronoDuration::minutes(10))
}

fn mint_jwt_with(secret: &str, user: &str, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::parse(user).unwrap(),
        issued_at: now - ChronoDuration::seconds(1),
        expires_at: now + ttl,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt_with("wrong-secret", ADMIN, ChronoDuration::minutes(10));
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let expired = mint_jwt_with(SECRET, ADMIN, ChronoDuration::seconds(-30));
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn identity_is_derived_from_token() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/whoami", "someone").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user_id"], "someone");
    assert!(body["role_id"].is_null());

    let body: Value = srv.get("/whoami", ADMIN).await.json().await.unwrap();
    assert!(body["role_id"].is_string());
}

#[tokio::test]
async fn role_lifecycle_and_user_checks() {
    let srv = TestServer::spawn().await;
    let r1 = srv.create_role("Tester", json!(["test"])).await;

    let res = srv.assign("U1", json!(r1)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let me: Value = srv.get("/me/role", "U1").await.json().await.unwrap();
    assert_eq!(me["ready"], true);
    assert_eq!(me["role_id"], r1.as_str());
    assert_eq!(me["role"]["permissions"], json!(["test"]));

    assert_eq!(srv.check("U1", json!({ "permissions": "test" })).await["allowed"], true);
    let denied = srv.check("U1", json!({ "permissions": "other" })).await;
    assert_eq!(denied["allowed"], false);
    assert_eq!(denied["missing"], json!(["other"]));

    let res = srv
        .send_json(
            reqwest::Method::PATCH,
            &format!("/roles/{r1}/permissions"),
            ADMIN,
            json!({ "op": "add", "permissions": "create" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let role: Value = res.json().await.unwrap();
    assert_eq!(role["permissions"], json!(["create", "test"]));
    assert_eq!(
        srv.check("U1", json!({ "permissions": ["test", "create"] })).await["allowed"],
        true
    );

    srv.send_json(
        reqwest::Method::PATCH,
        &format!("/roles/{r1}/permissions"),
        ADMIN,
        json!({ "op": "remove", "permissions": ["create"] }),
    )
    .await;
    assert_eq!(srv.check("U1", json!({ "permissions": "create" })).await["allowed"], false);

    let res = srv
        .send_json(
            reqwest::Method::PATCH,
            &format!("/roles/{r1}/permissions"),
            ADMIN,
            json!({ "op": "set", "permissions": ["read", "write"] }),
        )
        .await;
    let role: Value = res.json().await.unwrap();
    assert_eq!(role["permissions"], json!(["read", "write"]));
}

#[tokio::test]
async fn empty_requirements_differ_between_users_and_roles() {
    let srv = TestServer::spawn().await;
    let r1 = srv.create_role("Tester", json!(["test"])).await;

    assert_eq!(srv.check("nobody", json!({ "permissions": "" })).await["allowed"], true);
    assert_eq!(srv.check("nobody", json!({ "permissions": [] })).await["allowed"], true);

    let role_check = srv
        .check(ADMIN, json!({ "permissions": "", "role_id": r1 }))
        .await;
    assert_eq!(role_check["allowed"], false);
    let role_check = srv
        .check(ADMIN, json!({ "permissions": "test", "role_id": r1 }))
        .await;
    assert_eq!(role_check["allowed"], true);
}

#[tokio::test]
async fn permission_guards_reject_unprivileged_callers() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/roles", "nobody").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["missing"], json!(["roles.read"]));

    let res = srv
        .send_json(reqwest::Method::POST, "/roles", "nobody", json!({ "name": "Sneaky" }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .send_json(reqwest::Method::PUT, "/users/nobody/role", "nobody", json!({ "role_id": null }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reading your own assignment needs nothing; reading someone else's does.
    assert_eq!(srv.get("/users/nobody/role", "nobody").await.status(), StatusCode::OK);
    assert_eq!(srv.get("/users/admin/role", "nobody").await.status(), StatusCode::FORBIDDEN);

    let res = srv
        .send_json(
            reqwest::Method::POST,
            "/authz/check",
            "nobody",
            json!({ "permissions": "x", "user_id": ADMIN }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_roles_are_not_found() {
    let srv = TestServer::spawn().await;

    let res = srv.assign("U1", json!("ghost")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    assert_eq!(srv.get("/roles/ghost", ADMIN).await.status(), StatusCode::NOT_FOUND);

    let res = srv
        .send_json(
            reqwest::Method::PATCH,
            "/roles/ghost/permissions",
            ADMIN,
            json!({ "op": "add", "permissions": "x" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .delete(srv.url("/roles/ghost"))
        .bearer_auth(mint_jwt(ADMIN))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_arguments_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let r1 = srv.create_role("Tester", json!(["test"])).await;

    for bad in [json!(42), json!({ "a": 1 }), json!(["ok", 7])] {
        let res = srv
            .send_json(
                reqwest::Method::PATCH,
                &format!("/roles/{r1}/permissions"),
                ADMIN,
                json!({ "op": "add", "permissions": bad }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {bad}");
    }

    // A full overwrite needs a list.
    let res = srv
        .send_json(
            reqwest::Method::PATCH,
            &format!("/roles/{r1}/permissions"),
            ADMIN,
            json!({ "op": "set", "permissions": "read" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_argument");

    let res = srv
        .send_json(reqwest::Method::POST, "/roles", ADMIN, json!({ "name": "  " }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_role_id_means_no_role() {
    let srv = TestServer::spawn().await;
    let r1 = srv.create_role("Tester", json!(["test"])).await;
    srv.assign("U1", json!(r1)).await;

    let res = srv.assign("U1", json!("")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["role_id"].is_null());
    assert!(body["role"].is_null());

    let body: Value = srv.get("/users/U1/role", "U1").await.json().await.unwrap();
    assert!(body["role_id"].is_null());
    assert_eq!(srv.check("U1", json!({ "permissions": "test" })).await["allowed"], false);

    let role_check = srv
        .check(ADMIN, json!({ "permissions": "test", "role_id": "" }))
        .await;
    assert_eq!(role_check["allowed"], false);
}

#[tokio::test]
async fn deleting_a_role_revokes_access_but_keeps_the_reference() {
    let srv = TestServer::spawn().await;
    let r1 = srv.create_role("Tester", json!(["test"])).await;
    srv.assign("U1", json!(r1)).await;

    let res = srv
        .client
        .delete(srv.url(&format!("/roles/{r1}")))
        .bearer_auth(mint_jwt(ADMIN))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body: Value = srv.get("/users/U1/role", "U1").await.json().await.unwrap();
    assert_eq!(body["role_id"], r1.as_str());
    assert!(body["role"].is_null());
    assert_eq!(srv.check("U1", json!({ "permissions": "test" })).await["allowed"], false);

    // Clearing works even though the referenced role is gone.
    let res = srv.assign("U1", Value::Null).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = srv.get("/users/U1/role", "U1").await.json().await.unwrap();
    assert!(body["role_id"].is_null());
}

#[tokio::test]
async fn stream_relays_changes_to_the_right_audience() {
    let srv = TestServer::spawn().await;

    let mut stream = srv.get("/stream", "U1").await;
    assert_eq!(stream.status(), StatusCode::OK);

    let r1 = srv.create_role("Tester", json!(["test"])).await;
    srv.assign("U2", json!(r1)).await;
    srv.assign("U1", json!(r1)).await;

    let mut seen = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !seen.contains("rbac.user.role_changed") {
        let chunk = tokio::time::timeout_at(deadline, stream.chunk())
            .await
            .expect("stream did not deliver the role change in time")
            .unwrap()
            .expect("stream ended early");
        seen.push_str(&String::from_utf8_lossy(&chunk));
    }

    assert!(seen.contains("rbac.role.created"));
    assert!(seen.contains("\"U1\""));
    assert!(!seen.contains("\"U2\""));
}
