//! End-to-end tests through the router on an in-memory SQLite store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use splittrip_api::{AppState, create_router};
use splittrip_db::LedgerStore;
use splittrip_shared::AppConfig;
use splittrip_shared::config::{
    ActivationConfig, DatabaseConfig, EmailConfig, JwtConfig, ServerConfig,
};
use splittrip_shared::email::{EmailError, Notifier};
use splittrip_shared::jwt::JwtService;
use tower::ServiceExt;

#[derive(Debug, Default)]
struct Inbox {
    bodies: Mutex<Vec<String>>,
}

impl Inbox {
    fn last_token(&self) -> String {
        let bodies = self.bodies.lock().unwrap();
        let body = bodies.last().expect("no mail sent");
        let start = body.find("token=").expect("no token in mail") + "token=".len();
        body[start..].split_whitespace().next().unwrap().to_string()
    }
}

#[async_trait]
impl Notifier for Inbox {
    async fn notify(
        &self,
        _recipients: &[String],
        _subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        self.bodies.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

struct Harness {
    app: Router,
    inbox: Arc<Inbox>,
}

fn config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_secs: 5,
        },
        jwt: JwtConfig {
            secret: "api-test-secret".to_string(),
            access_token_expiry_secs: 3600,
        },
        email: EmailConfig::default(),
        activation: ActivationConfig::default(),
    }
}

async fn harness() -> Harness {
    let config = config();
    let store = LedgerStore::connect(&config.database).await.unwrap();
    store.migrate().await.unwrap();
    let inbox = Arc::new(Inbox::default());
    let state = AppState::new(
        store,
        JwtService::new(&config.jwt),
        inbox.clone(),
        &config,
    );
    Harness {
        app: create_router(state, Duration::from_secs(30)),
        inbox,
    }
}

impl Harness {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Registers, activates and logs in; returns the bearer token and user id.
    async fn sign_up(&self, name: &str) -> (String, String) {
        let email = format!("{name}@example.com");
        let (status, user) = self
            .call(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({ "username": name, "email": email, "password": "correct horse battery" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");

        let token = self.inbox.last_token();
        let (status, _) = self
            .call(
                Method::POST,
                "/api/v1/auth/activate",
                None,
                Some(json!({ "token": token })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, login) = self
            .call(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": "correct horse battery" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            login["access_token"].as_str().unwrap().to_string(),
            user["id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_trip(&self, token: &str) -> String {
        let (status, trip) = self
            .call(
                Method::POST,
                "/api/v1/trips",
                Some(token),
                Some(json!({
                    "name": "Lisbon",
                    "location": "Portugal",
                    "description": null,
                    "start_date": "2026-06-01",
                    "end_date": "2026-06-10",
                    "currency": "EUR"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{trip}");
        trip["id"].as_str().unwrap().to_string()
    }

    async fn join(&self, trip_id: &str, owner: &str, name: &str, token: &str) {
        let (status, _) = self
            .call(
                Method::POST,
                &format!("/api/v1/trips/{trip_id}/participants"),
                Some(owner),
                Some(json!({ "email": format!("{name}@example.com") })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .call(
                Method::POST,
                &format!("/api/v1/trips/{trip_id}/participants/me/accept"),
                Some(token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_health_reports_database() {
    let h = harness().await;
    let (status, body) = h.call(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let h = harness().await;
    let (status, body) = h.call(Method::GET, "/api/v1/trips", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_TOKEN");

    let (status, body) = h
        .call(Method::GET, "/api/v1/trips", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_login_before_activation_is_forbidden() {
    let h = harness().await;
    let (status, _) = h
        .call(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "carol", "email": "carol@example.com", "password": "correct horse battery" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = h
        .call(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "carol@example.com", "password": "correct horse battery" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_me_round_trip() {
    let h = harness().await;
    let (token, id) = h.sign_up("alice").await;
    let (status, me) = h.call(Method::GET, "/api/v1/users/me", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id.as_str());
    assert_eq!(me["is_active"], true);

    let (status, me) = h
        .call(
            Method::PATCH,
            "/api/v1/users/me",
            Some(token.as_str()),
            Some(json!({ "username": "alice2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice2");
}

#[tokio::test]
async fn test_transaction_moves_and_restores_the_debt() {
    let h = harness().await;
    let (alice, alice_id) = h.sign_up("alice").await;
    let (bob, bob_id) = h.sign_up("bob").await;
    let trip_id = h.create_trip(&alice).await;
    h.join(&trip_id, &alice, "bob", &bob).await;

    let (status, tx) = h
        .call(
            Method::POST,
            &format!("/api/v1/trips/{trip_id}/transactions"),
            Some(alice.as_str()),
            Some(json!({
                "creditor_id": alice_id,
                "debtor_id": bob_id,
                "amount": "50.00",
                "description": "dinner"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{tx}");
    let tx_id = tx["id"].as_str().unwrap().to_string();

    let (status, debts) = h
        .call(
            Method::GET,
            &format!("/api/v1/trips/{trip_id}/debts"),
            Some(bob.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(debts.as_array().unwrap().len(), 1);
    assert_eq!(debts[0]["creditor"]["id"], alice_id.as_str());
    assert_eq!(debts[0]["debtor"]["id"], bob_id.as_str());
    assert_eq!(debts[0]["amount"]["amount"], "50.00");

    let (status, position) = h
        .call(
            Method::GET,
            &format!("/api/v1/trips/{trip_id}/debts/me"),
            Some(bob.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(position["debt"]["amount"], "50.00");

    // Only the debtor confirms, and only once.
    let confirm = format!("/api/v1/transactions/{tx_id}/confirm");
    let (status, _) = h.call(Method::POST, &confirm, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, confirmed) = h.call(Method::POST, &confirm, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["is_confirmed"], true);
    let (status, _) = h.call(Method::POST, &confirm, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h
        .call(
            Method::DELETE,
            &format!("/api/v1/transactions/{tx_id}"),
            Some(alice.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, position) = h
        .call(
            Method::GET,
            &format!("/api/v1/trips/{trip_id}/debts/me"),
            Some(bob.as_str()),
            None,
        )
        .await;
    assert_eq!(position["net"]["amount"], "0.00");

    let (status, _) = h
        .call(
            Method::GET,
            &format!("/api/v1/transactions/{tx_id}"),
            Some(alice.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_outsider_cannot_read_a_trip() {
    let h = harness().await;
    let (alice, _) = h.sign_up("alice").await;
    let (mallory, _) = h.sign_up("mallory").await;
    let trip_id = h.create_trip(&alice).await;

    let (status, body) = h
        .call(
            Method::GET,
            &format!("/api/v1/trips/{trip_id}"),
            Some(mallory.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, view) = h
        .call(
            Method::GET,
            &format!("/api/v1/trips/{trip_id}"),
            Some(alice.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["name"], "Lisbon");
    assert_eq!(view["participants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_costs_roll_up_per_category() {
    let h = harness().await;
    let (alice, _) = h.sign_up("alice").await;
    let trip_id = h.create_trip(&alice).await;

    let (status, category) = h
        .call(
            Method::POST,
            &format!("/api/v1/trips/{trip_id}/categories"),
            Some(alice.as_str()),
            Some(json!({ "name": "Food" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{category}");
    let category_id = category["id"].as_str().unwrap().to_string();

    for amount in ["12.50", "7.50"] {
        let (status, _) = h
            .call(
                Method::POST,
                &format!("/api/v1/trips/{trip_id}/costs"),
                Some(alice.as_str()),
                Some(json!({
                    "category_id": category_id,
                    "name": "lunch",
                    "amount": amount,
                    "cost_date": "2026-06-02"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, view) = h
        .call(
            Method::GET,
            &format!("/api/v1/trips/{trip_id}"),
            Some(alice.as_str()),
            None,
        )
        .await;
    assert_eq!(view["total_cost"]["amount"], "20.00");

    let (status, _) = h
        .call(
            Method::DELETE,
            &format!("/api/v1/trips/{trip_id}/categories/{category_id}"),
            Some(alice.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_amount_is_bad_request() {
    let h = harness().await;
    let (alice, alice_id) = h.sign_up("alice").await;
    let (bob, bob_id) = h.sign_up("bob").await;
    let trip_id = h.create_trip(&alice).await;
    h.join(&trip_id, &alice, "bob", &bob).await;

    let (status, body) = h
        .call(
            Method::POST,
            &format!("/api/v1/trips/{trip_id}/transactions"),
            Some(alice.as_str()),
            Some(json!({
                "creditor_id": alice_id,
                "debtor_id": bob_id,
                "amount": "12.345",
                "description": null
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}
