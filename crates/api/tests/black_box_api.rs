//! Black-box tests against a live server on an ephemeral port, with an
//! in-memory store and checkout provider behind the real router.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use tutorhub_api::app::{self, services::AppServices};
use tutorhub_auth::{JwtClaims, Role};
use tutorhub_core::UserId;
use tutorhub_infra::{InMemoryStore, MarketplaceStore};
use tutorhub_payments::{CheckoutProvider, InMemoryCheckout};

const SECRET: &str = "black-box-test-secret";

struct TestServer {
    base: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Self {
        let store: Arc<dyn MarketplaceStore> = Arc::new(InMemoryStore::new());
        let provider: Arc<dyn CheckoutProvider> = Arc::new(InMemoryCheckout::new());
        let services = Arc::new(AppServices::new(store, provider, "http://localhost:8080"));
        let router = app::build_app(SECRET.as_bytes(), services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut req = self.client.post(format!("{}{path}", self.base)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn patch(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(format!("{}{path}", self.base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{path}", self.base));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }
}

fn mint_token(user_id: UserId, role: &str) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        roles: vec![Role::new(role.to_string())],
        issued_at: now - Duration::minutes(1),
        expires_at: now + Duration::minutes(30),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn data(res: reqwest::Response) -> Value {
    let body: Value = res.json().await.unwrap();
    body["data"].clone()
}

/// Register a user and mint a matching token.
async fn register(server: &TestServer, name: &str, email: &str, role: &str) -> (String, String) {
    let res = server
        .post(
            "/users",
            None,
            json!({ "name": name, "email": email, "role": role }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let user = data(res).await;
    let id = user["id"].as_str().unwrap().to_string();
    let token = mint_token(id.parse().unwrap(), role);
    (id, token)
}

struct Marketplace {
    server: TestServer,
    learner_id: String,
    learner_token: String,
    tutor_token: String,
    tutor_id: String,
    course_id: String,
}

/// One tutor with one published course, and one learner.
async fn marketplace() -> Marketplace {
    let server = TestServer::spawn().await;

    let (tutor_user_id, tutor_token) =
        register(&server, "Grace", "grace@example.com", "tutor").await;
    let res = server
        .post(
            "/tutors",
            Some(&tutor_token),
            json!({ "user_id": tutor_user_id, "name": "Grace", "headline": "Math tutor" }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let tutor_id = data(res).await["id"].as_str().unwrap().to_string();

    let res = server
        .post(
            "/courses",
            Some(&tutor_token),
            json!({
                "tutor_id": tutor_id,
                "title": "Algebra I",
                "description": "Linear equations",
                "price_minor": 5000,
                "session_rate_minor": 2500,
            }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let course_id = data(res).await["id"].as_str().unwrap().to_string();

    let (learner_id, learner_token) =
        register(&server, "Ada", "ada@example.com", "learner").await;

    Marketplace {
        server,
        learner_id,
        learner_token,
        tutor_token,
        tutor_id,
        course_id,
    }
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = server.get("/health", None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(data(res).await["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let server = TestServer::spawn().await;
    let res = server.get("/courses", None).await;
    assert_eq!(res.status(), 401);
    let res = server.post("/checkout", None, json!({})).await;
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn registers_and_fetches_a_user() {
    let server = TestServer::spawn().await;
    let (id, token) = register(&server, "Ada", "ada@example.com", "learner").await;

    let res = server.get(&format!("/users/{id}"), Some(&token)).await;
    assert_eq!(res.status(), 200);
    let user = data(res).await;
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], "learner");
}

#[tokio::test]
async fn rejects_unknown_role_on_registration() {
    let server = TestServer::spawn().await;
    let res = server
        .post(
            "/users",
            None,
            json!({ "name": "Eve", "email": "eve@example.com", "role": "owner" }),
        )
        .await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn enrollment_checkout_end_to_end_and_idempotent() {
    let m = marketplace().await;

    let res = m
        .server
        .post(
            "/checkout",
            Some(&m.learner_token),
            json!({
                "course_id": m.course_id,
                "amount_minor": 5000,
                "fulfillment_type": "enrollment",
            }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let redirect = data(res).await;
    let session_id = redirect["session_id"].as_str().unwrap().to_string();
    assert!(redirect["url"].as_str().unwrap().contains(&session_id));

    // Resolving is a pure read of the intent.
    let res = m
        .server
        .get(
            &format!("/checkout/sessions/{session_id}"),
            Some(&m.learner_token),
        )
        .await;
    assert_eq!(res.status(), 200);
    let intent = data(res).await;
    assert_eq!(intent["fulfillment_type"], "enrollment");
    assert_eq!(intent["payer_id"], Value::String(m.learner_id.clone()));
    assert_eq!(intent["amount_minor"], 5000);

    let res = m
        .server
        .post(
            &format!("/checkout/sessions/{session_id}/fulfill"),
            Some(&m.learner_token),
            json!({}),
        )
        .await;
    assert_eq!(res.status(), 200);
    let first = data(res).await;
    assert_eq!(first["fulfillment_type"], "enrollment");
    let enrollment_id = first["enrollment"]["id"].as_str().unwrap().to_string();

    // A second fulfillment of the same session returns the same enrollment.
    let res = m
        .server
        .post(
            &format!("/checkout/sessions/{session_id}/fulfill"),
            Some(&m.learner_token),
            json!({}),
        )
        .await;
    assert_eq!(res.status(), 200);
    let second = data(res).await;
    assert_eq!(second["enrollment"]["id"].as_str().unwrap(), enrollment_id);

    let res = m.server.get("/enrollments", Some(&m.learner_token)).await;
    assert_eq!(data(res).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_validation_failures() {
    let m = marketplace().await;

    // amount must be positive
    let res = m
        .server
        .post(
            "/checkout",
            Some(&m.learner_token),
            json!({
                "course_id": m.course_id,
                "amount_minor": 0,
                "fulfillment_type": "enrollment",
            }),
        )
        .await;
    assert_eq!(res.status(), 400);

    // session checkout needs a session date
    let res = m
        .server
        .post(
            "/checkout",
            Some(&m.learner_token),
            json!({
                "course_id": m.course_id,
                "amount_minor": 2500,
                "fulfillment_type": "session",
                "tutor_id": m.tutor_id,
            }),
        )
        .await;
    assert_eq!(res.status(), 400);

    // unknown session reference
    let res = m
        .server
        .post(
            "/checkout/sessions/cs_missing/fulfill",
            Some(&m.learner_token),
            json!({}),
        )
        .await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn session_checkout_produces_a_booking_with_payment() {
    let m = marketplace().await;

    let res = m
        .server
        .post(
            "/checkout",
            Some(&m.learner_token),
            json!({
                "course_id": m.course_id,
                "amount_minor": 2500,
                "fulfillment_type": "session",
                "tutor_id": m.tutor_id,
                "session_date": "2025-01-10T18:00:00Z",
            }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let session_id = data(res).await["session_id"].as_str().unwrap().to_string();

    let res = m
        .server
        .post(
            &format!("/checkout/sessions/{session_id}/fulfill"),
            Some(&m.learner_token),
            json!({}),
        )
        .await;
    assert_eq!(res.status(), 200);
    let outcome = data(res).await;
    assert_eq!(outcome["fulfillment_type"], "session");
    let booking = &outcome["booking"];
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["duration_min"], 60);
    assert_eq!(booking["session_type"], "individual");
    assert_eq!(booking["payment"]["amount_minor"], 2500);
    assert_eq!(booking["payment"]["status"], "completed");
    assert_eq!(
        booking["payment"]["transaction_ref"].as_str().unwrap(),
        session_id
    );
}

#[tokio::test]
async fn direct_booking_deduplicates_on_payment_reference() {
    let m = marketplace().await;
    let body = json!({
        "learner_id": m.learner_id,
        "tutor_id": m.tutor_id,
        "course_id": m.course_id,
        "session_date": "2025-01-10T18:00:00Z",
        "amount_minor": 2500,
        "payment_session_id": "cs_dup_check",
    });

    let res = m.server.post("/bookings", Some(&m.learner_token), body.clone()).await;
    assert_eq!(res.status(), 201);
    let first_id = data(res).await["id"].as_str().unwrap().to_string();

    let res = m.server.post("/bookings", Some(&m.learner_token), body).await;
    assert_eq!(res.status(), 201);
    assert_eq!(data(res).await["id"].as_str().unwrap(), first_id);

    let res = m.server.get("/bookings", Some(&m.learner_token)).await;
    assert_eq!(data(res).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn booking_amount_falls_back_to_session_rate() {
    let m = marketplace().await;
    let res = m
        .server
        .post(
            "/bookings",
            Some(&m.learner_token),
            json!({
                "learner_id": m.learner_id,
                "tutor_id": m.tutor_id,
                "course_id": m.course_id,
                "session_date": "2025-02-01T10:00:00Z",
            }),
        )
        .await;
    assert_eq!(res.status(), 201);
    assert_eq!(data(res).await["payment"]["amount_minor"], 2500);
}

#[tokio::test]
async fn bookings_cannot_be_created_for_someone_else() {
    let m = marketplace().await;
    let (other_id, _) = register(&m.server, "Eve", "eve@example.com", "learner").await;
    let res = m
        .server
        .post(
            "/bookings",
            Some(&m.learner_token),
            json!({
                "learner_id": other_id,
                "tutor_id": m.tutor_id,
                "course_id": m.course_id,
                "session_date": "2025-02-01T10:00:00Z",
            }),
        )
        .await;
    assert_eq!(res.status(), 403);
}

async fn booked_marketplace() -> (Marketplace, String) {
    let m = marketplace().await;
    let res = m
        .server
        .post(
            "/bookings",
            Some(&m.learner_token),
            json!({
                "learner_id": m.learner_id,
                "tutor_id": m.tutor_id,
                "course_id": m.course_id,
                "session_date": "2025-01-10T18:00:00Z",
            }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let booking_id = data(res).await["id"].as_str().unwrap().to_string();
    (m, booking_id)
}

#[tokio::test]
async fn review_moderation_lifecycle() {
    let (m, booking_id) = booked_marketplace().await;

    let res = m
        .server
        .post(
            "/reviews",
            Some(&m.learner_token),
            json!({
                "booking_id": booking_id,
                "reviewer_id": m.learner_id,
                "tutor_id": m.tutor_id,
                "course_id": m.course_id,
                "rating": 5,
                "comment": "Very clear explanations",
            }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let review = data(res).await;
    assert_eq!(review["status"], "pending");
    assert!(review["approved_at"].is_null());
    let review_id = review["id"].as_str().unwrap().to_string();

    // Pending reviews are hidden from non-owners.
    let res = m
        .server
        .get(&format!("/tutors/{}/reviews", m.tutor_id), Some(&m.learner_token))
        .await;
    assert_eq!(data(res).await.as_array().unwrap().len(), 0);

    let res = m
        .server
        .patch(
            &format!("/reviews/{review_id}"),
            &m.tutor_token,
            json!({ "status": "accepted" }),
        )
        .await;
    assert_eq!(res.status(), 200);
    let accepted = data(res).await;
    assert_eq!(accepted["status"], "accepted");
    assert!(!accepted["approved_at"].is_null());

    // Terminal states cannot transition again.
    let res = m
        .server
        .patch(
            &format!("/reviews/{review_id}"),
            &m.tutor_token,
            json!({ "status": "rejected" }),
        )
        .await;
    assert_eq!(res.status(), 409);

    // Accepted reviews become publicly visible.
    let res = m
        .server
        .get(&format!("/tutors/{}/reviews", m.tutor_id), Some(&m.learner_token))
        .await;
    assert_eq!(data(res).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_owning_tutor_moderates() {
    let (m, booking_id) = booked_marketplace().await;

    let res = m
        .server
        .post(
            "/reviews",
            Some(&m.learner_token),
            json!({
                "booking_id": booking_id,
                "reviewer_id": m.learner_id,
                "tutor_id": m.tutor_id,
                "course_id": m.course_id,
                "rating": 4,
            }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let review_id = data(res).await["id"].as_str().unwrap().to_string();

    let (other_user_id, other_token) =
        register(&m.server, "Hal", "hal@example.com", "tutor").await;
    let res = m
        .server
        .post(
            "/tutors",
            Some(&other_token),
            json!({ "user_id": other_user_id, "name": "Hal", "headline": "" }),
        )
        .await;
    assert_eq!(res.status(), 201);

    let res = m
        .server
        .patch(
            &format!("/reviews/{review_id}"),
            &other_token,
            json!({ "status": "accepted" }),
        )
        .await;
    assert_eq!(res.status(), 403);
}

#[tokio::test]
async fn pending_review_requests_clear_once_reviewed() {
    let (m, booking_id) = booked_marketplace().await;

    let res = m
        .server
        .post(
            "/review-requests",
            Some(&m.tutor_token),
            json!({
                "student_id": m.learner_id,
                "course_id": m.course_id,
                "tutor_id": m.tutor_id,
            }),
        )
        .await;
    assert_eq!(res.status(), 201);

    let res = m
        .server
        .get("/review-requests/pending", Some(&m.learner_token))
        .await;
    assert_eq!(data(res).await.as_array().unwrap().len(), 1);

    let res = m
        .server
        .post(
            "/reviews",
            Some(&m.learner_token),
            json!({
                "booking_id": booking_id,
                "reviewer_id": m.learner_id,
                "tutor_id": m.tutor_id,
                "course_id": m.course_id,
                "rating": 5,
            }),
        )
        .await;
    assert_eq!(res.status(), 201);

    let res = m
        .server
        .get("/review-requests/pending", Some(&m.learner_token))
        .await;
    assert_eq!(data(res).await.as_array().unwrap().len(), 0);
}
