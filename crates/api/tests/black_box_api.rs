//! Black-box tests for the public registration endpoint: real router, real
//! HTTP, in-memory collaborators.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;

use gestevent_api::app::services::{self, AppServices};
use gestevent_core::EventId;
use gestevent_registration::{EventRecord, EventStatus};

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory wiring, ephemeral port.
        let services = Arc::new(services::build_in_memory_services());
        let app = gestevent_api::app::build_app_with_services(services.clone());
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
            services,
            handle,
        }
    }

    fn seed_event(&self, event: EventRecord) -> EventRecord {
        self.services
            .directory_in_memory()
            .expect("in-memory wiring")
            .upsert(event.clone());
        event
    }

    fn register_url(&self) -> String {
        format!("{}/public_register", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn open_event(slug: &str) -> EventRecord {
    EventRecord {
        id: EventId::new(),
        title: "Spring Gala".to_string(),
        status: EventStatus::Published,
        is_open: true,
        sales_from: None,
        sales_until: None,
        capacity: None,
        max_per_user: 1,
        slug: slug.to_string(),
    }
}

async fn post_registration(
    client: &reqwest::Client,
    srv: &TestServer,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let res = client
        .post(srv.register_url())
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    let body: serde_json::Value = res.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn health_endpoint_responds() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn only_post_is_accepted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.register_url()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "post_only");

    let res = client.put(srv.register_url()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preflight_and_cors_headers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Browser-style pre-flight is answered by the CORS layer.
    let res = client
        .request(reqwest::Method::OPTIONS, srv.register_url())
        .header("origin", "https://tickets.example")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    // Cross-origin POST responses carry the header too.
    let res = client
        .post(srv.register_url())
        .header("origin", "https://tickets.example")
        .body("{}")
        .header("content-type", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn malformed_body_is_tagged_invalid_json() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.register_url())
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_json");
}

#[tokio::test]
async fn missing_required_fields_have_distinct_codes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases = [
        (json!({}), "slug_required"),
        (json!({"slug": "gala"}), "full_name_required"),
        (json!({"slug": "gala", "full_name": "Jane"}), "email_required"),
        (json!({"slug": "  ", "full_name": "Jane", "email": "j@d.io"}), "slug_required"),
    ];

    for (payload, expected_code) in cases {
        let (status, body) = post_registration(&client, &srv, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], expected_code);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn unknown_slug_is_event_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = post_registration(
        &client,
        &srv,
        json!({"slug": "nope", "full_name": "Jane Doe", "email": "jane@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "event_not_found");
}

#[tokio::test]
async fn policy_rejections_are_403_with_codes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut draft = open_event("draft-gala");
    draft.status = EventStatus::Draft;
    srv.seed_event(draft);

    let mut closed = open_event("closed-gala");
    closed.is_open = false;
    srv.seed_event(closed);

    let mut not_yet = open_event("future-gala");
    not_yet.sales_from = Some(Utc::now() + Duration::hours(1));
    srv.seed_event(not_yet);

    let cases = [
        ("draft-gala", "event_not_published"),
        ("closed-gala", "registrations_closed"),
        ("future-gala", "registrations_not_open_yet"),
    ];
    for (slug, expected_code) in cases {
        let (status, body) = post_registration(
            &client,
            &srv,
            json!({"slug": slug, "full_name": "Jane Doe", "email": "jane@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "slug {slug}");
        assert_eq!(body["code"], expected_code);
    }

    // Policy rejections must not write anything.
    assert!(srv.services.participants_in_memory().unwrap().is_empty());
}

#[tokio::test]
async fn successful_registration_returns_participant_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let event = srv.seed_event(open_event("gala"));

    // firstname/lastname fallback path.
    let (status, body) = post_registration(
        &client,
        &srv,
        json!({
            "slug": "gala",
            "firstname": "Jane",
            "lastname": "Doe",
            "email": "Jane@Example.com",
            "phone": "+33600000000",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let id = body["participant_id"].as_str().expect("participant_id");
    let id = uuid::Uuid::from_str(id).expect("participant_id is a uuid");

    let participants = srv.services.participants_in_memory().unwrap();
    let row = participants
        .get(gestevent_core::ParticipantId::from_uuid(id))
        .expect("row persisted");
    assert_eq!(row.event_id, event.id);
    assert_eq!(row.full_name, "Jane Doe");
    assert_eq!(row.email_lower, "jane@example.com");
    let qr_url = row.qr_png_url.expect("ticket url attached");
    assert!(qr_url.contains(&format!("tickets/{}/{}.png", event.id, id)));

    // Ticket image stored in the bucket.
    let bucket = srv.services.bucket_in_memory().unwrap();
    assert!(bucket.contains(&format!("tickets/{}/{}.png", event.id, id)));

    // Consent lands eventually (detached task).
    let consents = srv.services.consents_in_memory().unwrap();
    for _ in 0..100 {
        if !consents.all().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let all = consents.all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].event_id, event.id);
}

#[tokio::test]
async fn retrying_a_successful_registration_is_already_registered() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let mut event = open_event("gala");
    event.max_per_user = 0; // no quota: the uniqueness guard answers instead
    srv.seed_event(event);

    let payload = json!({"slug": "gala", "full_name": "Jane Doe", "email": "jane@example.com"});

    let (status, _) = post_registration(&client, &srv, payload.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_registration(&client, &srv, payload).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "already_registered");

    assert_eq!(srv.services.participants_in_memory().unwrap().len(), 1);
}

#[tokio::test]
async fn quota_reached_on_repeat_email() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_event(open_event("gala"));

    let payload = json!({"slug": "gala", "full_name": "Jane Doe", "email": "jane@example.com"});
    let (status, _) = post_registration(&client, &srv, payload.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_registration(&client, &srv, payload).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "user_quota_reached");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn capacity_two_with_three_concurrent_submissions() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let mut event = open_event("gala");
    event.capacity = Some(2);
    srv.seed_event(event);

    let submit = |email: &str| {
        let client = client.clone();
        let url = srv.register_url();
        let body = json!({"slug": "gala", "full_name": "P", "email": email});
        async move {
            let res = client.post(url).json(&body).send().await.unwrap();
            let status = res.status();
            let body: serde_json::Value = res.json().await.unwrap();
            (status, body)
        }
    };

    let (a, b, c) = tokio::join!(
        submit("p1@example.com"),
        submit("p2@example.com"),
        submit("p3@example.com"),
    );

    let results = [a, b, c];
    let winners: Vec<&serde_json::Value> = results
        .iter()
        .filter(|(status, _)| *status == StatusCode::OK)
        .map(|(_, body)| &body["participant_id"])
        .collect();
    let sold_out = results
        .iter()
        .filter(|(status, body)| {
            *status == StatusCode::FORBIDDEN && body["code"] == "sold_out"
        })
        .count();

    assert_eq!(winners.len(), 2);
    assert_eq!(sold_out, 1);
    assert_ne!(winners[0], winners[1], "participant ids must be unique");
    assert_eq!(srv.services.participants_in_memory().unwrap().len(), 2);
}

#[tokio::test]
async fn sixth_attempt_from_one_address_is_rate_limited() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let payload = json!({"slug": "nope", "full_name": "Jane", "email": "jane@example.com"});

    for _ in 0..5 {
        let res = client
            .post(srv.register_url())
            .header("x-forwarded-for", "203.0.113.7")
            .json(&payload)
            .send()
            .await
            .unwrap();
        // Attempts are recorded even for rejected registrations.
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let res = client
        .post(srv.register_url())
        .header("x-forwarded-for", "203.0.113.7")
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "rate_limited");

    // A different address is unaffected.
    let res = client
        .post(srv.register_url())
        .header("x-forwarded-for", "203.0.113.8")
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
