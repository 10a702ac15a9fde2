//! Router tests driving the full middleware stack in-process

use super::*;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request as HttpRequest, StatusCode},
};
use leadforge_common::{
    db::SavedApplication,
    errors::{AppError, Result},
    notify::{DeliveryStatus, EmailMessage, Mailer},
    ratelimit::MemoryRateLimitStore,
    validation::ApplicationSubmission,
};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use tower::ServiceExt;

#[derive(Default)]
struct ScriptedMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl ScriptedMailer {
    fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    fn sent(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for ScriptedMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryStatus> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        if self.fail {
            return Err(AppError::Notification { message: "provider rejected message".into() });
        }
        Ok(DeliveryStatus::Sent)
    }

    fn is_configured(&self) -> bool {
        true
    }
}

struct FailingStore;

#[async_trait]
impl LeadStore for FailingStore {
    async fn save_application(
        &self,
        _submission: &ApplicationSubmission,
        _estimated_monthly_income: u64,
        _management_fee_percent: f64,
    ) -> Result<SavedApplication> {
        Err(AppError::DatabaseConnection { message: "connection refused".into() })
    }

    async fn ping(&self) -> Result<()> {
        Err(AppError::DatabaseConnection { message: "connection refused".into() })
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

fn app_with(store: Arc<dyn LeadStore>, mailer: Arc<dyn Mailer>) -> Router {
    let config = Arc::new(AppConfig::default());
    let notifier = Notifier::new(mailer, &config);

    create_router(AppState {
        intake: LeadIntake::new(store, notifier, &config),
        contact_limiter: Arc::new(MemoryRateLimitStore::new(5, Duration::from_millis(60_000))),
        cache: None,
        config,
    })
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    client_ip: &str,
) -> (StatusCode, HeaderMap, Value) {
    let builder = HttpRequest::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", client_ip);

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, headers, value)
}

fn contact_body() -> Value {
    json!({
        "name": "Maria Lopez",
        "email": "maria@example.com",
        "phone": "2105550199",
        "message": "I have a three bedroom house near the Pearl district.",
        "propertyType": "house",
        "bedrooms": "3"
    })
}

fn application_body() -> Value {
    json!({
        "firstName": "Dana",
        "lastName": "Whitfield",
        "email": "dana@example.com",
        "phone": "2105551234",
        "propertyType": "house",
        "address": "418 Mission Oak Dr",
        "city": "San Antonio",
        "state": "TX",
        "zipCode": "78254",
        "bedrooms": 3,
        "bathrooms": 2,
        "yearBuilt": 2004,
        "currentlyListed": false,
        "furnished": true,
        "amenities": ["pool", "wifi"],
        "photosAvailable": true
    })
}

#[tokio::test]
async fn test_contact_accepted_and_both_emails_sent() {
    let mailer = Arc::new(ScriptedMailer::default());
    let app = app_with(Arc::new(MemoryStore::new()), mailer.clone());

    let (status, headers, body) =
        call(&app, Method::POST, "/contact", Some(contact_body()), "203.0.113.10").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Thank you for your inquiry! We'll get back to you within 24 hours."
    );
    assert_eq!(body["data"]["notificationSent"], true);
    assert_eq!(body["data"]["autoReplySent"], true);
    assert_eq!(body["data"]["emailConfigured"], true);
    assert_eq!(mailer.sent(), 2);
}

#[tokio::test]
async fn test_contact_sixth_request_in_window_is_rejected() {
    let mailer = Arc::new(ScriptedMailer::default());
    let app = app_with(Arc::new(MemoryStore::new()), mailer.clone());

    for _ in 0..5 {
        let (status, _, _) =
            call(&app, Method::POST, "/contact", Some(contact_body()), "203.0.113.20").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, headers, body) =
        call(&app, Method::POST, "/contact", Some(contact_body()), "203.0.113.20").await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(headers.contains_key(header::RETRY_AFTER));
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Too many requests. Please try again later.");
    assert_eq!(body["code"], "RATE_LIMITED");
    assert_eq!(mailer.sent(), 10);

    // Another client has its own window
    let (status, _, _) =
        call(&app, Method::POST, "/contact", Some(contact_body()), "203.0.113.21").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_contact_short_message_single_error_no_email() {
    let mailer = Arc::new(ScriptedMailer::default());
    let app = app_with(Arc::new(MemoryStore::new()), mailer.clone());

    let (status, _, body) = call(
        &app,
        Method::POST,
        "/contact",
        Some(json!({ "name": "Jo", "email": "jo@x.com", "message": "short" })),
        "203.0.113.30",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(
        body["errors"],
        json!([{ "field": "message", "message": "Message must be at least 10 characters" }])
    );
    assert_eq!(mailer.sent(), 0);
}

#[tokio::test]
async fn test_contact_array_body_is_rejected_without_email() {
    let mailer = Arc::new(ScriptedMailer::default());
    let app = app_with(Arc::new(MemoryStore::new()), mailer.clone());

    let (status, _, body) = call(
        &app,
        Method::POST,
        "/contact",
        Some(json!(["Jonathan", "jo@example.com", null, "Please send me a quote for my condo"])),
        "203.0.113.31",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["errors"][0]["field"], "body");
    assert_eq!(mailer.sent(), 0);
}

#[tokio::test]
async fn test_contact_malformed_json_is_body_error() {
    let app = app_with(Arc::new(MemoryStore::new()), Arc::new(ScriptedMailer::default()));

    let request = HttpRequest::builder()
        .method(Method::POST)
        .uri("/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn test_contact_with_unconfigured_email_still_succeeds() {
    let mailer = leadforge_common::notify::build_mailer(&Default::default()).unwrap();
    let app = app_with(Arc::new(MemoryStore::new()), mailer);

    let (status, _, body) =
        call(&app, Method::POST, "/contact", Some(contact_body()), "203.0.113.40").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["emailConfigured"], false);
    assert_eq!(body["data"]["notificationSent"], false);
    assert_eq!(body["data"]["autoReplySent"], false);
}

#[tokio::test]
async fn test_contact_info() {
    let app = app_with(Arc::new(MemoryStore::new()), Arc::new(ScriptedMailer::default()));

    let (status, _, body) = call(&app, Method::GET, "/contact", None, "203.0.113.50").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emailConfigured"], true);
    assert_eq!(body["config"]["apiBase"], "https://api.resend.com");
}

#[tokio::test]
async fn test_application_created_with_ids_and_estimate() {
    let store = MemoryStore::new();
    let mailer = Arc::new(ScriptedMailer::default());
    let app = app_with(Arc::new(store.clone()), mailer.clone());

    let (status, _, body) =
        call(&app, Method::POST, "/applications", Some(application_body()), "198.51.100.1").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Application submitted successfully!");

    let data = &body["data"];
    assert_eq!(data["dbResult"]["success"], true);
    assert_eq!(data["applicationId"], data["dbResult"]["applicationId"]);
    assert_eq!(data["emailResult"]["status"], "sent");
    assert_eq!(data["application"]["city"], "San Antonio");

    // house: 200 + 60 + 15 + 20 + 50 = 345, * 1.2 = 414 nightly, * 25 * 0.75
    assert_eq!(data["dbResult"]["estimatedMonthlyIncome"], 7763);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.applications[0].estimated_monthly_income, 7763);
    assert_eq!(mailer.sent(), 1);
}

#[tokio::test]
async fn test_application_resubmission_reuses_owner_and_property() {
    let store = MemoryStore::new();
    let app = app_with(Arc::new(store.clone()), Arc::new(ScriptedMailer::default()));

    let (_, _, first) =
        call(&app, Method::POST, "/applications", Some(application_body()), "198.51.100.2").await;
    let (_, _, second) =
        call(&app, Method::POST, "/applications", Some(application_body()), "198.51.100.2").await;

    assert_eq!(first["data"]["dbResult"]["ownerId"], second["data"]["dbResult"]["ownerId"]);
    assert_eq!(first["data"]["dbResult"]["propertyId"], second["data"]["dbResult"]["propertyId"]);
    assert_ne!(first["data"]["applicationId"], second["data"]["applicationId"]);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.owners.len(), 1);
    assert_eq!(snapshot.properties.len(), 1);
    assert_eq!(snapshot.applications.len(), 2);
}

#[tokio::test]
async fn test_same_owner_new_address_adds_property() {
    let store = MemoryStore::new();
    let app = app_with(Arc::new(store.clone()), Arc::new(ScriptedMailer::default()));

    let mut other = application_body();
    other["address"] = json!("77 Alamo Plaza");

    call(&app, Method::POST, "/applications", Some(application_body()), "198.51.100.3").await;
    call(&app, Method::POST, "/applications", Some(other), "198.51.100.3").await;

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.owners.len(), 1);
    assert_eq!(snapshot.properties.len(), 2);
    assert_eq!(snapshot.applications.len(), 2);
}

#[tokio::test]
async fn test_application_future_year_rejected_without_persisting() {
    let store = MemoryStore::new();
    let mailer = Arc::new(ScriptedMailer::default());
    let app = app_with(Arc::new(store.clone()), mailer.clone());

    let mut body = application_body();
    body["yearBuilt"] = json!(chrono::Datelike::year(&chrono::Utc::now()) + 1);

    let (status, _, response) =
        call(&app, Method::POST, "/applications", Some(body), "198.51.100.4").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "Validation error");
    assert_eq!(
        response["errors"],
        json!([{ "field": "yearBuilt", "message": "Year built cannot be in the future" }])
    );
    assert!(store.snapshot().await.applications.is_empty());
    assert_eq!(mailer.sent(), 0);
}

#[tokio::test]
async fn test_application_store_failure_is_masked_and_skips_email() {
    let mailer = Arc::new(ScriptedMailer::default());
    let app = app_with(Arc::new(FailingStore), mailer.clone());

    let (status, _, body) =
        call(&app, Method::POST, "/applications", Some(application_body()), "198.51.100.5").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(body["code"], "CONNECTION_ERROR");
    assert!(!body.to_string().contains("connection refused"));
    assert_eq!(mailer.sent(), 0);
}

#[tokio::test]
async fn test_application_email_failure_still_created() {
    let store = MemoryStore::new();
    let app = app_with(Arc::new(store.clone()), Arc::new(ScriptedMailer::failing()));

    let (status, _, body) =
        call(&app, Method::POST, "/applications", Some(application_body()), "198.51.100.6").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["emailResult"]["success"], false);
    assert_eq!(body["data"]["emailResult"]["status"], "failed");
    assert_eq!(store.snapshot().await.applications.len(), 1);
}

#[tokio::test]
async fn test_applications_probe() {
    let app = app_with(Arc::new(MemoryStore::new()), Arc::new(ScriptedMailer::default()));

    let (status, _, body) = call(&app, Method::GET, "/applications", None, "198.51.100.7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Application API endpoint is working");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_estimate_endpoint() {
    let app = app_with(Arc::new(MemoryStore::new()), Arc::new(ScriptedMailer::default()));

    let (status, _, body) = call(
        &app,
        Method::POST,
        "/estimate",
        Some(json!({
            "propertyType": "apartment",
            "bedrooms": 1,
            "bathrooms": 1,
            "city": "Boise"
        })),
        "192.0.2.1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nightlyRate"], 120);
    assert_eq!(body["monthlyIncome"], 2250);
    assert_eq!(body["annualIncome"], 27000);
    assert_eq!(body["longTermMonthly"], 720);
}

#[tokio::test]
async fn test_estimate_rejects_negative_counts() {
    let app = app_with(Arc::new(MemoryStore::new()), Arc::new(ScriptedMailer::default()));

    let (status, _, body) = call(
        &app,
        Method::POST,
        "/estimate",
        Some(json!({ "propertyType": "condo", "bedrooms": -1, "bathrooms": 1, "city": "Miami" })),
        "192.0.2.2",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "bedrooms");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app_with(Arc::new(MemoryStore::new()), Arc::new(ScriptedMailer::default()));
    let (status, _, body) = call(&app, Method::GET, "/health", None, "192.0.2.3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "leadforge");

    let (status, _, body) = call(&app, Method::GET, "/ready", None, "192.0.2.3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["store"]["backend"], "memory");

    let failing = app_with(Arc::new(FailingStore), Arc::new(ScriptedMailer::default()));
    let (status, _, body) = call(&failing, Method::GET, "/ready", None, "192.0.2.3").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");
}
