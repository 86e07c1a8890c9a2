//! HTTP surface tests against an in-memory store and a mock model.

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::{json, Value};
use tower::ServiceExt;

use nutrilog_analyzer::FoodAnalyzer;
use nutrilog_gateway::{auth::AuthKeys, GatewayConfig, GatewayServer};
use nutrilog_model_gateway::MockLlmClient;
use nutrilog_store::SqliteStore;

fn app(model_reply: Option<&str>) -> Router {
    let llm: Arc<MockLlmClient> = Arc::new(match model_reply {
        Some(reply) => MockLlmClient::new(reply),
        None => MockLlmClient::failing(),
    });
    let analyzer = FoodAnalyzer::new(llm);
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let auth = AuthKeys::new(Some(&Secret::new("test-secret".to_string())), 24).unwrap();

    GatewayServer::new(GatewayConfig::default(), analyzer, store, auth).build_router()
}

fn photo_base64() -> String {
    use base64::Engine as _;
    let img = image::RgbImage::from_fn(32, 24, |x, y| image::Rgb([x as u8, y as u8, 99]));
    let mut cursor = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(cursor.into_inner())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn register_and_login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/register",
            None,
            json!({"username": "budi", "email": "budi@example.com", "password": "rahasia123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            None,
            json!({"username": "budi", "password": "rahasia123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    body_json(response).await["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(Some("{}"));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_analyze_requires_auth() {
    let app = app(Some("{}"));
    let response = app
        .oneshot(post_json(
            "/v1/analyze",
            None,
            json!({"image_base64": photo_base64()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_analyze_saves_log_and_returns_record() {
    let app = app(Some(
        r#"{"foods_detected":["Nasi goreng"],"total_calories":560}"#,
    ));
    let token = register_and_login(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/analyze",
            Some(&token),
            json!({"image_base64": photo_base64(), "meal_type": "lunch"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = body_json(response).await;
    assert_eq!(record["analysis_source"], "direct_json");
    assert_eq!(record["total_calories"], 560.0);

    // The log and the lunch slot are both persisted.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/logs")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let logs = body_json(response).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/summary")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["summary"]["meal_count"], 1);
    assert_eq!(summary["summary"]["total_calories"], 560.0);
}

#[tokio::test]
async fn test_analyze_never_fails_on_model_outage() {
    let app = app(None);
    let token = register_and_login(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/analyze",
            Some(&token),
            json!({"image_base64": photo_base64()}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let record = body_json(response).await;
    assert_eq!(record["analysis_source"], "smart_fallback");
}

#[tokio::test]
async fn test_analyze_rejects_bad_base64() {
    let app = app(Some("{}"));
    let token = register_and_login(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/analyze",
            Some(&token),
            json!({"image_base64": "%%% not base64 %%%"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_rejects_undecodable_image() {
    let app = app(Some("{}"));
    let token = register_and_login(&app).await;

    use base64::Engine as _;
    let not_an_image = base64::engine::general_purpose::STANDARD.encode(b"plain text");
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/analyze",
            Some(&token),
            json!({"image_base64": not_an_image}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_round_trip_with_bmi_report() {
    let app = app(Some("{}"));
    let token = register_and_login(&app).await;

    let response = app
        .clone()
        .oneshot({
            let mut builder = Request::builder()
                .method("PUT")
                .uri("/v1/profile")
                .header("Content-Type", "application/json");
            builder = builder.header("Authorization", format!("Bearer {token}"));
            builder
                .body(Body::from(
                    json!({
                        "height_cm": 175.0,
                        "current_weight_kg": 70.0,
                        "target_weight_kg": 68.0,
                        "age": 30,
                        "gender": "male",
                        "activity_level": "moderate",
                    })
                    .to_string(),
                ))
                .unwrap()
        })
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let profile = body_json(response).await;
    assert_eq!(profile["report"]["bmi"], 22.9);
    assert_eq!(profile["report"]["category"], "normal");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/profile")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let fetched = body_json(response).await;
    assert_eq!(fetched["profile"]["height_cm"], 175.0);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = app(Some("{}"));
    let _ = register_and_login(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/register",
            None,
            json!({"username": "budi", "email": "budi@example.com", "password": "x12345"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
