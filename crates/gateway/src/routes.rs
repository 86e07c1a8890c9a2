//! Request handlers and wire DTOs.

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use nutrilog_core::{
    ActivityLevel, BmiReport, DailySummary, Error, Gender, MealType, NutritionLog,
    NutritionRecord, UserProfile,
};
use nutrilog_store::bmi;

use crate::auth::AuthUser;
use crate::server::AppState;

/// Error wrapper mapping the taxonomy onto HTTP statuses.
///
/// Analysis itself never 5xxes for model or parse trouble; the fallback
/// guarantees a record. What remains here is bad input, bad credentials,
/// and storage failure.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::ImageDecode(_) | Error::InvalidRequest(_) | Error::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::UserNotFound(_) => StatusCode::NOT_FOUND,
            Error::ModelProvider(_) => StatusCode::BAD_GATEWAY,
            Error::Storage(_) | Error::Internal(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 of the raw photo bytes.
    pub image_base64: String,
    /// When present, the analysis also fills this daily meal slot.
    pub meal_type: Option<MealType>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: DailySummary,
    pub narrative: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub height_cm: f64,
    pub current_weight_kg: f64,
    pub target_weight_kg: f64,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Option<UserProfile>,
    pub report: Option<BmiReport>,
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub record: NutritionRecord,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub advice: String,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(Error::invalid_request("username and password are required").into());
    }

    state
        .store
        .create_user(&request.username, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "account created" })),
    ))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let account = state
        .store
        .authenticate(&request.username, &request.password)
        .await?;
    let token = state.auth.issue(&account.username)?;

    Ok(Json(TokenResponse {
        token,
        username: account.username,
    }))
}

/// Analyze a meal photo and persist the result.
///
/// Undecodable input is the only hard failure; the analyzer guarantees a
/// record for every reachable model reply and for model outages.
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<NutritionRecord>, ApiError> {
    let image_bytes = base64::engine::general_purpose::STANDARD
        .decode(request.image_base64.trim())
        .map_err(|e| Error::invalid_request(format!("invalid base64 image: {e}")))?;

    let record = state.analyzer.analyze(&image_bytes).await?;

    let image = Bytes::from(image_bytes);
    state.store.save_log(&username, &record, image.clone()).await?;

    if let Some(meal_type) = request.meal_type {
        state
            .store
            .upsert_daily_meal(&username, Utc::now().date_naive(), meal_type, &record, image)
            .await?;
    }

    Ok(Json(record))
}

pub async fn logs_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<NutritionLog>>, ApiError> {
    let limit = query.limit.unwrap_or(20).min(100);
    let logs = state.store.recent_logs(&username, limit).await?;
    Ok(Json(logs))
}

pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let summary = state.store.daily_summary(&username, date).await?;
    let meals = state.store.daily_meals(&username, date).await?;
    let narrative = state.analyzer.daily_summary_narrative(&meals).await;

    Ok(Json(SummaryResponse { summary, narrative }))
}

pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.store.get_profile(&username).await?;
    let report = profile.as_ref().map(bmi::bmi_report);
    Ok(Json(ProfileResponse { profile, report }))
}

pub async fn put_profile_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(username): AuthUser,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if request.height_cm <= 0.0 || request.current_weight_kg <= 0.0 {
        return Err(Error::invalid_request("height and weight must be positive").into());
    }

    let profile = UserProfile {
        username,
        height_cm: request.height_cm,
        current_weight_kg: request.current_weight_kg,
        target_weight_kg: request.target_weight_kg,
        age: request.age,
        gender: request.gender,
        activity_level: request.activity_level,
        updated_at: Utc::now(),
    };
    state.store.upsert_profile(&profile).await?;

    let report = bmi::bmi_report(&profile);
    Ok(Json(ProfileResponse {
        profile: Some(profile),
        report: Some(report),
    }))
}

pub async fn advice_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_username): AuthUser,
    Json(request): Json<AdviceRequest>,
) -> Result<Json<AdviceResponse>, ApiError> {
    let advice = state.analyzer.nutrition_advice(&request.record).await;
    Ok(Json(AdviceResponse { advice }))
}
