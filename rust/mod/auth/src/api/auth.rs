use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use aidiy_core::{ApiJson, ServiceError};

use crate::api::AppState;
use crate::model::{
    Claims, GoogleLoginInput, KidLoginInput, LoginInput, LoginResult, RegisterInput,
    ResetPasswordInput, SendOtpInput, VerifyOtpInput,
};
use crate::service::account::ResetOutcome;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/auth/google", post(google))
        .route("/api/auth/kid-login", post(kid_login))
        .route("/api/auth/send-otp", post(send_otp))
        .route("/api/auth/resend-otp", post(send_otp))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/reset-password", post(reset_password))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/api/auth/logout", post(logout))
}

fn login_body(result: LoginResult) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": result.user,
        "appToken": result.app_token,
    }))
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": text }))
}

/// POST /api/auth/register
async fn register(
    State(svc): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let user = svc.register(&input).map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registered. OTP sent for verification",
            "user": user.summary(),
        })),
    ))
}

/// POST /api/auth/login
async fn login(
    State(svc): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<Value>, ServiceError> {
    let result = svc.login(&input).map_err(ServiceError::from)?;
    Ok(login_body(result))
}

/// POST /auth/google
async fn google(
    State(svc): State<AppState>,
    ApiJson(input): ApiJson<GoogleLoginInput>,
) -> Result<Json<Value>, ServiceError> {
    let result = svc.google_login(&input.token).await.map_err(ServiceError::from)?;
    Ok(login_body(result))
}

/// POST /api/auth/kid-login
async fn kid_login(
    State(svc): State<AppState>,
    ApiJson(input): ApiJson<KidLoginInput>,
) -> Result<Json<Value>, ServiceError> {
    let result = svc.kid_login(&input.code).map_err(ServiceError::from)?;
    Ok(login_body(result))
}

/// POST /api/auth/send-otp and /api/auth/resend-otp
async fn send_otp(
    State(svc): State<AppState>,
    ApiJson(input): ApiJson<SendOtpInput>,
) -> Result<Json<Value>, ServiceError> {
    svc.send_verification_otp(&input.email)
        .map_err(ServiceError::from)?;
    Ok(message("OTP sent"))
}

/// POST /api/auth/verify-otp
async fn verify_otp(
    State(svc): State<AppState>,
    ApiJson(input): ApiJson<VerifyOtpInput>,
) -> Result<Json<Value>, ServiceError> {
    svc.verify_email(&input.email, &input.otp)
        .map_err(ServiceError::from)?;
    Ok(message("Email verified"))
}

/// POST /api/auth/reset-password
async fn reset_password(
    State(svc): State<AppState>,
    ApiJson(input): ApiJson<ResetPasswordInput>,
) -> Result<Json<Value>, ServiceError> {
    let outcome = svc.reset_password(&input).map_err(ServiceError::from)?;
    Ok(match outcome {
        ResetOutcome::CodeSent => message("Reset code sent"),
        ResetOutcome::PasswordChanged => message("Password updated"),
    })
}

/// POST /api/auth/logout
async fn logout(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ServiceError> {
    svc.logout(&claims.sid).map_err(ServiceError::from)?;
    Ok(message("Logged out"))
}
