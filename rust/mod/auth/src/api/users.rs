use axum::extract::{Extension, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use aidiy_core::{ApiJson, ServiceError};

use crate::api::AppState;
use crate::model::{AddChildInput, Claims, UpdateProfile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/profile", get(get_profile).put(update_profile))
        .route("/api/users/children", get(list_children).post(add_child))
}

async fn get_profile(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ServiceError> {
    let user = svc.get_profile(&claims.sub).map_err(ServiceError::from)?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn update_profile(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(patch): ApiJson<UpdateProfile>,
) -> Result<Json<Value>, ServiceError> {
    let user = svc
        .update_profile(&claims.sub, &patch)
        .map_err(ServiceError::from)?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn list_children(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ServiceError> {
    let children = svc.list_children(&claims.sub).map_err(ServiceError::from)?;
    Ok(Json(json!({ "success": true, "children": children })))
}

async fn add_child(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(input): ApiJson<AddChildInput>,
) -> Result<Json<Value>, ServiceError> {
    let child = svc.add_child(&claims, &input).map_err(ServiceError::from)?;
    Ok(Json(json!({ "success": true, "child": child })))
}
