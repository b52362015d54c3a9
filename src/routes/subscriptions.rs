use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::subscriptions::{
        CreateSubscriptionRequest, CreateSubscriptionResponse, RedriveNotificationRequest,
        RedriveNotificationResponse, SubscriptionDetail, SubscriptionList,
    },
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    services::subscription_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subscriptions).post(create_subscription))
        .route("/{id}", get(get_subscription))
        .route("/{id}/notifications", post(redrive_notification))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = ApiResponse<CreateSubscriptionResponse>),
        (status = 400, description = "Every invalid field"),
        (status = 404, description = "Referenced product or package not found"),
    ),
    tag = "Subscriptions"
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiJson(payload): ApiJson<CreateSubscriptionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreateSubscriptionResponse>>)> {
    let resp = subscription_service::create_subscription(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    responses(
        (status = 200, description = "Subscriptions of the current customer", body = ApiResponse<SubscriptionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SubscriptionList>>> {
    let resp = subscription_service::list_subscriptions(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/{id}",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription with pricing and delivery schedule", body = ApiResponse<SubscriptionDetail>),
        (status = 404, description = "Subscription not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SubscriptionDetail>>> {
    let resp = subscription_service::get_subscription(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/notifications",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    request_body = RedriveNotificationRequest,
    responses(
        (status = 200, description = "Send attempt recorded", body = ApiResponse<RedriveNotificationResponse>),
        (status = 400, description = "Kind does not apply to this subscription"),
        (status = 404, description = "Subscription not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn redrive_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<RedriveNotificationRequest>,
) -> AppResult<Json<ApiResponse<RedriveNotificationResponse>>> {
    let resp = subscription_service::redrive_notification(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
