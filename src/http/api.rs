//! REST API routes.
//!
//! Thin handlers over [`ReviewService`]: decode, call, wrap. Every failure
//! leaves as `{"error": {"code", "message"}}` with the stable code from
//! [`AppError::code`].

use crate::error::AppError;
use crate::models::{
    PullRequest, PullRequestReviewersStat, PullRequestShort, ReviewerAssignmentStat, Team,
    UserWithTeam,
};
use crate::services::ReviewService;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(AppError);

impl ApiErr {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyExists { .. }
            | AppError::AlreadyMerged { .. }
            | AppError::ReviewerNotAssigned { .. }
            | AppError::NoReviewerCandidates { .. }
            | AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = self.status();
        // Storage details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code: self.0.code().to_string(),
                    message,
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// JSON body extractor whose rejection is a `VALIDATION_ERROR`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiErr;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                log::warn!("Rejected request body: {}", rejection.body_text());
                Err(ApiErr(invalid_json(&rejection)))
            }
        }
    }
}

fn invalid_json(rejection: &JsonRejection) -> AppError {
    AppError::validation(format!("invalid json: {}", rejection.body_text()))
}

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetUserActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Deserialize)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

#[derive(Deserialize)]
pub struct ReassignReviewerRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Deserialize)]
struct TeamNameQuery {
    #[serde(default)]
    team_name: String,
}

#[derive(Deserialize)]
struct UserIdQuery {
    #[serde(default)]
    user_id: String,
}

#[derive(Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: UserWithTeam,
}

#[derive(Serialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

#[derive(Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequest,
}

#[derive(Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequest,
    pub replaced_by: String,
}

#[derive(Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build all API routes.
pub fn api_routes(service: ReviewService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/users/setIsActive", post(set_user_active))
        .route("/users/getReview", get(get_user_reviews))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/stats/reviewers", get(reviewer_stats))
        .route("/stats/pullRequests", get(pull_request_stats))
        .with_state(service)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn add_team(
    State(service): State<ReviewService>,
    ApiJson(team): ApiJson<Team>,
) -> Result<Json<TeamResponse>, ApiErr> {
    let team = service.upsert_team(team).await?;
    Ok(Json(TeamResponse { team }))
}

async fn get_team(
    State(service): State<ReviewService>,
    Query(params): Query<TeamNameQuery>,
) -> Result<Json<Team>, ApiErr> {
    Ok(Json(service.get_team_by_name(&params.team_name).await?))
}

async fn set_user_active(
    State(service): State<ReviewService>,
    ApiJson(req): ApiJson<SetUserActiveRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    let user = service.set_user_active(&req.user_id, req.is_active).await?;
    Ok(Json(UserResponse { user }))
}

async fn get_user_reviews(
    State(service): State<ReviewService>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UserReviewsResponse>, ApiErr> {
    let pull_requests = service.list_reviews_for_user(&params.user_id).await?;
    Ok(Json(UserReviewsResponse {
        user_id: params.user_id,
        pull_requests,
    }))
}

async fn create_pull_request(
    State(service): State<ReviewService>,
    ApiJson(req): ApiJson<CreatePullRequestRequest>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let pr = service
        .create_pull_request(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;
    Ok(Json(PullRequestResponse { pr }))
}

async fn merge_pull_request(
    State(service): State<ReviewService>,
    ApiJson(req): ApiJson<MergePullRequestRequest>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let pr = service.merge_pull_request(&req.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

async fn reassign_reviewer(
    State(service): State<ReviewService>,
    ApiJson(req): ApiJson<ReassignReviewerRequest>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let outcome = service
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: outcome.pull_request,
        replaced_by: outcome.replaced_by.user_id,
    }))
}

async fn reviewer_stats(
    State(service): State<ReviewService>,
) -> Result<Json<ItemsResponse<ReviewerAssignmentStat>>, ApiErr> {
    let items = service.reviewer_assignment_stats().await?;
    Ok(Json(ItemsResponse { items }))
}

async fn pull_request_stats(
    State(service): State<ReviewService>,
) -> Result<Json<ItemsResponse<PullRequestReviewersStat>>, ApiErr> {
    let items = service.pull_request_reviewer_stats().await?;
    Ok(Json(ItemsResponse { items }))
}
