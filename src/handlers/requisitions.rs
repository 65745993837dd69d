use crate::auth::ActingUser;
use crate::errors::ServiceError;
use crate::models::RequisitionStatus;
use crate::services::requisitions::{
    CreateRequisitionRequest, RequisitionSnapshot, RequisitionSummary, UpdateRequisitionRequest,
};
use crate::{ApiResponse, AppState, PaginatedResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::flatten_validation_errors;

#[derive(Debug, Deserialize)]
pub struct RequisitionListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    pub status: Option<RequisitionStatus>,
}

fn default_page() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitRequisitionRequest {
    #[validate]
    pub acting_user: ActingUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApproveRequisitionRequest {
    #[validate]
    pub acting_user: ActingUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectRequisitionRequest {
    #[validate]
    pub acting_user: ActingUser,
    #[validate(length(min = 1, message = "A rejection requires a reason"))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeleteRequisitionRequest {
    #[validate]
    pub acting_user: ActingUser,
}

#[utoipa::path(
    post,
    path = "/api/v1/requisitions",
    tag = "requisitions",
    summary = "Create requisition",
    description = "Create a purchase requisition in Draft with its document number already allocated",
    request_body = CreateRequisitionRequest,
    responses(
        (status = 201, description = "Requisition created", body = ApiResponse<RequisitionSnapshot>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_requisition(
    State(state): State<AppState>,
    Json(request): Json<CreateRequisitionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RequisitionSnapshot>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let snapshot = state
        .services
        .requisitions
        .create_requisition(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(snapshot))))
}

#[utoipa::path(
    get,
    path = "/api/v1/requisitions",
    tag = "requisitions",
    summary = "List requisitions",
    description = "Get a paginated list of requisitions, newest first, with optional status filtering",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("status" = Option<String>, Query, description = "Filter by requisition status"),
    ),
    responses(
        (status = 200, description = "Requisitions retrieved", body = ApiResponse<PaginatedResponse<RequisitionSummary>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_requisitions(
    State(state): State<AppState>,
    Query(query): Query<RequisitionListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<RequisitionSummary>>>, ServiceError> {
    let limit = query
        .limit
        .unwrap_or(u64::from(state.config.api_default_page_size))
        .clamp(1, u64::from(state.config.api_max_page_size));

    let result = state
        .services
        .requisitions
        .list_requisitions(query.page, limit, query.status)
        .await?;

    let total_pages = (result.total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.requisitions,
        total: result.total,
        page: result.page,
        limit,
        total_pages,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/requisitions/{id}",
    tag = "requisitions",
    summary = "Get requisition",
    description = "Get one requisition with its lines",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    responses(
        (status = 200, description = "Requisition retrieved", body = ApiResponse<RequisitionSnapshot>),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequisitionSnapshot>>, ServiceError> {
    let snapshot = state
        .services
        .requisitions
        .get_requisition(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Requisition {} not found", id)))?;
    Ok(Json(ApiResponse::success(snapshot)))
}

#[utoipa::path(
    get,
    path = "/api/v1/requisitions/by-number/{number}",
    tag = "requisitions",
    summary = "Get requisition by number",
    description = "Get one requisition by its document number",
    params(("number" = String, Path, description = "Requisition number, e.g. PR-000042")),
    responses(
        (status = 200, description = "Requisition retrieved", body = ApiResponse<RequisitionSnapshot>),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_requisition_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<ApiResponse<RequisitionSnapshot>>, ServiceError> {
    let snapshot = state
        .services
        .requisitions
        .get_requisition_by_number(&number)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Requisition {} not found", number)))?;
    Ok(Json(ApiResponse::success(snapshot)))
}

#[utoipa::path(
    put,
    path = "/api/v1/requisitions/{id}",
    tag = "requisitions",
    summary = "Update requisition",
    description = "Replace a draft's header fields and lines; the write is conditioned on the version the client read",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = UpdateRequisitionRequest,
    responses(
        (status = 200, description = "Requisition updated", body = ApiResponse<RequisitionSnapshot>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Not editable in its current status, or the version is stale", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRequisitionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RequisitionSnapshot>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let snapshot = state
        .services
        .requisitions
        .update_requisition(id, request)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(snapshot))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/requisitions/{id}",
    tag = "requisitions",
    summary = "Delete requisition",
    description = "Logically delete a draft or rejected requisition",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = DeleteRequisitionRequest,
    responses(
        (status = 204, description = "Requisition deleted"),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Not deletable in its current status", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeleteRequisitionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .requisitions
        .delete_requisition(id, request.acting_user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/requisitions/{id}/submit",
    tag = "requisitions",
    summary = "Submit requisition",
    description = "Move a draft to Submitted; requires at least one line and a purpose",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = SubmitRequisitionRequest,
    responses(
        (status = 200, description = "Requisition submitted", body = ApiResponse<RequisitionSnapshot>),
        (status = 400, description = "Submission guard failed", body = crate::errors::ErrorResponse),
        (status = 403, description = "Actor may not submit", body = crate::errors::ErrorResponse),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Illegal transition or stale document", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn submit_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitRequisitionRequest>,
) -> Result<Json<ApiResponse<RequisitionSnapshot>>, ServiceError> {
    let snapshot = state
        .services
        .requisitions
        .submit_requisition(id, request.acting_user)
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/v1/requisitions/{id}/approve",
    tag = "requisitions",
    summary = "Approve requisition",
    description = "Approve a submitted requisition, releasing it to fulfillment",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = ApproveRequisitionRequest,
    responses(
        (status = 200, description = "Requisition approved", body = ApiResponse<RequisitionSnapshot>),
        (status = 403, description = "Actor may not approve", body = crate::errors::ErrorResponse),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Illegal transition or stale document", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn approve_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApproveRequisitionRequest>,
) -> Result<Json<ApiResponse<RequisitionSnapshot>>, ServiceError> {
    let snapshot = state
        .services
        .requisitions
        .approve_requisition(id, request.acting_user)
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/v1/requisitions/{id}/reject",
    tag = "requisitions",
    summary = "Reject requisition",
    description = "Reject a submitted requisition with a mandatory reason",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = RejectRequisitionRequest,
    responses(
        (status = 200, description = "Requisition rejected", body = ApiResponse<RequisitionSnapshot>),
        (status = 400, description = "Missing rejection reason", body = crate::errors::ErrorResponse),
        (status = 403, description = "Actor may not reject", body = crate::errors::ErrorResponse),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Illegal transition or stale document", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn reject_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequisitionRequest>,
) -> Result<Json<ApiResponse<RequisitionSnapshot>>, ServiceError> {
    let snapshot = state
        .services
        .requisitions
        .reject_requisition(id, request.acting_user, request.reason)
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}
