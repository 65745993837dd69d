use crate::errors::ServiceError;
use crate::services::fulfillment::{DispatchFulfillmentRequest, FulfillmentRecordResponse};
use crate::{ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::flatten_validation_errors;

#[utoipa::path(
    post,
    path = "/api/v1/requisitions/{id}/fulfillments",
    tag = "fulfillments",
    summary = "Dispatch fulfillment",
    description = "Dispatch fulfillment for selected lines of an approved requisition over one channel",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = DispatchFulfillmentRequest,
    responses(
        (status = 201, description = "Fulfillment dispatched", body = ApiResponse<FulfillmentRecordResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid selection or channel attributes", body = crate::errors::ErrorResponse),
        (status = 403, description = "Actor may not dispatch fulfillment", body = crate::errors::ErrorResponse),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Requisition not open for fulfillment, or kept changing underneath the dispatch", body = crate::errors::ErrorResponse),
        (status = 422, description = "Dispatch exceeds a line's pending quantity", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn dispatch_fulfillment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DispatchFulfillmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FulfillmentRecordResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let record = state
        .services
        .fulfillments
        .dispatch_fulfillment(id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

#[utoipa::path(
    get,
    path = "/api/v1/requisitions/{id}/fulfillments",
    tag = "fulfillments",
    summary = "List fulfillments",
    description = "List the fulfillment records dispatched against a requisition, oldest first",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    responses(
        (status = 200, description = "Fulfillment records retrieved", body = ApiResponse<Vec<FulfillmentRecordResponse>>),
        (status = 404, description = "Requisition not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_fulfillments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<FulfillmentRecordResponse>>>, ServiceError> {
    let records = state.services.fulfillments.list_fulfillments(id).await?;
    Ok(Json(ApiResponse::success(records)))
}
