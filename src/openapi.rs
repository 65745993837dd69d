use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Procurement API",
        version = "1.0.0",
        description = r#"
# Purchase Requisition and Fulfillment API

Manages purchase requisitions from draft through approval and into fulfillment.

## Workflow

A requisition starts as a `Draft`, is `Submitted` for review, and is then
`Approved` or `Rejected`. Fulfillment is dispatched against approved documents
over one of three channels (purchase order conversion, stock issue, material
transfer); the header moves through `PartiallyFulfilled` to `FullyFulfilled`
as line quantities are satisfied.

## Error Handling

Errors use a consistent envelope with appropriate HTTP status codes:

```json
{
  "error": "State Error",
  "message": "fulfillment cannot be dispatched against a Draft requisition",
  "request_id": "b5d9...",
  "timestamp": "2026-08-25T00:00:00Z"
}
```

Conflicts with concurrent editors surface as `409`; dispatching more than a
line's pending quantity surfaces as `422`.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
        "#,
    ),
    tags(
        (name = "requisitions", description = "Requisition lifecycle and approval workflow"),
        (name = "fulfillments", description = "Fulfillment dispatch and history")
    ),
    paths(
        // Requisitions
        crate::handlers::requisitions::list_requisitions,
        crate::handlers::requisitions::create_requisition,
        crate::handlers::requisitions::get_requisition,
        crate::handlers::requisitions::get_requisition_by_number,
        crate::handlers::requisitions::update_requisition,
        crate::handlers::requisitions::delete_requisition,
        crate::handlers::requisitions::submit_requisition,
        crate::handlers::requisitions::approve_requisition,
        crate::handlers::requisitions::reject_requisition,

        // Fulfillments
        crate::handlers::fulfillments::dispatch_fulfillment,
        crate::handlers::fulfillments::list_fulfillments,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            // Domain enums
            crate::models::RequisitionStatus,
            crate::models::RequisitionPriority,
            crate::models::requisition::LineStatus,
            crate::models::FulfillmentChannel,
            crate::models::ChannelAttributes,

            // Requisition types
            crate::auth::ActingUser,
            crate::services::requisitions::CreateRequisitionRequest,
            crate::services::requisitions::UpdateRequisitionRequest,
            crate::services::requisitions::RequisitionLineInput,
            crate::services::requisitions::RequisitionSnapshot,
            crate::services::requisitions::RequisitionLineSnapshot,
            crate::services::requisitions::RequisitionSummary,
            crate::handlers::requisitions::SubmitRequisitionRequest,
            crate::handlers::requisitions::ApproveRequisitionRequest,
            crate::handlers::requisitions::RejectRequisitionRequest,
            crate::handlers::requisitions::DeleteRequisitionRequest,

            // Fulfillment types
            crate::services::fulfillment::DispatchFulfillmentRequest,
            crate::services::fulfillment::DispatchLineInput,
            crate::services::fulfillment::FulfillmentRecordResponse,
            crate::services::fulfillment::FulfillmentLineView,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document at `/api-docs/openapi.json`.
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Procurement API"));
        assert!(json.contains("/api/v1/requisitions"));
        assert!(json.contains("/api/v1/requisitions/{id}/fulfillments"));
    }
}
