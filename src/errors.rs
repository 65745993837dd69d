use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{QuantityIntegrityError, RequisitionStatus};

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    #[schema(example = "Conflict")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Invalid transition from Draft to Approved")]
    pub message: String,
    /// Additional error details when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: RequisitionStatus,
        to: RequisitionStatus,
    },

    /// State-guard failures other than an explicit transition, e.g. editing a
    /// submitted document or dispatching against a draft.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error(
        "Over-fulfillment on line {line_id}: dispatch of {requested} exceeds pending {pending}"
    )]
    OverFulfillment {
        line_id: Uuid,
        requested: Decimal,
        pending: Decimal,
    },

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(Uuid),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Persisted state violates a ledger invariant. Never caused by client
    /// input; surfaced as an opaque 500.
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Numbering error: {0}")]
    NumberingError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<validator::ValidationError> for ServiceError {
    fn from(err: validator::ValidationError) -> Self {
        ServiceError::ValidationError(err.code.to_string())
    }
}

impl From<QuantityIntegrityError> for ServiceError {
    fn from(err: QuantityIntegrityError) -> Self {
        ServiceError::IntegrityViolation(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidTransition { .. }
            | Self::InvalidOperation(_)
            | Self::ConcurrentModification(_) => StatusCode::CONFLICT,
            Self::OverFulfillment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_)
            | Self::IntegrityViolation(_)
            | Self::NumberingError(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::IntegrityViolation(_) => "Data integrity error".to_string(),
            Self::NumberingError(_) | Self::EventError(_) | Self::InternalError(_)
            | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.response_message();

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            details: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rust_decimal_macros::dec;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidTransition {
                from: RequisitionStatus::Draft,
                to: RequisitionStatus::Approved,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::ConcurrentModification(Uuid::new_v4()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::OverFulfillment {
                line_id: Uuid::new_v4(),
                requested: dec!(6),
                pending: dec!(2),
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::IntegrityViolation("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transition_errors_name_both_states() {
        let err = ServiceError::InvalidTransition {
            from: RequisitionStatus::Draft,
            to: RequisitionStatus::FullyFulfilled,
        };
        let msg = err.response_message();
        assert!(msg.contains("Draft"));
        assert!(msg.contains("FullyFulfilled"));
    }

    #[test]
    fn over_fulfillment_names_line_and_quantities() {
        let line_id = Uuid::new_v4();
        let msg = ServiceError::OverFulfillment {
            line_id,
            requested: dec!(6),
            pending: dec!(2),
        }
        .response_message();
        assert!(msg.contains(&line_id.to_string()));
        assert!(msg.contains('6'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn internal_details_are_not_exposed() {
        assert_eq!(
            ServiceError::IntegrityViolation("fulfilled 12 exceeds requested 10".into())
                .response_message(),
            "Data integrity error"
        );
        assert_eq!(
            ServiceError::NumberingError("sequence row missing".into()).response_message(),
            "Internal server error"
        );
    }

    #[tokio::test]
    async fn error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
    }
}
