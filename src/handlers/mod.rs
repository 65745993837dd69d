pub mod fulfillments;
pub mod requisitions;

use crate::auth::{ApprovalGate, PermissionChecker};
use crate::db::DbPool;
use crate::events::EventSender;
use crate::numbering::{NumberingService, SequenceNumbering};
use crate::services::{FulfillmentService, RequisitionService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Flattens field-level validation failures into `field: message` strings for
/// the response envelope.
pub(crate) fn flatten_validation_errors(
    validation_errors: &validator::ValidationErrors,
) -> Vec<String> {
    let mut errors: Vec<String> = validation_errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            let field = field.to_string();
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error.message.as_ref().unwrap_or(&"Invalid value".into())
                )
            })
        })
        .collect();
    // Nested failures (line items) do not show up as field errors.
    if errors.is_empty() {
        errors.push(validation_errors.to_string());
    }
    errors
}

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub requisitions: Arc<RequisitionService>,
    pub fulfillments: Arc<FulfillmentService>,
}

impl AppServices {
    /// Builds the service container shared by every handler. Both services
    /// draw numbers from the same database-backed sequence and pass through
    /// the same approval gate.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        permission_checker: Arc<dyn PermissionChecker>,
    ) -> Self {
        let numbering: Arc<dyn NumberingService> =
            Arc::new(SequenceNumbering::new(db_pool.clone()));
        let gate = Arc::new(ApprovalGate::new(permission_checker));

        let requisitions = Arc::new(RequisitionService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
            gate.clone(),
            numbering.clone(),
        ));
        let fulfillments = Arc::new(FulfillmentService::new(
            db_pool,
            Some(event_sender),
            gate,
            numbering,
        ));

        Self {
            requisitions,
            fulfillments,
        }
    }
}
