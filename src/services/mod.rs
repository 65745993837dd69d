// Workflow services
pub mod fulfillment;
pub mod requisitions;

pub use fulfillment::FulfillmentService;
pub use requisitions::RequisitionService;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Shared `validator` hook for Decimal quantity fields.
pub(crate) fn validate_positive_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("quantity");
        err.message = Some("Quantity must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}
