pub mod fulfillment;
pub mod requisition;

pub use fulfillment::{ChannelAttributes, FulfillmentChannel};
pub use requisition::{
    derive_header_status, LineStatus, QuantityIntegrityError, RequisitionPriority,
    RequisitionStatus,
};
