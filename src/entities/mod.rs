pub mod document_sequence;
pub mod fulfillment_line;
pub mod fulfillment_record;
pub mod requisition;
pub mod requisition_line;
