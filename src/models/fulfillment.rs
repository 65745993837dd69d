use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationError;

/// The three ways a requisition line can be satisfied.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum FulfillmentChannel {
    #[sea_orm(string_value = "ConvertToPurchaseOrder")]
    ConvertToPurchaseOrder,
    #[sea_orm(string_value = "StockIssue")]
    StockIssue,
    #[sea_orm(string_value = "MaterialTransfer")]
    MaterialTransfer,
}

impl FulfillmentChannel {
    /// Prefix of the reference number minted for documents on this channel.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            FulfillmentChannel::ConvertToPurchaseOrder => "PO",
            FulfillmentChannel::StockIssue => "SI",
            FulfillmentChannel::MaterialTransfer => "MT",
        }
    }
}

/// Channel selection together with the attributes that channel requires.
///
/// Carrying the attributes inside the variant means a request can never mix
/// a channel with another channel's attributes; deserialization already
/// rejects that shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "channel")]
pub enum ChannelAttributes {
    ConvertToPurchaseOrder {
        supplier_id: Uuid,
    },
    StockIssue {
        warehouse_id: Uuid,
    },
    MaterialTransfer {
        source_location: String,
        target_location: String,
    },
}

impl ChannelAttributes {
    pub fn channel(&self) -> FulfillmentChannel {
        match self {
            ChannelAttributes::ConvertToPurchaseOrder { .. } => {
                FulfillmentChannel::ConvertToPurchaseOrder
            }
            ChannelAttributes::StockIssue { .. } => FulfillmentChannel::StockIssue,
            ChannelAttributes::MaterialTransfer { .. } => FulfillmentChannel::MaterialTransfer,
        }
    }

    /// Checks the attribute values themselves; the shape is already enforced
    /// by the enum.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ChannelAttributes::ConvertToPurchaseOrder { supplier_id } => {
                if supplier_id.is_nil() {
                    return Err(ValidationError::new("supplier_id must not be nil"));
                }
            }
            ChannelAttributes::StockIssue { warehouse_id } => {
                if warehouse_id.is_nil() {
                    return Err(ValidationError::new("warehouse_id must not be nil"));
                }
            }
            ChannelAttributes::MaterialTransfer {
                source_location,
                target_location,
            } => {
                if source_location.trim().is_empty() || target_location.trim().is_empty() {
                    return Err(ValidationError::new(
                        "transfer locations must be non-empty",
                    ));
                }
                if source_location == target_location {
                    return Err(ValidationError::new(
                        "transfer source and target must differ",
                    ));
                }
            }
        }
        Ok(())
    }
}
