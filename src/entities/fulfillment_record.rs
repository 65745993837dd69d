use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ChannelAttributes, FulfillmentChannel};

/// One fulfillment action against a requisition. Rows are append-only;
/// corrections are new compensating records, never edits.
///
/// The channel attributes live in nullable columns, exactly one set per
/// channel. `channel_attributes()` rebuilds the tagged value and treats any
/// other column combination as corrupt.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fulfillment_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub requisition_id: Uuid,
    pub requisition_number: String,
    pub channel: FulfillmentChannel,
    #[sea_orm(unique)]
    pub reference_number: String,
    pub action_date: DateTime<Utc>,
    pub acting_user_id: Uuid,
    pub acting_user_name: String,
    pub supplier_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub source_location: Option<String>,
    pub target_location: Option<String>,
    pub total_quantity: Decimal,
    pub total_value: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::requisition::Entity",
        from = "Column::RequisitionId",
        to = "super::requisition::Column::Id"
    )]
    Requisition,
    #[sea_orm(has_many = "super::fulfillment_line::Entity")]
    FulfillmentLines,
}

impl Related<super::requisition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requisition.def()
    }
}

impl Related<super::fulfillment_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FulfillmentLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rebuilds the tagged channel attributes from the flattened columns.
    /// Returns `None` when the columns do not match the stored channel.
    pub fn channel_attributes(&self) -> Option<ChannelAttributes> {
        match self.channel {
            FulfillmentChannel::ConvertToPurchaseOrder => {
                if self.warehouse_id.is_some()
                    || self.source_location.is_some()
                    || self.target_location.is_some()
                {
                    return None;
                }
                self.supplier_id
                    .map(|supplier_id| ChannelAttributes::ConvertToPurchaseOrder { supplier_id })
            }
            FulfillmentChannel::StockIssue => {
                if self.supplier_id.is_some()
                    || self.source_location.is_some()
                    || self.target_location.is_some()
                {
                    return None;
                }
                self.warehouse_id
                    .map(|warehouse_id| ChannelAttributes::StockIssue { warehouse_id })
            }
            FulfillmentChannel::MaterialTransfer => {
                if self.supplier_id.is_some() || self.warehouse_id.is_some() {
                    return None;
                }
                match (&self.source_location, &self.target_location) {
                    (Some(source), Some(target)) => Some(ChannelAttributes::MaterialTransfer {
                        source_location: source.clone(),
                        target_location: target.clone(),
                    }),
                    _ => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn record(channel: FulfillmentChannel) -> Model {
        Model {
            id: Uuid::new_v4(),
            requisition_id: Uuid::new_v4(),
            requisition_number: "PR-000001".into(),
            channel,
            reference_number: "SI-000001".into(),
            action_date: Utc::now(),
            acting_user_id: Uuid::new_v4(),
            acting_user_name: "storekeeper".into(),
            supplier_id: None,
            warehouse_id: None,
            source_location: None,
            target_location: None,
            total_quantity: dec!(4),
            total_value: None,
            remarks: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn attributes_round_out_of_their_columns() {
        let warehouse = Uuid::new_v4();
        let mut row = record(FulfillmentChannel::StockIssue);
        row.warehouse_id = Some(warehouse);
        assert_eq!(
            row.channel_attributes(),
            Some(ChannelAttributes::StockIssue {
                warehouse_id: warehouse
            })
        );
    }

    #[test]
    fn foreign_columns_make_the_row_corrupt() {
        let mut row = record(FulfillmentChannel::StockIssue);
        row.warehouse_id = Some(Uuid::new_v4());
        row.supplier_id = Some(Uuid::new_v4());
        assert_eq!(row.channel_attributes(), None);

        let mut missing = record(FulfillmentChannel::MaterialTransfer);
        missing.source_location = Some("MAIN".into());
        assert_eq!(missing.channel_attributes(), None);
    }
}
