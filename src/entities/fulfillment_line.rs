use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-line share of a fulfillment record. Item columns are denormalized from
/// the requisition line at dispatch time so the record stays readable even if
/// the catalog changes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fulfillment_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub fulfillment_record_id: Uuid,
    pub requisition_line_id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_rate: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fulfillment_record::Entity",
        from = "Column::FulfillmentRecordId",
        to = "super::fulfillment_record::Column::Id"
    )]
    FulfillmentRecord,
    #[sea_orm(
        belongs_to = "super::requisition_line::Entity",
        from = "Column::RequisitionLineId",
        to = "super::requisition_line::Column::Id"
    )]
    RequisitionLine,
}

impl Related<super::fulfillment_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FulfillmentRecord.def()
    }
}

impl Related<super::requisition_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequisitionLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
