use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::LineStatus;

/// Requisition line row. The catalog item columns are opaque to the workflow;
/// `status` is always rederived from the quantity pair, never written on its
/// own.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requisition_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub requisition_id: Uuid,
    pub line_number: i32,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub item_description: Option<String>,
    pub unit_of_measure: String,
    pub quantity_requested: Decimal,
    pub quantity_fulfilled: Decimal,
    pub status: LineStatus,
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
