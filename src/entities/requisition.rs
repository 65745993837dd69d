use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RequisitionPriority, RequisitionStatus};

/// Requisition header row.
///
/// `version` starts at 1 and every successful mutation increments it; all
/// writes are conditioned on the version they read.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requisitions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub requisition_number: String,
    pub status: RequisitionStatus,
    pub priority: RequisitionPriority,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub department: String,
    pub delivery_location: String,
    #[sea_orm(column_type = "Text")]
    pub purpose: String,
    pub required_date: NaiveDate,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub is_deleted: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::requisition_line::Entity")]
    RequisitionLines,
    #[sea_orm(has_many = "super::fulfillment_record::Entity")]
    FulfillmentRecords,
}

impl Related<super::requisition_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequisitionLines.def()
    }
}

impl Related<super::fulfillment_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FulfillmentRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
