use crate::{
    auth::{ActingUser, ApprovalGate},
    db::DbPool,
    entities::requisition::{self, Entity as RequisitionEntity},
    entities::requisition_line::{self, Entity as RequisitionLineEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{LineStatus, RequisitionPriority, RequisitionStatus},
    numbering::NumberingService,
};
use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validate_positive_quantity;

/// Prefix of requisition document numbers (`PR-000123`).
pub const REQUISITION_PREFIX: &str = "PR";

lazy_static! {
    static ref REQUISITION_CREATIONS: IntCounter = register_int_counter!(
        "requisition_creations_total",
        "Total number of requisitions created"
    )
    .expect("metric can be created");
    static ref REQUISITION_CREATION_FAILURES: IntCounter = register_int_counter!(
        "requisition_creation_failures_total",
        "Total number of failed requisition creations"
    )
    .expect("metric can be created");
    static ref REQUISITION_SUBMISSIONS: IntCounter = register_int_counter!(
        "requisition_submissions_total",
        "Total number of requisitions submitted for approval"
    )
    .expect("metric can be created");
    static ref REQUISITION_APPROVALS: IntCounter = register_int_counter!(
        "requisition_approvals_total",
        "Total number of requisitions approved"
    )
    .expect("metric can be created");
    static ref REQUISITION_REJECTIONS: IntCounter = register_int_counter!(
        "requisition_rejections_total",
        "Total number of requisitions rejected"
    )
    .expect("metric can be created");
}

fn default_priority() -> RequisitionPriority {
    RequisitionPriority::Normal
}

/// Request/Response types for the requisition service
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RequisitionLineInput {
    pub item_id: Uuid,
    #[validate(length(min = 1, message = "Item code is required"))]
    pub item_code: String,
    #[validate(length(min = 1, message = "Item name is required"))]
    pub item_name: String,
    pub item_description: Option<String>,
    #[validate(length(min = 1, message = "Unit of measure is required"))]
    pub unit_of_measure: String,
    #[validate(custom = "validate_positive_quantity")]
    pub quantity_requested: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRequisitionRequest {
    pub requester_id: Uuid,
    #[validate(length(min = 1, message = "Requester name is required"))]
    pub requester_name: String,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    #[validate(length(min = 1, message = "Delivery location is required"))]
    pub delivery_location: String,
    /// May stay empty while the document is a draft; submission requires it.
    #[serde(default)]
    pub purpose: String,
    pub required_date: NaiveDate,
    #[serde(default = "default_priority")]
    pub priority: RequisitionPriority,
    /// A draft may be saved without lines; submission requires at least one.
    #[validate]
    #[serde(default)]
    pub lines: Vec<RequisitionLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRequisitionRequest {
    #[validate]
    pub acting_user: ActingUser,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    #[validate(length(min = 1, message = "Delivery location is required"))]
    pub delivery_location: String,
    #[serde(default)]
    pub purpose: String,
    pub required_date: NaiveDate,
    #[serde(default = "default_priority")]
    pub priority: RequisitionPriority,
    /// Lines replace the draft's current set wholesale.
    #[validate]
    #[serde(default)]
    pub lines: Vec<RequisitionLineInput>,
    /// Version the client read; a stale version is rejected as a conflict.
    pub version: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequisitionLineSnapshot {
    pub id: Uuid,
    pub line_number: i32,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub item_description: Option<String>,
    pub unit_of_measure: String,
    pub quantity_requested: Decimal,
    pub quantity_fulfilled: Decimal,
    pub quantity_pending: Decimal,
    pub status: LineStatus,
}

/// Read model of one requisition: header, lines, derived statuses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequisitionSnapshot {
    pub id: Uuid,
    pub requisition_number: String,
    pub status: RequisitionStatus,
    pub priority: RequisitionPriority,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub department: String,
    pub delivery_location: String,
    pub purpose: String,
    pub required_date: NaiveDate,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<RequisitionLineSnapshot>,
}

/// Header-only projection used by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequisitionSummary {
    pub id: Uuid,
    pub requisition_number: String,
    pub status: RequisitionStatus,
    pub priority: RequisitionPriority,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub department: String,
    pub delivery_location: String,
    pub required_date: NaiveDate,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequisitionListResponse {
    pub requisitions: Vec<RequisitionSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service owning the requisition lifecycle: creation, draft edits, the
/// approval workflow, and logical deletion.
///
/// Every write is conditioned on the version it read; a write that affects
/// zero rows means another actor got there first and surfaces as
/// `ConcurrentModification`.
#[derive(Clone)]
pub struct RequisitionService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    gate: Arc<ApprovalGate>,
    numbering: Arc<dyn NumberingService>,
}

impl RequisitionService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        gate: Arc<ApprovalGate>,
        numbering: Arc<dyn NumberingService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            gate,
            numbering,
        }
    }

    /// Creates a requisition in Draft with its document number already assigned.
    #[instrument(skip(self, request), fields(requester_id = %request.requester_id, department = %request.department))]
    pub async fn create_requisition(
        &self,
        request: CreateRequisitionRequest,
    ) -> Result<RequisitionSnapshot, ServiceError> {
        request.validate().map_err(|e| {
            REQUISITION_CREATION_FAILURES.inc();
            ServiceError::ValidationError(e.to_string())
        })?;

        let requisition_number = self
            .numbering
            .next_number(REQUISITION_PREFIX)
            .await
            .map_err(|e| {
                REQUISITION_CREATION_FAILURES.inc();
                error!(error = %e, "Failed to allocate a requisition number");
                e
            })?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let requisition_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for requisition creation");
            ServiceError::DatabaseError(e)
        })?;

        let header = requisition::ActiveModel {
            id: Set(requisition_id),
            requisition_number: Set(requisition_number.clone()),
            status: Set(RequisitionStatus::Draft),
            priority: Set(request.priority),
            requester_id: Set(request.requester_id),
            requester_name: Set(request.requester_name.clone()),
            department: Set(request.department.clone()),
            delivery_location: Set(request.delivery_location.clone()),
            purpose: Set(request.purpose.clone()),
            required_date: Set(request.required_date),
            submitted_at: Set(None),
            submitted_by: Set(None),
            approved_at: Set(None),
            approved_by: Set(None),
            rejected_at: Set(None),
            rejected_by: Set(None),
            rejection_reason: Set(None),
            is_deleted: Set(false),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let header = header.insert(&txn).await.map_err(|e| {
            error!(error = %e, requisition_id = %requisition_id, "Failed to insert requisition");
            ServiceError::DatabaseError(e)
        })?;

        let lines = self
            .insert_lines(&txn, requisition_id, &request.lines)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, requisition_id = %requisition_id, "Failed to commit requisition creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            requisition_id = %requisition_id,
            requisition_number = %requisition_number,
            line_count = lines.len(),
            "Requisition created"
        );
        REQUISITION_CREATIONS.inc();

        self.send_event(Event::RequisitionCreated {
            requisition_id,
            requisition_number,
            acted_by: request.requester_id,
        })
        .await;

        Ok(self.snapshot(header, lines))
    }

    /// Retrieves one requisition with its lines. Deleted documents read as absent.
    #[instrument(skip(self), fields(requisition_id = %requisition_id))]
    pub async fn get_requisition(
        &self,
        requisition_id: Uuid,
    ) -> Result<Option<RequisitionSnapshot>, ServiceError> {
        let header = RequisitionEntity::find_by_id(requisition_id)
            .filter(requisition::Column::IsDeleted.eq(false))
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to fetch requisition");
                ServiceError::DatabaseError(e)
            })?;

        match header {
            Some(header) => {
                let lines = self.load_lines(requisition_id).await?;
                Ok(Some(self.snapshot(header, lines)))
            }
            None => Ok(None),
        }
    }

    /// Looks a requisition up by its document number.
    #[instrument(skip(self))]
    pub async fn get_requisition_by_number(
        &self,
        requisition_number: &str,
    ) -> Result<Option<RequisitionSnapshot>, ServiceError> {
        let header = RequisitionEntity::find()
            .filter(requisition::Column::RequisitionNumber.eq(requisition_number))
            .filter(requisition::Column::IsDeleted.eq(false))
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_number, "Failed to fetch requisition by number");
                ServiceError::DatabaseError(e)
            })?;

        match header {
            Some(header) => {
                let lines = self.load_lines(header.id).await?;
                Ok(Some(self.snapshot(header, lines)))
            }
            None => Ok(None),
        }
    }

    /// Lists requisitions newest first, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_requisitions(
        &self,
        page: u64,
        per_page: u64,
        status: Option<RequisitionStatus>,
    ) -> Result<RequisitionListResponse, ServiceError> {
        let db = &*self.db_pool;
        // page is 1-based on the wire
        let page = page.max(1);
        let per_page = per_page.max(1);

        let mut query = RequisitionEntity::find().filter(requisition::Column::IsDeleted.eq(false));
        if let Some(status) = status {
            query = query.filter(requisition::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(requisition::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count requisitions");
            ServiceError::DatabaseError(e)
        })?;

        let headers = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, per_page, "Failed to fetch requisitions page");
            ServiceError::DatabaseError(e)
        })?;

        let requisitions: Vec<RequisitionSummary> =
            headers.into_iter().map(|h| self.summary(h)).collect();

        info!(
            total,
            page,
            per_page,
            returned = requisitions.len(),
            "Requisitions listed"
        );

        Ok(RequisitionListResponse {
            requisitions,
            total,
            page,
            per_page,
        })
    }

    /// Replaces a draft's header fields and lines.
    ///
    /// Only drafts are editable; the write is conditioned on the version the
    /// client read.
    #[instrument(skip(self, request), fields(requisition_id = %requisition_id, acted_by = %request.acting_user.id))]
    pub async fn update_requisition(
        &self,
        requisition_id: Uuid,
        request: UpdateRequisitionRequest,
    ) -> Result<RequisitionSnapshot, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let header = self.load_header(requisition_id).await?;
        if !header.status.allows_structural_edits() {
            return Err(ServiceError::InvalidOperation(format!(
                "a {} requisition cannot be edited",
                header.status
            )));
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, requisition_id = %requisition_id, "Failed to start transaction for requisition update");
            ServiceError::DatabaseError(e)
        })?;

        let updated = RequisitionEntity::update_many()
            .col_expr(requisition::Column::Priority, Expr::value(request.priority))
            .col_expr(
                requisition::Column::Department,
                Expr::value(request.department.clone()),
            )
            .col_expr(
                requisition::Column::DeliveryLocation,
                Expr::value(request.delivery_location.clone()),
            )
            .col_expr(
                requisition::Column::Purpose,
                Expr::value(request.purpose.clone()),
            )
            .col_expr(
                requisition::Column::RequiredDate,
                Expr::value(request.required_date),
            )
            .col_expr(requisition::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                requisition::Column::Version,
                Expr::value(request.version + 1),
            )
            .filter(requisition::Column::Id.eq(requisition_id))
            .filter(requisition::Column::Version.eq(request.version))
            .filter(requisition::Column::IsDeleted.eq(false))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to update requisition header");
                ServiceError::DatabaseError(e)
            })?;

        if updated.rows_affected == 0 {
            let _ = txn.rollback().await;
            warn!(
                requisition_id = %requisition_id,
                expected_version = request.version,
                "Requisition changed underneath an edit"
            );
            return Err(ServiceError::ConcurrentModification(requisition_id));
        }

        RequisitionLineEntity::delete_many()
            .filter(requisition_line::Column::RequisitionId.eq(requisition_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to clear requisition lines");
                ServiceError::DatabaseError(e)
            })?;

        let lines = self
            .insert_lines(&txn, requisition_id, &request.lines)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, requisition_id = %requisition_id, "Failed to commit requisition update");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            requisition_id = %requisition_id,
            version = request.version + 1,
            "Requisition updated"
        );

        self.send_event(Event::RequisitionUpdated {
            requisition_id,
            acted_by: request.acting_user.id,
        })
        .await;

        let header = requisition::Model {
            priority: request.priority,
            department: request.department,
            delivery_location: request.delivery_location,
            purpose: request.purpose,
            required_date: request.required_date,
            updated_at: now,
            version: request.version + 1,
            ..header
        };
        Ok(self.snapshot(header, lines))
    }

    /// Moves a draft to Submitted.
    ///
    /// Requires at least one line with a positive quantity and a non-empty
    /// purpose; records the submission timestamp and actor.
    #[instrument(skip(self, acting_user), fields(requisition_id = %requisition_id, acted_by = %acting_user.id))]
    pub async fn submit_requisition(
        &self,
        requisition_id: Uuid,
        acting_user: ActingUser,
    ) -> Result<RequisitionSnapshot, ServiceError> {
        acting_user
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let header = self.load_header(requisition_id).await?;
        self.gate
            .ensure_transition(header.status, RequisitionStatus::Submitted, &acting_user)
            .await?;

        let lines = self.load_lines(requisition_id).await?;
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "A requisition needs at least one line before submission".to_string(),
            ));
        }
        if lines
            .iter()
            .any(|line| line.quantity_requested <= Decimal::ZERO)
        {
            return Err(ServiceError::ValidationError(
                "Every line must request a quantity greater than zero".to_string(),
            ));
        }
        if header.purpose.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Purpose is required before submission".to_string(),
            ));
        }

        let now = Utc::now();
        let updated = RequisitionEntity::update_many()
            .col_expr(
                requisition::Column::Status,
                Expr::value(RequisitionStatus::Submitted),
            )
            .col_expr(requisition::Column::SubmittedAt, Expr::value(Some(now)))
            .col_expr(
                requisition::Column::SubmittedBy,
                Expr::value(Some(acting_user.id)),
            )
            .col_expr(requisition::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                requisition::Column::Version,
                Expr::value(header.version + 1),
            )
            .filter(requisition::Column::Id.eq(requisition_id))
            .filter(requisition::Column::Version.eq(header.version))
            .filter(requisition::Column::IsDeleted.eq(false))
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to submit requisition");
                ServiceError::DatabaseError(e)
            })?;

        if updated.rows_affected == 0 {
            warn!(requisition_id = %requisition_id, "Requisition changed underneath a submission");
            return Err(ServiceError::ConcurrentModification(requisition_id));
        }

        info!(requisition_id = %requisition_id, "Requisition submitted");
        REQUISITION_SUBMISSIONS.inc();

        self.send_event(Event::RequisitionSubmitted {
            requisition_id,
            acted_by: acting_user.id,
        })
        .await;
        self.send_event(Event::RequisitionStatusChanged {
            requisition_id,
            old_status: header.status,
            new_status: RequisitionStatus::Submitted,
        })
        .await;

        let header = requisition::Model {
            status: RequisitionStatus::Submitted,
            submitted_at: Some(now),
            submitted_by: Some(acting_user.id),
            updated_at: now,
            version: header.version + 1,
            ..header
        };
        Ok(self.snapshot(header, lines))
    }

    /// Approves a submitted requisition, releasing it to fulfillment.
    #[instrument(skip(self, acting_user), fields(requisition_id = %requisition_id, acted_by = %acting_user.id))]
    pub async fn approve_requisition(
        &self,
        requisition_id: Uuid,
        acting_user: ActingUser,
    ) -> Result<RequisitionSnapshot, ServiceError> {
        acting_user
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let header = self.load_header(requisition_id).await?;
        self.gate
            .ensure_transition(header.status, RequisitionStatus::Approved, &acting_user)
            .await?;

        let lines = self.load_lines(requisition_id).await?;

        let now = Utc::now();
        let updated = RequisitionEntity::update_many()
            .col_expr(
                requisition::Column::Status,
                Expr::value(RequisitionStatus::Approved),
            )
            .col_expr(requisition::Column::ApprovedAt, Expr::value(Some(now)))
            .col_expr(
                requisition::Column::ApprovedBy,
                Expr::value(Some(acting_user.id)),
            )
            .col_expr(requisition::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                requisition::Column::Version,
                Expr::value(header.version + 1),
            )
            .filter(requisition::Column::Id.eq(requisition_id))
            .filter(requisition::Column::Version.eq(header.version))
            .filter(requisition::Column::IsDeleted.eq(false))
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to approve requisition");
                ServiceError::DatabaseError(e)
            })?;

        if updated.rows_affected == 0 {
            warn!(requisition_id = %requisition_id, "Requisition changed underneath an approval");
            return Err(ServiceError::ConcurrentModification(requisition_id));
        }

        info!(requisition_id = %requisition_id, "Requisition approved");
        REQUISITION_APPROVALS.inc();

        self.send_event(Event::RequisitionApproved {
            requisition_id,
            acted_by: acting_user.id,
        })
        .await;
        self.send_event(Event::RequisitionStatusChanged {
            requisition_id,
            old_status: header.status,
            new_status: RequisitionStatus::Approved,
        })
        .await;

        let header = requisition::Model {
            status: RequisitionStatus::Approved,
            approved_at: Some(now),
            approved_by: Some(acting_user.id),
            updated_at: now,
            version: header.version + 1,
            ..header
        };
        Ok(self.snapshot(header, lines))
    }

    /// Rejects a submitted requisition with a mandatory reason.
    #[instrument(skip(self, acting_user, reason), fields(requisition_id = %requisition_id, acted_by = %acting_user.id))]
    pub async fn reject_requisition(
        &self,
        requisition_id: Uuid,
        acting_user: ActingUser,
        reason: String,
    ) -> Result<RequisitionSnapshot, ServiceError> {
        acting_user
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A rejection requires a reason".to_string(),
            ));
        }

        let header = self.load_header(requisition_id).await?;
        self.gate
            .ensure_transition(header.status, RequisitionStatus::Rejected, &acting_user)
            .await?;

        let lines = self.load_lines(requisition_id).await?;

        let now = Utc::now();
        let updated = RequisitionEntity::update_many()
            .col_expr(
                requisition::Column::Status,
                Expr::value(RequisitionStatus::Rejected),
            )
            .col_expr(requisition::Column::RejectedAt, Expr::value(Some(now)))
            .col_expr(
                requisition::Column::RejectedBy,
                Expr::value(Some(acting_user.id)),
            )
            .col_expr(
                requisition::Column::RejectionReason,
                Expr::value(Some(reason.clone())),
            )
            .col_expr(requisition::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                requisition::Column::Version,
                Expr::value(header.version + 1),
            )
            .filter(requisition::Column::Id.eq(requisition_id))
            .filter(requisition::Column::Version.eq(header.version))
            .filter(requisition::Column::IsDeleted.eq(false))
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to reject requisition");
                ServiceError::DatabaseError(e)
            })?;

        if updated.rows_affected == 0 {
            warn!(requisition_id = %requisition_id, "Requisition changed underneath a rejection");
            return Err(ServiceError::ConcurrentModification(requisition_id));
        }

        info!(requisition_id = %requisition_id, "Requisition rejected");
        REQUISITION_REJECTIONS.inc();

        self.send_event(Event::RequisitionRejected {
            requisition_id,
            acted_by: acting_user.id,
            reason: reason.clone(),
        })
        .await;
        self.send_event(Event::RequisitionStatusChanged {
            requisition_id,
            old_status: header.status,
            new_status: RequisitionStatus::Rejected,
        })
        .await;

        let header = requisition::Model {
            status: RequisitionStatus::Rejected,
            rejected_at: Some(now),
            rejected_by: Some(acting_user.id),
            rejection_reason: Some(reason),
            updated_at: now,
            version: header.version + 1,
            ..header
        };
        Ok(self.snapshot(header, lines))
    }

    /// Logically deletes a draft or rejected requisition.
    #[instrument(skip(self, acting_user), fields(requisition_id = %requisition_id, acted_by = %acting_user.id))]
    pub async fn delete_requisition(
        &self,
        requisition_id: Uuid,
        acting_user: ActingUser,
    ) -> Result<(), ServiceError> {
        acting_user
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let header = self.load_header(requisition_id).await?;
        if !header.status.allows_delete() {
            return Err(ServiceError::InvalidOperation(format!(
                "a {} requisition cannot be deleted",
                header.status
            )));
        }

        let now = Utc::now();
        let updated = RequisitionEntity::update_many()
            .col_expr(requisition::Column::IsDeleted, Expr::value(true))
            .col_expr(requisition::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                requisition::Column::Version,
                Expr::value(header.version + 1),
            )
            .filter(requisition::Column::Id.eq(requisition_id))
            .filter(requisition::Column::Version.eq(header.version))
            .filter(requisition::Column::IsDeleted.eq(false))
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to delete requisition");
                ServiceError::DatabaseError(e)
            })?;

        if updated.rows_affected == 0 {
            warn!(requisition_id = %requisition_id, "Requisition changed underneath a deletion");
            return Err(ServiceError::ConcurrentModification(requisition_id));
        }

        info!(requisition_id = %requisition_id, "Requisition deleted");

        self.send_event(Event::RequisitionDeleted {
            requisition_id,
            acted_by: acting_user.id,
        })
        .await;

        Ok(())
    }

    async fn load_header(
        &self,
        requisition_id: Uuid,
    ) -> Result<requisition::Model, ServiceError> {
        let header = RequisitionEntity::find_by_id(requisition_id)
            .filter(requisition::Column::IsDeleted.eq(false))
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to fetch requisition");
                ServiceError::DatabaseError(e)
            })?;

        header.ok_or_else(|| {
            warn!(requisition_id = %requisition_id, "Requisition not found");
            ServiceError::NotFound(format!("Requisition {} not found", requisition_id))
        })
    }

    async fn load_lines(
        &self,
        requisition_id: Uuid,
    ) -> Result<Vec<requisition_line::Model>, ServiceError> {
        RequisitionLineEntity::find()
            .filter(requisition_line::Column::RequisitionId.eq(requisition_id))
            .order_by_asc(requisition_line::Column::LineNumber)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to fetch requisition lines");
                ServiceError::DatabaseError(e)
            })
    }

    async fn insert_lines(
        &self,
        txn: &DatabaseTransaction,
        requisition_id: Uuid,
        inputs: &[RequisitionLineInput],
    ) -> Result<Vec<requisition_line::Model>, ServiceError> {
        let mut lines = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            let status = LineStatus::derive(input.quantity_requested, Decimal::ZERO)?;
            let line = requisition_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                requisition_id: Set(requisition_id),
                line_number: Set(index as i32 + 1),
                item_id: Set(input.item_id),
                item_code: Set(input.item_code.clone()),
                item_name: Set(input.item_name.clone()),
                item_description: Set(input.item_description.clone()),
                unit_of_measure: Set(input.unit_of_measure.clone()),
                quantity_requested: Set(input.quantity_requested),
                quantity_fulfilled: Set(Decimal::ZERO),
                status: Set(status),
            };
            let line = line.insert(txn).await.map_err(|e| {
                error!(
                    error = %e,
                    requisition_id = %requisition_id,
                    line_number = index + 1,
                    "Failed to insert requisition line"
                );
                ServiceError::DatabaseError(e)
            })?;
            lines.push(line);
        }
        Ok(lines)
    }

    async fn send_event(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send requisition event");
            }
        }
    }

    fn snapshot(
        &self,
        header: requisition::Model,
        lines: Vec<requisition_line::Model>,
    ) -> RequisitionSnapshot {
        RequisitionSnapshot {
            id: header.id,
            requisition_number: header.requisition_number,
            status: header.status,
            priority: header.priority,
            requester_id: header.requester_id,
            requester_name: header.requester_name,
            department: header.department,
            delivery_location: header.delivery_location,
            purpose: header.purpose,
            required_date: header.required_date,
            submitted_at: header.submitted_at,
            submitted_by: header.submitted_by,
            approved_at: header.approved_at,
            approved_by: header.approved_by,
            rejected_at: header.rejected_at,
            rejected_by: header.rejected_by,
            rejection_reason: header.rejection_reason,
            version: header.version,
            created_at: header.created_at,
            updated_at: header.updated_at,
            lines: lines.into_iter().map(Self::line_snapshot).collect(),
        }
    }

    fn summary(&self, header: requisition::Model) -> RequisitionSummary {
        RequisitionSummary {
            id: header.id,
            requisition_number: header.requisition_number,
            status: header.status,
            priority: header.priority,
            requester_id: header.requester_id,
            requester_name: header.requester_name,
            department: header.department,
            delivery_location: header.delivery_location,
            required_date: header.required_date,
            version: header.version,
            created_at: header.created_at,
            updated_at: header.updated_at,
        }
    }

    fn line_snapshot(model: requisition_line::Model) -> RequisitionLineSnapshot {
        RequisitionLineSnapshot {
            id: model.id,
            line_number: model.line_number,
            item_id: model.item_id,
            item_code: model.item_code,
            item_name: model.item_name,
            item_description: model.item_description,
            unit_of_measure: model.unit_of_measure,
            quantity_pending: model.quantity_requested - model.quantity_fulfilled,
            quantity_requested: model.quantity_requested,
            quantity_fulfilled: model.quantity_fulfilled,
            status: model.status,
        }
    }
}
