use crate::{
    auth::{ActingUser, ApprovalGate},
    db::DbPool,
    entities::fulfillment_line::{self, Entity as FulfillmentLineEntity},
    entities::fulfillment_record::{self, Entity as FulfillmentRecordEntity},
    entities::requisition::{self, Entity as RequisitionEntity},
    entities::requisition_line::{self, Entity as RequisitionLineEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{derive_header_status, ChannelAttributes, FulfillmentChannel, LineStatus},
    numbering::NumberingService,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Attempts a dispatch makes before giving up on the version race.
const DISPATCH_RETRY_ATTEMPTS: usize = 3;

lazy_static! {
    static ref FULFILLMENT_DISPATCHES: IntCounter = register_int_counter!(
        "fulfillment_dispatches_total",
        "Total number of fulfillment dispatches committed"
    )
    .expect("metric can be created");
    static ref FULFILLMENT_DISPATCH_FAILURES: IntCounter = register_int_counter!(
        "fulfillment_dispatch_failures_total",
        "Total number of fulfillment dispatches rejected before the write"
    )
    .expect("metric can be created");
    static ref FULFILLMENT_DISPATCH_CONFLICTS: IntCounter = register_int_counter!(
        "fulfillment_dispatch_conflicts_total",
        "Total number of fulfillment dispatches abandoned after version races"
    )
    .expect("metric can be created");
}

/// One requisition line selected for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchLineInput {
    pub requisition_line_id: Uuid,
    pub quantity: Decimal,
    /// Required when converting to a purchase order, not accepted on the
    /// stock channels.
    pub unit_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DispatchFulfillmentRequest {
    #[validate]
    pub acting_user: ActingUser,
    pub attributes: ChannelAttributes,
    #[validate(length(min = 1, message = "Select at least one line to fulfill"))]
    pub lines: Vec<DispatchLineInput>,
    pub remarks: Option<String>,
    /// Defaults to the dispatch time when omitted.
    pub action_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FulfillmentLineView {
    pub id: Uuid,
    pub requisition_line_id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_rate: Option<Decimal>,
}

/// Read model of one fulfillment record with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FulfillmentRecordResponse {
    pub id: Uuid,
    pub requisition_id: Uuid,
    pub requisition_number: String,
    pub reference_number: String,
    pub attributes: ChannelAttributes,
    pub action_date: DateTime<Utc>,
    pub acting_user_id: Uuid,
    pub acting_user_name: String,
    pub total_quantity: Decimal,
    pub total_value: Option<Decimal>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<FulfillmentLineView>,
}

/// Service carrying out fulfillment against approved requisitions.
///
/// A dispatch claims the requisition header with a version-conditioned write
/// before touching any line; two dispatches racing on the same document can
/// therefore never both count the same pending quantity. The loser retries on
/// fresh reads a bounded number of times.
#[derive(Clone)]
pub struct FulfillmentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    gate: Arc<ApprovalGate>,
    numbering: Arc<dyn NumberingService>,
}

impl FulfillmentService {
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

    /// Dispatches fulfillment for the selected lines over one channel.
    ///
    /// Writes the fulfillment record and its lines, advances the per-line
    /// fulfilled quantities and recomputes the header status, all in one
    /// transaction keyed on the header version.
    #[instrument(
        skip(self, request),
        fields(
            requisition_id = %requisition_id,
            acted_by = %request.acting_user.id,
            channel = %request.attributes.channel()
        )
    )]
    pub async fn dispatch_fulfillment(
        &self,
        requisition_id: Uuid,
        request: DispatchFulfillmentRequest,
    ) -> Result<FulfillmentRecordResponse, ServiceError> {
        request.validate().map_err(|e| {
            FULFILLMENT_DISPATCH_FAILURES.inc();
            ServiceError::ValidationError(e.to_string())
        })?;
        request.attributes.validate().map_err(|e| {
            FULFILLMENT_DISPATCH_FAILURES.inc();
            ServiceError::from(e)
        })?;
        let channel = request.attributes.channel();
        Self::validate_selections(channel, &request.lines).map_err(|e| {
            FULFILLMENT_DISPATCH_FAILURES.inc();
            e
        })?;

        let acting_user = &request.acting_user;
        let db = &*self.db_pool;

        for attempt in 1..=DISPATCH_RETRY_ATTEMPTS {
            // Fresh reads on every attempt; stale quantities are never reused.
            let header = RequisitionEntity::find_by_id(requisition_id)
                .filter(requisition::Column::IsDeleted.eq(false))
                .one(db)
                .await
                .map_err(|e| {
                    error!(error = %e, requisition_id = %requisition_id, "Failed to fetch requisition for dispatch");
                    ServiceError::DatabaseError(e)
                })?
                .ok_or_else(|| {
                    warn!(requisition_id = %requisition_id, "Requisition not found for dispatch");
                    ServiceError::NotFound(format!("Requisition {} not found", requisition_id))
                })?;

            self.gate.ensure_dispatch(header.status, acting_user).await?;

            let stored_lines = RequisitionLineEntity::find()
                .filter(requisition_line::Column::RequisitionId.eq(requisition_id))
                .order_by_asc(requisition_line::Column::LineNumber)
                .all(db)
                .await
                .map_err(|e| {
                    error!(error = %e, requisition_id = %requisition_id, "Failed to fetch requisition lines for dispatch");
                    ServiceError::DatabaseError(e)
                })?;

            let by_id: HashMap<Uuid, &requisition_line::Model> =
                stored_lines.iter().map(|line| (line.id, line)).collect();

            let record_id = Uuid::new_v4();
            let mut dispatched: HashMap<Uuid, Decimal> =
                HashMap::with_capacity(request.lines.len());
            let mut planned_lines = Vec::with_capacity(request.lines.len());
            for selection in &request.lines {
                let line = by_id.get(&selection.requisition_line_id).ok_or_else(|| {
                    FULFILLMENT_DISPATCH_FAILURES.inc();
                    ServiceError::ValidationError(format!(
                        "Line {} does not belong to requisition {}",
                        selection.requisition_line_id, requisition_id
                    ))
                })?;
                let pending = line.quantity_requested - line.quantity_fulfilled;
                if selection.quantity > pending {
                    FULFILLMENT_DISPATCH_FAILURES.inc();
                    return Err(ServiceError::OverFulfillment {
                        line_id: line.id,
                        requested: selection.quantity,
                        pending,
                    });
                }
                dispatched.insert(line.id, selection.quantity);
                planned_lines.push(fulfillment_line::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    fulfillment_record_id: Set(record_id),
                    requisition_line_id: Set(line.id),
                    item_id: Set(line.item_id),
                    item_code: Set(line.item_code.clone()),
                    item_name: Set(line.item_name.clone()),
                    quantity: Set(selection.quantity),
                    unit_rate: Set(selection.unit_rate),
                });
            }

            // New statuses for every line. Untouched lines are recomputed from
            // their stored quantities too, so a corrupt row aborts the dispatch
            // instead of silently skewing the header status.
            let mut touched: Vec<(Uuid, Decimal, LineStatus)> =
                Vec::with_capacity(request.lines.len());
            let mut line_statuses = Vec::with_capacity(stored_lines.len());
            for line in &stored_lines {
                let add = dispatched.get(&line.id).copied().unwrap_or(Decimal::ZERO);
                let fulfilled = line.quantity_fulfilled + add;
                let status = LineStatus::derive(line.quantity_requested, fulfilled)?;
                if add > Decimal::ZERO {
                    touched.push((line.id, fulfilled, status));
                }
                line_statuses.push(status);
            }
            let new_header_status = derive_header_status(header.status, &line_statuses);

            // Allocated outside the write transaction; a lost race below
            // wastes this number. Gaps are fine, reuse is not.
            let reference_number = self
                .numbering
                .next_number(channel.reference_prefix())
                .await?;

            let total_quantity: Decimal = request.lines.iter().map(|l| l.quantity).sum();
            let total_value: Option<Decimal> = match channel {
                FulfillmentChannel::ConvertToPurchaseOrder => Some(
                    request
                        .lines
                        .iter()
                        .map(|l| l.quantity * l.unit_rate.unwrap_or(Decimal::ZERO))
                        .sum(),
                ),
                _ => None,
            };

            let now = Utc::now();
            let action_date = request.action_date.unwrap_or(now);

            let txn = db.begin().await.map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to start dispatch transaction");
                ServiceError::DatabaseError(e)
            })?;

            // The header write goes first and is conditioned on the version
            // read above; it serializes concurrent dispatches on the document.
            let claimed = RequisitionEntity::update_many()
                .col_expr(requisition::Column::Status, Expr::value(new_header_status))
                .col_expr(requisition::Column::UpdatedAt, Expr::value(now))
                .col_expr(
                    requisition::Column::Version,
                    Expr::value(header.version + 1),
                )
                .filter(requisition::Column::Id.eq(requisition_id))
                .filter(requisition::Column::Version.eq(header.version))
                .filter(requisition::Column::IsDeleted.eq(false))
                .exec(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, requisition_id = %requisition_id, "Failed to claim requisition header for dispatch");
                    ServiceError::DatabaseError(e)
                })?;

            if claimed.rows_affected == 0 {
                let _ = txn.rollback().await;
                warn!(
                    requisition_id = %requisition_id,
                    attempt,
                    "Dispatch lost the version race"
                );
                if attempt < DISPATCH_RETRY_ATTEMPTS {
                    let backoff = {
                        let mut rng = rand::thread_rng();
                        Duration::from_millis(rng.gen_range(10..50))
                    };
                    tokio::time::sleep(backoff).await;
                }
                continue;
            }

            for (line_id, fulfilled, status) in &touched {
                RequisitionLineEntity::update_many()
                    .col_expr(
                        requisition_line::Column::QuantityFulfilled,
                        Expr::value(*fulfilled),
                    )
                    .col_expr(requisition_line::Column::Status, Expr::value(*status))
                    .filter(requisition_line::Column::Id.eq(*line_id))
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        error!(error = %e, requisition_id = %requisition_id, line_id = %line_id, "Failed to write fulfilled quantity");
                        ServiceError::DatabaseError(e)
                    })?;
            }

            let (supplier_id, warehouse_id, source_location, target_location) =
                match &request.attributes {
                    ChannelAttributes::ConvertToPurchaseOrder { supplier_id } => {
                        (Some(*supplier_id), None, None, None)
                    }
                    ChannelAttributes::StockIssue { warehouse_id } => {
                        (None, Some(*warehouse_id), None, None)
                    }
                    ChannelAttributes::MaterialTransfer {
                        source_location,
                        target_location,
                    } => (
                        None,
                        None,
                        Some(source_location.clone()),
                        Some(target_location.clone()),
                    ),
                };

            let record = fulfillment_record::ActiveModel {
                id: Set(record_id),
                requisition_id: Set(requisition_id),
                requisition_number: Set(header.requisition_number.clone()),
                channel: Set(channel),
                reference_number: Set(reference_number.clone()),
                action_date: Set(action_date),
                acting_user_id: Set(acting_user.id),
                acting_user_name: Set(acting_user.name.clone()),
                supplier_id: Set(supplier_id),
                warehouse_id: Set(warehouse_id),
                source_location: Set(source_location),
                target_location: Set(target_location),
                total_quantity: Set(total_quantity),
                total_value: Set(total_value),
                remarks: Set(request.remarks.clone()),
                created_at: Set(now),
            };
            let record = record.insert(&txn).await.map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to insert fulfillment record");
                ServiceError::DatabaseError(e)
            })?;

            let mut record_lines = Vec::with_capacity(planned_lines.len());
            for planned in planned_lines {
                let line = planned.insert(&txn).await.map_err(|e| {
                    error!(error = %e, requisition_id = %requisition_id, "Failed to insert fulfillment line");
                    ServiceError::DatabaseError(e)
                })?;
                record_lines.push(line);
            }

            txn.commit().await.map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to commit dispatch");
                ServiceError::DatabaseError(e)
            })?;

            info!(
                requisition_id = %requisition_id,
                fulfillment_id = %record.id,
                reference_number = %reference_number,
                total_quantity = %total_quantity,
                new_status = %new_header_status,
                "Fulfillment dispatched"
            );
            FULFILLMENT_DISPATCHES.inc();

            self.send_event(Event::FulfillmentDispatched {
                requisition_id,
                fulfillment_id: record.id,
                channel,
                reference_number,
                total_quantity,
                acted_by: acting_user.id,
            })
            .await;
            if new_header_status != header.status {
                self.send_event(Event::RequisitionStatusChanged {
                    requisition_id,
                    old_status: header.status,
                    new_status: new_header_status,
                })
                .await;
            }

            return Ok(self.record_response(record, request.attributes.clone(), record_lines));
        }

        FULFILLMENT_DISPATCH_CONFLICTS.inc();
        warn!(
            requisition_id = %requisition_id,
            attempts = DISPATCH_RETRY_ATTEMPTS,
            "Dispatch gave up after repeated version races"
        );
        Err(ServiceError::ConcurrentModification(requisition_id))
    }

    /// Lists the fulfillment records dispatched against a requisition, oldest
    /// first.
    #[instrument(skip(self), fields(requisition_id = %requisition_id))]
    pub async fn list_fulfillments(
        &self,
        requisition_id: Uuid,
    ) -> Result<Vec<FulfillmentRecordResponse>, ServiceError> {
        let db = &*self.db_pool;

        let header = RequisitionEntity::find_by_id(requisition_id)
            .filter(requisition::Column::IsDeleted.eq(false))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to fetch requisition");
                ServiceError::DatabaseError(e)
            })?;
        if header.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Requisition {} not found",
                requisition_id
            )));
        }

        let records = FulfillmentRecordEntity::find()
            .filter(fulfillment_record::Column::RequisitionId.eq(requisition_id))
            .order_by_asc(fulfillment_record::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to fetch fulfillment records");
                ServiceError::DatabaseError(e)
            })?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let record_ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let lines = FulfillmentLineEntity::find()
            .filter(fulfillment_line::Column::FulfillmentRecordId.is_in(record_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, requisition_id = %requisition_id, "Failed to fetch fulfillment lines");
                ServiceError::DatabaseError(e)
            })?;

        let mut lines_by_record: HashMap<Uuid, Vec<fulfillment_line::Model>> = HashMap::new();
        for line in lines {
            lines_by_record
                .entry(line.fulfillment_record_id)
                .or_default()
                .push(line);
        }

        let mut responses = Vec::with_capacity(records.len());
        for record in records {
            let attributes = record.channel_attributes().ok_or_else(|| {
                error!(fulfillment_id = %record.id, "Fulfillment record carries inconsistent channel attributes");
                ServiceError::IntegrityViolation(format!(
                    "Fulfillment record {} carries inconsistent channel attributes",
                    record.id
                ))
            })?;
            let lines = lines_by_record.remove(&record.id).unwrap_or_default();
            responses.push(self.record_response(record, attributes, lines));
        }
        Ok(responses)
    }

    fn validate_selections(
        channel: FulfillmentChannel,
        selections: &[DispatchLineInput],
    ) -> Result<(), ServiceError> {
        let mut seen = HashSet::with_capacity(selections.len());
        for selection in selections {
            if selection.quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Dispatch quantity for line {} must be greater than zero",
                    selection.requisition_line_id
                )));
            }
            if !seen.insert(selection.requisition_line_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Line {} is selected more than once",
                    selection.requisition_line_id
                )));
            }
            match channel {
                FulfillmentChannel::ConvertToPurchaseOrder => match selection.unit_rate {
                    Some(rate) if rate > Decimal::ZERO => {}
                    Some(_) => {
                        return Err(ServiceError::ValidationError(format!(
                            "Unit rate for line {} must be greater than zero",
                            selection.requisition_line_id
                        )))
                    }
                    None => {
                        return Err(ServiceError::ValidationError(format!(
                            "A purchase order requires a unit rate on line {}",
                            selection.requisition_line_id
                        )))
                    }
                },
                FulfillmentChannel::StockIssue | FulfillmentChannel::MaterialTransfer => {
                    if selection.unit_rate.is_some() {
                        return Err(ServiceError::ValidationError(format!(
                            "Unit rate is not accepted on the {} channel",
                            channel
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    async fn send_event(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send fulfillment event");
            }
        }
    }

    fn record_response(
        &self,
        record: fulfillment_record::Model,
        attributes: ChannelAttributes,
        lines: Vec<fulfillment_line::Model>,
    ) -> FulfillmentRecordResponse {
        FulfillmentRecordResponse {
            id: record.id,
            requisition_id: record.requisition_id,
            requisition_number: record.requisition_number,
            reference_number: record.reference_number,
            attributes,
            action_date: record.action_date,
            acting_user_id: record.acting_user_id,
            acting_user_name: record.acting_user_name,
            total_quantity: record.total_quantity,
            total_value: record.total_value,
            remarks: record.remarks,
            created_at: record.created_at,
            lines: lines.into_iter().map(Self::line_view).collect(),
        }
    }

    fn line_view(model: fulfillment_line::Model) -> FulfillmentLineView {
        FulfillmentLineView {
            id: model.id,
            requisition_line_id: model.requisition_line_id,
            item_id: model.item_id,
            item_code: model.item_code,
            item_name: model.item_name,
            quantity: model.quantity,
            unit_rate: model.unit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AllowAllPermissions;
    use crate::numbering::InMemoryNumbering;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::DatabaseConnection;

    fn service() -> FulfillmentService {
        FulfillmentService::new(
            Arc::new(DatabaseConnection::Disconnected),
            None,
            Arc::new(ApprovalGate::new(Arc::new(AllowAllPermissions))),
            Arc::new(InMemoryNumbering::new()),
        )
    }

    fn selection(quantity: Decimal, unit_rate: Option<Decimal>) -> DispatchLineInput {
        DispatchLineInput {
            requisition_line_id: Uuid::new_v4(),
            quantity,
            unit_rate,
        }
    }

    #[test]
    fn selections_must_carry_positive_quantities() {
        let result = FulfillmentService::validate_selections(
            FulfillmentChannel::StockIssue,
            &[selection(dec!(0), None)],
        );
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn a_line_cannot_be_selected_twice() {
        let line = selection(dec!(1), None);
        let twice = vec![line.clone(), line];
        let result =
            FulfillmentService::validate_selections(FulfillmentChannel::StockIssue, &twice);
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn purchase_orders_require_a_positive_unit_rate() {
        let missing = FulfillmentService::validate_selections(
            FulfillmentChannel::ConvertToPurchaseOrder,
            &[selection(dec!(2), None)],
        );
        assert_matches!(missing, Err(ServiceError::ValidationError(_)));

        let zero = FulfillmentService::validate_selections(
            FulfillmentChannel::ConvertToPurchaseOrder,
            &[selection(dec!(2), Some(dec!(0)))],
        );
        assert_matches!(zero, Err(ServiceError::ValidationError(_)));

        let ok = FulfillmentService::validate_selections(
            FulfillmentChannel::ConvertToPurchaseOrder,
            &[selection(dec!(2), Some(dec!(14.50)))],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn stock_channels_refuse_unit_rates() {
        let issue = FulfillmentService::validate_selections(
            FulfillmentChannel::StockIssue,
            &[selection(dec!(2), Some(dec!(3)))],
        );
        assert_matches!(issue, Err(ServiceError::ValidationError(_)));

        let transfer = FulfillmentService::validate_selections(
            FulfillmentChannel::MaterialTransfer,
            &[selection(dec!(2), Some(dec!(3)))],
        );
        assert_matches!(transfer, Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn dispatch_request_requires_at_least_one_line() {
        let request = DispatchFulfillmentRequest {
            acting_user: ActingUser::new(Uuid::new_v4(), "K. Mba"),
            attributes: ChannelAttributes::StockIssue {
                warehouse_id: Uuid::new_v4(),
            },
            lines: vec![],
            remarks: None,
            action_date: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn record_response_carries_attributes_and_line_views() {
        let now = Utc::now();
        let record_id = Uuid::new_v4();
        let requisition_id = Uuid::new_v4();
        let record = fulfillment_record::Model {
            id: record_id,
            requisition_id,
            requisition_number: "PR-000012".into(),
            channel: FulfillmentChannel::MaterialTransfer,
            reference_number: "MT-000003".into(),
            action_date: now,
            acting_user_id: Uuid::new_v4(),
            acting_user_name: "K. Mba".into(),
            supplier_id: None,
            warehouse_id: None,
            source_location: Some("Central store".into()),
            target_location: Some("Plant 2".into()),
            total_quantity: dec!(6),
            total_value: None,
            remarks: None,
            created_at: now,
        };
        let attributes = record.channel_attributes().unwrap();
        let line = fulfillment_line::Model {
            id: Uuid::new_v4(),
            fulfillment_record_id: record_id,
            requisition_line_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            item_code: "GSK-040".into(),
            item_name: "Gasket set".into(),
            quantity: dec!(6),
            unit_rate: None,
        };

        let response = service().record_response(record, attributes, vec![line]);

        assert_eq!(response.requisition_id, requisition_id);
        assert_eq!(response.reference_number, "MT-000003");
        assert_eq!(
            response.attributes,
            ChannelAttributes::MaterialTransfer {
                source_location: "Central store".into(),
                target_location: "Plant 2".into(),
            }
        );
        assert_eq!(response.lines.len(), 1);
        assert_eq!(response.lines[0].quantity, dec!(6));
    }
}
