use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{FulfillmentChannel, RequisitionStatus};

/// Audit events emitted after every successful workflow mutation.
///
/// Delivery is fire-and-forget: a full or closed channel never fails the
/// operation that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RequisitionCreated {
        requisition_id: Uuid,
        requisition_number: String,
        acted_by: Uuid,
    },
    RequisitionUpdated {
        requisition_id: Uuid,
        acted_by: Uuid,
    },
    RequisitionDeleted {
        requisition_id: Uuid,
        acted_by: Uuid,
    },
    RequisitionSubmitted {
        requisition_id: Uuid,
        acted_by: Uuid,
    },
    RequisitionApproved {
        requisition_id: Uuid,
        acted_by: Uuid,
    },
    RequisitionRejected {
        requisition_id: Uuid,
        acted_by: Uuid,
        reason: String,
    },
    RequisitionStatusChanged {
        requisition_id: Uuid,
        old_status: RequisitionStatus,
        new_status: RequisitionStatus,
    },
    FulfillmentDispatched {
        requisition_id: Uuid,
        fulfillment_id: Uuid,
        channel: FulfillmentChannel,
        reference_number: String,
        total_quantity: Decimal,
        acted_by: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Handlers implementing this trait process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

/// Default handler: writes one structured audit line per event.
pub struct AuditLogHandler;

#[async_trait]
impl EventHandler for AuditLogHandler {
    async fn handle_event(&self, event: Event) -> Result<(), String> {
        match &event {
            Event::RequisitionCreated {
                requisition_id,
                requisition_number,
                acted_by,
            } => info!(
                requisition_id = %requisition_id,
                requisition_number = %requisition_number,
                acted_by = %acted_by,
                "audit: requisition created"
            ),
            Event::RequisitionUpdated {
                requisition_id,
                acted_by,
            } => info!(
                requisition_id = %requisition_id,
                acted_by = %acted_by,
                "audit: requisition updated"
            ),
            Event::RequisitionDeleted {
                requisition_id,
                acted_by,
            } => info!(
                requisition_id = %requisition_id,
                acted_by = %acted_by,
                "audit: requisition deleted"
            ),
            Event::RequisitionSubmitted {
                requisition_id,
                acted_by,
            } => info!(
                requisition_id = %requisition_id,
                acted_by = %acted_by,
                "audit: requisition submitted"
            ),
            Event::RequisitionApproved {
                requisition_id,
                acted_by,
            } => info!(
                requisition_id = %requisition_id,
                acted_by = %acted_by,
                "audit: requisition approved"
            ),
            Event::RequisitionRejected {
                requisition_id,
                acted_by,
                reason,
            } => info!(
                requisition_id = %requisition_id,
                acted_by = %acted_by,
                reason = %reason,
                "audit: requisition rejected"
            ),
            Event::RequisitionStatusChanged {
                requisition_id,
                old_status,
                new_status,
            } => info!(
                requisition_id = %requisition_id,
                old_status = %old_status,
                new_status = %new_status,
                "audit: requisition status changed"
            ),
            Event::FulfillmentDispatched {
                requisition_id,
                fulfillment_id,
                channel,
                reference_number,
                total_quantity,
                acted_by,
            } => info!(
                requisition_id = %requisition_id,
                fulfillment_id = %fulfillment_id,
                channel = %channel,
                reference_number = %reference_number,
                total_quantity = %total_quantity,
                acted_by = %acted_by,
                "audit: fulfillment dispatched"
            ),
        }
        Ok(())
    }
}

/// Drains the event channel and distributes each event to every handler.
/// Handler failures are logged and never stop the loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handlers: Vec<Arc<dyn EventHandler>>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        for handler in &handlers {
            if let Err(e) = handler.handle_event(event.clone()).await {
                warn!("Event handler failed: event={:?}, error={}", event, e);
            }
        }
    }

    warn!("Event processing loop has ended");
}
