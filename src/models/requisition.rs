use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle states of a purchase requisition.
///
/// `Draft`, `Submitted` and `Rejected` are owned by the approval workflow;
/// `Approved`, `PartiallyFulfilled` and `FullyFulfilled` are owned by the
/// status deriver and never set directly by a client call.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum RequisitionStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Submitted")]
    Submitted,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "PartiallyFulfilled")]
    PartiallyFulfilled,
    #[sea_orm(string_value = "FullyFulfilled")]
    FullyFulfilled,
}

impl RequisitionStatus {
    /// Returns true when the state machine permits moving from `self` to `target`.
    ///
    /// The fulfillment edges are included so the deriver's output can be
    /// asserted against the same table the workflow transitions use.
    pub fn can_transition_to(self, target: RequisitionStatus) -> bool {
        use RequisitionStatus::*;
        matches!(
            (self, target),
            (Draft, Submitted)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (Approved, PartiallyFulfilled)
                | (Approved, FullyFulfilled)
                | (PartiallyFulfilled, FullyFulfilled)
        )
    }

    /// Header fields and lines may only be changed while the document is a draft.
    pub fn allows_structural_edits(self) -> bool {
        matches!(self, RequisitionStatus::Draft)
    }

    /// Logical deletion is legal before submission and after a rejection.
    pub fn allows_delete(self) -> bool {
        matches!(
            self,
            RequisitionStatus::Draft | RequisitionStatus::Rejected
        )
    }

    /// Fulfillment dispatch is only accepted against these states.
    pub fn accepts_dispatch(self) -> bool {
        matches!(
            self,
            RequisitionStatus::Approved | RequisitionStatus::PartiallyFulfilled
        )
    }

    /// True once the approval gate has released the document to fulfillment.
    pub fn is_post_approval(self) -> bool {
        matches!(
            self,
            RequisitionStatus::Approved
                | RequisitionStatus::PartiallyFulfilled
                | RequisitionStatus::FullyFulfilled
        )
    }

    /// Terminal for forward progress: no transition leaves these states.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequisitionStatus::Rejected | RequisitionStatus::FullyFulfilled
        )
    }
}

/// Urgency of a requisition. Informational only; no guard depends on it.
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
pub enum RequisitionPriority {
    #[sea_orm(string_value = "Normal")]
    Normal,
    #[sea_orm(string_value = "Urgent")]
    Urgent,
    #[sea_orm(string_value = "Critical")]
    Critical,
}

/// Per-line fulfillment progress, always derived from the quantity pair and
/// never set independently.
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
pub enum LineStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "PartiallyFulfilled")]
    PartiallyFulfilled,
    #[sea_orm(string_value = "FullyFulfilled")]
    FullyFulfilled,
}

/// A quantity pair that no sequence of valid dispatches can produce.
///
/// Input validation rejects bad requests before they reach the ledger, so any
/// of these surfacing from persisted rows means the store itself is corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityIntegrityError {
    #[error("requested quantity {requested} must be positive")]
    NonPositiveRequested { requested: Decimal },
    #[error("fulfilled quantity {fulfilled} is negative")]
    NegativeFulfilled { fulfilled: Decimal },
    #[error("fulfilled quantity {fulfilled} exceeds requested quantity {requested}")]
    FulfilledExceedsRequested {
        requested: Decimal,
        fulfilled: Decimal,
    },
}

impl LineStatus {
    /// Derives a line's status from its quantity ledger.
    pub fn derive(requested: Decimal, fulfilled: Decimal) -> Result<Self, QuantityIntegrityError> {
        if requested <= Decimal::ZERO {
            return Err(QuantityIntegrityError::NonPositiveRequested { requested });
        }
        if fulfilled < Decimal::ZERO {
            return Err(QuantityIntegrityError::NegativeFulfilled { fulfilled });
        }
        if fulfilled > requested {
            return Err(QuantityIntegrityError::FulfilledExceedsRequested {
                requested,
                fulfilled,
            });
        }
        Ok(if fulfilled == Decimal::ZERO {
            LineStatus::Pending
        } else if fulfilled < requested {
            LineStatus::PartiallyFulfilled
        } else {
            LineStatus::FullyFulfilled
        })
    }
}

/// Recomputes the header status from the line statuses.
///
/// Idempotent: feeding the result back with the same lines returns the same
/// status. Before approval the header belongs to the workflow and is returned
/// unchanged regardless of line state.
pub fn derive_header_status(
    current: RequisitionStatus,
    lines: &[LineStatus],
) -> RequisitionStatus {
    if !current.is_post_approval() {
        return current;
    }
    if lines.is_empty() {
        return current;
    }
    if lines.iter().all(|s| *s == LineStatus::FullyFulfilled) {
        RequisitionStatus::FullyFulfilled
    } else if lines.iter().any(|s| *s != LineStatus::Pending) {
        RequisitionStatus::PartiallyFulfilled
    } else {
        RequisitionStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn workflow_transitions_follow_the_state_machine() {
        use RequisitionStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Approved));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(PartiallyFulfilled));
        assert!(Approved.can_transition_to(FullyFulfilled));
        assert!(PartiallyFulfilled.can_transition_to(FullyFulfilled));

        assert!(!Draft.can_transition_to(Approved));
        assert!(!Draft.can_transition_to(Draft));
        assert!(!Rejected.can_transition_to(Submitted));
        assert!(!FullyFulfilled.can_transition_to(PartiallyFulfilled));
        assert!(!PartiallyFulfilled.can_transition_to(Approved));
    }

    #[test]
    fn terminal_states_accept_nothing_further() {
        use RequisitionStatus::*;
        for target in [
            Draft,
            Submitted,
            Approved,
            Rejected,
            PartiallyFulfilled,
            FullyFulfilled,
        ] {
            assert!(!Rejected.can_transition_to(target));
            assert!(!FullyFulfilled.can_transition_to(target));
        }
    }

    #[test]
    fn only_draft_is_editable_and_dispatch_needs_approval() {
        use RequisitionStatus::*;
        assert!(Draft.allows_structural_edits());
        assert!(!Submitted.allows_structural_edits());
        assert!(!Approved.allows_structural_edits());

        assert!(Draft.allows_delete());
        assert!(Rejected.allows_delete());
        assert!(!Submitted.allows_delete());
        assert!(!FullyFulfilled.allows_delete());

        assert!(Approved.accepts_dispatch());
        assert!(PartiallyFulfilled.accepts_dispatch());
        assert!(!Draft.accepts_dispatch());
        assert!(!Submitted.accepts_dispatch());
        assert!(!Rejected.accepts_dispatch());
        assert!(!FullyFulfilled.accepts_dispatch());
    }

    #[test]
    fn line_status_tracks_the_quantity_ledger() {
        assert_eq!(
            LineStatus::derive(dec!(10), dec!(0)).unwrap(),
            LineStatus::Pending
        );
        assert_eq!(
            LineStatus::derive(dec!(10), dec!(4)).unwrap(),
            LineStatus::PartiallyFulfilled
        );
        assert_eq!(
            LineStatus::derive(dec!(10), dec!(10)).unwrap(),
            LineStatus::FullyFulfilled
        );
        // fractional quantities participate like any other
        assert_eq!(
            LineStatus::derive(dec!(2.5), dec!(2.5)).unwrap(),
            LineStatus::FullyFulfilled
        );
    }

    #[test]
    fn corrupt_quantity_pairs_are_integrity_errors() {
        assert_eq!(
            LineStatus::derive(dec!(10), dec!(11)),
            Err(QuantityIntegrityError::FulfilledExceedsRequested {
                requested: dec!(10),
                fulfilled: dec!(11),
            })
        );
        assert_eq!(
            LineStatus::derive(dec!(0), dec!(0)),
            Err(QuantityIntegrityError::NonPositiveRequested {
                requested: dec!(0)
            })
        );
        assert_eq!(
            LineStatus::derive(dec!(5), dec!(-1)),
            Err(QuantityIntegrityError::NegativeFulfilled {
                fulfilled: dec!(-1)
            })
        );
    }

    #[test]
    fn header_status_follows_the_lines() {
        use LineStatus::*;
        use RequisitionStatus as R;

        assert_eq!(
            derive_header_status(R::Approved, &[Pending, Pending]),
            R::Approved
        );
        assert_eq!(
            derive_header_status(R::Approved, &[PartiallyFulfilled, Pending]),
            R::PartiallyFulfilled
        );
        assert_eq!(
            derive_header_status(R::Approved, &[FullyFulfilled, Pending]),
            R::PartiallyFulfilled
        );
        assert_eq!(
            derive_header_status(R::PartiallyFulfilled, &[FullyFulfilled, FullyFulfilled]),
            R::FullyFulfilled
        );
    }

    #[test]
    fn header_derivation_is_idempotent() {
        use LineStatus::*;
        use RequisitionStatus as R;
        for lines in [
            vec![Pending],
            vec![PartiallyFulfilled],
            vec![FullyFulfilled, Pending],
            vec![FullyFulfilled, FullyFulfilled],
        ] {
            let once = derive_header_status(R::Approved, &lines);
            assert_eq!(derive_header_status(once, &lines), once);
        }
    }

    #[test]
    fn pre_approval_headers_are_left_to_the_workflow() {
        use LineStatus::*;
        use RequisitionStatus as R;
        for status in [R::Draft, R::Submitted, R::Rejected] {
            assert_eq!(derive_header_status(status, &[FullyFulfilled]), status);
        }
    }
}
