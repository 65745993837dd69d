/*!
 * # Authorization Module
 *
 * Authority checks for the requisition workflow. Every check in the crate
 * goes through the [`ApprovalGate`]; no service or handler consults
 * permissions on its own.
 *
 * Permissions are `resource:action` strings resolved through a pluggable
 * [`PermissionChecker`]. The in-crate default resolves static role grants;
 * deployments wire their own checker against an external identity system.
 */

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::RequisitionStatus;

/// Identity on whose behalf a mutating operation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ActingUser {
    pub id: Uuid,
    #[validate(length(min = 1, message = "acting user name must not be empty"))]
    pub name: String,
}

impl ActingUser {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Permission string constants for compile-time safety
pub mod consts {
    pub const REQUISITIONS_SUBMIT: &str = "requisitions:submit";
    pub const REQUISITIONS_APPROVE: &str = "requisitions:approve";
    pub const REQUISITIONS_REJECT: &str = "requisitions:reject";
    pub const REQUISITIONS_FULFILL: &str = "requisitions:fulfill";
}

/// Role definition with associated permissions
#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

// Standard roles and their permissions
lazy_static! {
    pub static ref ROLES: HashMap<String, Role> = {
        let mut roles = HashMap::new();

        roles.insert(
            "admin".to_string(),
            Role {
                name: "admin".to_string(),
                description: "Administrator with full access".to_string(),
                permissions: vec!["requisitions:*".to_string()],
            },
        );

        roles.insert(
            "requester".to_string(),
            Role {
                name: "requester".to_string(),
                description: "Creates and submits requisitions".to_string(),
                permissions: vec![consts::REQUISITIONS_SUBMIT.to_string()],
            },
        );

        roles.insert(
            "approver".to_string(),
            Role {
                name: "approver".to_string(),
                description: "Approves or rejects submitted requisitions".to_string(),
                permissions: vec![
                    consts::REQUISITIONS_APPROVE.to_string(),
                    consts::REQUISITIONS_REJECT.to_string(),
                ],
            },
        );

        roles.insert(
            "storekeeper".to_string(),
            Role {
                name: "storekeeper".to_string(),
                description: "Dispatches fulfillment actions against approved requisitions"
                    .to_string(),
                permissions: vec![consts::REQUISITIONS_FULFILL.to_string()],
            },
        );

        roles
    };
}

/// Checks whether a held permission satisfies a required one.
/// Supports `resource:*` and the super wildcard `*`.
pub fn permission_matches(held: &str, required: &str) -> bool {
    if held == required || held == "*" {
        return true;
    }
    if let Some(prefix) = held.strip_suffix(":*") {
        if required.starts_with(prefix) {
            return true;
        }
    }
    false
}

/// External authority source consulted by the gate.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn holds(&self, user: &ActingUser, permission: &str) -> bool;
}

/// Grants every permission to every user. Suitable for embedded use and
/// tests that are not about authority.
pub struct AllowAllPermissions;

#[async_trait]
impl PermissionChecker for AllowAllPermissions {
    async fn holds(&self, _user: &ActingUser, _permission: &str) -> bool {
        true
    }
}

/// In-memory checker resolving per-user role assignments against [`ROLES`].
#[derive(Default)]
pub struct StaticPermissionChecker {
    assignments: HashMap<Uuid, HashSet<String>>,
}

impl StaticPermissionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign_role(mut self, user_id: Uuid, role: &str) -> Self {
        self.assignments
            .entry(user_id)
            .or_default()
            .insert(role.to_string());
        self
    }

    fn permissions_of(&self, user_id: Uuid) -> HashSet<String> {
        let mut permissions = HashSet::new();
        if let Some(roles) = self.assignments.get(&user_id) {
            for role_name in roles {
                if let Some(role) = ROLES.get(role_name) {
                    permissions.extend(role.permissions.iter().cloned());
                }
            }
        }
        permissions
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissionChecker {
    async fn holds(&self, user: &ActingUser, permission: &str) -> bool {
        self.permissions_of(user.id)
            .iter()
            .any(|held| permission_matches(held, permission))
    }
}

/// Single owner of workflow authority decisions.
///
/// Each `ensure_*` revalidates the current status before the authority
/// check, so a stale client cannot slip an illegal transition past the gate.
pub struct ApprovalGate {
    checker: Arc<dyn PermissionChecker>,
}

impl ApprovalGate {
    pub fn new(checker: Arc<dyn PermissionChecker>) -> Self {
        Self { checker }
    }

    pub async fn can_submit(&self, user: &ActingUser) -> bool {
        self.checker.holds(user, consts::REQUISITIONS_SUBMIT).await
    }

    pub async fn can_approve(&self, user: &ActingUser) -> bool {
        self.checker.holds(user, consts::REQUISITIONS_APPROVE).await
    }

    pub async fn can_reject(&self, user: &ActingUser) -> bool {
        self.checker.holds(user, consts::REQUISITIONS_REJECT).await
    }

    pub async fn can_dispatch_fulfillment(&self, user: &ActingUser) -> bool {
        self.checker.holds(user, consts::REQUISITIONS_FULFILL).await
    }

    /// Authorizes a workflow transition: the move must be legal from the
    /// current status and the user must hold the matching permission.
    pub async fn ensure_transition(
        &self,
        current: RequisitionStatus,
        target: RequisitionStatus,
        user: &ActingUser,
    ) -> Result<(), ServiceError> {
        if !current.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        let allowed = match target {
            RequisitionStatus::Submitted => self.can_submit(user).await,
            RequisitionStatus::Approved => self.can_approve(user).await,
            RequisitionStatus::Rejected => self.can_reject(user).await,
            // deriver-owned states are never reached through the gate
            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "user {} may not move a requisition to {}",
                user.name, target
            )))
        }
    }

    /// Authorizes a fulfillment dispatch against the current status.
    pub async fn ensure_dispatch(
        &self,
        current: RequisitionStatus,
        user: &ActingUser,
    ) -> Result<(), ServiceError> {
        if !current.accepts_dispatch() {
            return Err(ServiceError::InvalidOperation(format!(
                "fulfillment cannot be dispatched against a {} requisition",
                current
            )));
        }
        if self.can_dispatch_fulfillment(user).await {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "user {} may not dispatch fulfillment",
                user.name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn user(name: &str) -> ActingUser {
        ActingUser::new(Uuid::new_v4(), name)
    }

    #[test]
    fn wildcards_expand_as_expected() {
        assert!(permission_matches(
            "requisitions:approve",
            consts::REQUISITIONS_APPROVE
        ));
        assert!(permission_matches("requisitions:*", consts::REQUISITIONS_REJECT));
        assert!(permission_matches("*", consts::REQUISITIONS_FULFILL));
        assert!(!permission_matches(
            "requisitions:approve",
            consts::REQUISITIONS_REJECT
        ));
        assert!(!permission_matches("orders:*", consts::REQUISITIONS_SUBMIT));
    }

    #[tokio::test]
    async fn roles_grant_their_permissions() {
        let approver = user("pat");
        let clerk = user("sam");
        let checker = StaticPermissionChecker::new()
            .assign_role(approver.id, "approver")
            .assign_role(clerk.id, "storekeeper");
        let gate = ApprovalGate::new(Arc::new(checker));

        assert!(gate.can_approve(&approver).await);
        assert!(gate.can_reject(&approver).await);
        assert!(!gate.can_dispatch_fulfillment(&approver).await);

        assert!(gate.can_dispatch_fulfillment(&clerk).await);
        assert!(!gate.can_approve(&clerk).await);
    }

    #[tokio::test]
    async fn gate_rejects_illegal_transition_before_authority() {
        let gate = ApprovalGate::new(Arc::new(AllowAllPermissions));
        // even an all-powerful user cannot approve a draft
        let result = gate
            .ensure_transition(
                RequisitionStatus::Draft,
                RequisitionStatus::Approved,
                &user("root"),
            )
            .await;
        assert_matches!(
            result,
            Err(ServiceError::InvalidTransition {
                from: RequisitionStatus::Draft,
                to: RequisitionStatus::Approved,
            })
        );
    }

    #[tokio::test]
    async fn gate_refuses_unauthorized_approval() {
        let requester = user("riley");
        let checker = StaticPermissionChecker::new().assign_role(requester.id, "requester");
        let gate = ApprovalGate::new(Arc::new(checker));

        let result = gate
            .ensure_transition(
                RequisitionStatus::Submitted,
                RequisitionStatus::Approved,
                &requester,
            )
            .await;
        assert_matches!(result, Err(ServiceError::Forbidden(_)));

        // the same user may submit
        assert!(gate
            .ensure_transition(
                RequisitionStatus::Draft,
                RequisitionStatus::Submitted,
                &requester,
            )
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn dispatch_needs_an_accepting_status() {
        let gate = ApprovalGate::new(Arc::new(AllowAllPermissions));
        assert!(gate
            .ensure_dispatch(RequisitionStatus::Approved, &user("kit"))
            .await
            .is_ok());
        assert_matches!(
            gate.ensure_dispatch(RequisitionStatus::Draft, &user("kit"))
                .await,
            Err(ServiceError::InvalidOperation(_))
        );
        assert_matches!(
            gate.ensure_dispatch(RequisitionStatus::FullyFulfilled, &user("kit"))
                .await,
            Err(ServiceError::InvalidOperation(_))
        );
    }
}
