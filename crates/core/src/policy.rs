//! Capability checks.
//!
//! Every ownership and role rule of the API lives in [`Actor::authorize`].
//! Handlers describe what they are about to do as an [`Action`] (carrying
//! the owner of the resource when ownership matters) and turn a
//! [`Denied`] into a 403.

use crate::types::{Role, UserId};

/// Roles allowed to run the back office.
const STAFF_ROLES: &[Role] = &[Role::Editor, Role::Admin];

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

/// Something an actor wants to do.
///
/// Variants carrying an `owner` are scoped to a resource belonging to that
/// user (a service request, an order, a notification list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open a new service request.
    CreateServiceRequest,
    /// Read a service request and its thread.
    ViewServiceRequest { owner: UserId },
    /// Post a message on a request thread.
    PostMessage { owner: UserId },
    /// Send or replace the quote on a request.
    SendQuote,
    /// Accept or decline a quote.
    RespondToQuote { owner: UserId },
    /// Attach a deliverable to a request.
    PostDeliverable,
    /// Set a request's status by hand.
    SetRequestStatus,
    /// Mock-pay an order.
    PayOrder { owner: UserId },
    /// See every customer's service requests.
    ListAllRequests,
    /// See every customer's orders.
    ListAllOrders,
    /// Read a user's notifications.
    ListNotifications { owner: UserId },
    /// Create, edit or delete products and services.
    ManageCatalog,
    /// Create, edit or delete user accounts.
    ManageUsers,
    /// Read dashboard statistics.
    ViewStats,
    /// Send a notification to many users at once.
    Broadcast,
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Denied {
    /// Client-facing explanation.
    pub reason: &'static str,
}

impl Denied {
    pub(crate) const FORBIDDEN: Self = Self { reason: "Forbidden" };
}

impl Actor {
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Editors and admins.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    fn owns(&self, owner: UserId) -> bool {
        self.id == owner
    }

    /// Decide whether this actor may perform `action`.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] when the actor's role or ownership does not allow
    /// the action.
    pub fn authorize(&self, action: Action) -> Result<(), Denied> {
        let allowed = match action {
            Action::CreateServiceRequest => {
                if self.is_staff() {
                    return Err(Denied {
                        reason: "Only customers can create service requests",
                    });
                }
                true
            }
            Action::ViewServiceRequest { owner }
            | Action::PostMessage { owner }
            | Action::PayOrder { owner } => self.is_staff() || self.owns(owner),
            Action::RespondToQuote { owner } => self.owns(owner),
            Action::SendQuote
            | Action::PostDeliverable
            | Action::SetRequestStatus
            | Action::ListAllRequests
            | Action::ListAllOrders
            | Action::ManageCatalog
            | Action::ViewStats => require_any_role(self, STAFF_ROLES).is_ok(),
            Action::ListNotifications { owner } => {
                self.owns(owner) || require_any_role(self, &[Role::Admin]).is_ok()
            }
            Action::ManageUsers | Action::Broadcast => {
                require_any_role(self, &[Role::Admin]).is_ok()
            }
        };

        if allowed { Ok(()) } else { Err(Denied::FORBIDDEN) }
    }
}

/// Require the actor's role to rank at least `minimum`.
///
/// # Errors
///
/// Returns [`Denied`] if the role ranks lower.
pub const fn require_minimum_role(actor: &Actor, minimum: Role) -> Result<(), Denied> {
    if actor.role.at_least(minimum) {
        Ok(())
    } else {
        Err(Denied::FORBIDDEN)
    }
}

/// Require the actor's role to be one of `roles`.
///
/// # Errors
///
/// Returns [`Denied`] if the role is not listed.
pub fn require_any_role(actor: &Actor, roles: &[Role]) -> Result<(), Denied> {
    if roles.contains(&actor.role) {
        Ok(())
    } else {
        Err(Denied::FORBIDDEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor::new(UserId::generate(), role)
    }

    #[test]
    fn test_only_customers_create_requests() {
        assert!(actor(Role::Customer).authorize(Action::CreateServiceRequest).is_ok());
        let denied = actor(Role::Editor).authorize(Action::CreateServiceRequest);
        assert_eq!(
            denied.map_err(|d| d.reason),
            Err("Only customers can create service requests")
        );
        assert!(actor(Role::Admin).authorize(Action::CreateServiceRequest).is_err());
    }

    #[test]
    fn test_request_visibility() {
        let owner = actor(Role::Customer);
        let stranger = actor(Role::Customer);
        let view = Action::ViewServiceRequest { owner: owner.id };

        assert!(owner.authorize(view).is_ok());
        assert!(stranger.authorize(view).is_err());
        assert!(actor(Role::Editor).authorize(view).is_ok());
    }

    #[test]
    fn test_only_owner_responds_to_quote() {
        let owner = actor(Role::Customer);
        let respond = Action::RespondToQuote { owner: owner.id };

        assert!(owner.authorize(respond).is_ok());
        assert!(actor(Role::Admin).authorize(respond).is_err());
    }

    #[test]
    fn test_staff_actions() {
        for action in [Action::SendQuote, Action::PostDeliverable, Action::SetRequestStatus] {
            assert!(actor(Role::Customer).authorize(action).is_err());
            assert!(actor(Role::Editor).authorize(action).is_ok());
            assert!(actor(Role::Admin).authorize(action).is_ok());
        }
    }

    #[test]
    fn test_notifications_of_other_users_need_admin() {
        let owner = actor(Role::Customer);
        let list = Action::ListNotifications { owner: owner.id };

        assert!(owner.authorize(list).is_ok());
        assert!(actor(Role::Editor).authorize(list).is_err());
        assert!(actor(Role::Admin).authorize(list).is_ok());
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [Action::ManageUsers, Action::Broadcast] {
            assert!(actor(Role::Editor).authorize(action).is_err());
            assert!(actor(Role::Admin).authorize(action).is_ok());
        }
    }

    #[test]
    fn test_back_office_actions_follow_staff_roles() {
        for action in [
            Action::ListAllRequests,
            Action::ListAllOrders,
            Action::ManageCatalog,
            Action::ViewStats,
        ] {
            for role in [Role::Customer, Role::Editor, Role::Admin] {
                assert_eq!(
                    actor(role).authorize(action).is_ok(),
                    require_any_role(&actor(role), STAFF_ROLES).is_ok(),
                    "{action:?} as {role}"
                );
            }
        }
    }

    #[test]
    fn test_role_helpers() {
        let editor = actor(Role::Editor);
        assert!(require_minimum_role(&editor, Role::Editor).is_ok());
        assert!(require_minimum_role(&editor, Role::Admin).is_err());
        assert!(require_any_role(&editor, &[Role::Admin, Role::Editor]).is_ok());
        assert!(require_any_role(&editor, &[Role::Customer]).is_err());
    }
}
