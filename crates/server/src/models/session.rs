//! The authenticated caller.

use serde::Serialize;

use atelier_core::{Actor, Email, Role, UserId};

use super::User;

/// Identity resolved from the session cookie.
///
/// Loaded fresh from `users` on every request, so a role change or a
/// deleted account takes effect immediately.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
}

impl SessionUser {
    /// The caller as seen by the capability policy.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}
