//! User roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Role of a user account.
///
/// Roles form a total order used for "minimum role" checks:
/// `Customer < Editor < Admin`. Editors and admins together are "staff".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Buys products and commissions services.
    Customer,
    /// Staff member who manages catalog and service requests.
    Editor,
    /// Full access, including user management.
    Admin,
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    /// All roles in ascending rank.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Editor, Self::Admin];

    /// Numeric rank (1 = customer, 3 = admin).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Customer => 1,
            Self::Editor => 2,
            Self::Admin => 3,
        }
    }

    /// Whether this role ranks at or above `minimum`.
    #[must_use]
    pub const fn at_least(self, minimum: Self) -> bool {
        self.rank() >= minimum.rank()
    }

    /// Editors and admins.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Editor | Self::Admin)
    }

    /// The wire/storage name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "editor" => Ok(Self::Editor),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(Role::Customer < Role::Editor);
        assert!(Role::Editor < Role::Admin);
        assert!(Role::Admin.at_least(Role::Editor));
        assert!(!Role::Customer.at_least(Role::Editor));
        assert!(Role::Editor.at_least(Role::Editor));
    }

    #[test]
    fn test_staff() {
        assert!(!Role::Customer.is_staff());
        assert!(Role::Editor.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn test_parse_and_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert!("root".parse::<Role>().is_err());
    }
}
