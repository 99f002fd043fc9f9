//! User bootstrap command.
//!
//! Registration through the API only ever creates customers; this is how
//! the first admin comes into existence.

use atelier_core::{Email, Role, UserId};
use atelier_server::db::users::UserRepository;
use atelier_server::services::auth::hash_password;

use super::{CliError, connect};

const MIN_PASSWORD_LEN: usize = 8;

/// Check arguments before touching the database.
fn parse_args(email: &str, role: &str, password: &str) -> Result<(Email, Role), CliError> {
    let email =
        Email::parse(email).map_err(|e| CliError::InvalidArgument("email", e.to_string()))?;
    let role: Role = role
        .parse()
        .map_err(|_| CliError::InvalidArgument("role", format!("{role} (customer, editor, admin)")))?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CliError::InvalidArgument(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok((email, role))
}

/// Create a user with the given role.
///
/// # Errors
///
/// Returns `CliError` for invalid arguments, an existing email, or a
/// database failure.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<UserId, CliError> {
    let (email, role) = parse_args(email, role, password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    if users.email_taken(&email, None).await? {
        return Err(CliError::UserExists(email.to_string()));
    }

    let hash = hash_password(password)?;
    let user = users.create(&email, name.trim(), role, &hash).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id)
}
