//! Signed session tokens.
//!
//! A session is an HS256 JWT carrying the user id and role, valid for
//! seven days. The role in the token is informational only: every request
//! reloads the user, so the database role always wins.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use atelier_core::{Role, UserId};

use super::AuthError;

/// How long a session lasts, in days.
pub const SESSION_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: UserId,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionTokens {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            role,
            iat: now.timestamp(),
            exp: (now + Duration::days(SESSION_DAYS)).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Check a token's signature and expiry.
    ///
    /// Returns `None` for anything that is not a valid, unexpired token.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tokens(secret: &str) -> SessionTokens {
        SessionTokens::new(&SecretString::from(secret.to_owned()))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = tokens("k8#Qz!2vLp9@Wm4$Tn7^Rb1&Xc6*Yd3%");
        let user = UserId::generate();
        let token = tokens.issue(user, Role::Editor).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, user);
        assert_eq!(claims.role, Role::Editor);
        assert_eq!(claims.exp - claims.iat, Duration::days(SESSION_DAYS).num_seconds());
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = tokens("first-secret-first-secret-first!")
            .issue(UserId::generate(), Role::Customer)
            .unwrap();
        assert!(tokens("other-secret-other-secret-other!").verify(&token).is_none());
    }

    #[test]
    fn test_rejects_garbage_and_expired() {
        let tokens = tokens("k8#Qz!2vLp9@Wm4$Tn7^Rb1&Xc6*Yd3%");
        assert!(tokens.verify("").is_none());
        assert!(tokens.verify("not.a.jwt").is_none());

        let past = Utc::now() - Duration::days(30);
        let stale = Claims {
            user_id: UserId::generate(),
            role: Role::Customer,
            iat: past.timestamp(),
            exp: (past + Duration::days(SESSION_DAYS)).timestamp(),
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &stale, &tokens.encoding).unwrap();
        assert!(tokens.verify(&token).is_none());
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", tokens("k8#Qz!2vLp9@Wm4$Tn7^Rb1&Xc6*Yd3%"));
        assert!(!debug.contains("k8#Qz"));
    }
}
