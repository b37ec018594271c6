use std::time::{SystemTime, UNIX_EPOCH};

use crate::{model::role::Role, models::Claims};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// Mints a session token the way the identity service does. Production
/// issuance lives outside this repo; this backs ops tooling and tests.
pub fn issue_session_token(
    user_id: &str,
    email: &str,
    name: &str,
    roles: Vec<Role>,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = Claims {
        user_id: user_id.to_string(),
        sub: email.to_string(),
        name: name.to_string(),
        roles,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let token = issue_session_token(
            "u-1",
            "alice@x.com",
            "Alice",
            vec![Role::Admin],
            "test-secret",
            3600,
        );
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "alice@x.com");
        assert_eq!(claims.roles, vec![Role::Admin]);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = issue_session_token(
            "u-1",
            "alice@x.com",
            "Alice",
            vec![Role::Employee],
            "test-secret",
            3600,
        );
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
