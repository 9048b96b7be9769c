use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
}

pub fn create_jwt(
    member_id: Uuid,
    role: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    let claims = Claims {
        sub: member_id,
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_subject_and_role() {
        let member_id = Uuid::new_v4();
        let token = create_jwt(member_id, "manager", "test-secret").unwrap();
        let claims = verify_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, member_id);
        assert_eq!(claims.role, "manager");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_jwt(Uuid::new_v4(), "admin", "secret-a").unwrap();
        assert!(verify_jwt(&token, "secret-b").is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = create_jwt(Uuid::new_v4(), "viewer", "secret").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_jwt(&tampered, "secret").is_err());
    }
}
