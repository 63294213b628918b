//! Password hashing and access/refresh token handling.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    domain::user::Role,
    dto::auth::Claims,
    error::{AppError, AppResult},
};

pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_refresh_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, user_id: Uuid, email: &str, role: Role) -> AppResult<String> {
        issue(&self.access_encoding, self.access_ttl, user_id, email, role)
    }

    pub fn issue_refresh(&self, user_id: Uuid, email: &str, role: Role) -> AppResult<String> {
        issue(&self.refresh_encoding, self.refresh_ttl, user_id, email, role)
    }

    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        verify(&self.access_decoding, token)
    }

    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        verify(&self.refresh_decoding, token)
    }
}

fn issue(
    key: &EncodingKey,
    ttl: Duration,
    user_id: Uuid,
    email: &str,
    role: Role,
) -> AppResult<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(&Header::default(), &claims, key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify(key: &DecodingKey, token: &str) -> AppResult<Claims> {
    decode::<Claims>(token, key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("Token expired".into()),
            _ => AppError::Unauthorized("Invalid token".into()),
        })
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("access-secret", "refresh-secret", Duration::minutes(15), Duration::days(7))
    }

    #[test]
    fn access_token_round_trip_keeps_role() {
        let keys = keys();
        let id = Uuid::new_v4();
        let token = keys.issue_access(id, "a@example.com", Role::Admin).unwrap();
        let claims = keys.verify_access(&token).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys();
        let token = keys
            .issue_refresh(Uuid::new_v4(), "a@example.com", Role::User)
            .unwrap();
        assert!(keys.verify_refresh(&token).is_ok());
        assert!(matches!(
            keys.verify_access(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new("s", "r", Duration::minutes(-10), Duration::days(7));
        let token = keys
            .issue_access(Uuid::new_v4(), "a@example.com", Role::User)
            .unwrap();
        match keys.verify_access(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("Passw0rd!").unwrap();
        assert!(verify_password("Passw0rd!", &hash).unwrap());
        assert!(!verify_password("passw0rd!", &hash).unwrap());
    }
}
