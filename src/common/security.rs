// src/common/security.rs
//
// Hash de senha e emissão de token ficam atrás de traits estreitas: o núcleo
// só conhece `hash/verify` e `issue/verify`.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Claims, User},
};

#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<String, AppError>;
    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError>;
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<String, AppError>;
    fn verify(&self, token: &str) -> Result<Claims, AppError>;
}

// ---
// Bcrypt
// ---

#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl CredentialHasher for BcryptHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let password = plaintext.to_owned();
        let cost = self.cost;

        // bcrypt é CPU-bound: roda fora do executor
        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        Ok(digest)
    }

    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError> {
        let password = plaintext.to_owned();
        let digest = digest.to_owned();

        let is_valid = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &digest))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        Ok(is_valid)
    }
}

// ---
// JWT (HS256)
// ---

#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
}

impl JwtIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::hours(ttl_hours),
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            supplier_id: user.supplier_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn user(role: Role, supplier_id: Option<i64>) -> User {
        User {
            id: 42,
            email: "dono@hortifruti.com".into(),
            password_hash: String::new(),
            full_name: "Dono".into(),
            role,
            supplier_id,
            restaurant_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_carries_role_and_supplier() {
        let issuer = JwtIssuer::new("segredo-de-teste", 1);
        let token = issuer.issue(&user(Role::Owner, Some(7))).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.supplier_id, Some(7));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtIssuer::new("um", 1).issue(&user(Role::Consumer, None)).unwrap();
        assert!(matches!(
            JwtIssuer::new("outro", 1).verify(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn bcrypt_round_trip() {
        let hasher = BcryptHasher::new(4);
        let digest = hasher.hash("senha123").await.unwrap();
        assert!(hasher.verify("senha123", &digest).await.unwrap());
        assert!(!hasher.verify("errada", &digest).await.unwrap());
    }
}
