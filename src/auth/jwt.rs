//! HS256 bearer tokens for users and sub-accounts.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_secs: i64,
    pub issuer: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expires_in_secs: i64) -> Self {
        JwtConfig {
            secret: secret.into(),
            expires_in_secs,
            issuer: "redetrade-api".to_string(),
        }
    }
}

/// Which table the token subject lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Usuario,
    Subconta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Primary key of the subject row.
    pub sub: String,
    pub kind: AccountKind,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn subject_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Token inválido.".into()))
    }
}

#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        JwtManager {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn generate_token(&self, subject_id: i64, kind: AccountKind) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.expires_in_secs);
        let claims = Claims {
            sub: subject_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token encode: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("Token expirado.".into()),
            _ => AppError::Unauthorized("Token inválido.".into()),
        })?;
        Ok(data.claims)
    }
}
