use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::AppError;

pub const RESET_TOKEN_LEN: usize = 32;

/// Cheapest cost bcrypt accepts.
pub const MIN_BCRYPT_COST: u32 = 4;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(format!("password hash: {}", e)))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not bcrypt");
            false
        }
    }
}

/// Opaque single-use token for the password reset link.
pub fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}
