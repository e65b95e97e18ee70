//! Credentials: password hashing, bearer tokens, reset tokens.

mod jwt;
mod password;

pub use jwt::{AccountKind, Claims, JwtConfig, JwtManager};
pub use password::{generate_reset_token, hash_password, verify_password, MIN_BCRYPT_COST, RESET_TOKEN_LEN};
