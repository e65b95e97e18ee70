//! Process settings from environment variables (optionally loaded from `.env` by the binary).

use crate::auth::MIN_BCRYPT_COST;
use crate::error::ConfigError;

const DEV_JWT_SECRET: &str = "redetrade-dev-secret-change-me";
pub const DEFAULT_RESET_LINK_BASE: &str = "https://app.redetrade.com.br/resetPassword";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub db_kind: DbKind,
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub bcrypt_cost: u32,
    pub reset_link_base: String,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_kind = match var("DB_TYPE").as_deref() {
            None | Some("postgres") | Some("pgsql") => DbKind::Postgres,
            Some("memory") => DbKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "DB_TYPE",
                    value: other.to_string(),
                })
            }
        };

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = var("DB_HOST").unwrap_or_else(|| "localhost".into());
                let port = var("DB_PORT").unwrap_or_else(|| "5432".into());
                let name = var("DB_NAME").unwrap_or_else(|| "redetrade".into());
                match (var("DB_USER"), var("DB_PASSWORD")) {
                    (Some(user), Some(pass)) => format!("postgres://{}:{}@{}:{}/{}", user, pass, host, port, name),
                    (Some(user), None) => format!("postgres://{}@{}:{}/{}", user, host, port, name),
                    _ => format!("postgres://{}:{}/{}", host, port, name),
                }
            }
        };

        let jwt_secret = match var("JWT_SECRET").or_else(|| var("SECRET")) {
            Some(s) => s,
            None if db_kind == DbKind::Memory => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        Ok(Settings {
            db_kind,
            database_url,
            max_connections: parse(&var, "DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_ttl_secs: parse(&var, "JWT_TTL_SECS", 3600)?,
            bcrypt_cost: parse(&var, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            reset_link_base: var("RESET_LINK_BASE").unwrap_or_else(|| DEFAULT_RESET_LINK_BASE.into()),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
        })
    }

    /// In-memory settings with the cheapest hashing cost.
    pub fn for_tests() -> Self {
        Settings {
            db_kind: DbKind::Memory,
            database_url: String::new(),
            max_connections: 1,
            jwt_secret: "test-secret".into(),
            jwt_ttl_secs: 3600,
            bcrypt_cost: MIN_BCRYPT_COST,
            reset_link_base: DEFAULT_RESET_LINK_BASE.into(),
            bind_addr: "127.0.0.1:0".into(),
        }
    }
}

fn parse<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn postgres_requires_a_secret() {
        assert!(matches!(settings(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        let s = settings(&[("SECRET", "s3")]).unwrap();
        assert_eq!(s.jwt_secret, "s3");
        assert_eq!(s.db_kind, DbKind::Postgres);
    }

    #[test]
    fn database_url_is_composed_from_parts() {
        let s = settings(&[
            ("JWT_SECRET", "k"),
            ("DB_HOST", "db"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "trade"),
        ])
        .unwrap();
        assert_eq!(s.database_url, "postgres://app:pw@db:5432/trade");
    }

    #[test]
    fn test_settings_hash_at_minimum_cost() {
        let s = Settings::for_tests();
        assert_eq!(s.bcrypt_cost, MIN_BCRYPT_COST);
        let hashed = crate::auth::hash_password("segredo123", s.bcrypt_cost).unwrap();
        assert!(hashed.starts_with("$2b$04$"));
    }

    #[test]
    fn memory_backend_defaults() {
        let s = settings(&[("DB_TYPE", "memory")]).unwrap();
        assert_eq!(s.db_kind, DbKind::Memory);
        assert_eq!(s.jwt_ttl_secs, 3600);
        assert_eq!(s.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(s.reset_link_base, DEFAULT_RESET_LINK_BASE);
    }

    #[test]
    fn bad_numbers_and_kinds_are_rejected() {
        assert!(settings(&[("JWT_SECRET", "k"), ("JWT_TTL_SECS", "soon")]).is_err());
        assert!(settings(&[("DB_TYPE", "oracle")]).is_err());
    }
}
