//! Service settings from environment variables (optionally seeded from `.env`).

use crate::config::{builtin, load_schema_file, SchemaConfig};
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    /// Required when `backend` is `Postgres`.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub entity_schema: String,
    /// When set, the schema is read from this JSON file instead of the built-in set.
    pub schema_path: Option<PathBuf>,
    pub seed_sample_data: bool,
    pub max_body_bytes: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".into())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Load(format!("BIND_ADDR: {}", e)))?;

        let backend = match get("RECORD_STORE").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres,
            other => {
                return Err(ConfigError::Load(format!(
                    "RECORD_STORE: expected 'memory' or 'postgres', got '{}'",
                    other
                )))
            }
        };

        let database_url = get("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Load("DATABASE_URL is required when RECORD_STORE=postgres".into()));
        }

        let max_connections = parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 5u32)?;
        let seed_sample_data = match get("SEED_SAMPLE_DATA") {
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Load(format!("SEED_SAMPLE_DATA: invalid bool '{}'", v)))?,
            None => backend == StoreBackend::Memory,
        };
        let max_body_bytes = parse_or(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES", 64 * 1024usize)?;

        Ok(ServiceConfig {
            bind_addr,
            backend,
            database_url,
            max_connections,
            entity_schema: get("ENTITY_SCHEMA").unwrap_or_else(|| "books".into()),
            schema_path: get("SCHEMA_PATH").map(PathBuf::from),
            seed_sample_data,
            max_body_bytes,
        })
    }

    /// The active schema config: `SCHEMA_PATH` wins over `ENTITY_SCHEMA`.
    pub fn schema_config(&self) -> Result<SchemaConfig, ConfigError> {
        match &self.schema_path {
            Some(path) => load_schema_file(path),
            None => builtin(&self.entity_schema),
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.parse().map_err(|e| ConfigError::Load(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServiceConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.backend, StoreBackend::Memory);
        assert_eq!(cfg.entity_schema, "books");
        assert!(cfg.seed_sample_data);
        assert_eq!(cfg.max_body_bytes, 65536);
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(matches!(from_pairs(&[("RECORD_STORE", "postgres")]), Err(ConfigError::Load(_))));
        let cfg = from_pairs(&[
            ("RECORD_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/library"),
        ])
        .unwrap();
        assert_eq!(cfg.backend, StoreBackend::Postgres);
        assert!(!cfg.seed_sample_data);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(from_pairs(&[("RECORD_STORE", "mysql")]).is_err());
        assert!(from_pairs(&[("BIND_ADDR", "nowhere")]).is_err());
        assert!(from_pairs(&[("MAX_BODY_BYTES", "lots")]).is_err());
        assert!(from_pairs(&[("SEED_SAMPLE_DATA", "maybe")]).is_err());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg = from_pairs(&[("ENTITY_SCHEMA", "  "), ("SEED_SAMPLE_DATA", "")]).unwrap();
        assert_eq!(cfg.entity_schema, "books");
        assert!(cfg.seed_sample_data);
    }

    #[test]
    fn schema_config_uses_builtin_kind() {
        let cfg = from_pairs(&[("ENTITY_SCHEMA", "students"), ("SEED_SAMPLE_DATA", "off")]).unwrap();
        assert!(!cfg.seed_sample_data);
        assert_eq!(cfg.schema_config().unwrap().path_segment, "students");
    }
}
