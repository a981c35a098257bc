/// Connection settings for the graph store
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on pooled Bolt connections
const MAX_SUPPORTED_CONNECTIONS: usize = 512;

pub const URL_ENV: &str = "NEO4J_URL";
pub const USER_ENV: &str = "NEO4J_USER";
pub const PASSWORD_ENV: &str = "NEO4J_PASSWORD";
pub const DATABASE_ENV: &str = "NEO4J_DATABASE";
pub const MAX_CONNECTIONS_ENV: &str = "NEO4J_MAX_CONNECTIONS";

/// Configuration for the Neo4j connection pool
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bolt URI, e.g. `bolt://localhost:7687`
    pub uri: String,

    pub user: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// Target database; the server default when `None`
    pub database: Option<String>,

    /// Maximum number of pooled connections
    pub max_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: None,
            max_connections: 16,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl StoreConfig {
    /// Build a configuration from the process environment, falling back to
    /// defaults for unset variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(uri) = lookup(URL_ENV) {
            config.uri = uri;
        }
        if let Some(user) = lookup(USER_ENV) {
            config.user = user;
        }
        if let Some(password) = lookup(PASSWORD_ENV) {
            config.password = password;
        }
        config.database = lookup(DATABASE_ENV).filter(|db| !db.trim().is_empty());
        if let Some(max) = lookup(MAX_CONNECTIONS_ENV) {
            config.max_connections = max
                .trim()
                .parse()
                .map_err(|e| format!("{} must be a positive integer: {}", MAX_CONNECTIONS_ENV, e))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.uri.trim().is_empty() {
            return Err("uri cannot be empty".to_string());
        }

        if !self.uri.contains("://") {
            return Err(format!("uri '{}' is missing a scheme", self.uri));
        }

        if self.user.is_empty() {
            return Err("user cannot be empty".to_string());
        }

        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }

        if self.max_connections > MAX_SUPPORTED_CONNECTIONS {
            return Err(format!(
                "max_connections cannot exceed {}",
                MAX_SUPPORTED_CONNECTIONS
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.max_connections, 16);
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("NEO4J_URL", "neo4j://graph:7687"),
            ("NEO4J_USER", "writer"),
            ("NEO4J_PASSWORD", "secret"),
            ("NEO4J_DATABASE", "concepts"),
            ("NEO4J_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();

        assert_eq!(config.uri, "neo4j://graph:7687");
        assert_eq!(config.user, "writer");
        assert_eq!(config.password, "secret");
        assert_eq!(config.database.as_deref(), Some("concepts"));
        assert_eq!(config.max_connections, 4);
    }

    #[test]
    fn test_from_lookup_rejects_bad_pool_size() {
        assert!(StoreConfig::from_lookup(lookup(&[("NEO4J_MAX_CONNECTIONS", "many")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("NEO4J_MAX_CONNECTIONS", "0")])).is_err());
    }

    #[test]
    fn test_validate_rejects_uri_without_scheme() {
        let config = StoreConfig {
            uri: "localhost:7687".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = StoreConfig {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
