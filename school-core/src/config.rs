use crate::common::error::{Result, SchoolError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings shared by the GraphQL services.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    pub log_dir: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: "school.db".to_string(),
            jwt_secret: String::new(),
            jwt_ttl_seconds: 3600,
            bcrypt_cost: 10,
            log_dir: "logs".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load the optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    SchoolError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                toml::from_str(&content)?
            }
            None => Self::default(),
        };

        let config = base.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SCHOOL_DB_PATH") {
            self.database_path = path;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(ttl) = lookup("JWT_TTL_SECONDS") {
            self.jwt_ttl_seconds = ttl
                .parse()
                .map_err(|_| SchoolError::Config(format!("Invalid JWT_TTL_SECONDS: {ttl}")))?;
        }
        if let Some(cost) = lookup("BCRYPT_COST") {
            self.bcrypt_cost = cost
                .parse()
                .map_err(|_| SchoolError::Config(format!("Invalid BCRYPT_COST: {cost}")))?;
        }
        if let Some(dir) = lookup("SCHOOL_LOG_DIR") {
            self.log_dir = dir;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(SchoolError::Config("JWT_SECRET must be set".to_string()));
        }
        if self.jwt_ttl_seconds <= 0 {
            return Err(SchoolError::Config(
                "JWT_TTL_SECONDS must be positive".to_string(),
            ));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(SchoolError::Config(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }
        Ok(())
    }
}
