//! Configuration validation.

use super::Config;
use crate::error::{Result, SeedError};
use crate::target::SslMode;

/// Largest dimension pgvector accepts for a `vector` column.
const MAX_VECTOR_DIMENSIONS: u32 = 16_000;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let target = &config.target;

    if target.url.is_none() {
        if target.host.is_empty() {
            return Err(SeedError::Config("target.host is required (or target.url)".into()));
        }
        if target.database.is_empty() {
            return Err(SeedError::Config("target.database is required (or target.url)".into()));
        }
        if target.user.is_empty() {
            return Err(SeedError::Config("target.user is required (or target.url)".into()));
        }
        if target.port == 0 {
            return Err(SeedError::Config("target.port must be non-zero".into()));
        }
    }

    if target.schema.trim().is_empty() {
        return Err(SeedError::Config("target.schema must not be blank".into()));
    }

    SslMode::parse(&target.ssl_mode)?;

    let dims = config.seed.embedding_dimensions;
    if dims == 0 || dims > MAX_VECTOR_DIMENSIONS {
        return Err(SeedError::Config(format!(
            "seed.embedding_dimensions must be between 1 and {}, got {}",
            MAX_VECTOR_DIMENSIONS, dims
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SeedConfig, SourceConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                dir: Some("/data/csv".into()),
            },
            target: TargetConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                database: "careers".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
                schema: "public".to_string(),
                ssl_mode: "disable".to_string(),
            },
            seed: SeedConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_target_host() {
        let mut config = valid_config();
        config.target.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_url_replaces_discrete_fields() {
        let mut config = valid_config();
        config.target.host = "".to_string();
        config.target.database = "".to_string();
        config.target.url = Some("postgres://u:p@h/db".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_ssl_mode() {
        let mut config = valid_config();
        config.target.ssl_mode = "sometimes".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_embedding_dimensions_bounds() {
        let mut config = valid_config();
        config.seed.embedding_dimensions = 0;
        assert!(validate(&config).is_err());
        config.seed.embedding_dimensions = 16_001;
        assert!(validate(&config).is_err());
        config.seed.embedding_dimensions = 768;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_target_config_debug_redacts_secrets() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_456".to_string();
        config.target.url = Some("postgres://u:super_secret_url_pw@h/db".to_string());
        let debug_output = format!("{:?}", config.target);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password_456"));
        assert!(!debug_output.contains("super_secret_url_pw"));
    }
}
