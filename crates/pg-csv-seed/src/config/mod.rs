//! Configuration loading, environment overlay and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{Result, SeedError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio_postgres::Config as PgConfig;

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// The result is not validated yet; callers overlay environment and
    /// command-line values first and then call [`Config::validate`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Overlay values from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from a dotenv file, then the process environment.
    ///
    /// Variables already set in the process win over the file.
    pub fn with_env_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let file_vars = read_env_file(path.as_ref())?;
        self.with_env_from(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Blank variables are treated as unset. `DATABASE_DIR` wins over
    /// `CSV_DATABASE_DIR`.
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = var("DATABASE_DIR").or_else(|| var("CSV_DATABASE_DIR")) {
            self.source.dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = var("DB_URL") {
            self.target.url = Some(url);
        }
        if let Some(host) = var("DB_HOST") {
            self.target.host = host;
        }
        if let Some(port) = var("DB_PORT") {
            self.target.port = port
                .parse()
                .map_err(|_| SeedError::Config(format!("DB_PORT must be a port number, got '{}'", port)))?;
        }
        if let Some(database) = var("DB_NAME") {
            self.target.database = database;
        }
        if let Some(user) = var("DB_USER") {
            self.target.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.target.password = password;
        }

        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Resolve the CSV directory, failing if it is unset or absent.
    ///
    /// Must be called before any connection is opened.
    pub fn csv_dir(&self) -> Result<PathBuf> {
        let dir = self.source.dir.as_ref().ok_or_else(|| {
            SeedError::Config(
                "CSV directory is required: set source.dir, DATABASE_DIR (or CSV_DATABASE_DIR), or --csv-dir"
                    .into(),
            )
        })?;

        if !dir.is_dir() {
            return Err(SeedError::SourceDirMissing(dir.clone()));
        }
        Ok(dir.canonicalize()?)
    }
}

/// Parse a dotenv file without touching the process environment.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let env_file_error = |e: dotenvy::Error| match e {
        dotenvy::Error::Io(io) => SeedError::Io(io),
        other => SeedError::Config(format!("{}: {}", path.display(), other)),
    };

    dotenvy::from_path_iter(path)
        .map_err(env_file_error)?
        .map(|item| item.map_err(env_file_error))
        .collect()
}

impl TargetConfig {
    /// Build a tokio-postgres configuration.
    pub fn pg_config(&self) -> Result<PgConfig> {
        if let Some(url) = &self.url {
            return url
                .parse::<PgConfig>()
                .map_err(|e| SeedError::Config(format!("target.url is not a valid connection string: {}", e)));
        }

        let mut pg_config = PgConfig::new();
        pg_config.host(&self.host);
        pg_config.port(self.port);
        pg_config.dbname(&self.database);
        pg_config.user(&self.user);
        pg_config.password(&self.password);
        Ok(pg_config)
    }

    /// Human-readable endpoint for log lines, never including credentials.
    pub fn describe(&self) -> String {
        match &self.url {
            Some(_) => "connection url".to_string(),
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}
