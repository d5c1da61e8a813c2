use crate::core::db::procedure::ProcedureCatalog;
use crate::core::db::sqlite::SqliteProvider;
use crate::core::{CrudError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Environment variable holding the database endpoint.
pub const URL_VAR: &str = "DB_URL";
/// Environment variable holding the database user.
pub const USER_VAR: &str = "DB_USER";
/// Environment variable holding the database password.
pub const PASS_VAR: &str = "DB_PASS";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Procedure name to SQL body, for drivers without stored procedures.
    #[serde(default)]
    pub procedures: HashMap<String, String>,
}

impl Config {
    /// Builds a provider carrying this configuration's procedure catalog.
    pub fn provider(&self) -> SqliteProvider {
        SqliteProvider::new(self.database.clone())
            .with_procedures(ProcedureCatalog::from(self.procedures.clone()))
    }
}

/// Credentials used by the connection provider.
///
/// `url` accepts `sqlite://<path>`, `sqlite:<path>` or a bare path. All
/// three fields are mandatory.
///
/// `:memory:` is rejected: the provider opens a new connection for every
/// operation, and each in-memory connection starts from an empty database.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        DatabaseConfig {
            url: url.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// Reads `DB_URL`, `DB_USER` and `DB_PASS` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the three credentials through `lookup`, failing with every
    /// missing variable named.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_VAR);
        let user = lookup(USER_VAR);
        let password = lookup(PASS_VAR);

        match (url, user, password) {
            (Some(url), Some(user), Some(password)) => Ok(DatabaseConfig {
                url,
                user,
                password,
            }),
            (url, user, password) => {
                let missing: Vec<&str> = [
                    (URL_VAR, url.is_none()),
                    (USER_VAR, user.is_none()),
                    (PASS_VAR, password.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| *name)
                .collect();
                Err(CrudError::Config(format!(
                    "Database configuration missing. Please set {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Checks that no credential is blank and that `url` names a database
    /// that outlives a single connection.
    pub fn validate(&self) -> Result<()> {
        let blank: Vec<&str> = [
            ("url", &self.url),
            ("user", &self.user),
            ("password", &self.password),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !blank.is_empty() {
            return Err(CrudError::Config(format!(
                "Database configuration incomplete: {} must not be empty",
                blank.join(", ")
            )));
        }
        if self.database_path() == ":memory:" {
            return Err(CrudError::Config(
                "In-memory databases are not supported: each operation opens a new connection"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The filesystem path named by `url`.
    pub fn database_path(&self) -> &str {
        let url = self.url.trim();
        url.strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = dbcrud::config::load_config("dbcrud.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.database.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CONFIG: &str = r#"
[database]
url = "sqlite://app.db"
user = "app"
password = "secret"

[procedures]
deactivate_user = "UPDATE users SET active = 0 WHERE id = ?"
count_users = "SELECT COUNT(*) AS total FROM users"
"#;

    #[test]
    fn test_load_config_from_str() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.database.url, "sqlite://app.db");
        assert_eq!(config.database.database_path(), "app.db");
        assert_eq!(config.database.user, "app");
        assert_eq!(config.procedures.len(), 2);
        assert_eq!(
            config.procedures.get("count_users").unwrap(),
            "SELECT COUNT(*) AS total FROM users"
        );
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.provider().config().user, "app");
    }

    #[test]
    fn test_load_config_errors() {
        match load_config("/nonexistent/dbcrud.toml") {
            Err(CrudError::Io(_)) => {}
            other => panic!("Expected Io error, got {:?}", other),
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[database]\nurl = 1\n").unwrap();
        match load_config(file.path()) {
            Err(CrudError::Toml(_)) => {}
            other => panic!("Expected Toml error, got {:?}", other),
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[database]\nurl = \"app.db\"\nuser = \"\"\npassword = \"x\"\n")
            .unwrap();
        match load_config(file.path()) {
            Err(CrudError::Config(msg)) => assert!(msg.contains("user")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("DB_URL", "sqlite://app.db"),
            ("DB_USER", "app"),
            ("DB_PASS", "pw"),
        ]
        .into_iter()
        .collect();
        let config =
            DatabaseConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.database_path(), "app.db");

        let err = DatabaseConfig::from_lookup(|name| {
            if name == URL_VAR { Some("app.db".to_string()) } else { None }
        })
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("DB_USER") && msg.contains("DB_PASS"));
        assert!(!msg.contains("DB_URL"));
    }

    #[test]
    fn test_database_path_forms() {
        let config = DatabaseConfig::new("sqlite:data/app.db", "u", "p");
        assert_eq!(config.database_path(), "data/app.db");
        let config = DatabaseConfig::new("/var/db/app.db", "u", "p");
        assert_eq!(config.database_path(), "/var/db/app.db");
    }

    #[test]
    fn test_validate_rejects_in_memory_database() {
        for url in [":memory:", "sqlite://:memory:", "sqlite::memory:", " :memory: "] {
            match DatabaseConfig::new(url, "app", "secret").validate() {
                Err(CrudError::Config(msg)) => assert!(msg.contains("In-memory")),
                other => panic!("Expected Config error for {}, got {:?}", url, other),
            }
        }
        assert!(DatabaseConfig::new("sqlite://app.db", "app", "secret").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DatabaseConfig::new("app.db", "app", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("app"));
        assert!(!rendered.contains("hunter2"));
    }
}
