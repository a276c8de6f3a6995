use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DATABASE_DIR_VAR: &str = "ACHOT_DATABASE_DIR";
pub const DRAFT_FILE_VAR: &str = "ACHOT_DRAFT_FILE";
pub const USER_VAR: &str = "ACHOT_USER";
pub const BIND_VAR: &str = "ACHOT_BIND";

const DEFAULT_DRAFT_FILE: &str = "achot-draft.bin.gz";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ACHOT_DATABASE_DIR is not set; point it at the report database directory")]
    MissingDatabase,
    #[error("ACHOT_USER is not set; reports need an owner")]
    MissingUser,
    #[error("invalid bind address {0:?}")]
    InvalidBind(String),
}

/// Runtime settings for both front ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the report database. `None` means not configured.
    pub database_dir: Option<PathBuf>,
    /// File backing the draft and preference store.
    pub draft_file: PathBuf,
    /// Owner stamped on every group and row.
    pub user: String,
    pub bind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_dir: None,
            draft_file: PathBuf::from(DEFAULT_DRAFT_FILE),
            user: String::new(),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`; blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();
        AppConfig {
            database_dir: get(DATABASE_DIR_VAR).map(PathBuf::from),
            draft_file: get(DRAFT_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.draft_file),
            user: get(USER_VAR).unwrap_or(defaults.user),
            bind: get(BIND_VAR).unwrap_or(defaults.bind),
        }
    }

    /// Apply positional command-line overrides: `[database_dir] [user]`.
    pub fn with_args(mut self, args: &[String]) -> Self {
        if let Some(dir) = args.first().filter(|a| !a.trim().is_empty()) {
            self.database_dir = Some(PathBuf::from(dir));
        }
        if let Some(user) = args.get(1).filter(|a| !a.trim().is_empty()) {
            self.user = user.trim().to_string();
        }
        self
    }

    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_dir.is_none() {
            return Err(ConfigError::MissingDatabase);
        }
        if self.user.is_empty() {
            return Err(ConfigError::MissingUser);
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_not_configured() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.validate(), Err(ConfigError::MissingDatabase));
        assert_eq!(config.bind, "127.0.0.1:3000");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = AppConfig::from_lookup(lookup(&[(DATABASE_DIR_VAR, "/tmp/db"), (USER_VAR, "  ")]));
        assert_eq!(config.validate(), Err(ConfigError::MissingUser));
    }

    #[test]
    fn args_override_environment() {
        let config = AppConfig::from_lookup(lookup(&[(DATABASE_DIR_VAR, "/tmp/db"), (USER_VAR, "ali")]))
            .with_args(&["/srv/achot".to_string(), "vali".to_string()]);
        assert_eq!(config.database_dir, Some(PathBuf::from("/srv/achot")));
        assert_eq!(config.user, "vali");
        assert!(config.is_configured());
    }

    #[test]
    fn bad_bind_is_rejected() {
        let config = AppConfig::from_lookup(lookup(&[
            (DATABASE_DIR_VAR, "/tmp/db"),
            (USER_VAR, "ali"),
            (BIND_VAR, "not-an-address"),
        ]));
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBind("not-an-address".to_string()))
        );
    }
}
