pub const DEFAULT_DB_URL: &str = "sqlite://tutor.sqlite3";
pub const DEFAULT_STORAGE_KEY: &str = "default";

/// Settings read from the environment; command-line flags override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub storage_key: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let db_url = non_empty("TUTOR_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.to_string());
        let storage_key =
            non_empty("TUTOR_STORAGE_KEY").unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        let log_level = non_empty("TUTOR_LOG")
            .or_else(|| non_empty("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        Self {
            db_url,
            storage_key,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.db_url, DEFAULT_DB_URL);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn tutor_log_wins_over_rust_log() {
        let config = config_from(&[("RUST_LOG", "warn"), ("TUTOR_LOG", "debug")]);
        assert_eq!(config.log_level, "debug");

        let config = config_from(&[("RUST_LOG", "warn"), ("TUTOR_LOG", " ")]);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn reads_storage_settings() {
        let config = config_from(&[
            ("TUTOR_DB_URL", "sqlite::memory:"),
            ("TUTOR_STORAGE_KEY", "alice"),
        ]);
        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(config.storage_key, "alice");
    }
}
