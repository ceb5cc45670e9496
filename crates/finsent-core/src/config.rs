use std::path::PathBuf;

use crate::ConfigError;

/// Application configuration, read from `FINSENT_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the model gateway (embed / classify / chat endpoints).
    pub gateway_url: String,
    /// On-disk directory for the persistent vector store.
    pub data_dir: PathBuf,
    /// Local mirror of the batch bucket; `None` disables remote sync.
    pub bucket_dir: Option<PathBuf>,
    /// Partition prefix that batch files live under.
    pub batch_prefix: String,
    /// Entity names scanned for when extracting tickers.
    pub watchlist: Vec<String>,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub classify_max_retries: u32,
    pub classify_backoff_base_ms: u64,
    pub rag_top_k: usize,
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let gateway_url = require("FINSENT_GATEWAY_URL")?;

    let data_dir = PathBuf::from(or_default("FINSENT_DATA_DIR", "./finsent_data"));
    let bucket_dir = lookup("FINSENT_BUCKET_DIR").ok().map(PathBuf::from);
    let batch_prefix = or_default("FINSENT_BATCH_PREFIX", "tweets/");
    let watchlist = parse_watchlist(&or_default("FINSENT_WATCHLIST", "BBVA"));
    let log_level = or_default("FINSENT_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("FINSENT_REQUEST_TIMEOUT_SECS", "30")?;
    let classify_max_retries = parse_u32("FINSENT_CLASSIFY_MAX_RETRIES", "5")?;
    let classify_backoff_base_ms = parse_u64("FINSENT_CLASSIFY_BACKOFF_BASE_MS", "1000")?;
    let rag_top_k = parse_usize("FINSENT_RAG_TOP_K", "30")?;

    Ok(AppConfig {
        gateway_url,
        data_dir,
        bucket_dir,
        batch_prefix,
        watchlist,
        log_level,
        request_timeout_secs,
        classify_max_retries,
        classify_backoff_base_ms,
        rag_top_k,
    })
}

/// Parse a comma-separated watchlist, dropping empty entries.
fn parse_watchlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("FINSENT_GATEWAY_URL", "http://localhost:8080");
        m
    }

    #[test]
    fn fails_without_gateway_url() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "FINSENT_GATEWAY_URL"),
            "expected MissingEnvVar(FINSENT_GATEWAY_URL), got: {result:?}"
        );
    }

    #[test]
    fn succeeds_with_defaults() {
        let map = full_env();
        let config = build_app_config(lookup_from_map(&map)).expect("config should build");
        assert_eq!(config.gateway_url, "http://localhost:8080");
        assert_eq!(config.data_dir, PathBuf::from("./finsent_data"));
        assert!(config.bucket_dir.is_none());
        assert_eq!(config.batch_prefix, "tweets/");
        assert_eq!(config.watchlist, vec!["BBVA".to_string()]);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.classify_max_retries, 5);
        assert_eq!(config.classify_backoff_base_ms, 1000);
        assert_eq!(config.rag_top_k, 30);
    }

    #[test]
    fn parses_multi_entry_watchlist() {
        let mut map = full_env();
        map.insert("FINSENT_WATCHLIST", "BBVA, SAN,,ITX ");
        let config = build_app_config(lookup_from_map(&map)).expect("config should build");
        assert_eq!(
            config.watchlist,
            vec!["BBVA".to_string(), "SAN".to_string(), "ITX".to_string()]
        );
    }

    #[test]
    fn rejects_invalid_top_k() {
        let mut map = full_env();
        map.insert("FINSENT_RAG_TOP_K", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FINSENT_RAG_TOP_K"),
            "expected InvalidEnvVar(FINSENT_RAG_TOP_K), got: {result:?}"
        );
    }

    #[test]
    fn bucket_dir_is_read_when_set() {
        let mut map = full_env();
        map.insert("FINSENT_BUCKET_DIR", "/mnt/bucket");
        let config = build_app_config(lookup_from_map(&map)).expect("config should build");
        assert_eq!(config.bucket_dir, Some(PathBuf::from("/mnt/bucket")));
    }
}
