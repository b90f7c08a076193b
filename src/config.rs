use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Files larger than this are left out of the index (REPOQUERY_MAX_FILE_BYTES)
    pub max_file_bytes: u64,

    /// Walk files ignored by .gitignore as well (REPOQUERY_NO_IGNORE)
    pub no_ignore: bool,

    /// Maximum search text length in bytes (REPOQUERY_PATTERN_MAX_LENGTH)
    pub pattern_max_length: usize,

    /// Compiled regex size limit in bytes (REPOQUERY_REGEX_SIZE_LIMIT)
    pub regex_size_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_bytes: 2 * 1024 * 1024,
            no_ignore: false,
            pattern_max_length: 10_000,
            regex_size_limit: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();
        override_from_env("REPOQUERY_MAX_FILE_BYTES", &mut config.max_file_bytes, parse_number);
        override_from_env("REPOQUERY_NO_IGNORE", &mut config.no_ignore, parse_flag);
        override_from_env(
            "REPOQUERY_PATTERN_MAX_LENGTH",
            &mut config.pattern_max_length,
            parse_number,
        );
        override_from_env(
            "REPOQUERY_REGEX_SIZE_LIMIT",
            &mut config.regex_size_limit,
            parse_number,
        );
        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

fn override_from_env<T: Display>(name: &str, slot: &mut T, parse: fn(&str) -> Option<T>) {
    let Ok(val) = env::var(name) else {
        return;
    };
    match parse(&val) {
        Some(parsed) => *slot = parsed,
        None => tracing::warn!("invalid {name} value: {val}, using default: {slot}"),
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
