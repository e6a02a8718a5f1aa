use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/bararan.db?mode=rwc";
const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";
const DEFAULT_CHAT_ENDPOINT: &str = "https://api.perplexity.ai";
const DEFAULT_CHAT_MODEL: &str = "llama-3.1-sonar-small-128k-online";
const DEFAULT_DICTIONARY_ENDPOINT: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
const DEFAULT_REMINDER_SCHEDULE: &str = "0 * * * * *";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub logging: LogConfig,
    pub database_url: String,
    pub badge_store_dir: PathBuf,
    pub jwt_secret: Option<String>,
    pub translate: TranslateConfig,
    pub chat: ChatConfig,
    pub dictionary: DictionaryConfig,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    /// Daily-rolling log files go here when set.
    pub file_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct DictionaryConfig {
    pub endpoint: String,
    pub debounce: Duration,
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub schedule: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_string("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = env_string("HOST")
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let logging = LogConfig {
            level: env_string("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            file_dir: env_bool("ENABLE_FILE_LOGS")
                .unwrap_or(false)
                .then(|| PathBuf::from(env_string("LOG_DIR").unwrap_or_else(|| "./logs".to_string()))),
        };

        let database_url =
            env_string("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let badge_store_dir = env_string("BADGE_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_badge_store_dir);

        Self {
            host,
            port,
            logging,
            database_url,
            badge_store_dir,
            jwt_secret: env_string("JWT_SECRET"),
            translate: TranslateConfig {
                api_key: env_string("GOOGLE_TRANSLATE_API_KEY"),
                endpoint: env_string("TRANSLATE_API_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_TRANSLATE_ENDPOINT.to_string()),
            },
            chat: ChatConfig {
                api_key: env_string("PERPLEXITY_API_KEY"),
                endpoint: env_string("CHAT_API_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_CHAT_ENDPOINT.to_string()),
                model: env_string("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            },
            dictionary: DictionaryConfig {
                endpoint: env_string("DICTIONARY_API_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_DICTIONARY_ENDPOINT.to_string()),
                debounce: Duration::from_millis(env_u64("DICTIONARY_DEBOUNCE_MS").unwrap_or(300)),
            },
            reminders: ReminderConfig {
                enabled: env_bool("ENABLE_REMINDER_WORKER").unwrap_or(true),
                schedule: env_string("REMINDER_SCHEDULE")
                    .unwrap_or_else(|| DEFAULT_REMINDER_SCHEDULE.to_string()),
            },
        }
    }

    /// Configuration with no credentials and local-only endpoints.
    pub fn for_tests() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            logging: LogConfig {
                level: "debug".to_string(),
                file_dir: None,
            },
            database_url: "sqlite::memory:".to_string(),
            badge_store_dir: std::env::temp_dir().join("bararan-test-badges"),
            jwt_secret: None,
            translate: TranslateConfig {
                api_key: None,
                endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            },
            chat: ChatConfig {
                api_key: None,
                endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
                model: DEFAULT_CHAT_MODEL.to_string(),
            },
            dictionary: DictionaryConfig {
                endpoint: DEFAULT_DICTIONARY_ENDPOINT.to_string(),
                debounce: Duration::ZERO,
            },
            reminders: ReminderConfig {
                enabled: false,
                schedule: DEFAULT_REMINDER_SCHEDULE.to_string(),
            },
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn auth_configured(&self) -> bool {
        self.jwt_secret.is_some()
    }
}

fn default_badge_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bararan")
        .join("badges")
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.trim().parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    let value = env_string(key)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
