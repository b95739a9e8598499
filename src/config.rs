//! Settings loaded once at startup from `config.json`.
//!
//! The file uses upper-case keys (`FACEBOOK_EMAIL`, `CHECK_INTERVAL`, ...).
//! Everything is validated before any network activity; a bad file is a
//! [`ConfigError`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::ConfigError;

const CATEGORY_URL: &str = "https://www.facebook.com/marketplace/category";
const SEARCH_URL: &str = "https://www.facebook.com/marketplace/category/search?";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub login: Credentials,
    pub recipient: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub facebook: Credentials,
    pub mail: MailSettings,
    pub category: String,
    pub query: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub poll_interval: Duration,
    /// Listings posted at most this many minutes ago are fresh.
    pub max_minutes: u64,
    pub log_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawSettings {
    facebook_email: String,
    facebook_password: String,
    gmail_user: String,
    gmail_pass: String,
    to_email: String,
    check_interval: u64,
    #[serde(default = "default_max_minutes")]
    max_minutes: u64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    min_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_price")]
    max_price: Option<f64>,
    #[serde(default)]
    log_path: Option<String>,
    #[serde(default = "default_smtp_host")]
    smtp_host: String,
    #[serde(default = "default_smtp_port")]
    smtp_port: u16,
}

fn default_max_minutes() -> u64 {
    5
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

/// Prices may be numbers, numeric strings, or `""`/`"null"`/`null` for "no bound".
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    match Option::<RawPrice>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPrice::Number(n)) => Ok(Some(n)),
        Some(RawPrice::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                Ok(None)
            } else {
                trimmed
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| de::Error::custom(format!("invalid price {text:?}")))
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Invalid(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

fn require_address(field: &str, value: &str) -> Result<(), ConfigError> {
    value
        .parse::<lettre::Address>()
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("{field} is not a valid email address: {e}")))
}

fn format_price(price: f64) -> String {
    // 100.0 renders as "100", 99.5 as "99.5".
    format!("{}", price)
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&content, &display)
    }

    /// Parse and validate settings; `origin` names the source in error messages.
    pub fn from_json(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;

        require("FACEBOOK_EMAIL", &raw.facebook_email)?;
        require("FACEBOOK_PASSWORD", &raw.facebook_password)?;
        require("GMAIL_PASS", &raw.gmail_pass)?;
        require_address("GMAIL_USER", &raw.gmail_user)?;
        require_address("TO_EMAIL", &raw.to_email)?;
        require("SMTP_HOST", &raw.smtp_host)?;

        if raw.check_interval == 0 {
            return Err(ConfigError::Invalid("CHECK_INTERVAL must be greater than 0".to_string()));
        }

        for (field, price) in [("MIN_PRICE", raw.min_price), ("MAX_PRICE", raw.max_price)] {
            if let Some(price) = price {
                if !price.is_finite() || price < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "{field} must be a non-negative number"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (raw.min_price, raw.max_price) {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "MIN_PRICE ({min}) is greater than MAX_PRICE ({max})"
                )));
            }
        }

        let category = non_blank(raw.category).unwrap_or_else(|| "vehicles".to_string());

        Ok(Self {
            facebook: Credentials {
                user: raw.facebook_email,
                password: raw.facebook_password,
            },
            mail: MailSettings {
                login: Credentials {
                    user: raw.gmail_user,
                    password: raw.gmail_pass,
                },
                recipient: raw.to_email,
                smtp_host: raw.smtp_host,
                smtp_port: raw.smtp_port,
            },
            category: category.trim().to_string(),
            query: non_blank(raw.query),
            min_price: raw.min_price,
            max_price: raw.max_price,
            poll_interval: Duration::from_secs(raw.check_interval),
            max_minutes: raw.max_minutes,
            log_dir: non_blank(raw.log_path).map(PathBuf::from),
        })
    }

    /// The page to crawl: the plain category listing, or the search endpoint when
    /// any price or text filter is set.
    pub fn marketplace_url(&self) -> String {
        let category = urlencoding::encode(&self.category);

        if self.min_price.is_none() && self.max_price.is_none() && self.query.is_none() {
            return format!("{}/{}", CATEGORY_URL, category);
        }

        let mut params = Vec::new();
        if let Some(min) = self.min_price {
            params.push(format!("minPrice={}", format_price(min)));
        }
        if let Some(max) = self.max_price {
            params.push(format!("maxPrice={}", format_price(max)));
        }
        if let Some(query) = &self.query {
            params.push(format!("query={}", urlencoding::encode(query)));
        }
        params.push("exact=false".to_string());
        params.push(format!("category_id={}", category));

        format!("{}{}", SEARCH_URL, params.join("&"))
    }

    /// Directory for log files: `LOG_PATH` if set, else next to the executable.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(executable_dir)
    }
}

pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `config.json` next to the executable.
pub fn default_config_path() -> PathBuf {
    executable_dir().join(CONFIG_FILE_NAME)
}
