//! Bot configuration
//!
//! Loaded from TOML, validated after parse. Only deployment-level settings
//! live here; per-tenant branding and catalogs come from the record store,
//! with `[tenant_defaults]` filling the gaps for tenants that have not
//! configured theirs yet.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotConfig {
    pub bot: BotSection,
    #[serde(default)]
    pub tenant_defaults: TenantDefaults,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub health: HealthSection,
}

/// Deployment identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotSection {
    /// Instance identifier (must match [a-zA-Z0-9._-]+)
    pub id: String,
}

/// Fallback branding for tenants without their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenantDefaults {
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    /// Comma-separated, same format as the tenant sheet column.
    #[serde(default = "default_property_types")]
    pub property_types: String,
}

impl Default for TenantDefaults {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            company_name: default_company_name(),
            property_types: default_property_types(),
        }
    }
}

fn default_bot_name() -> String {
    "Assistant".to_string()
}

fn default_company_name() -> String {
    "our agency".to_string()
}

fn default_property_types() -> String {
    "Buy, Rent, Land".to_string()
}

/// Viewing-slot generation window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulingConfig {
    /// Days ahead to offer, counting from today.
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
    /// First slot starts at this local hour.
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u8,
    /// Last slot ends by this local hour.
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: u8,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    /// Tenant-local fixed offset from UTC, in whole hours.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i8,
    #[serde(default = "default_skip_weekends")]
    pub skip_weekends: bool,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            days_ahead: default_days_ahead(),
            day_start_hour: default_day_start_hour(),
            day_end_hour: default_day_end_hour(),
            slot_minutes: default_slot_minutes(),
            utc_offset_hours: default_utc_offset_hours(),
            skip_weekends: default_skip_weekends(),
        }
    }
}

fn default_days_ahead() -> u32 {
    5
}

fn default_day_start_hour() -> u8 {
    9
}

fn default_day_end_hour() -> u8 {
    17
}

fn default_slot_minutes() -> u32 {
    60
}

fn default_utc_offset_hours() -> i8 {
    3
}

fn default_skip_weekends() -> bool {
    true
}

/// Tenant-cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSection {
    /// How long a tenant profile stays fresh before the next message
    /// reloads it.
    #[serde(default = "default_tenant_ttl_secs")]
    pub tenant_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            tenant_ttl_secs: default_tenant_ttl_secs(),
        }
    }
}

fn default_tenant_ttl_secs() -> u64 {
    300
}

/// Health endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthSection {
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            port: default_health_port(),
        }
    }
}

fn default_health_port() -> u16 {
    8080
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid bot ID format: {0}")]
    InvalidBotId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BotConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: BotConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and formats after parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bot_id(&self.bot.id)?;

        let s = &self.scheduling;
        if s.days_ahead == 0 || s.days_ahead > 30 {
            return Err(ConfigError::InvalidConfig(
                "scheduling.days_ahead must be between 1 and 30".to_string(),
            ));
        }
        if s.day_start_hour >= s.day_end_hour || s.day_end_hour > 24 {
            return Err(ConfigError::InvalidConfig(
                "scheduling hours must satisfy start < end <= 24".to_string(),
            ));
        }
        if !(15..=240).contains(&s.slot_minutes) {
            return Err(ConfigError::InvalidConfig(
                "scheduling.slot_minutes must be between 15 and 240".to_string(),
            ));
        }
        if !(-12..=14).contains(&s.utc_offset_hours) {
            return Err(ConfigError::InvalidConfig(
                "scheduling.utc_offset_hours must be between -12 and 14".to_string(),
            ));
        }
        if self.cache.tenant_ttl_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "cache.tenant_ttl_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[bot]
id = "test-bot"

[tenant_defaults]
bot_name = "Kezia"
company_name = "Acme Homes"
property_types = "Buy, Rent, Land"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Validate the instance id format.
fn validate_bot_id(bot_id: &str) -> Result<(), ConfigError> {
    let valid_chars = bot_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if bot_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidBotId(format!(
            "Bot ID '{bot_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
