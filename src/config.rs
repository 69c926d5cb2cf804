use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::multisig;

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub wallet: WalletDefaults,
    pub limits: CopayerLimits,
    pub sync: SyncConfig,
    /// Application name used to filter targeted server messages.
    pub app_name: String,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the wallet service.
    pub url: String,
}

/// Pre-filled values for the create-wallet form.
#[derive(Debug, Clone)]
pub struct WalletDefaults {
    pub total_copayers: u8,
    pub required_signatures: u8,
    pub single_address: bool,
}

/// Upper bounds offered by the UI forms. The hard 1..=12 table limit still
/// applies on top of these.
#[derive(Debug, Clone)]
pub struct CopayerLimits {
    pub total_copayers: u8,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period for per-wallet status refreshes (trailing edge).
    pub status_debounce: Duration,
    /// Absorption window for full-list refreshes (leading edge).
    pub list_debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: ServiceConfig {
                url: "https://bws.bitpay.com/bws/api".to_string(),
            },
            wallet: WalletDefaults {
                total_copayers: 3,
                required_signatures: 2,
                single_address: false,
            },
            limits: CopayerLimits { total_copayers: 6 },
            sync: SyncConfig {
                status_debounce: Duration::from_secs(3),
                list_debounce: Duration::from_secs(5),
            },
            app_name: "wallet-core".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file, falling back to defaults for anything
    /// the file does not set.
    pub fn load(conf_path: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if conf_path.exists() {
            let file = fs::File::open(conf_path)
                .map_err(|e| ConfigError(format!("Failed to open config file: {}", e)))?;

            let reader = io::BufReader::new(file);
            let mut section = String::new();

            for line in reader.lines() {
                let line =
                    line.map_err(|e| ConfigError(format!("Failed to read line: {}", e)))?;
                let trimmed = line.trim();

                // Skip comments and empty lines
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }

                // Handle section headers
                if trimmed.starts_with('[') && trimmed.ends_with(']') {
                    section = trimmed[1..trimmed.len() - 1].to_string();
                    continue;
                }

                // Process key-value pairs
                if let Some(pos) = trimmed.find('=') {
                    let key = trimmed[..pos].trim();
                    let value = trimmed[pos + 1..].trim();

                    Self::apply_setting(&mut config, &section, key, value);
                }
            }
        }

        if config.wallet.total_copayers > config.limits.total_copayers
            || config.wallet.total_copayers > multisig::MAX_COPAYERS
        {
            return Err(ConfigError(format!(
                "default copayer count {} exceeds the limit",
                config.wallet.total_copayers
            )));
        }

        Ok(config)
    }

    fn apply_setting(config: &mut Config, section: &str, key: &str, value: &str) {
        match (section, key) {
            ("service", "url") | ("", "bwsurl") => {
                config.service.url = value.to_string();
            }

            ("wallet", "total_copayers") => {
                if let Ok(n) = value.parse::<u8>() {
                    config.wallet.total_copayers = n;
                }
            }
            ("wallet", "required_signatures") => {
                if let Ok(n) = value.parse::<u8>() {
                    config.wallet.required_signatures = n;
                }
            }
            ("wallet", "single_address") => {
                config.wallet.single_address = value == "1" || value.to_lowercase() == "true";
            }

            ("limits", "total_copayers") => {
                if let Ok(n) = value.parse::<u8>() {
                    config.limits.total_copayers = n;
                }
            }

            ("sync", "status_debounce_secs") => {
                if let Ok(secs) = value.parse::<u64>() {
                    config.sync.status_debounce = Duration::from_secs(secs);
                }
            }
            ("sync", "list_debounce_secs") => {
                if let Ok(secs) = value.parse::<u64>() {
                    config.sync.list_debounce = Duration::from_secs(secs);
                }
            }

            ("", "app_name") => {
                config.app_name = value.to_string();
            }

            // Ignore unknown settings
            _ => {
                log::debug!("Ignoring unknown config option: [{}] {}", section, key);
            }
        }
    }
}
