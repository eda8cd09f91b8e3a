//! # Till Configuration
//!
//! Per-terminal till settings: which drawer key belongs to this terminal,
//! the store's till policy switches, and the tender definitions that decide
//! which tenders pop the drawer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_TERMINAL_ID=register-3                                        │
//! │     TILL_FIXED_DRAWER_KEY=DRAWER-03                                    │
//! │     TILL_DISALLOW_AFTER_FINAL_SETTLEMENT=true                          │
//! │     TILL_PRINT_NO_SALE_RECEIPT=true                                    │
//! │     TILL_VAT_RECEIPT=false                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/till/till.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.titan.till/till.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no fixed key, every policy switch off, no tenders                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [terminal]
//! id = "register-3"
//! fixed_drawer_key = "DRAWER-03"
//!
//! [policy]
//! disallow_till_events_after_final_settlement = false
//! print_no_sale_receipt_required = true
//! vat_receipt = false
//!
//! [[tenders]]
//! tender_id = "cash"
//! tender_name = "Cash"
//! opens_drawer_for = ["payment", "refund", "change"]
//!
//! [[tenders]]
//! tender_id = "visa"
//! tender_name = "Visa"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use till_core::validation::{validate_drawer_key, validate_tender_definitions};
use till_core::{TenderDefinition, TenderDefinitions, TillPolicy};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Terminal Configuration
// =============================================================================

/// Identity of this terminal and the drawer bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Terminal identifier, used in log fields only.
    #[serde(default = "default_terminal_id")]
    pub id: String,

    /// Drawer key validated automatically under terminal accountability.
    #[serde(default)]
    pub fixed_drawer_key: Option<String>,
}

fn default_terminal_id() -> String {
    "terminal-1".to_string()
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            id: default_terminal_id(),
            fixed_drawer_key: None,
        }
    }
}

// =============================================================================
// Main Till Configuration
// =============================================================================

/// Complete till configuration for one terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TillConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub policy: TillPolicy,

    #[serde(default)]
    pub tenders: Vec<TenderDefinition>,
}

impl TillConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (till.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading till config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load till config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a config file without environment overrides.
    pub fn from_file(path: &Path) -> SessionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SessionResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SessionError::ConfigSaveFailed("No config path available".into()))?;

        let write_failed =
            |err: std::io::Error| SessionError::ConfigSaveFailed(format!("{}: {err}", path.display()));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(write_failed)?;

        info!(?path, "Till config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SessionResult<()> {
        if self.terminal.id.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "terminal id must not be empty".into(),
            ));
        }

        if let Some(key) = &self.terminal.fixed_drawer_key {
            validate_drawer_key(key)?;
        }

        validate_tender_definitions(&self.tender_definitions())?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("TILL_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal ID from environment");
            self.terminal.id = id;
        }

        if let Ok(key) = std::env::var("TILL_FIXED_DRAWER_KEY") {
            debug!("Overriding fixed drawer key from environment");
            self.terminal.fixed_drawer_key = Some(key).filter(|k| !k.trim().is_empty());
        }

        if let Some(on) = env_flag("TILL_DISALLOW_AFTER_FINAL_SETTLEMENT") {
            self.policy.disallow_till_events_after_final_settlement = on;
        }

        if let Some(on) = env_flag("TILL_PRINT_NO_SALE_RECEIPT") {
            self.policy.print_no_sale_receipt_required = on;
        }

        if let Some(on) = env_flag("TILL_VAT_RECEIPT") {
            self.policy.vat_receipt = on;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "titan", "till")
            .map(|dirs| dirs.config_dir().join("till.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tender_definitions(&self) -> TenderDefinitions {
        self.tenders.iter().cloned().collect()
    }

    pub fn fixed_drawer_key(&self) -> Option<&str> {
        self.terminal.fixed_drawer_key.as_deref()
    }
}

/// Reads a boolean switch; unparseable values are ignored with a warning.
fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match parse_flag(&raw) {
        Some(on) => {
            debug!(variable = name, value = on, "Overriding policy from environment");
            Some(on)
        }
        None => {
            warn!(variable = name, value = %raw, "Ignoring unrecognized boolean in environment");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
