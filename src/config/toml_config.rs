use crate::adapters::LabwareRules;
use crate::core::validators::{PatternBarcodeValidator, RequiredBarcodeValidator};
use crate::domain::model::{SelectableFilter, SelectionMode};
use crate::domain::ports::BarcodeValidator;
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::{self, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

static ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern"));

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    pub lookup: LookupConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub barcode_pattern: Option<String>,
    pub barcode_pattern_message: Option<String>,
    pub location_prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Inventory,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    pub source: LookupSource,
    pub inventory_path: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    pub allowed_labware_types: Option<Vec<String>>,
    pub max_labware: Option<usize>,
    pub require_samples: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub selectable: SelectableFilter,
    #[serde(default)]
    pub mode: SelectionMode,
}

impl ConsoleConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConsoleError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ConsoleError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(pattern) = &self.scanner.barcode_pattern {
            validation::validate_pattern("scanner.barcode_pattern", pattern)?;
        }
        if let Some(prefix) = &self.scanner.location_prefix {
            validation::validate_non_empty_string("scanner.location_prefix", prefix)?;
        }

        match self.lookup.source {
            LookupSource::Inventory => {
                let path = validation::validate_required_field(
                    "lookup.inventory_path",
                    &self.lookup.inventory_path,
                )?;
                validation::validate_path("lookup.inventory_path", path)?;
                validation::validate_file_extension("lookup.inventory_path", path, &["csv"])?;
            }
            LookupSource::Http => {
                let endpoint =
                    validation::validate_required_field("lookup.endpoint", &self.lookup.endpoint)?;
                validation::validate_url("lookup.endpoint", endpoint)?;
                if self.scanner.location_prefix.is_some() {
                    return Err(ConsoleError::ConfigValidationError {
                        field: "scanner.location_prefix".to_string(),
                        message: "Location scans need the inventory lookup source".to_string(),
                    });
                }
            }
        }

        if let Some(timeout) = self.lookup.timeout_seconds {
            validation::validate_range("lookup.timeout_seconds", timeout, 1, 300)?;
        }

        if let Some(max) = self.rules.max_labware {
            validation::validate_range("rules.max_labware", max, 1, 1000)?;
        }

        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn barcode_validator(&self) -> Result<Arc<dyn BarcodeValidator>> {
        let Some(pattern) = &self.scanner.barcode_pattern else {
            return Ok(Arc::new(RequiredBarcodeValidator));
        };

        let regex = Regex::new(pattern).map_err(|e| ConsoleError::InvalidConfigValueError {
            field: "scanner.barcode_pattern".to_string(),
            value: pattern.clone(),
            reason: format!("Invalid regular expression: {}", e),
        })?;

        let mut validator = PatternBarcodeValidator::new(regex);
        if let Some(message) = &self.scanner.barcode_pattern_message {
            validator = validator.with_message(message.clone());
        }
        Ok(Arc::new(validator))
    }

    pub fn labware_rules(&self) -> LabwareRules {
        LabwareRules {
            allowed_types: self.rules.allowed_labware_types.clone().unwrap_or_default(),
            max_labware: self.rules.max_labware,
            require_samples: self.rules.require_samples.unwrap_or(false),
        }
    }
}

impl Validate for ConsoleConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
