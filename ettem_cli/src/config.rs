//! Command-line configuration management.
//!
//! Consolidates flag and environment variable reads and produces a validated
//! engine configuration.

use ettem::{CompetitionConfig, ConfigurationError, MatchFormat};
use std::path::PathBuf;

/// Values given on the command line; they win over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub category: Option<String>,
    pub group_size: Option<u8>,
    pub advance_per_group: Option<u8>,
    pub random_seed: Option<u64>,
    pub out: Option<PathBuf>,
}

/// Complete driver configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Tournament file to load
    pub input: PathBuf,
    /// Category to run; the file's own category when absent
    pub category: Option<String>,
    /// Engine configuration for the category
    pub competition: CompetitionConfig,
    /// Where to write the JSON snapshot, if anywhere
    pub out: Option<PathBuf>,
}

impl CliConfig {
    /// Load configuration from flags with environment fallbacks
    ///
    /// # Errors
    ///
    /// Returns error if no input file is given or a value is out of range
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_source(overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`CliConfig::from_env`] with an explicit variable source
    pub fn from_source(
        overrides: Overrides,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let input = overrides
            .input
            .or_else(|| var("ETTEM_INPUT").map(PathBuf::from))
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "ETTEM_INPUT".to_string(),
                hint: "Pass --input FILE with the tournament JSON".to_string(),
            })?;

        let defaults = CompetitionConfig::default();
        let group_size = overrides
            .group_size
            .unwrap_or_else(|| parse_var_or(&var, "ETTEM_GROUP_SIZE", defaults.group_size_preference));
        let advance = overrides.advance_per_group.unwrap_or_else(|| {
            parse_var_or(&var, "ETTEM_ADVANCE_PER_GROUP", defaults.qualifiers_per_group)
        });
        let random_seed = overrides
            .random_seed
            .unwrap_or_else(|| parse_var_or(&var, "ETTEM_RANDOM_SEED", defaults.random_seed));

        let group_format = parse_format(&var, "ETTEM_GROUP_BEST_OF", defaults.group_format)?;
        let knockout_format =
            parse_format(&var, "ETTEM_KNOCKOUT_BEST_OF", defaults.knockout_format)?;

        let config = CliConfig {
            input,
            category: overrides.category.or_else(|| var("ETTEM_CATEGORY")),
            competition: CompetitionConfig {
                group_size_preference: group_size,
                qualifiers_per_group: advance,
                random_seed,
                group_format,
                knockout_format,
            },
            out: overrides.out.or_else(|| var("ETTEM_OUT").map(PathBuf::from)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading, using the engine's own rules
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.competition.validate().map_err(|err| {
            let var = match &err {
                ConfigurationError::InvalidGroupSize(_) => "ETTEM_GROUP_SIZE",
                ConfigurationError::InvalidQualifiers(_) => "ETTEM_ADVANCE_PER_GROUP",
                _ => "competition",
            };
            ConfigError::Invalid {
                var: var.to_string(),
                reason: err.to_string(),
            }
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_var_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    var(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Best-of format from a variable; present but not 3, 5 or 7 is an error
fn parse_format(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: MatchFormat,
) -> Result<MatchFormat, ConfigError> {
    let Some(raw) = var(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<u8>()
        .ok()
        .and_then(|best_of| MatchFormat::try_from(best_of).ok())
        .ok_or_else(|| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Must be 3, 5 or 7, got {raw:?}"),
        })
}
