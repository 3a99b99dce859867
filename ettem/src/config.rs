//! Competition configuration models.

use serde::{Deserialize, Serialize};

use crate::entities::MatchFormat;
use crate::errors::ConfigurationError;

/// Per-category competition configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Preferred group size (3 or 4)
    pub group_size_preference: u8,

    /// Entrants advancing from each group to the bracket (1, 2 or 3)
    pub qualifiers_per_group: u8,

    /// Seed for the deterministic bracket draw
    pub random_seed: u64,

    /// Format of round-robin matches
    pub group_format: MatchFormat,

    /// Format of knockout matches
    pub knockout_format: MatchFormat,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            group_size_preference: 4,
            qualifiers_per_group: 2,
            random_seed: 42,
            group_format: MatchFormat::BestOf5,
            knockout_format: MatchFormat::BestOf5,
        }
    }
}

impl CompetitionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !matches!(self.group_size_preference, 3 | 4) {
            return Err(ConfigurationError::InvalidGroupSize(
                self.group_size_preference,
            ));
        }

        if !(1..=3).contains(&self.qualifiers_per_group) {
            return Err(ConfigurationError::InvalidQualifiers(
                self.qualifiers_per_group,
            ));
        }

        Ok(())
    }

    /// Builder-style seed override
    pub fn with_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Builder-style qualifier override
    pub fn with_qualifiers(mut self, qualifiers_per_group: u8) -> Self {
        self.qualifiers_per_group = qualifiers_per_group;
        self
    }

    /// Builder-style group size override
    pub fn with_group_size(mut self, group_size_preference: u8) -> Self {
        self.group_size_preference = group_size_preference;
        self
    }
}
