//! # ettem
//!
//! A competition engine for table tennis tournaments (and any other
//! round-robin-then-knockout format): seeded group formation, round-robin
//! fixtures, standings with cascading tie-breaks, and knockout brackets with
//! seeded placement, BYEs and automatic advancement.
//!
//! ## Architecture
//!
//! A category flows through the engine stages in order:
//!
//! - **GroupFormer**: ranks entrants and deals them into groups of 3 and 4
//!   in serpentine order
//! - **FixtureGenerator**: round robin per group (circle method)
//! - **StandingsCalculator**: group tables, ties resolved among the tied
//!   entrants only
//! - **BracketBuilder**: power-of-two bracket, BYE table and seeded draw
//! - **Advancement**: winners move forward, BYE chains resolve to a
//!   fixpoint, results roll back when nothing downstream was played
//!
//! ## Core Modules
//!
//! - [`manager`]: [`CompetitionManager`], the thread-safe category registry
//! - [`category`]: one category's state and operations
//! - [`groups`], [`standings`], [`bracket`]: the engine stages
//! - [`results`]: result submissions and ITTF score validation
//! - [`errors`]: validation, consistency and configuration errors
//!
//! ## Example
//!
//! ```
//! use ettem::{CompetitionConfig, CompetitionManager, MatchOutcome, NewEntrant};
//!
//! let manager = CompetitionManager::new();
//! manager.create_category("U13", CompetitionConfig::default()).unwrap();
//! for (name, score) in [("Ana", 900.0), ("Bo", 800.0), ("Cy", 700.0), ("Di", 600.0)] {
//!     manager.register_entrant("U13", NewEntrant::new(name, "ESP", score)).unwrap();
//! }
//!
//! let groups = manager.form_groups("U13").unwrap();
//! let fixtures = manager.fixtures("U13", groups[0].id).unwrap();
//! assert_eq!(fixtures.len(), 6);
//!
//! let first = &fixtures[0];
//! manager
//!     .record_result("U13", first.id, &MatchOutcome::scored(vec![(11, 7), (11, 8), (11, 9)]))
//!     .unwrap();
//! ```

/// Bracket construction, placement rules and advancement.
pub mod bracket;
pub use bracket::{AdvancementEvent, Bracket, BracketBuilder, Qualifier, SlotOccupant};

/// Per-category state.
pub mod category;
pub use category::Category;

/// Competition configuration.
pub mod config;
pub use config::CompetitionConfig;

/// Core entities.
pub mod entities;
pub use entities::{
    CategoryId, Entrant, EntrantId, Group, GroupId, Match, MatchContext, MatchFormat, MatchId,
    MatchStatus, NewEntrant, RoundType, SetResult,
};

/// Engine errors.
pub mod errors;
pub use errors::{
    ConfigurationError, ConsistencyError, EngineError, EngineResult, ValidationError,
};

pub mod groups;

/// Category registry.
pub mod manager;
pub use manager::{CategorySnapshot, CompetitionManager, GroupSnapshot};

pub mod results;
pub use results::MatchOutcome;

pub mod standings;
pub use standings::{StandingEntry, TiebreakCriterion};
