//! Group stage: seeded group formation and round-robin fixtures.
//!
//! Entrants are ordered by ranking score, split into groups of three and four
//! and dealt across groups in serpentine order so group strength is
//! balanced. Each group then gets a full round robin.
//!
//! ## Example
//!
//! ```
//! use ettem::groups::{FixtureGenerator, GroupFormer};
//! use ettem::entities::{Entrant, MatchFormat};
//!
//! let mut entrants: Vec<Entrant> = (1..=8)
//!     .map(|id| Entrant {
//!         id,
//!         name: format!("Player {id}"),
//!         country: "ESP".to_string(),
//!         rank_score: 1000.0 - id as f64,
//!         group: None,
//!         seed: None,
//!     })
//!     .collect();
//!
//! let groups = GroupFormer::new(4).form("U13", &mut entrants, 1).unwrap();
//! assert_eq!(groups[0].entrants, vec![1, 4, 5, 8]);
//!
//! let mut next_id = 1;
//! let fixtures = FixtureGenerator::new(MatchFormat::BestOf5).generate(&groups[0], &mut next_id);
//! assert_eq!(fixtures.len(), 6);
//! ```

pub mod fixtures;
pub mod former;

pub use fixtures::{FixtureGenerator, circle_rounds};
pub use former::{GroupFormer, group_sizes, ranking_order, snake_assignment};
