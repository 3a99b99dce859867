//! Knockout bracket: construction, placement rules and advancement.
//!
//! ## Overview
//!
//! - [`BracketBuilder`] sizes the bracket to the next power of two, lays out
//!   BYEs from [`BYE_TABLE`] and draws qualifiers into seed positions.
//! - [`placement`] holds the hard and soft placement rules, also used for
//!   manual slot assignment.
//! - [`advancement`] records results, moves winners forward (running BYE
//!   chains to a fixpoint) and rolls results back.
//!
//! Every round is materialized when the bracket is built, so each match
//! always knows the slot it feeds.

pub mod advancement;
pub mod builder;
pub mod byes;
pub mod models;
pub mod placement;

pub use advancement::AdvancementEvent;
pub use builder::BracketBuilder;
pub use byes::{BYE_TABLE, bracket_size, bye_slots, seeding_order};
pub use models::{Bracket, BracketRound, BracketSlot, Qualifier, SlotOccupant};
pub use placement::{check_slot, half_of, quarter_of};
