//! Plain-text reports and JSON export.

use chrono::{DateTime, Utc};
use ettem::bracket::Bracket;
use ettem::standings::StandingEntry;
use ettem::{AdvancementEvent, CategorySnapshot, MatchContext};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use crate::input::Roster;

/// Snapshot file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export {
    pub generated_at: DateTime<Utc>,
    pub snapshot: CategorySnapshot,
}

impl Export {
    pub fn new(snapshot: CategorySnapshot) -> Self {
        Self {
            generated_at: Utc::now(),
            snapshot,
        }
    }

    /// Write as pretty JSON
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Groups with members and fixtures
pub fn render_groups(snapshot: &CategorySnapshot, roster: &Roster) -> String {
    let mut out = String::new();
    for group in &snapshot.groups {
        let _ = writeln!(out, "Group {} ({} entrants)", group.group.name, group.group.size());
        for &id in &group.group.entrants {
            let seed = snapshot
                .entrants
                .iter()
                .find(|e| e.id == id)
                .and_then(|e| e.seed)
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            let _ = writeln!(out, "  [{seed:>3}] {}", roster.name(id));
        }

        for fixture in &group.fixtures {
            let round = match fixture.context {
                MatchContext::Group { round, .. } => round,
                MatchContext::Knockout { round, .. } => round,
            };
            let _ = writeln!(
                out,
                "  R{round} #{:<4} {} vs {}  {}",
                fixture.id,
                fixture.entrant_a.map_or_else(String::new, |id| roster.name(id)),
                fixture.entrant_b.map_or_else(String::new, |id| roster.name(id)),
                fixture.score_line()
            );
        }
        out.push('\n');
    }
    out
}

fn standings_row(entry: &StandingEntry, roster: &Roster) -> String {
    let mut row = format!(
        "  {:>2}. {:<24} {:>2} {:>2}-{:<2} {:>3}  sets {:>2}-{:<2}  pts {:>4}-{:<4}",
        entry.position,
        roster.name(entry.entrant),
        entry.played,
        entry.wins,
        entry.losses,
        entry.tournament_points,
        entry.sets_won,
        entry.sets_lost,
        entry.points_won,
        entry.points_lost,
    );
    if let Some(tiebreak) = &entry.tiebreak {
        let _ = write!(row, "  (tie: {})", tiebreak.decided_by);
    }
    row
}

/// Group tables
pub fn render_standings(snapshot: &CategorySnapshot, roster: &Roster) -> String {
    let mut out = String::new();
    for group in &snapshot.groups {
        let _ = writeln!(out, "Group {}", group.group.name);
        let _ = writeln!(out, "   #  {:<24}  P  W-L  Pts", "Entrant");
        for entry in &group.standings {
            let _ = writeln!(out, "{}", standings_row(entry, roster));
        }
        out.push('\n');
    }
    out
}

/// Knockout bracket, round by round
pub fn render_bracket(bracket: &Bracket, roster: &Roster) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Bracket: {} slots, BYEs at {:?}", bracket.size, bracket.bye_slots());

    for round in &bracket.rounds {
        let _ = writeln!(out, "{}", round.round_type);
        for number in 1..=bracket.match_count(round.round) {
            let Some(fixture) = bracket.match_at(round.round, number) else {
                continue;
            };
            let side = |slot: usize| {
                let occupant = bracket.occupant(round.round, slot);
                let mut label = match occupant.entrant() {
                    Some(id) => roster.name(id),
                    None => occupant.to_string(),
                };
                if bracket
                    .slot(round.round, slot)
                    .is_some_and(|s| s.same_country_warning)
                {
                    label.push_str(" (!)");
                }
                label
            };

            let result = if fixture.decided_by_bye {
                "BYE".to_string()
            } else {
                fixture.score_line()
            };
            let _ = writeln!(
                out,
                "  #{:<4} {} vs {}  {}",
                fixture.id,
                side(2 * number - 1),
                side(2 * number),
                result
            );
        }
    }

    if let Some(champion) = bracket.champion() {
        let _ = writeln!(out, "\nChampion: {}", roster.name(champion));
    }
    out
}

/// One line per advancement
pub fn render_events(events: &[AdvancementEvent], roster: &Roster) -> String {
    events
        .iter()
        .map(|event| match event {
            AdvancementEvent::Advanced {
                entrant,
                round,
                slot,
                by_bye,
                ..
            } => format!(
                "{} -> round {round} slot {slot}{}",
                roster.name(*entrant),
                if *by_bye { " (BYE)" } else { "" }
            ),
            AdvancementEvent::Champion { entrant, .. } => {
                format!("{} wins the category", roster.name(*entrant))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
