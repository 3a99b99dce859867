//! Table tennis competition driver.
//!
//! Loads a tournament file, forms the groups, replays the recorded results
//! and prints groups, standings or the knockout bracket.

mod config;
mod input;
mod report;

use std::path::PathBuf;

use anyhow::{Error, bail};
use config::{CliConfig, Overrides};
use ettem::CompetitionManager;
use input::{TournamentFile, apply_group_results, apply_knockout_results, register_entrants};
use log::info;
use pico_args::Arguments;
use report::{Export, render_bracket, render_events, render_groups, render_standings};

const HELP: &str = "\
Run a table tennis competition from a tournament file

USAGE:
  ettem [OPTIONS] <COMMAND>

COMMANDS:
  groups                   Form groups and list their fixtures
  standings                Replay group results and print the group tables
  bracket                  Replay every result and print the knockout bracket

OPTIONS:
  --input      FILE        Tournament JSON file        [default: env ETTEM_INPUT]
  --category   NAME        Category name to use        [default: the file's category]
  --group-size N           Preferred group size, 3|4   [default: env ETTEM_GROUP_SIZE or 4]
  --advance    N           Qualifiers per group, 1..3  [default: env ETTEM_ADVANCE_PER_GROUP or 2]
  --seed       N           Draw seed                   [default: env ETTEM_RANDOM_SEED or 42]
  --out        FILE        Write a JSON snapshot       [default: env ETTEM_OUT]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  ETTEM_GROUP_BEST_OF      Group match format (3, 5 or 7)
  ETTEM_KNOCKOUT_BEST_OF   Knockout match format (3, 5 or 7)
  RUST_LOG                 Log level (e.g., info, debug)
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Groups,
    Standings,
    Bracket,
}

fn parse_command(raw: Option<String>) -> Result<Command, Error> {
    match raw.as_deref() {
        Some("groups") => Ok(Command::Groups),
        Some("standings") | None => Ok(Command::Standings),
        Some("bracket") => Ok(Command::Bracket),
        Some(other) => bail!("Unknown command {other:?}, see --help"),
    }
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        input: pargs.opt_value_from_os_str("--input", |s| {
            Ok::<PathBuf, std::convert::Infallible>(PathBuf::from(s))
        })?,
        category: pargs.opt_value_from_str("--category")?,
        group_size: pargs.opt_value_from_str("--group-size")?,
        advance_per_group: pargs.opt_value_from_str("--advance")?,
        random_seed: pargs.opt_value_from_str("--seed")?,
        out: pargs.opt_value_from_os_str("--out", |s| {
            Ok::<PathBuf, std::convert::Infallible>(PathBuf::from(s))
        })?,
    };
    let command = parse_command(pargs.subcommand()?)?;

    env_logger::builder().format_target(false).init();

    let config = CliConfig::from_env(overrides)?;
    let file = TournamentFile::load(&config.input)?;
    let category = config.category.clone().unwrap_or_else(|| file.category.clone());
    info!(
        "Running {} with {} entrants from {}",
        category,
        file.entrants.len(),
        config.input.display()
    );

    let manager = CompetitionManager::new();
    manager.create_category(&category, config.competition.clone())?;
    let roster = register_entrants(&manager, &category, &file)?;
    let groups = manager.form_groups(&category)?;
    info!("Formed {} groups", groups.len());

    if command != Command::Groups {
        let recorded = apply_group_results(&manager, &category, &file, &roster)?;
        info!("Replayed {recorded} group results");
    }

    let snapshot = manager.snapshot(&category)?;
    match command {
        Command::Groups => print!("{}", render_groups(&snapshot, &roster)),
        Command::Standings => print!("{}", render_standings(&snapshot, &roster)),
        Command::Bracket => {
            manager.build_bracket(&category)?;
            let events = apply_knockout_results(&manager, &category, &file, &roster)?;
            if !events.is_empty() {
                println!("{}\n", render_events(&events, &roster));
            }
            if let Some(bracket) = manager.bracket(&category)? {
                print!("{}", render_bracket(&bracket, &roster));
            }
        }
    }

    if let Some(path) = &config.out {
        Export::new(manager.snapshot(&category)?).write(path)?;
        info!("Snapshot written to {}", path.display());
    }

    Ok(())
}
