use clap::{Args, Parser, Subcommand, ValueEnum};
use panteon_core::{GenerationMode, Pact, PlayerColor, PlayerEntry};
use std::path::PathBuf;

/// Table companion for Panteón game nights.
#[derive(Debug, Parser)]
#[command(name = "panteon", version, about = "Panteón session keeper")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Session file (defaults to $PANTEON_STORE, then ~/.panteon_session.json)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Directory with catalog JSON files (defaults to the built-in catalogs)
    #[arg(long, global = true)]
    pub assets: Option<PathBuf>,

    /// Seed for pact deals and draws
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register the players of a new game night
    Setup(SetupArgs),
    /// List or edit the registered players
    Players {
        #[command(subcommand)]
        action: Option<PlayersAction>,
    },
    /// Start play with the registered roster
    Start,
    /// Change a player's relics, plagues or powers
    Stat {
        player: String,
        counter: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Draw from the minigame or oracle deck
    Draw {
        deck: String,
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Restrict minigame draws to some categories (no arguments clears it)
    Filter { categories: Vec<String> },
    /// Record and edit minigame results
    Minigame {
        #[command(subcommand)]
        action: MinigameAction,
    },
    /// Mention a player in a vote category
    Vote { category: String, player: String },
    /// Drop every vote of one category
    ClearVotes { category: String },
    /// Close the game and compute final scores
    Finish,
    /// Show the final leaderboard and honors
    Results,
    /// Show phase, counters and deck progress
    Status,
    /// Forget players, counters and results; deck progress is kept
    Reset,
}

#[derive(Debug, Args)]
pub struct SetupArgs {
    #[arg(long, value_enum, default_value_t = ModeArg::Balanced)]
    pub mode: ModeArg,

    /// NAME:COLOR or NAME:COLOR:PACT (the pact is only used in strategic mode)
    #[arg(short, long = "player", value_parser = parse_entry, required = true)]
    pub players: Vec<PlayerEntry>,
}

#[derive(Debug, Subcommand)]
pub enum PlayersAction {
    List {
        /// Also show secret pacts
        #[arg(long)]
        reveal: bool,
    },
    Rename { player: String, name: String },
    Recolor { player: String, color: String },
    Pact { player: String, pact: String },
    Remove { player: String },
    /// Deal new random pacts to everyone
    Reroll {
        #[arg(long, value_enum, default_value_t = ModeArg::Balanced)]
        mode: ModeArg,
    },
}

#[derive(Debug, Subcommand)]
pub enum MinigameAction {
    /// Record a finished minigame and its winners
    Add { winners: Vec<String> },
    Delete { id: String },
    /// Replace the winners of a recorded minigame
    Winners { id: String, winners: Vec<String> },
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Balanced,
    Chaotic,
    Strategic,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Balanced => GenerationMode::Balanced,
            ModeArg::Chaotic => GenerationMode::Chaotic,
            ModeArg::Strategic => GenerationMode::Strategic,
        }
    }
}

fn parse_entry(raw: &str) -> Result<PlayerEntry, String> {
    let mut parts = raw.split(':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(format!("missing player name in '{raw}'"));
    }
    let color = parts
        .next()
        .ok_or_else(|| format!("missing color in '{raw}'"))?;
    let color = PlayerColor::from_id(color).ok_or_else(|| format!("unknown color '{color}'"))?;
    let mut entry = PlayerEntry::new(name, color);
    if let Some(pact) = parts.next() {
        let pact = Pact::from_id(pact).ok_or_else(|| format!("unknown pact '{pact}'"))?;
        entry = entry.with_pact(pact);
    }
    if parts.next().is_some() {
        return Err(format!("too many fields in '{raw}'"));
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn setup_parses_player_entries() {
        let cli = Cli::try_parse_from([
            "panteon",
            "setup",
            "--mode",
            "strategic",
            "-p",
            "Ana:red:atenea",
            "-p",
            "Bruno:blue:loki",
        ])
        .expect("cli should parse");
        let Commands::Setup(args) = cli.command else {
            panic!("expected setup");
        };
        assert_eq!(args.mode, ModeArg::Strategic);
        assert_eq!(args.players.len(), 2);
        assert_eq!(args.players[1].pact, Some(Pact::Loki));
        assert_eq!(args.players[0].color, PlayerColor::Red);
    }

    #[test]
    fn bad_player_entries_are_rejected() {
        for raw in ["Ana", ":red", "Ana:teal", "Ana:red:zeus", "Ana:red:loki:x"] {
            assert!(parse_entry(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn stat_accepts_negative_delta() {
        let cli = Cli::try_parse_from(["panteon", "stat", "Ana", "plagues", "-1"])
            .expect("cli should parse");
        assert!(matches!(cli.command, Commands::Stat { delta: -1, .. }));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["panteon", "results", "--store", "/tmp/s.json", "-q"])
            .expect("cli should parse");
        assert!(cli.quiet);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s.json")));
    }
}
