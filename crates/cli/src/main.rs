mod args;
mod file_store;
mod render;

use anyhow::{anyhow, bail, Context};
use args::{Cli, Commands, MinigameAction, PlayersAction};
use clap::Parser;
use file_store::{default_store_path, FileStore};
use panteon_core::{
    load, save, CardCategory, Counter, DeckKind, DrawOutcome, MinigameCategory, Pact, PlayerColor,
    PlayerId, RngState, Roster, Session, SessionConfig, SessionError, SessionPhase, SessionStore,
};
use panteon_data::{builtin_catalogs, load_catalogs, load_session_config};
use render::{
    format_award, format_card, format_event, format_player, format_record, format_standing,
};
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Minigame filter chosen with `panteon filter`, kept next to the session keys.
const MINIGAME_FILTER_KEY: &str = "cli_minigame_filter";

fn main() {
    if let Err(error) = run() {
        eprintln!("panteon error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let path = cli
        .store
        .clone()
        .or_else(default_store_path)
        .context("no session file: pass --store or set PANTEON_STORE")?;
    let store = FileStore::open(path);
    tracing::debug!(path = %store.path().display(), "session store opened");

    let (config, catalogs) = match &cli.assets {
        Some(dir) => (load_session_config(dir)?, load_catalogs(dir)?),
        None => (SessionConfig::default(), builtin_catalogs()?),
    };
    let filter: Option<Vec<MinigameCategory>> = load(&store, MINIGAME_FILTER_KEY);
    let rng = cli.seed.map(RngState::from_seed).unwrap_or_default();
    let mut session = Session::open(store, config, catalogs, rng)?;
    tracing::debug!(seed = session.rng.seed(), "session opened");
    if let Some(filter) = filter {
        session.set_minigame_filter(&filter);
    }

    let result = dispatch(cli.command, &mut session);
    print_events(&mut session);
    result
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("PANTEON_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn dispatch(command: Commands, session: &mut Session<FileStore>) -> anyhow::Result<()> {
    match command {
        Commands::Setup(args) => {
            let roster = session
                .register(&args.players, args.mode.into())
                .map_err(with_phase_hint)?;
            for player in roster.players() {
                println!("{}", format_player(player, None, false));
            }
        }
        Commands::Players { action } => players(session, action)?,
        Commands::Start => session.start()?,
        Commands::Stat {
            player,
            counter,
            delta,
        } => {
            let id = resolve_player(&session.roster(), &player)?;
            let counter =
                Counter::from_id(&counter).ok_or_else(|| anyhow!("unknown counter '{counter}'"))?;
            session.adjust_counter(&id, counter, delta)?;
        }
        Commands::Draw { deck, count } => {
            match DeckKind::from_id(&deck).ok_or_else(|| anyhow!("unknown deck '{deck}'"))? {
                DeckKind::Minigame => draw_cards(
                    session,
                    count,
                    Session::draw_minigame,
                    |s| s.minigames.locked_until(),
                )?,
                DeckKind::Oracle => draw_cards(
                    session,
                    count,
                    Session::draw_oracle,
                    |s| s.oracles.locked_until(),
                )?,
            }
        }
        Commands::Filter { categories } => set_minigame_filter(session, &categories)?,
        Commands::Minigame { action } => minigame(session, action)?,
        Commands::Vote { category, player } => {
            let id = resolve_player(&session.roster(), &player)?;
            let pending = session.propose_vote(&category, &id, Instant::now())?;
            thread::sleep(pending.confirm_at.saturating_duration_since(Instant::now()));
            if session.confirm_vote(Instant::now())?.is_none() {
                bail!("vote for {player} was not confirmed");
            }
        }
        Commands::ClearVotes { category } => {
            if !session.clear_votes(&category)? {
                println!("no votes recorded in {category}");
            }
        }
        Commands::Finish => {
            session.finalize()?;
            print_results(session);
        }
        Commands::Results => {
            if session.results().is_none() {
                println!("no final results yet, run `panteon finish`");
            } else {
                print_results(session);
            }
        }
        Commands::Status => print_status(session),
        Commands::Reset => session.new_session()?,
    }
    Ok(())
}

fn players(session: &mut Session<FileStore>, action: Option<PlayersAction>) -> anyhow::Result<()> {
    let roster = session.roster();
    match action.unwrap_or(PlayersAction::List { reveal: false }) {
        PlayersAction::List { reveal } => {
            if roster.is_empty() {
                println!("no players registered, run `panteon setup`");
            }
            let stats = session.stats();
            for player in roster.players() {
                println!("{}", format_player(player, stats.get(&player.id), reveal));
            }
        }
        PlayersAction::Rename { player, name } => {
            session.rename_player(&resolve_player(&roster, &player)?, &name)?
        }
        PlayersAction::Recolor { player, color } => {
            let color =
                PlayerColor::from_id(&color).ok_or_else(|| anyhow!("unknown color '{color}'"))?;
            session.recolor_player(&resolve_player(&roster, &player)?, color)?
        }
        PlayersAction::Pact { player, pact } => {
            let pact = Pact::from_id(&pact).ok_or_else(|| anyhow!("unknown pact '{pact}'"))?;
            session.set_pact(&resolve_player(&roster, &player)?, pact)?
        }
        PlayersAction::Remove { player } => {
            session.remove_player(&resolve_player(&roster, &player)?)?
        }
        PlayersAction::Reroll { mode } => session.reroll_pacts(mode.into())?,
    }
    Ok(())
}

fn minigame(session: &mut Session<FileStore>, action: MinigameAction) -> anyhow::Result<()> {
    let roster = session.roster();
    match action {
        MinigameAction::Add { winners } => {
            let winners = resolve_players(&roster, &winners)?;
            session.record_minigame(winners, unix_millis())?;
        }
        MinigameAction::Delete { id } => {
            session.delete_minigame(&id)?;
        }
        MinigameAction::Winners { id, winners } => {
            let winners = resolve_players(&roster, &winners)?;
            session.set_minigame_winners(&id, winners)?;
        }
        MinigameAction::List => {
            let history = session.history();
            if history.is_empty() {
                println!("no minigames recorded");
            }
            for record in history.records() {
                println!("{}", format_record(record, &roster));
            }
            let wins = session.log().minigames;
            for player in roster.players() {
                let count = wins.get(&player.id).copied().unwrap_or(0);
                println!("{:<14} {count} wins", player.name);
            }
        }
    }
    Ok(())
}

/// Draws until `count` cards are shown, waiting out the cooldown between
/// draws. Stops early on a reshuffle or an empty filter.
fn draw_cards<C: CardCategory>(
    session: &mut Session<FileStore>,
    count: usize,
    draw: fn(&mut Session<FileStore>, Instant) -> Result<DrawOutcome<C>, SessionError>,
    locked_until: fn(&Session<FileStore>) -> Option<Instant>,
) -> anyhow::Result<()> {
    let mut shown = 0;
    while shown < count {
        let now = Instant::now();
        match draw(session, now)? {
            DrawOutcome::Revealed(card) => {
                println!("{}", format_card(&card));
                shown += 1;
            }
            DrawOutcome::Locked => {
                if let Some(until) = locked_until(session) {
                    thread::sleep(until.saturating_duration_since(now));
                }
            }
            DrawOutcome::Reshuffled => break,
            DrawOutcome::NoCandidates => {
                println!("no {} cards match the current filter", C::DECK);
                break;
            }
        }
    }
    Ok(())
}

fn set_minigame_filter(
    session: &mut Session<FileStore>,
    categories: &[String],
) -> anyhow::Result<()> {
    if categories.is_empty() {
        session.store_mut().remove(MINIGAME_FILTER_KEY)?;
        session.set_minigame_filter(MinigameCategory::ALL);
        println!("minigame filter cleared");
        return Ok(());
    }
    let parsed = categories
        .iter()
        .map(|raw| {
            MinigameCategory::from_id(raw)
                .ok_or_else(|| anyhow!("unknown minigame category '{raw}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    save(session.store_mut(), MINIGAME_FILTER_KEY, &parsed)?;
    session.set_minigame_filter(&parsed);
    let names: Vec<&str> = parsed.iter().map(|c| c.id()).collect();
    println!("minigame filter: {}", names.join(", "));
    Ok(())
}

fn print_results(session: &Session<FileStore>) {
    let roster = session.roster();
    for standing in session.standings() {
        println!("{}", format_standing(&standing));
    }
    let awards = session.awards();
    if !awards.is_empty() {
        println!();
        for award in &awards {
            println!("{}", format_award(award, &roster));
        }
    }
}

fn print_status(session: &Session<FileStore>) {
    let roster = session.roster();
    let stats = session.stats();
    println!("phase: {:?}", session.phase());
    for player in roster.players() {
        println!("  {}", format_player(player, stats.get(&player.id), false));
    }
    println!("minigames played: {}", session.history().len());
    println!(
        "minigame deck: {} of {} left",
        session.minigames.remaining(),
        session.minigames.filtered().count()
    );
    println!(
        "oracle deck: {} of {} left",
        session.oracles.remaining(),
        session.oracles.catalog().len()
    );
    let filter: Vec<&str> = session.minigames.filter().iter().map(|c| c.id()).collect();
    println!("minigame filter: {}", filter.join(", "));
    let categories: Vec<&str> = session
        .vote_categories()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    println!("vote categories: {}", categories.join(", "));
}

fn print_events(session: &mut Session<FileStore>) {
    let roster = session.roster();
    for event in session.events.drain() {
        println!("{}", format_event(&event, &roster));
    }
}

fn resolve_player(roster: &Roster, key: &str) -> anyhow::Result<PlayerId> {
    roster
        .find(key)
        .map(|player| player.id.clone())
        .ok_or_else(|| anyhow!("no player named '{key}'"))
}

fn resolve_players(roster: &Roster, keys: &[String]) -> anyhow::Result<Vec<PlayerId>> {
    keys.iter().map(|key| resolve_player(roster, key)).collect()
}

fn with_phase_hint(err: SessionError) -> anyhow::Error {
    match err {
        SessionError::InvalidPhase(phase) if phase != SessionPhase::Registration => {
            anyhow!("a game is already {phase:?}, run `panteon reset` first")
        }
        other => other.into(),
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use panteon_core::{GenerationMode, PlayerEntry};
    use std::fs;
    use std::path::PathBuf;

    fn temp_store(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("panteon-cli-{}-{}.json", name, std::process::id()))
    }

    fn open(path: &PathBuf) -> Session<FileStore> {
        let config = SessionConfig {
            draw_cooldown_ms: 0,
            vote_confirm_ms: 0,
            ..SessionConfig::default()
        };
        let catalogs = builtin_catalogs().expect("builtin catalogs");
        Session::open(FileStore::open(path), config, catalogs, RngState::from_seed(8))
            .expect("open session")
    }

    #[test]
    fn session_survives_process_restart() {
        let path = temp_store("restart");
        let _ = fs::remove_file(&path);
        {
            let mut session = open(&path);
            let entries = [
                PlayerEntry::new("Ana", PlayerColor::Red),
                PlayerEntry::new("Bruno", PlayerColor::Blue),
                PlayerEntry::new("Carla", PlayerColor::Green),
                PlayerEntry::new("Dario", PlayerColor::Yellow),
            ];
            session
                .register(&entries, GenerationMode::Balanced)
                .expect("register");
            session.start().expect("start");
            let ana = resolve_player(&session.roster(), "ana").expect("ana");
            session
                .adjust_counter(&ana, Counter::Relics, 2)
                .expect("adjust");
            let DrawOutcome::Revealed(_) = session.draw_oracle(Instant::now()).expect("draw")
            else {
                panic!("expected a card");
            };
        }

        let session = open(&path);
        assert_eq!(session.phase(), SessionPhase::Playing);
        let ana = resolve_player(&session.roster(), "Ana").expect("ana");
        assert_eq!(session.stats()[&ana].relics, 2);
        assert_eq!(session.oracles.used_ids().len(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn filter_is_stored_for_later_draws() {
        let path = temp_store("filter");
        let _ = fs::remove_file(&path);
        let mut session = open(&path);
        let filter = Commands::Filter {
            categories: vec!["luck".to_string()],
        };
        dispatch(filter, &mut session).expect("filter");
        assert_eq!(session.minigames.filter(), [MinigameCategory::Luck]);
        let stored: Option<Vec<MinigameCategory>> =
            load(&FileStore::open(&path), MINIGAME_FILTER_KEY);
        assert_eq!(stored, Some(vec![MinigameCategory::Luck]));

        let unknown = Commands::Filter {
            categories: vec!["dance".to_string()],
        };
        assert!(dispatch(unknown, &mut session).is_err());
        dispatch(Commands::Filter { categories: vec![] }, &mut session).expect("clear");
        assert_eq!(session.minigames.filter(), MinigameCategory::ALL);
        assert!(FileStore::open(&path).get_raw(MINIGAME_FILTER_KEY).is_none());
        let _ = fs::remove_file(path);
    }
}
