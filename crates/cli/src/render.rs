use panteon_core::{
    Award, Card, CardCategory, Counter, Event, MinigameRecord, Player, PlayerId, Roster,
    ScoreDetails, Standing,
};

pub fn format_event(event: &Event, roster: &Roster) -> String {
    match event {
        Event::PlayersRegistered { count, mode } => {
            format!("{count} players registered ({mode:?} pacts)")
        }
        Event::RosterEdited { player } => format!("player updated: {}", name_of(roster, player)),
        Event::GameStarted { players } => format!("game started with {players} players"),
        Event::CounterChanged {
            player,
            counter,
            value,
        } => format!(
            "{} now has {} {}",
            name_of(roster, player),
            value,
            counter_label(*counter)
        ),
        Event::CardDrawn { deck, id } => format!("{deck} card drawn: {id}"),
        Event::DeckReshuffled { deck } => format!("{deck} deck reshuffled, draw again"),
        Event::MinigameRecorded { id, round, winners } => {
            format!("minigame {id} recorded as round {round} ({winners} winners)")
        }
        Event::MinigameDeleted { id, remaining } => {
            format!("minigame {id} deleted, {remaining} rounds left")
        }
        Event::MinigameEdited { id } => format!("minigame {id} winners updated"),
        Event::VoteProposed { category, player } => {
            format!("vote for {} in {category} pending", name_of(roster, player))
        }
        Event::VoteCast {
            category,
            player,
            votes,
        } => format!(
            "{} has {votes} votes in {category}",
            name_of(roster, player)
        ),
        Event::VotesCleared { category } => format!("votes cleared: {category}"),
        Event::ResultsFinalized { players } => format!("results final for {players} players"),
        Event::SessionReset => "session reset".to_string(),
    }
}

pub fn format_card<C: CardCategory>(card: &Card<C>) -> String {
    format!(
        "[{}] {}\n    {}",
        card.category.id(),
        card.title,
        card.body
    )
}

pub fn format_player(player: &Player, details: Option<&ScoreDetails>, reveal: bool) -> String {
    let mut line = format!("{:<14} {:<7} {}", player.name, player.color.id(), player.id);
    if reveal {
        line.push_str(&format!("  {}", player.pact));
    }
    if let Some(details) = details {
        line.push_str(&format!(
            "  R{} P{} W{}",
            details.relics, details.plagues, details.powers
        ));
    }
    line
}

pub fn format_record(record: &MinigameRecord, roster: &Roster) -> String {
    let winners: Vec<String> = record
        .winners
        .iter()
        .map(|id| name_of(roster, id))
        .collect();
    let winners = if winners.is_empty() {
        "-".to_string()
    } else {
        winners.join(", ")
    };
    format!("#{:<3} {}  {}", record.round, record.id, winners)
}

pub fn format_standing(standing: &Standing) -> String {
    let details = standing.result.score_details.unwrap_or_default();
    format!(
        "{:>2}. {:<14} {:>4} pts  {} honors  ({}, R{} P{} W{})",
        standing.rank,
        standing.result.name,
        standing.score(),
        standing.honors,
        standing.result.pact,
        details.relics,
        details.plagues,
        details.powers
    )
}

pub fn format_award(award: &Award, roster: &Roster) -> String {
    let mut line = format!(
        "{}: {} ({})",
        award.title,
        name_of(roster, &award.recipient),
        award.count
    );
    let others: Vec<String> = award
        .holders
        .iter()
        .filter(|id| **id != award.recipient)
        .map(|id| name_of(roster, id))
        .collect();
    if !others.is_empty() {
        line.push_str(&format!(", tied with {}", others.join(", ")));
    }
    line
}

pub fn counter_label(counter: Counter) -> &'static str {
    match counter {
        Counter::Relics => "relics",
        Counter::Plagues => "plagues",
        Counter::Powers => "powers",
    }
}

fn name_of(roster: &Roster, id: &PlayerId) -> String {
    roster
        .get(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}
