use crate::store::{keys, load, save};
use crate::{
    awards, final_results, generate_pacts, rank, Award, CardCategory, CatalogError, Counter,
    DeckEngine, DrawOutcome, Event, EventBus, GenerationMode, MentionLog, MinigameCard,
    MinigameCategory, MinigameHistory, MinigameRecord, OracleCard, OracleCategory, Pact,
    PendingVote, Player, PlayerColor, PlayerEntry, PlayerId, RngState, RoleError, Roster,
    RosterError, ScoreDetails, SessionConfig, SessionLog, SessionStore, Standing, StoreError,
    VoteCategory, VoteDesk, VoteError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Registration,
    Playing,
    Finished,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid phase: {0:?}")]
    InvalidPhase(SessionPhase),
    #[error("no players registered")]
    NoPlayers,
    #[error("unknown vote category {0}")]
    UnknownCategory(String),
    #[error("unknown minigame record {0}")]
    UnknownRecord(String),
    #[error("strategic pacts are chosen by the players, not rerolled")]
    ManualPacts,
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Roles(#[from] RoleError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub minigames: Vec<MinigameCard>,
    pub oracles: Vec<OracleCard>,
    pub vote_categories: Vec<VoteCategory>,
}

/// One game night. The store is the source of truth for everything except
/// the in-memory deck phases, cooldowns and the pending vote.
pub struct Session<S: SessionStore> {
    pub config: SessionConfig,
    pub rng: RngState,
    pub events: EventBus,
    pub minigames: DeckEngine<MinigameCategory>,
    pub oracles: DeckEngine<OracleCategory>,
    pub votes: VoteDesk,
    vote_categories: Vec<VoteCategory>,
    store: S,
}

impl<S: SessionStore> Session<S> {
    pub fn open(
        store: S,
        config: SessionConfig,
        catalogs: Catalogs,
        rng: RngState,
    ) -> Result<Self, SessionError> {
        let cooldown = config.draw_cooldown();
        let mut minigames = DeckEngine::new(catalogs.minigames, cooldown)?;
        let mut oracles = DeckEngine::new(catalogs.oracles, cooldown)?;
        minigames.restore_used(load(&store, keys::MINIGAME_DECK_USED).unwrap_or_default());
        oracles.restore_used(load(&store, keys::ORACLE_DECK_USED).unwrap_or_default());
        let votes = VoteDesk::new(config.vote_confirm_delay());
        Ok(Self {
            config,
            rng,
            events: EventBus::default(),
            minigames,
            oracles,
            votes,
            vote_categories: catalogs.vote_categories,
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Raw access for keys the session does not own.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn vote_categories(&self) -> &[VoteCategory] {
        &self.vote_categories
    }

    pub fn phase(&self) -> SessionPhase {
        load(&self.store, keys::PHASE).unwrap_or_default()
    }

    /// The registered players; empty when no session exists.
    pub fn roster(&self) -> Roster {
        Roster::from_players(load(&self.store, keys::PLAYERS).unwrap_or_default())
    }

    pub fn stats(&self) -> BTreeMap<PlayerId, ScoreDetails> {
        load(&self.store, keys::STATS).unwrap_or_default()
    }

    pub fn history(&self) -> MinigameHistory {
        load::<Vec<MinigameRecord>>(&self.store, keys::MINIGAME_HISTORY)
            .map(MinigameHistory::from_records)
            .unwrap_or_default()
    }

    pub fn log(&self) -> SessionLog {
        load(&self.store, keys::LOG).unwrap_or_default()
    }

    pub fn results(&self) -> Option<Vec<Player>> {
        load(&self.store, keys::RESULTS)
    }

    // registration

    pub fn register(
        &mut self,
        entries: &[PlayerEntry],
        mode: GenerationMode,
    ) -> Result<Roster, SessionError> {
        self.require(&[SessionPhase::Registration])?;
        let pacts = match generate_pacts(
            entries.len(),
            mode,
            self.config.player_range(),
            self.config.pact_cap,
            &mut self.rng,
        )? {
            Some(pacts) => pacts,
            None => entries
                .iter()
                .map(|entry| {
                    entry
                        .pact
                        .ok_or_else(|| RosterError::MissingPact(entry.name.trim().to_string()))
                })
                .collect::<Result<Vec<Pact>, RosterError>>()?,
        };
        let roster = Roster::from_entries(entries, &pacts, &mut self.rng)?;

        for key in keys::SESSION {
            self.store.remove(key)?;
        }
        save(&mut self.store, keys::PLAYERS, roster.players())?;
        save(&mut self.store, keys::PHASE, &SessionPhase::Registration)?;
        tracing::debug!(players = roster.len(), ?mode, "players registered");
        self.events.push(Event::PlayersRegistered {
            count: roster.len(),
            mode,
        });
        Ok(roster)
    }

    pub fn rename_player(&mut self, id: &PlayerId, name: &str) -> Result<(), SessionError> {
        self.edit_roster(id, |roster| roster.rename(id, name))
    }

    pub fn recolor_player(
        &mut self,
        id: &PlayerId,
        color: PlayerColor,
    ) -> Result<(), SessionError> {
        self.edit_roster(id, |roster| roster.recolor(id, color))
    }

    pub fn set_pact(&mut self, id: &PlayerId, pact: Pact) -> Result<(), SessionError> {
        self.edit_roster(id, |roster| roster.set_pact(id, pact))
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> Result<(), SessionError> {
        self.edit_roster(id, |roster| roster.remove(id).map(drop))
    }

    /// Deals fresh secret pacts to the current roster.
    pub fn reroll_pacts(&mut self, mode: GenerationMode) -> Result<(), SessionError> {
        self.require(&[SessionPhase::Registration])?;
        let mut roster = self.existing_roster()?;
        let Some(pacts) = generate_pacts(
            roster.len(),
            mode,
            self.config.player_range(),
            self.config.pact_cap,
            &mut self.rng,
        )?
        else {
            return Err(SessionError::ManualPacts);
        };
        let ids: Vec<PlayerId> = roster.ids().cloned().collect();
        for (id, pact) in ids.iter().zip(pacts) {
            roster.set_pact(id, pact)?;
        }
        save(&mut self.store, keys::PLAYERS, roster.players())?;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.require(&[SessionPhase::Registration])?;
        let roster = self.existing_roster()?;
        roster.validate_count(self.config.player_range())?;
        let stats: BTreeMap<PlayerId, ScoreDetails> = roster
            .ids()
            .map(|id| (id.clone(), ScoreDetails::default()))
            .collect();
        save(&mut self.store, keys::STATS, &stats)?;
        save(&mut self.store, keys::LOG, &SessionLog::default())?;
        save(&mut self.store, keys::PHASE, &SessionPhase::Playing)?;
        self.events.push(Event::GameStarted {
            players: roster.len(),
        });
        Ok(())
    }

    // play

    pub fn adjust_counter(
        &mut self,
        id: &PlayerId,
        counter: Counter,
        delta: i64,
    ) -> Result<u32, SessionError> {
        self.require(&[SessionPhase::Playing])?;
        let mut roster = self.existing_roster()?;
        let mut stats = self.stats();
        let player = roster.get_mut(id)?;
        let details = stats.entry(id.clone()).or_default();
        let value = details.adjust(counter, delta);
        player.score_details = Some(*details);
        save(&mut self.store, keys::STATS, &stats)?;
        save(&mut self.store, keys::PLAYERS, roster.players())?;
        self.events.push(Event::CounterChanged {
            player: id.clone(),
            counter,
            value,
        });
        Ok(value)
    }

    pub fn draw_minigame(
        &mut self,
        now: Instant,
    ) -> Result<DrawOutcome<MinigameCategory>, SessionError> {
        draw_from(
            &mut self.minigames,
            &mut self.rng,
            &mut self.store,
            &mut self.events,
            keys::MINIGAME_DECK_USED,
            now,
        )
    }

    pub fn draw_oracle(
        &mut self,
        now: Instant,
    ) -> Result<DrawOutcome<OracleCategory>, SessionError> {
        draw_from(
            &mut self.oracles,
            &mut self.rng,
            &mut self.store,
            &mut self.events,
            keys::ORACLE_DECK_USED,
            now,
        )
    }

    pub fn set_minigame_filter(&mut self, categories: &[MinigameCategory]) {
        self.minigames.set_filter(categories);
    }

    pub fn record_minigame(
        &mut self,
        winners: Vec<PlayerId>,
        timestamp: u64,
    ) -> Result<MinigameRecord, SessionError> {
        self.require(&[SessionPhase::Playing])?;
        let roster = self.existing_roster()?;
        check_players(&roster, &winners)?;
        let mut history = self.history();
        let id = loop {
            let id = format!("mg{:08x}", self.rng.next_u64() as u32);
            if history.get(&id).is_none() {
                break id;
            }
        };
        let record = history.record(id, winners, timestamp).clone();
        self.commit_history(&roster, &history)?;
        self.events.push(Event::MinigameRecorded {
            id: record.id.clone(),
            round: record.round,
            winners: record.winners.len(),
        });
        Ok(record)
    }

    pub fn delete_minigame(&mut self, id: &str) -> Result<MinigameRecord, SessionError> {
        self.require(&[SessionPhase::Playing])?;
        let roster = self.existing_roster()?;
        let mut history = self.history();
        let removed = history
            .delete(id)
            .ok_or_else(|| SessionError::UnknownRecord(id.to_string()))?;
        self.commit_history(&roster, &history)?;
        self.events.push(Event::MinigameDeleted {
            id: removed.id.clone(),
            remaining: history.len(),
        });
        Ok(removed)
    }

    pub fn set_minigame_winners(
        &mut self,
        id: &str,
        winners: Vec<PlayerId>,
    ) -> Result<(), SessionError> {
        self.require(&[SessionPhase::Playing])?;
        let roster = self.existing_roster()?;
        check_players(&roster, &winners)?;
        let mut history = self.history();
        if !history.set_winners(id, winners) {
            return Err(SessionError::UnknownRecord(id.to_string()));
        }
        self.commit_history(&roster, &history)?;
        self.events.push(Event::MinigameEdited { id: id.to_string() });
        Ok(())
    }

    /// Rewrites `log.minigames` from the stored history.
    pub fn rebuild_minigame_log(&mut self) -> Result<BTreeMap<PlayerId, u32>, SessionError> {
        let roster = self.roster();
        let history = self.history();
        self.commit_history(&roster, &history)?;
        Ok(self.log().minigames)
    }

    // votes

    pub fn propose_vote(
        &mut self,
        category: &str,
        player: &PlayerId,
        now: Instant,
    ) -> Result<PendingVote, SessionError> {
        self.require(&[SessionPhase::Playing, SessionPhase::Finished])?;
        if !self.vote_categories.iter().any(|c| c.id == category) {
            return Err(SessionError::UnknownCategory(category.to_string()));
        }
        if !self.roster().contains(player) {
            return Err(RosterError::UnknownPlayer(player.clone()).into());
        }
        let pending = self.votes.propose(category, player, now)?.clone();
        self.events.push(Event::VoteProposed {
            category: category.to_string(),
            player: player.clone(),
        });
        Ok(pending)
    }

    /// Commits the pending vote when its delay is over; `None` if too early.
    pub fn confirm_vote(&mut self, now: Instant) -> Result<Option<u32>, SessionError> {
        let mut log = self.log();
        let Some((vote, votes)) = self.votes.confirm(&mut log.mentions, now)? else {
            return Ok(None);
        };
        save(&mut self.store, keys::LOG, &log)?;
        self.events.push(Event::VoteCast {
            category: vote.category,
            player: vote.player,
            votes,
        });
        Ok(Some(votes))
    }

    pub fn cancel_vote(&mut self) -> Option<PendingVote> {
        self.votes.cancel()
    }

    pub fn clear_votes(&mut self, category: &str) -> Result<bool, SessionError> {
        let mut log = self.log();
        let cleared = log.mentions.clear_category(category);
        if cleared {
            save(&mut self.store, keys::LOG, &log)?;
            self.events.push(Event::VotesCleared {
                category: category.to_string(),
            });
        }
        Ok(cleared)
    }

    pub fn mentions(&self) -> MentionLog {
        self.log().mentions
    }

    // results

    pub fn finalize(&mut self) -> Result<Vec<Player>, SessionError> {
        self.require(&[SessionPhase::Playing])?;
        let roster = self.existing_roster()?;
        let stats = self.stats();
        let results = final_results(roster.players(), |player| stats.get(&player.id));
        save(&mut self.store, keys::RESULTS, &results)?;
        save(&mut self.store, keys::PHASE, &SessionPhase::Finished)?;
        tracing::debug!(players = results.len(), "results finalized");
        self.events.push(Event::ResultsFinalized {
            players: results.len(),
        });
        Ok(results)
    }

    /// The ranked leaderboard; empty until results exist.
    pub fn standings(&self) -> Vec<Standing> {
        match self.results() {
            Some(results) => rank(&results, &self.log()),
            None => Vec::new(),
        }
    }

    pub fn awards(&self) -> Vec<Award> {
        match self.results() {
            Some(results) => awards(&results, &self.log(), &self.vote_categories),
            None => Vec::new(),
        }
    }

    /// Clears registration, counters, logs and results. Deck cycles survive.
    pub fn new_session(&mut self) -> Result<(), SessionError> {
        for key in keys::SESSION {
            self.store.remove(key)?;
        }
        self.votes.cancel();
        self.minigames.dismiss();
        self.oracles.dismiss();
        self.events.push(Event::SessionReset);
        Ok(())
    }

    fn require(&self, allowed: &[SessionPhase]) -> Result<SessionPhase, SessionError> {
        let phase = self.phase();
        if allowed.contains(&phase) {
            Ok(phase)
        } else {
            Err(SessionError::InvalidPhase(phase))
        }
    }

    fn existing_roster(&self) -> Result<Roster, SessionError> {
        let roster = self.roster();
        if roster.is_empty() {
            return Err(SessionError::NoPlayers);
        }
        Ok(roster)
    }

    fn edit_roster(
        &mut self,
        id: &PlayerId,
        edit: impl FnOnce(&mut Roster) -> Result<(), RosterError>,
    ) -> Result<(), SessionError> {
        self.require(&[SessionPhase::Registration])?;
        let mut roster = self.existing_roster()?;
        edit(&mut roster)?;
        save(&mut self.store, keys::PLAYERS, roster.players())?;
        self.events.push(Event::RosterEdited { player: id.clone() });
        Ok(())
    }

    fn commit_history(
        &mut self,
        roster: &Roster,
        history: &MinigameHistory,
    ) -> Result<(), SessionError> {
        let mut log = self.log();
        log.minigames = history.tallies(roster.ids());
        save(&mut self.store, keys::MINIGAME_HISTORY, history.records())?;
        save(&mut self.store, keys::LOG, &log)?;
        Ok(())
    }
}

fn check_players(roster: &Roster, ids: &[PlayerId]) -> Result<(), RosterError> {
    match ids.iter().find(|id| !roster.contains(id)) {
        Some(id) => Err(RosterError::UnknownPlayer(id.clone())),
        None => Ok(()),
    }
}

fn draw_from<C: CardCategory, S: SessionStore>(
    deck: &mut DeckEngine<C>,
    rng: &mut RngState,
    store: &mut S,
    events: &mut EventBus,
    key: &str,
    now: Instant,
) -> Result<DrawOutcome<C>, SessionError> {
    let outcome = deck.draw(rng, now);
    if outcome.changed_used() {
        save(store, key, deck.used_ids())?;
    }
    match &outcome {
        DrawOutcome::Revealed(card) => events.push(Event::CardDrawn {
            deck: C::DECK,
            id: card.id.clone(),
        }),
        DrawOutcome::Reshuffled => events.push(Event::DeckReshuffled { deck: C::DECK }),
        DrawOutcome::Locked | DrawOutcome::NoCandidates => {}
    }
    Ok(outcome)
}
