//! Draw-without-replacement over a fixed catalog.
//!
//! The engine keeps the ordered list of ids already drawn in the current
//! cycle. That list is the only durable state; the phase, the revealed card
//! and the cooldown live in memory and start fresh on every load.

use crate::{Card, CardCategory, DeckKind, RngState};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{0} catalog is empty")]
    Empty(DeckKind),
    #[error("duplicate card id {0}")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckPhase {
    Idle,
    /// Selection in progress; nothing has been recorded yet.
    Drawing,
    Revealed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStart {
    /// A draw is pending or the cooldown has not expired.
    Locked,
    /// The active filter matches no card at all.
    NoCandidates,
    /// The cycle was exhausted; used ids were cleared and nothing was drawn.
    Reshuffled,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome<C> {
    Locked,
    NoCandidates,
    Reshuffled,
    Revealed(Card<C>),
}

impl<C> DrawOutcome<C> {
    /// Whether the used-id list changed and must be written back.
    pub fn changed_used(&self) -> bool {
        matches!(self, DrawOutcome::Reshuffled | DrawOutcome::Revealed(_))
    }
}

#[derive(Debug, Clone)]
pub struct DeckEngine<C: CardCategory> {
    catalog: Vec<Card<C>>,
    used: Vec<String>,
    filter: Vec<C>,
    phase: DeckPhase,
    locked_until: Option<Instant>,
    cooldown: Duration,
}

impl<C: CardCategory> DeckEngine<C> {
    pub fn new(catalog: Vec<Card<C>>, cooldown: Duration) -> Result<Self, CatalogError> {
        if catalog.is_empty() {
            return Err(CatalogError::Empty(C::DECK));
        }
        let mut seen = HashSet::new();
        for card in &catalog {
            if !seen.insert(card.id.as_str()) {
                return Err(CatalogError::DuplicateId(card.id.clone()));
            }
        }
        Ok(Self {
            catalog,
            used: Vec::new(),
            filter: C::ALL.to_vec(),
            phase: DeckPhase::Idle,
            locked_until: None,
            cooldown,
        })
    }

    pub fn catalog(&self) -> &[Card<C>] {
        &self.catalog
    }

    pub fn card(&self, id: &str) -> Option<&Card<C>> {
        self.catalog.iter().find(|card| card.id == id)
    }

    pub fn used_ids(&self) -> &[String] {
        &self.used
    }

    /// Replaces the used list with persisted ids. Ids that are not in the
    /// catalog, and repeats, are dropped.
    pub fn restore_used(&mut self, ids: Vec<String>) {
        let mut seen = HashSet::new();
        let before = ids.len();
        self.used = ids
            .into_iter()
            .filter(|id| self.card(id).is_some() && seen.insert(id.clone()))
            .collect();
        if self.used.len() != before {
            tracing::warn!(
                deck = %C::DECK,
                dropped = before - self.used.len(),
                "dropped stale card ids from persisted deck state"
            );
        }
        self.phase = DeckPhase::Idle;
    }

    pub fn filter(&self) -> &[C] {
        &self.filter
    }

    /// Restricts draws to `categories`. Used ids are kept; the revealed card
    /// is cleared so the next card comes from the new filter.
    pub fn set_filter(&mut self, categories: &[C]) {
        let mut filter = Vec::with_capacity(categories.len());
        for category in categories {
            if !filter.contains(category) {
                filter.push(*category);
            }
        }
        self.filter = filter;
        self.phase = DeckPhase::Idle;
    }

    pub fn filtered(&self) -> impl Iterator<Item = &Card<C>> {
        self.catalog
            .iter()
            .filter(move |card| self.filter.contains(&card.category))
    }

    pub fn available(&self) -> impl Iterator<Item = &Card<C>> {
        self.filtered()
            .filter(move |card| !self.used.iter().any(|id| id == &card.id))
    }

    pub fn remaining(&self) -> usize {
        self.available().count()
    }

    /// Every card matching the filter has been drawn in this cycle.
    pub fn is_exhausted(&self) -> bool {
        self.filtered().next().is_some() && self.available().next().is_none()
    }

    pub fn phase(&self) -> &DeckPhase {
        &self.phase
    }

    pub fn current(&self) -> Option<&Card<C>> {
        match &self.phase {
            DeckPhase::Revealed(id) => self.card(id),
            _ => None,
        }
    }

    pub fn locked_until(&self) -> Option<Instant> {
        self.locked_until
    }

    pub fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// First half of a draw. On exhaustion this resets the cycle instead of
    /// drawing; the caller has to start another draw to get a card.
    pub fn start_draw(&mut self, now: Instant) -> DrawStart {
        if self.phase == DeckPhase::Drawing || self.is_locked(now) {
            return DrawStart::Locked;
        }
        if self.filtered().next().is_none() {
            self.phase = DeckPhase::Idle;
            return DrawStart::NoCandidates;
        }
        if self.is_exhausted() {
            self.reset();
            tracing::debug!(deck = %C::DECK, "deck exhausted, cycle reset");
            return DrawStart::Reshuffled;
        }
        self.phase = DeckPhase::Drawing;
        DrawStart::Pending
    }

    /// Second half of a draw: picks uniformly from the available pool and
    /// records it. Returns `None` unless a draw is pending.
    pub fn complete_draw(&mut self, rng: &mut RngState, now: Instant) -> Option<Card<C>> {
        if self.phase != DeckPhase::Drawing {
            return None;
        }
        let pool: Vec<usize> = self
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, card)| {
                self.filter.contains(&card.category) && !self.used.contains(&card.id)
            })
            .map(|(index, _)| index)
            .collect();
        let Some(&index) = rng.choose(&pool) else {
            self.phase = DeckPhase::Idle;
            return None;
        };
        let card = self.catalog[index].clone();
        self.used.push(card.id.clone());
        self.phase = DeckPhase::Revealed(card.id.clone());
        self.locked_until = Some(now + self.cooldown);
        tracing::debug!(
            deck = %C::DECK,
            card = %card.id,
            remaining = pool.len() - 1,
            "card drawn"
        );
        Some(card)
    }

    pub fn draw(&mut self, rng: &mut RngState, now: Instant) -> DrawOutcome<C> {
        match self.start_draw(now) {
            DrawStart::Locked => DrawOutcome::Locked,
            DrawStart::NoCandidates => DrawOutcome::NoCandidates,
            DrawStart::Reshuffled => DrawOutcome::Reshuffled,
            DrawStart::Pending => match self.complete_draw(rng, now) {
                Some(card) => DrawOutcome::Revealed(card),
                None => DrawOutcome::NoCandidates,
            },
        }
    }

    /// Puts the revealed card away without touching the cycle.
    pub fn dismiss(&mut self) {
        if matches!(self.phase, DeckPhase::Revealed(_)) {
            self.phase = DeckPhase::Idle;
        }
    }

    /// Clears every used id of this catalog, whatever the filter.
    pub fn reset(&mut self) {
        self.used.clear();
        self.phase = DeckPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MinigameCategory, OracleCategory};

    fn card<C>(id: &str, category: C) -> Card<C> {
        Card {
            id: id.to_string(),
            category,
            title: id.to_uppercase(),
            body: String::new(),
        }
    }

    fn minigames() -> Vec<Card<MinigameCategory>> {
        vec![
            card("m1", MinigameCategory::Skill),
            card("m2", MinigameCategory::Skill),
            card("m3", MinigameCategory::Social),
            card("m4", MinigameCategory::Luck),
        ]
    }

    fn engine() -> DeckEngine<MinigameCategory> {
        DeckEngine::new(minigames(), Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let err = DeckEngine::<OracleCategory>::new(Vec::new(), Duration::ZERO).unwrap_err();
        assert_eq!(err, CatalogError::Empty(DeckKind::Oracle));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let cards = vec![
            card("o1", OracleCategory::Curse),
            card("o1", OracleCategory::Blessing),
        ];
        let err = DeckEngine::new(cards, Duration::ZERO).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("o1".to_string()));
    }

    #[test]
    fn cooldown_blocks_then_expires() {
        let mut deck = engine();
        let mut rng = RngState::from_seed(2);
        let t0 = Instant::now();
        assert!(matches!(deck.draw(&mut rng, t0), DrawOutcome::Revealed(_)));
        assert_eq!(deck.locked_until(), Some(t0 + Duration::from_millis(500)));
        assert_eq!(
            deck.draw(&mut rng, t0 + Duration::from_millis(100)),
            DrawOutcome::Locked
        );
        assert_eq!(deck.used_ids().len(), 1);
        let later = t0 + Duration::from_millis(500);
        assert!(!deck.is_locked(later));
        assert!(matches!(deck.draw(&mut rng, later), DrawOutcome::Revealed(_)));
        assert_eq!(deck.used_ids().len(), 2);
    }

    #[test]
    fn pending_draw_locks_a_second_start() {
        let mut deck = engine();
        let now = Instant::now();
        assert_eq!(deck.start_draw(now), DrawStart::Pending);
        assert_eq!(deck.phase(), &DeckPhase::Drawing);
        assert_eq!(deck.start_draw(now), DrawStart::Locked);
        assert!(deck.used_ids().is_empty());
    }

    #[test]
    fn filter_change_clears_current_but_keeps_used() {
        let mut deck = engine();
        let mut rng = RngState::from_seed(4);
        let now = Instant::now();
        let DrawOutcome::Revealed(first) = deck.draw(&mut rng, now) else {
            panic!("expected a card");
        };
        assert_eq!(deck.current(), Some(&first));
        deck.set_filter(&[MinigameCategory::Luck]);
        assert!(deck.current().is_none());
        assert_eq!(deck.used_ids(), &[first.id.clone()][..]);
    }

    #[test]
    fn filter_defines_exhaustion() {
        let mut deck = engine();
        let mut rng = RngState::from_seed(4);
        let mut now = Instant::now();
        deck.set_filter(&[MinigameCategory::Social]);
        let DrawOutcome::Revealed(only) = deck.draw(&mut rng, now) else {
            panic!("expected a card");
        };
        assert_eq!(only.id, "m3");
        assert!(deck.is_exhausted());

        deck.set_filter(&[MinigameCategory::Social, MinigameCategory::Skill]);
        assert!(!deck.is_exhausted());
        assert_eq!(deck.remaining(), 2);

        deck.set_filter(&[MinigameCategory::Social]);
        now += Duration::from_secs(1);
        assert_eq!(deck.draw(&mut rng, now), DrawOutcome::Reshuffled);
        assert!(deck.used_ids().is_empty());
    }

    #[test]
    fn empty_filter_has_no_candidates() {
        let mut deck = engine();
        let mut rng = RngState::from_seed(4);
        deck.set_filter(&[]);
        assert!(!deck.is_exhausted());
        assert_eq!(deck.draw(&mut rng, Instant::now()), DrawOutcome::NoCandidates);
        assert!(deck.used_ids().is_empty());
    }

    #[test]
    fn restore_drops_unknown_and_repeated_ids() {
        let mut deck = engine();
        deck.restore_used(vec![
            "m2".to_string(),
            "gone".to_string(),
            "m2".to_string(),
            "m4".to_string(),
        ]);
        assert_eq!(deck.used_ids(), &["m2".to_string(), "m4".to_string()][..]);
        assert_eq!(deck.remaining(), 2);
    }

    #[test]
    fn dismiss_keeps_cycle() {
        let mut deck = engine();
        let mut rng = RngState::from_seed(8);
        let _ = deck.draw(&mut rng, Instant::now());
        deck.dismiss();
        assert_eq!(deck.phase(), &DeckPhase::Idle);
        assert_eq!(deck.used_ids().len(), 1);
    }
}
