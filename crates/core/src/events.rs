use crate::{Counter, DeckKind, GenerationMode, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    PlayersRegistered {
        count: usize,
        mode: GenerationMode,
    },
    RosterEdited { player: PlayerId },
    GameStarted { players: usize },
    CounterChanged {
        player: PlayerId,
        counter: Counter,
        value: u32,
    },
    CardDrawn { deck: DeckKind, id: String },
    DeckReshuffled { deck: DeckKind },
    MinigameRecorded { id: String, round: u32, winners: usize },
    MinigameDeleted { id: String, remaining: usize },
    MinigameEdited { id: String },
    VoteProposed { category: String, player: PlayerId },
    VoteCast {
        category: String,
        player: PlayerId,
        votes: u32,
    },
    VotesCleared { category: String },
    ResultsFinalized { players: usize },
    SessionReset,
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }
}
