//! Session rules for the Panteón party game. Keep this crate free of IO and
//! platform concerns; persistence goes through [`SessionStore`].

pub mod cards;
pub mod config;
pub mod deck;
pub mod events;
pub mod history;
pub mod honors;
pub mod mentions;
pub mod pact;
pub mod player;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod store;

pub use cards::*;
pub use config::*;
pub use deck::*;
pub use events::*;
pub use history::*;
pub use honors::*;
pub use mentions::*;
pub use pact::*;
pub use player::*;
pub use rng::*;
pub use scoring::*;
pub use session::*;
pub use store::*;
