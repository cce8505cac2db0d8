pub use panteon_core::{
    Card, Catalogs, MinigameCard, MinigameCategory, OracleCard, OracleCategory, SessionConfig,
    VoteCategory,
};

pub const MINIGAMES_FILE: &str = "minigames.json";
pub const ORACLES_FILE: &str = "oracles.json";
pub const VOTE_CATEGORIES_FILE: &str = "vote_categories.json";
pub const SESSION_CONFIG_FILE: &str = "session.json";
