use crate::{Pact, Player, ScoreDetails};

/// Per-counter weights of one pact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PactWeights {
    pub relics: i64,
    pub plagues: i64,
    pub powers: i64,
}

impl PactWeights {
    pub const fn of(pact: Pact) -> Self {
        match pact {
            Pact::Atenea => Self {
                relics: 3,
                plagues: -1,
                powers: 0,
            },
            Pact::Loki => Self {
                relics: 2,
                plagues: 1,
                powers: 0,
            },
            Pact::Longwang => Self {
                relics: 2,
                plagues: -1,
                powers: 1,
            },
        }
    }
}

/// Linear pact score. Not floored: heavy plagues push loyal pacts below zero.
pub fn score(counters: &ScoreDetails, pact: Pact) -> i64 {
    let weights = PactWeights::of(pact);
    i64::from(counters.relics) * weights.relics
        + i64::from(counters.plagues) * weights.plagues
        + i64::from(counters.powers) * weights.powers
}

/// Copies of `players` carrying their counters and computed score.
pub fn final_results<'a>(
    players: &[Player],
    counters: impl Fn(&Player) -> Option<&'a ScoreDetails>,
) -> Vec<Player> {
    players
        .iter()
        .map(|player| {
            let details = counters(player).copied().unwrap_or_default();
            Player {
                score: Some(score(&details, player.pact)),
                score_details: Some(details),
                ..player.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlayerColor, PlayerId};

    fn details(relics: u32, plagues: u32, powers: u32) -> ScoreDetails {
        ScoreDetails {
            relics,
            plagues,
            powers,
        }
    }

    #[test]
    fn empty_counters_score_zero_for_every_pact() {
        for pact in Pact::ALL {
            assert_eq!(score(&ScoreDetails::default(), pact), 0);
        }
    }

    #[test]
    fn loki_gains_from_plagues() {
        assert_eq!(score(&details(1, 4, 9), Pact::Loki), 6);
    }

    #[test]
    fn missing_counters_count_as_zero() {
        let players = vec![Player {
            id: PlayerId::new("p1"),
            name: "Ana".to_string(),
            color: PlayerColor::Red,
            pact: Pact::Atenea,
            score: None,
            score_details: None,
        }];
        let results = final_results(&players, |_| None);
        assert_eq!(results[0].score, Some(0));
        assert_eq!(results[0].score_details, Some(ScoreDetails::default()));
    }
}
