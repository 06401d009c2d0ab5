use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game::Game;
use crate::team::Team;

/// Win probability and predicted margin for the first team of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub probability: f64,
    pub spread: f64,
}

impl Prediction {
    pub fn new(probability: f64, spread: f64) -> Self {
        Prediction { probability, spread }
    }

    /// The same prediction from the opponent's side.
    pub fn flip(self) -> Self {
        Prediction::new(1.0 - self.probability, -self.spread)
    }
}

/// The favoured side of a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Team,
    pub probability: f64,
    pub spread: f64,
}

/// Fixed outcomes for games against the reserved teams.
///
/// Playing a bye can never win a streak; playing "no pick" always does.
pub fn degenerate_prediction(game: &Game) -> Option<Prediction> {
    if game.team1.is_bye() || game.team2.is_bye() {
        Some(Prediction::new(0.0, 0.0))
    } else if game.team1 == Team::NoPick || game.team2 == Team::NoPick {
        Some(Prediction::new(1.0, 0.0))
    } else {
        None
    }
}

/// Maps a game to the first team's win probability and spread.
pub trait OutcomeModel: Send + Sync {
    fn predict(&self, game: &Game) -> Result<Prediction>;

    fn most_likely_outcome(&self, game: &Game) -> Result<Outcome> {
        let prediction = self.predict(game)?;
        let outcome = if prediction.probability >= 0.5 {
            Outcome {
                winner: game.team1.clone(),
                probability: prediction.probability,
                spread: prediction.spread.abs(),
            }
        } else {
            Outcome {
                winner: game.team2.clone(),
                probability: 1.0 - prediction.probability,
                spread: prediction.spread.abs(),
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RelativeLocation;

    struct Fixed(Prediction);

    impl OutcomeModel for Fixed {
        fn predict(&self, _game: &Game) -> Result<Prediction> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_degenerate_predictions() {
        let a = Team::named("A");
        let bye = Game::bye(a.clone());
        assert_eq!(degenerate_prediction(&bye), Some(Prediction::new(0.0, 0.0)));

        let none = Game::new(a.clone(), Team::NoPick, RelativeLocation::Neutral);
        assert_eq!(degenerate_prediction(&none), Some(Prediction::new(1.0, 0.0)));

        let real = Game::new(a, Team::named("B"), RelativeLocation::Home);
        assert_eq!(degenerate_prediction(&real), None);
    }

    #[test]
    fn test_most_likely_outcome_picks_underdog_side() {
        let game = Game::new(Team::named("A"), Team::named("B"), RelativeLocation::Away);
        let model = Fixed(Prediction::new(0.25, -6.5));
        let outcome = model.most_likely_outcome(&game).unwrap();
        assert_eq!(outcome.winner, Team::named("B"));
        assert!((outcome.probability - 0.75).abs() < 1e-12);
        assert!((outcome.spread - 6.5).abs() < 1e-12);
    }
}
