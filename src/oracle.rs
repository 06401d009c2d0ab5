use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game::Game;
use crate::model::{degenerate_prediction, OutcomeModel, Prediction};
use crate::team::Team;

/// A played game and its final margin for `game.team1`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameResult {
    pub game: Game,
    pub margin: f64,
}

/// Outcome model that already knows how every game ended.
///
/// Used for backtests. Results are keyed by game, so a home-and-home series
/// or a neutral-site rematch keeps each meeting. A lookup whose site matches
/// no recorded game falls back to the latest meeting of the two teams.
#[derive(Clone, Debug, Default)]
pub struct OracleModel {
    /// Margin for the stored key's `team1`.
    results: HashMap<Game, f64>,
    /// Latest margin per `(lower, higher)` team pair, for the lower team.
    latest: HashMap<(Team, Team), f64>,
}

impl OracleModel {
    pub fn new(results: impl IntoIterator<Item = GameResult>) -> Self {
        let mut oracle = OracleModel::default();
        for GameResult { game, margin } in results {
            let (pair, pair_margin) = if game.team1 <= game.team2 {
                ((game.team1.clone(), game.team2.clone()), margin)
            } else {
                ((game.team2.clone(), game.team1.clone()), -margin)
            };
            oracle.latest.insert(pair, pair_margin);
            // the map keeps its first key on overwrite, so drop the old orientation
            oracle.results.remove(&game);
            oracle.results.insert(game, margin);
        }
        oracle
    }

    /// Realised margin for `game.team1`.
    pub fn margin(&self, game: &Game) -> Option<f64> {
        if let Some((stored, &margin)) = self.results.get_key_value(game) {
            return Some(if stored.team1 == game.team1 { margin } else { -margin });
        }
        if game.team1 <= game.team2 {
            self.latest
                .get(&(game.team1.clone(), game.team2.clone()))
                .copied()
        } else {
            self.latest
                .get(&(game.team2.clone(), game.team1.clone()))
                .map(|m| -m)
        }
    }

    /// Number of distinct recorded games.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl OutcomeModel for OracleModel {
    fn predict(&self, game: &Game) -> Result<Prediction> {
        if let Some(prediction) = degenerate_prediction(game) {
            return Ok(prediction);
        }

        // a tie is not a win for team1
        let prediction = match self.margin(game) {
            Some(margin) if margin > 0.0 => Prediction::new(1.0, margin),
            Some(margin) => Prediction::new(0.0, margin),
            None => Prediction::new(0.5, 0.0),
        };
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RelativeLocation;

    fn game(a: &str, b: &str, location: RelativeLocation) -> Game {
        Game::new(Team::named(a), Team::named(b), location)
    }

    fn result(a: &str, b: &str, margin: f64) -> GameResult {
        GameResult {
            game: game(a, b, RelativeLocation::Home),
            margin,
        }
    }

    #[test]
    fn test_known_results() {
        let oracle = OracleModel::new(vec![result("Army", "Navy", 7.0)]);

        let won = oracle.predict(&game("Army", "Navy", RelativeLocation::Home)).unwrap();
        assert_eq!(won, Prediction::new(1.0, 7.0));

        let lost = oracle.predict(&game("Navy", "Army", RelativeLocation::Away)).unwrap();
        assert_eq!(lost, Prediction::new(0.0, -7.0));
    }

    #[test]
    fn test_rematch_keeps_both_meetings() {
        let oracle = OracleModel::new(vec![
            result("Army", "Navy", 10.0),
            GameResult {
                game: game("Army", "Navy", RelativeLocation::Neutral),
                margin: -3.0,
            },
        ]);
        assert_eq!(oracle.len(), 2);

        let home = oracle.predict(&game("Army", "Navy", RelativeLocation::Home)).unwrap();
        assert_eq!(home, Prediction::new(1.0, 10.0));

        let neutral = oracle.predict(&game("Navy", "Army", RelativeLocation::Neutral)).unwrap();
        assert_eq!(neutral, Prediction::new(1.0, 3.0));

        // no game at Navy's home; the latest meeting answers
        let road = oracle.predict(&game("Army", "Navy", RelativeLocation::Away)).unwrap();
        assert_eq!(road, Prediction::new(0.0, -3.0));
    }

    #[test]
    fn test_recorded_tie_is_not_a_win() {
        let oracle = OracleModel::new(vec![result("Army", "Navy", 0.0)]);
        let p = oracle.predict(&game("Army", "Navy", RelativeLocation::Home)).unwrap();
        assert_eq!(p, Prediction::new(0.0, 0.0));
        let q = oracle.predict(&game("Navy", "Army", RelativeLocation::Away)).unwrap();
        assert_eq!(q.probability, 0.0);
    }

    #[test]
    fn test_unknown_game_is_a_coin_flip() {
        let oracle = OracleModel::new(vec![result("Army", "Navy", 7.0)]);
        let p = oracle.predict(&game("Army", "Air Force", RelativeLocation::Home)).unwrap();
        assert_eq!(p, Prediction::new(0.5, 0.0));
    }

    #[test]
    fn test_bye_still_degenerate() {
        let oracle = OracleModel::new(Vec::new());
        let p = oracle.predict(&Game::bye(Team::named("Army"))).unwrap();
        assert_eq!(p.probability, 0.0);
    }
}
