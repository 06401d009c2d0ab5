use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{Result, StreakError};
use crate::game::{Game, RelativeLocation};
use crate::model::{degenerate_prediction, OutcomeModel, Prediction};
use crate::overrides::OverridesMap;
use crate::team::Team;

/// Strength rating for one team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Points better than an average team on a neutral field
    pub points: f64,

    /// Points gained when the game is not at a neutral site
    pub home_bonus: f64,
}

impl Rating {
    pub fn new(points: f64, home_bonus: f64) -> Self {
        Rating { points, home_bonus }
    }
}

/// Predicted margin for `team1` over `team2`.
///
/// The home bonus is added for any non-neutral location, including road
/// games. Ratings consumers rely on this exact formula.
pub fn calculate_spread(team1: &Rating, team2: &Rating, location: RelativeLocation) -> f64 {
    let bonus = if location.is_neutral() {
        0.0
    } else {
        team1.home_bonus
    };
    team1.points - team2.points + bonus
}

/// Gaussian spread model.
///
/// Win probability is the residual distribution's CDF evaluated at the
/// predicted spread.
#[derive(Clone, Debug)]
pub struct GaussianSpreadModel {
    ratings: HashMap<Team, Rating>,
    residual: Normal,
    bias: f64,
    stddev: f64,
    overrides: OverridesMap,
}

impl GaussianSpreadModel {
    /// Build a model from per-team ratings and the residual `(bias, stddev)`.
    pub fn new(ratings: HashMap<Team, Rating>, bias: f64, stddev: f64) -> Result<Self> {
        if !(stddev > 0.0) || !bias.is_finite() {
            return Err(StreakError::InvalidModel(format!(
                "residual distribution needs finite bias and positive stddev, got bias={} stddev={}",
                bias, stddev
            )));
        }
        let residual = Normal::new(bias, stddev)
            .map_err(|e| StreakError::InvalidModel(e.to_string()))?;

        Ok(GaussianSpreadModel {
            ratings,
            residual,
            bias,
            stddev,
            overrides: OverridesMap::new(),
        })
    }

    pub fn with_overrides(mut self, overrides: OverridesMap) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn stddev(&self) -> f64 {
        self.stddev
    }

    pub fn ratings(&self) -> &HashMap<Team, Rating> {
        &self.ratings
    }

    pub fn rating(&self, team: &Team) -> Result<&Rating> {
        self.ratings
            .get(team)
            .ok_or_else(|| StreakError::MissingRating(team.clone()))
    }

    /// Check that every listed team has a rating.
    pub fn require_ratings<'a>(&self, teams: impl IntoIterator<Item = &'a Team>) -> Result<()> {
        for team in teams {
            if !team.is_reserved() {
                self.rating(team)?;
            }
        }
        Ok(())
    }
}

impl OutcomeModel for GaussianSpreadModel {
    fn predict(&self, game: &Game) -> Result<Prediction> {
        if let Some(prediction) = degenerate_prediction(game) {
            return Ok(prediction);
        }

        if let Some(prediction) = self.overrides.get(&game.team1, &game.team2) {
            return Ok(prediction);
        }

        let r1 = self.rating(&game.team1)?;
        let r2 = self.rating(&game.team2)?;
        let spread = calculate_spread(r1, r2, game.location);

        Ok(Prediction::new(self.residual.cdf(spread), spread))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(ratings: &[(&str, f64, f64)], bias: f64, stddev: f64) -> GaussianSpreadModel {
        let ratings = ratings
            .iter()
            .map(|&(name, points, bonus)| (Team::named(name), Rating::new(points, bonus)))
            .collect();
        GaussianSpreadModel::new(ratings, bias, stddev).unwrap()
    }

    fn game(a: &str, b: &str, loc: RelativeLocation) -> Game {
        Game::new(Team::named(a), Team::named(b), loc)
    }

    #[test]
    fn test_equal_teams_50_50() {
        let m = model(&[("A", 3.0, 0.0), ("B", 3.0, 0.0)], 0.0, 14.0);
        let p = m.predict(&game("A", "B", RelativeLocation::Neutral)).unwrap();
        assert!((p.probability - 0.5).abs() < 1e-9);
        assert_eq!(p.spread, 0.0);
    }

    #[test]
    fn test_one_sigma_favourite() {
        let m = model(&[("A", 10.0, 0.0), ("B", 0.0, 0.0)], 0.0, 10.0);
        let p = m.predict(&game("A", "B", RelativeLocation::Home)).unwrap();
        assert!((p.probability - 0.841_344_746).abs() < 1e-6);
        assert!((p.spread - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_home_bonus_applies_on_the_road_too() {
        let m = model(&[("A", 0.0, 2.5), ("B", 0.0, 2.5)], 0.0, 14.0);
        let home = m.predict(&game("A", "B", RelativeLocation::Home)).unwrap();
        let away = m.predict(&game("A", "B", RelativeLocation::Away)).unwrap();
        let neutral = m.predict(&game("A", "B", RelativeLocation::Neutral)).unwrap();
        assert_eq!(home.spread, 2.5);
        assert_eq!(away.spread, 2.5);
        assert_eq!(neutral.spread, 0.0);
    }

    #[test]
    fn test_symmetric_without_home_bonus() {
        let m = model(&[("A", 7.0, 0.0), ("B", -3.0, 0.0)], 0.0, 12.0);
        let g = game("A", "B", RelativeLocation::Near);
        let p = m.predict(&g).unwrap();
        let q = m.predict(&g.swap()).unwrap();
        assert!((p.probability + q.probability - 1.0).abs() < 1e-10);
        assert!((p.spread + q.spread).abs() < 1e-10);
    }

    #[test]
    fn test_reserved_opponents() {
        let m = model(&[("A", 7.0, 0.0)], 0.0, 12.0);
        let bye = m.predict(&Game::bye(Team::named("A"))).unwrap();
        assert_eq!(bye, Prediction::new(0.0, 0.0));
        let none = m
            .predict(&Game::new(Team::named("A"), Team::NoPick, RelativeLocation::Home))
            .unwrap();
        assert_eq!(none, Prediction::new(1.0, 0.0));
    }

    #[test]
    fn test_missing_rating_is_an_error() {
        let m = model(&[("A", 7.0, 0.0)], 0.0, 12.0);
        let err = m.predict(&game("A", "Z", RelativeLocation::Home)).unwrap_err();
        assert!(matches!(err, StreakError::MissingRating(t) if t == Team::named("Z")));
    }

    #[test]
    fn test_invalid_stddev_rejected() {
        let err = GaussianSpreadModel::new(HashMap::new(), 0.0, 0.0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_override_used() {
        let mut overrides = OverridesMap::new();
        overrides.add_override(Team::named("A"), Team::named("B"), Prediction::new(0.75, 3.0));
        let m = model(&[("A", 0.0, 0.0), ("B", 0.0, 0.0)], 0.0, 12.0).with_overrides(overrides);

        let p = m.predict(&game("B", "A", RelativeLocation::Home)).unwrap();
        assert!((p.probability - 0.25).abs() < 1e-10, "Override should be used");
        assert!((p.spread + 3.0).abs() < 1e-10);
    }
}
