use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{Result, StreakError};
use crate::model::{OutcomeModel, Prediction};
use crate::schedule::Schedule;
use crate::team::Team;

/// Per-(team, week) outcome of each team's scheduled game.
///
/// Built once per run so the streak search only does table lookups.
#[derive(Clone, Debug, Default)]
pub struct Predictions {
    table: HashMap<Team, Vec<Prediction>>,
    weeks: usize,
}

impl Predictions {
    /// Evaluate every scheduled game under `model`.
    pub fn from_schedule<M>(schedule: &Schedule, model: &M) -> Result<Self>
    where
        M: OutcomeModel + ?Sized,
    {
        let teams: Vec<&Team> = schedule.teams().collect();
        let rows = teams
            .par_iter()
            .map(|&team| {
                let row = schedule
                    .games_for(team)?
                    .iter()
                    .map(|game| model.predict(game))
                    .collect::<Result<Vec<_>>>()?;
                Ok((team.clone(), row))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Predictions {
            table: rows.into_iter().collect(),
            weeks: schedule.num_weeks(),
        })
    }

    /// Build from an explicit table; every row must be `weeks` long.
    pub fn from_table(weeks: usize, table: HashMap<Team, Vec<Prediction>>) -> Result<Self> {
        for row in table.values() {
            if row.len() != weeks {
                return Err(StreakError::WeekOutOfRange {
                    week: row.len(),
                    weeks,
                });
            }
        }
        Ok(Predictions { table, weeks })
    }

    pub fn num_weeks(&self) -> usize {
        self.weeks
    }

    pub fn contains(&self, team: &Team) -> bool {
        self.table.contains_key(team)
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.table.keys()
    }

    /// Prediction for `team` in `week`.
    ///
    /// The reserved teams resolve without a table row: a bye never wins and
    /// "no pick" always survives.
    pub fn get(&self, team: &Team, week: usize) -> Result<Prediction> {
        match team {
            Team::Bye => return Ok(Prediction::new(0.0, 0.0)),
            Team::NoPick => return Ok(Prediction::new(1.0, 0.0)),
            Team::Named(_) => {}
        }
        let row = self
            .table
            .get(team)
            .ok_or_else(|| StreakError::UnknownTeam(team.to_string()))?;
        row.get(week).copied().ok_or(StreakError::WeekOutOfRange {
            week,
            weeks: self.weeks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::GameRecord;
    use crate::win_prob::{GaussianSpreadModel, Rating};

    #[test]
    fn test_from_schedule() {
        let a = Team::named("A");
        let b = Team::named("B");
        let season = vec![vec![GameRecord::new(a.clone(), b.clone(), false)], vec![]];
        let schedule = Schedule::build(&season, &[a.clone(), b.clone()]).unwrap();

        let ratings = [(a.clone(), Rating::new(10.0, 0.0)), (b.clone(), Rating::new(0.0, 0.0))]
            .into_iter()
            .collect();
        let model = GaussianSpreadModel::new(ratings, 0.0, 10.0).unwrap();
        let predictions = Predictions::from_schedule(&schedule, &model).unwrap();

        let pa = predictions.get(&a, 0).unwrap();
        let pb = predictions.get(&b, 0).unwrap();
        assert!((pa.probability + pb.probability - 1.0).abs() < 1e-10);
        assert_eq!(predictions.get(&a, 1).unwrap(), Prediction::new(0.0, 0.0));
        assert!(predictions.get(&a, 2).is_err());
        assert!(predictions.get(&Team::named("C"), 0).is_err());
    }

    #[test]
    fn test_missing_rating_propagates() {
        let a = Team::named("A");
        let season = vec![vec![GameRecord::new(a.clone(), Team::named("X"), false)]];
        let schedule = Schedule::build(&season, &[a.clone()]).unwrap();
        let ratings = [(a, Rating::new(10.0, 0.0))].into_iter().collect();
        let model = GaussianSpreadModel::new(ratings, 0.0, 10.0).unwrap();
        assert!(matches!(
            Predictions::from_schedule(&schedule, &model),
            Err(StreakError::MissingRating(_))
        ));
    }

    #[test]
    fn test_from_table_checks_width() {
        let mut table = HashMap::new();
        table.insert(Team::named("A"), vec![Prediction::new(0.5, 0.0)]);
        assert!(Predictions::from_table(2, table).is_err());
    }
}
