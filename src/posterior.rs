//! Monte-Carlo season simulation.

use std::collections::{BTreeSet, HashMap};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::{Result, StreakError};
use crate::game::{Game, RelativeLocation};
use crate::model::OutcomeModel;
use crate::schedule::Schedule;
use crate::team::Team;

/// Empirical distribution of season wins for one team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WinDistribution {
    pub team: Team,
    pub mean: f64,
    pub min: u32,
    pub q25: u32,
    pub q50: u32,
    pub q75: u32,
    pub max: u32,
    /// `histogram[k]` counts seasons ending with exactly `k` wins.
    pub histogram: Vec<u64>,
}

impl WinDistribution {
    fn from_samples(team: Team, mut wins: Vec<u32>) -> Self {
        wins.sort_unstable();
        let n = wins.len();
        let quantile = |q: f64| -> u32 {
            if n == 0 {
                0
            } else {
                wins[((n - 1) as f64 * q).round() as usize]
            }
        };

        let max = wins.last().copied().unwrap_or(0);
        let mut histogram = vec![0u64; max as usize + 1];
        for &w in &wins {
            histogram[w as usize] += 1;
        }
        let mean = if n == 0 {
            0.0
        } else {
            wins.iter().map(|&w| w as f64).sum::<f64>() / n as f64
        };

        WinDistribution {
            team,
            mean,
            min: wins.first().copied().unwrap_or(0),
            q25: quantile(0.25),
            q50: quantile(0.5),
            q75: quantile(0.75),
            max,
            histogram,
        }
    }
}

/// Draws whole seasons from a schedule and an outcome model.
pub struct SeasonSimulator<'a, M: OutcomeModel + ?Sized> {
    model: &'a M,
    teams: Vec<Team>,
    /// `(team1 index, team2 index, team1 win probability)` per unique game
    games: Vec<(usize, usize, f64)>,
    championship: bool,
}

impl<'a, M: OutcomeModel + ?Sized> SeasonSimulator<'a, M> {
    /// Resolve every unique game's probability up front so missing ratings
    /// surface before any simulation starts.
    ///
    /// Opponents outside the schedule's team set are simulated and reported
    /// alongside the scheduled teams.
    pub fn new(schedule: &Schedule, model: &'a M) -> Result<Self> {
        let unique = schedule.unique_games();
        let participants: BTreeSet<&Team> = schedule
            .teams()
            .chain(unique.iter().flat_map(|(_, game)| [&game.team1, &game.team2]))
            .collect();
        let teams: Vec<Team> = participants.into_iter().cloned().collect();
        let index: HashMap<&Team, usize> = teams.iter().enumerate().map(|(i, t)| (t, i)).collect();
        let lookup = |team: &Team| {
            index
                .get(team)
                .copied()
                .ok_or_else(|| StreakError::UnknownTeam(team.to_string()))
        };

        let games = unique
            .iter()
            .map(|(_, game)| {
                let prediction = model.predict(game)?;
                Ok((lookup(&game.team1)?, lookup(&game.team2)?, prediction.probability))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SeasonSimulator {
            model,
            teams,
            games,
            championship: false,
        })
    }

    /// Finish every season with a neutral-site game between the top two teams by wins.
    pub fn with_championship(mut self, championship: bool) -> Self {
        self.championship = championship;
        self
    }

    pub fn num_games(&self) -> usize {
        self.games.len()
    }

    /// Wins per team (in `teams` order) for one season.
    fn simulate_season(&self, rng: &mut ChaCha8Rng) -> Result<Vec<u32>> {
        let mut wins = vec![0u32; self.teams.len()];
        for &(t1, t2, p) in &self.games {
            if rng.gen::<f64>() < p {
                wins[t1] += 1;
            } else {
                wins[t2] += 1;
            }
        }

        if self.championship && self.teams.len() >= 2 {
            // ties broken by team order
            let mut ranked: Vec<usize> = (0..self.teams.len()).collect();
            ranked.sort_by(|&a, &b| wins[b].cmp(&wins[a]).then(a.cmp(&b)));
            let (first, second) = (ranked[0], ranked[1]);
            let game = Game::new(
                self.teams[first].clone(),
                self.teams[second].clone(),
                RelativeLocation::Neutral,
            );
            let p = self.model.predict(&game)?.probability;
            if rng.gen::<f64>() < p {
                wins[first] += 1;
            } else {
                wins[second] += 1;
            }
        }
        Ok(wins)
    }

    /// Simulate `n_simulations` seasons, one `ChaCha8Rng` per season drawn
    /// from a master generator.
    pub fn run(
        &self,
        n_simulations: usize,
        seed: Option<u64>,
        cancel: &CancelToken,
    ) -> Result<Vec<WinDistribution>> {
        let mut master = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let seeds: Vec<u64> = (0..n_simulations).map(|_| master.gen()).collect();

        info!(
            seasons = n_simulations,
            teams = self.teams.len(),
            games = self.games.len(),
            championship = self.championship,
            "simulating seasons"
        );

        let seasons = seeds
            .par_iter()
            .map(|&s| {
                if cancel.is_cancelled() {
                    return Err(StreakError::Cancelled);
                }
                let mut rng = ChaCha8Rng::seed_from_u64(s);
                self.simulate_season(&mut rng)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut per_team: Vec<Vec<u32>> = vec![Vec::with_capacity(n_simulations); self.teams.len()];
        for season in seasons {
            for (samples, w) in per_team.iter_mut().zip(season) {
                samples.push(w);
            }
        }

        let report: Vec<WinDistribution> = self
            .teams
            .iter()
            .cloned()
            .zip(per_team)
            .map(|(team, samples)| WinDistribution::from_samples(team, samples))
            .collect();
        debug!(teams = report.len(), "season simulation finished");
        Ok(report)
    }
}
