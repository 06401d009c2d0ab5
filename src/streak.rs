use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StreakError};
use crate::predictions::Predictions;
use crate::slots::PickSlots;
use crate::team::Team;

static BYE_WEEK: [Team; 1] = [Team::Bye];

/// Cumulative outcome of a streak.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub probability: f64,
    pub spread: f64,
}

impl StreakSummary {
    /// Objective maximised by the search.
    pub fn expected(&self) -> f64 {
        self.probability * self.spread
    }
}

/// One pick with its predicted outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickDetail {
    pub team: Team,
    pub probability: f64,
    pub spread: f64,
}

/// All picks of one week.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week: usize,
    pub picks: Vec<PickDetail>,
}

/// A reversible local move applied by [`Streak::perturbate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Perturbation {
    /// Two positions of the team sequence were exchanged.
    SwapTeams(usize, usize),
    /// The pick counts of two weeks were exchanged.
    SwapWeeks(usize, usize),
    /// Nothing could move (fewer than two teams and weeks).
    Nothing,
}

/// Assignment of every remaining team to a week.
///
/// Stored as a flat team sequence packed left to right into weeks of the
/// current sizes. A week of size 0 reads as `[BYE]`.
#[derive(Clone, Debug)]
pub struct Streak {
    teams: Arc<[Team]>,
    order: Vec<Team>,
    sizes: Vec<usize>,
    offsets: Vec<usize>,
}

impl Streak {
    /// Canonical streak: `teams` in order, packed into weeks of ascending size.
    pub fn new(teams: Vec<Team>, slots: &PickSlots) -> Result<Self> {
        let mut seen = HashSet::with_capacity(teams.len());
        for team in &teams {
            if team.is_reserved() {
                return Err(StreakError::ReservedTeam(team.clone()));
            }
            if !seen.insert(team) {
                return Err(StreakError::DuplicateTeam(team.clone()));
            }
        }
        slots.check_teams(teams.len())?;

        let sizes = slots.week_sizes();
        let offsets = offsets_for(&sizes);
        Ok(Streak {
            order: teams.clone(),
            teams: teams.into(),
            sizes,
            offsets,
        })
    }

    /// Streak with explicit per-week sizes.
    pub fn with_week_sizes(teams: Vec<Team>, sizes: &[usize]) -> Result<Self> {
        let mut streak = Streak::new(teams, &PickSlots::from_week_sizes(sizes))?;
        streak.set_week_sizes(sizes)?;
        Ok(streak)
    }

    pub fn num_weeks(&self) -> usize {
        self.sizes.len()
    }

    pub fn num_teams(&self) -> usize {
        self.order.len()
    }

    /// Pick count of every week.
    pub fn picks_per_week(&self) -> &[usize] {
        &self.sizes
    }

    pub fn slots(&self) -> PickSlots {
        PickSlots::from_week_sizes(&self.sizes)
    }

    /// The teams this streak was built from, in construction order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Picks of week `w`; `[BYE]` for a bye week.
    ///
    /// Panics if `w >= num_weeks()`.
    pub fn get_week(&self, w: usize) -> &[Team] {
        let size = self.sizes[w];
        if size == 0 {
            &BYE_WEEK[..]
        } else {
            let start = self.offsets[w];
            &self.order[start..start + size]
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[Team]> + '_ {
        (0..self.num_weeks()).map(move |w| self.get_week(w))
    }

    /// Teams picked in the first remaining week.
    pub fn first_week(&self) -> &[Team] {
        if self.sizes.is_empty() {
            &BYE_WEEK[..0]
        } else {
            self.get_week(0)
        }
    }

    /// Reorder the team sequence so position `i` holds `teams()[permutation[i]]`.
    pub fn permute_team_order(&mut self, permutation: &[usize]) -> Result<()> {
        if permutation.len() != self.teams.len() {
            return Err(StreakError::TeamIndexOutOfRange(permutation.len()));
        }
        let mut used = vec![false; permutation.len()];
        for &index in permutation {
            match used.get_mut(index) {
                Some(seen) if !*seen => *seen = true,
                Some(_) => return Err(StreakError::RepeatedTeamIndex(index)),
                None => return Err(StreakError::TeamIndexOutOfRange(index)),
            }
        }
        for (slot, &index) in self.order.iter_mut().zip(permutation) {
            slot.clone_from(&self.teams[index]);
        }
        Ok(())
    }

    /// Replace the per-week sizes with another arrangement of the same slots.
    pub fn set_week_sizes(&mut self, sizes: &[usize]) -> Result<()> {
        let expected = self.slots();
        let given = PickSlots::from_week_sizes(sizes);
        if given != expected {
            return Err(StreakError::SlotMismatch {
                slots: given.counts().to_vec(),
                picks: given.total_picks(),
                teams: self.order.len(),
            });
        }
        self.sizes.copy_from_slice(sizes);
        self.offsets = offsets_for(&self.sizes);
        Ok(())
    }

    /// Randomise both the team order and the week sizes.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
        self.sizes.shuffle(rng);
        self.offsets = offsets_for(&self.sizes);
    }

    /// Apply one random local move and return it so it can be undone.
    ///
    /// Team swaps and, when `allow_week_swap` is set, size swaps between two
    /// weeks of different size are equally likely. When only one kind of move
    /// exists it is always taken; `Nothing` means neither exists.
    pub fn perturbate<R: Rng + ?Sized>(&mut self, rng: &mut R, allow_week_swap: bool) -> Perturbation {
        let n = self.order.len();
        let can_swap_teams = n >= 2;
        let can_swap_weeks =
            allow_week_swap && self.sizes.iter().any(|&size| size != self.sizes[0]);

        let perturbation = match (can_swap_teams, can_swap_weeks) {
            (false, false) => return Perturbation::Nothing,
            (true, true) if rng.gen_bool(0.5) => self.pick_week_swap(rng),
            (false, true) => self.pick_week_swap(rng),
            _ => {
                let (i, j) = distinct_pair(rng, n);
                Perturbation::SwapTeams(i, j)
            }
        };
        self.apply(perturbation);
        perturbation
    }

    /// Two weeks of different size; at least two distinct sizes must exist.
    fn pick_week_swap<R: Rng + ?Sized>(&self, rng: &mut R) -> Perturbation {
        let weeks = self.sizes.len();
        let a = rng.gen_range(0..weeks);
        let differing = self.sizes.iter().filter(|&&size| size != self.sizes[a]).count();
        let k = rng.gen_range(0..differing);
        self.sizes
            .iter()
            .enumerate()
            .filter(|&(_, &size)| size != self.sizes[a])
            .nth(k)
            .map_or(Perturbation::Nothing, |(b, _)| Perturbation::SwapWeeks(a, b))
    }

    /// Revert a move returned by [`Streak::perturbate`].
    pub fn undo(&mut self, perturbation: Perturbation) {
        // both moves are swaps, so they are their own inverse
        self.apply(perturbation);
    }

    fn apply(&mut self, perturbation: Perturbation) {
        match perturbation {
            Perturbation::SwapTeams(i, j) => self.order.swap(i, j),
            Perturbation::SwapWeeks(a, b) => {
                self.sizes.swap(a, b);
                self.offsets = offsets_for(&self.sizes);
            }
            Perturbation::Nothing => {}
        }
    }

    /// Cumulative probability and spread under `predictions`.
    ///
    /// Bye weeks contribute nothing. Any zero-probability pick collapses the
    /// whole streak's probability to zero.
    pub fn summarize(&self, predictions: &Predictions) -> Result<StreakSummary> {
        let mut probability = 1.0;
        let mut spread = 0.0;
        for (w, &size) in self.sizes.iter().enumerate() {
            if size == 0 {
                continue;
            }
            for team in self.get_week(w) {
                let p = predictions.get(team, w)?;
                probability *= p.probability;
                spread += p.spread;
            }
        }
        Ok(StreakSummary {
            probability,
            spread,
        })
    }

    /// Week-by-week plan with the prediction for every pick.
    pub fn plan(&self, predictions: &Predictions) -> Result<Vec<WeekPlan>> {
        self.weeks()
            .enumerate()
            .map(|(week, teams)| {
                let picks = teams
                    .iter()
                    .map(|team| {
                        let p = predictions.get(team, week)?;
                        Ok(PickDetail {
                            team: team.clone(),
                            probability: p.probability,
                            spread: p.spread,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(WeekPlan { week, picks })
            })
            .collect()
    }
}

impl PartialEq for Streak {
    /// Two streaks are equal when every week holds the same set of teams.
    fn eq(&self, other: &Self) -> bool {
        if self.sizes != other.sizes {
            return false;
        }
        self.weeks().zip(other.weeks()).all(|(a, b)| {
            let mut a = a.to_vec();
            let mut b = b.to_vec();
            a.sort_unstable();
            b.sort_unstable();
            a == b
        })
    }
}

impl Eq for Streak {}

impl fmt::Display for Streak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (w, week) in self.weeks().enumerate() {
            if w > 0 {
                f.write_str(" | ")?;
            }
            let names: Vec<&str> = week.iter().map(Team::name).collect();
            f.write_str(&names.join(" + "))?;
        }
        Ok(())
    }
}

fn offsets_for(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .scan(0, |next, &size| {
            let start = *next;
            *next += size;
            Some(start)
        })
        .collect()
}

fn distinct_pair<R: Rng + ?Sized>(rng: &mut R, n: usize) -> (usize, usize) {
    let a = rng.gen_range(0..n);
    let mut b = rng.gen_range(0..n - 1);
    if b >= a {
        b += 1;
    }
    (a, b)
}
