//! Brute-force walk of every streak for posterior analysis.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::{Result, StreakError};
use crate::permutor::{IdenticalPermutor, IndexPermutor, Permutor};
use crate::predictions::Predictions;
use crate::streak::{Streak, StreakSummary};
use crate::team::Team;

const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Marginal counts over the surviving streaks.
#[derive(Clone, Debug)]
pub struct EnumerationTally {
    /// Season week of column 0.
    pub first_week: usize,
    pub total_streaks: u64,
    pub surviving_streaks: u64,
    /// `[team][week]` surviving streaks picking `team` in `week`
    pub success_by_team: BTreeMap<Team, Vec<u64>>,
    /// `[team][week]` summed streak spread over those streaks
    pub spread_by_team: BTreeMap<Team, Vec<f64>>,
    /// `[k][week]` surviving streaks with `k` picks in `week`
    pub success_by_week_type: Vec<Vec<u64>>,
    /// `[k][week]` summed streak spread over those streaks
    pub spread_by_week_type: Vec<Vec<f64>>,
    /// Highest expected value seen
    pub best: Option<(Streak, StreakSummary)>,
}

impl EnumerationTally {
    fn new(teams: &[Team], weeks: usize, max_picks: usize, first_week: usize) -> Self {
        EnumerationTally {
            first_week,
            total_streaks: 0,
            surviving_streaks: 0,
            success_by_team: teams.iter().map(|t| (t.clone(), vec![0; weeks])).collect(),
            spread_by_team: teams.iter().map(|t| (t.clone(), vec![0.0; weeks])).collect(),
            success_by_week_type: vec![vec![0; weeks]; max_picks + 1],
            spread_by_week_type: vec![vec![0.0; weeks]; max_picks + 1],
            best: None,
        }
    }

    fn record(&mut self, streak: &Streak, summary: StreakSummary) {
        self.total_streaks += 1;
        if summary.probability <= 0.0 {
            return;
        }
        self.surviving_streaks += 1;

        for (w, &k) in streak.picks_per_week().iter().enumerate() {
            self.success_by_week_type[k][w] += 1;
            self.spread_by_week_type[k][w] += summary.spread;
            if k == 0 {
                continue;
            }
            for team in streak.get_week(w) {
                if let Some(row) = self.success_by_team.get_mut(team) {
                    row[w] += 1;
                }
                if let Some(row) = self.spread_by_team.get_mut(team) {
                    row[w] += summary.spread;
                }
            }
        }

        let better = self
            .best
            .as_ref()
            .map_or(true, |(_, b)| summary.expected() > b.expected());
        if better {
            self.best = Some((streak.clone(), summary));
        }
    }

    fn merge(mut self, other: EnumerationTally) -> Self {
        self.total_streaks += other.total_streaks;
        self.surviving_streaks += other.surviving_streaks;

        for (team, row) in other.success_by_team {
            let mine = self.success_by_team.entry(team).or_insert_with(|| vec![0; row.len()]);
            mine.iter_mut().zip(row).for_each(|(a, b)| *a += b);
        }
        for (team, row) in other.spread_by_team {
            let mine = self.spread_by_team.entry(team).or_insert_with(|| vec![0.0; row.len()]);
            mine.iter_mut().zip(row).for_each(|(a, b)| *a += b);
        }
        for (mine, theirs) in self.success_by_week_type.iter_mut().zip(other.success_by_week_type) {
            mine.iter_mut().zip(theirs).for_each(|(a, b)| *a += b);
        }
        for (mine, theirs) in self.spread_by_week_type.iter_mut().zip(other.spread_by_week_type) {
            mine.iter_mut().zip(theirs).for_each(|(a, b)| *a += b);
        }

        self.best = match (self.best.take(), other.best) {
            (Some(a), Some(b)) => Some(if b.1.expected() > a.1.expected() { b } else { a }),
            (a, b) => a.or(b),
        };
        self
    }

    /// Write the four marginal tables as `<key>,<week>,<value>` CSV files.
    pub fn write_tables(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let weeks = |row_len: usize| (0..row_len).map(move |w| w + self.first_week);

        let mut out = BufWriter::new(File::create(dir.join("success_by_team.csv"))?);
        writeln!(out, "team,week,count")?;
        for (team, row) in &self.success_by_team {
            for (week, value) in weeks(row.len()).zip(row) {
                writeln!(out, "{},{},{}", csv_field(team.name()), week, value)?;
            }
        }
        out.flush()?;

        let mut out = BufWriter::new(File::create(dir.join("spread_by_team.csv"))?);
        writeln!(out, "team,week,spread")?;
        for (team, row) in &self.spread_by_team {
            for (week, value) in weeks(row.len()).zip(row) {
                writeln!(out, "{},{},{}", csv_field(team.name()), week, value)?;
            }
        }
        out.flush()?;

        let mut out = BufWriter::new(File::create(dir.join("success_by_week_type.csv"))?);
        writeln!(out, "picks,week,count")?;
        for (k, row) in self.success_by_week_type.iter().enumerate() {
            for (week, value) in weeks(row.len()).zip(row) {
                writeln!(out, "{},{},{}", k, week, value)?;
            }
        }
        out.flush()?;

        let mut out = BufWriter::new(File::create(dir.join("spread_by_week_type.csv"))?);
        writeln!(out, "picks,week,spread")?;
        for (k, row) in self.spread_by_week_type.iter().enumerate() {
            for (week, value) in weeks(row.len()).zip(row) {
                writeln!(out, "{},{},{}", k, week, value)?;
            }
        }
        out.flush()?;

        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Walks every slot arrangement crossed with every team ordering.
pub struct Enumerator<'a> {
    streak: Streak,
    predictions: &'a Predictions,
    first_week: usize,
}

impl<'a> Enumerator<'a> {
    pub fn new(streak: Streak, predictions: &'a Predictions) -> Self {
        Enumerator {
            streak,
            predictions,
            first_week: 0,
        }
    }

    /// Season week used to label column 0 of the output tables.
    pub fn with_first_week(mut self, first_week: usize) -> Self {
        self.first_week = first_week;
        self
    }

    /// Streaks the walk will visit, saturating.
    pub fn size(&self) -> u128 {
        let slots = IdenticalPermutor::new(self.streak.slots().counts()).number_of_permutations();
        let orders = IndexPermutor::new(self.streak.num_teams()).number_of_permutations();
        slots.saturating_mul(orders)
    }

    pub fn run(&self, cancel: &CancelToken) -> Result<EnumerationTally> {
        let slots = self.streak.slots();
        let mut slot_permutor = IdenticalPermutor::new(slots.counts());
        let mut arrangements = Vec::new();
        while slot_permutor.permute() {
            arrangements.push(slot_permutor.permutation().to_vec());
        }

        info!(
            arrangements = arrangements.len(),
            teams = self.streak.num_teams(),
            streaks = %self.size(),
            "enumerating streak space"
        );

        let teams = self.streak.teams().to_vec();
        let weeks = self.streak.num_weeks();
        let max_picks = slots.max_picks_per_week();
        let empty = || EnumerationTally::new(&teams, weeks, max_picks, self.first_week);

        let tally = arrangements
            .par_iter()
            .map(|sizes| {
                let mut tally = empty();
                let mut streak = self.streak.clone();
                streak.set_week_sizes(sizes)?;

                let mut orders = IndexPermutor::new(streak.num_teams());
                while orders.permute() {
                    if tally.total_streaks % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                        return Err(StreakError::Cancelled);
                    }
                    streak.permute_team_order(orders.permutation())?;
                    let summary = streak.summarize(self.predictions)?;
                    tally.record(&streak, summary);
                }
                debug!(?sizes, streaks = tally.total_streaks, "slot arrangement done");
                Ok(tally)
            })
            .try_reduce(empty, |a, b| Ok(a.merge(b)))?;

        info!(
            total = tally.total_streaks,
            surviving = tally.surviving_streaks,
            "enumeration finished"
        );
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Prediction;
    use crate::slots::PickSlots;
    use std::collections::HashMap;

    fn predictions(rows: &[(&str, &[(f64, f64)])]) -> Predictions {
        let weeks = rows.first().map_or(0, |(_, r)| r.len());
        let table: HashMap<Team, Vec<Prediction>> = rows
            .iter()
            .map(|&(team, row)| {
                (
                    Team::named(team),
                    row.iter().map(|&(p, s)| Prediction::new(p, s)).collect(),
                )
            })
            .collect();
        Predictions::from_table(weeks, table).unwrap()
    }

    #[test]
    fn test_two_singles() {
        let preds = predictions(&[("A", &[(0.9, 7.0), (0.6, 2.0)]), ("B", &[(0.8, 5.0), (0.7, 3.0)])]);
        let streak =
            Streak::new(vec![Team::named("A"), Team::named("B")], &PickSlots::new(vec![0, 2])).unwrap();
        let enumerator = Enumerator::new(streak, &preds);
        assert_eq!(enumerator.size(), 2);

        let tally = enumerator.run(&CancelToken::new()).unwrap();
        assert_eq!(tally.total_streaks, 2);
        assert_eq!(tally.success_by_team[&Team::named("A")], vec![1, 1]);
        assert_eq!(tally.success_by_week_type[1], vec![2, 2]);
        assert!((tally.spread_by_team[&Team::named("A")][0] - 10.0).abs() < 1e-12);

        let (best, summary) = tally.best.unwrap();
        assert_eq!(best.get_week(0), &[Team::named("A")]);
        assert!((summary.probability - 0.63).abs() < 1e-12);
    }

    #[test]
    fn test_bye_weeks_and_zero_probability() {
        let preds = predictions(&[("A", &[(0.9, 7.0), (0.0, 0.0)]), ("B", &[(0.5, 1.0), (0.8, 5.0)])]);
        let streak =
            Streak::new(vec![Team::named("A"), Team::named("B")], &PickSlots::new(vec![1, 0, 1])).unwrap();
        let tally = Enumerator::new(streak, &preds).run(&CancelToken::new()).unwrap();

        // two slot arrangements x two orderings
        assert_eq!(tally.total_streaks, 4);
        // A+B in week 0 (twice, one per ordering); week 1 always loses for A
        assert_eq!(tally.surviving_streaks, 2);
        assert_eq!(tally.success_by_week_type[2], vec![2, 0]);
        assert_eq!(tally.success_by_week_type[0], vec![0, 2]);
    }

    #[test]
    fn test_write_tables() {
        let preds = predictions(&[("A", &[(0.9, 7.0)])]);
        let streak = Streak::new(vec![Team::named("A")], &PickSlots::new(vec![0, 1])).unwrap();
        let tally = Enumerator::new(streak, &preds)
            .with_first_week(3)
            .run(&CancelToken::new())
            .unwrap();

        let dir = std::env::temp_dir().join(format!("streak-enum-{}", std::process::id()));
        tally.write_tables(&dir).unwrap();
        let text = std::fs::read_to_string(dir.join("success_by_team.csv")).unwrap();
        assert_eq!(text, "team,week,count\nA,3,1\n");
        let text = std::fs::read_to_string(dir.join("spread_by_week_type.csv")).unwrap();
        assert_eq!(text, "picks,week,spread\n0,3,0\n1,3,7\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_csv_field_quotes() {
        assert_eq!(csv_field("Texas A&M"), "Texas A&M");
        assert_eq!(csv_field("Miami, FL"), "\"Miami, FL\"");
    }
}
