use serde::{Deserialize, Serialize};

use crate::error::{Result, StreakError};

/// Pick-type slot counts: `counts[k]` is the number of weeks in which
/// exactly `k` teams are picked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PickSlots(Vec<usize>);

impl PickSlots {
    pub fn new(counts: Vec<usize>) -> Self {
        let mut counts = counts;
        while counts.last() == Some(&0) {
            counts.pop();
        }
        PickSlots(counts)
    }

    pub fn counts(&self) -> &[usize] {
        &self.0
    }

    /// Weeks with `k` picks.
    pub fn count(&self, k: usize) -> usize {
        self.0.get(k).copied().unwrap_or(0)
    }

    /// Largest pick count with at least one week.
    pub fn max_picks_per_week(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn num_weeks(&self) -> usize {
        self.0.iter().sum()
    }

    /// Σ k · s[k]
    pub fn total_picks(&self) -> usize {
        self.0.iter().enumerate().map(|(k, &n)| k * n).sum()
    }

    /// Per-week sizes in ascending order, one entry per week.
    pub fn week_sizes(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .flat_map(|(k, &n)| std::iter::repeat(k).take(n))
            .collect()
    }

    /// Slot counts realised by a list of per-week sizes.
    pub fn from_week_sizes(sizes: &[usize]) -> Self {
        let max = sizes.iter().copied().max().unwrap_or(0);
        let mut counts = vec![0; max + 1];
        for &size in sizes {
            counts[size] += 1;
        }
        PickSlots::new(counts)
    }

    /// Fails unless the slots consume exactly `teams` picks.
    pub fn check_teams(&self, teams: usize) -> Result<()> {
        let picks = self.total_picks();
        if picks != teams {
            return Err(StreakError::SlotMismatch {
                slots: self.0.clone(),
                picks,
                teams,
            });
        }
        Ok(())
    }
}

impl From<Vec<usize>> for PickSlots {
    fn from(counts: Vec<usize>) -> Self {
        PickSlots::new(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let slots = PickSlots::new(vec![0, 10, 2]);
        assert_eq!(slots.num_weeks(), 12);
        assert_eq!(slots.total_picks(), 14);
        assert_eq!(slots.max_picks_per_week(), 2);
        assert!(slots.check_teams(14).is_ok());
        assert!(matches!(
            slots.check_teams(13),
            Err(StreakError::SlotMismatch { picks: 14, teams: 13, .. })
        ));
    }

    #[test]
    fn test_week_sizes_round_trip() {
        let slots = PickSlots::new(vec![1, 2, 1, 0]);
        assert_eq!(slots.counts(), &[1, 2, 1]);
        assert_eq!(slots.week_sizes(), vec![0, 1, 1, 2]);
        assert_eq!(PickSlots::from_week_sizes(&[2, 1, 0, 1]), slots);
    }
}
