use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Result, StreakError};
use crate::model::Prediction;
use crate::team::Team;

/// Manual prediction overrides for specific matchups.
///
/// Overrides are stored with teams in lexicographic order. When retrieving
/// an override, the prediction is flipped if the teams are provided in
/// reverse order.
#[derive(Clone, Debug, Default)]
pub struct OverridesMap {
    overrides: HashMap<(Team, Team), Prediction>,
}

impl OverridesMap {
    pub fn new() -> Self {
        OverridesMap {
            overrides: HashMap::new(),
        }
    }

    /// Read overrides from a CSV file.
    /// Format: team1,team2,probability,spread
    pub fn read_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path)?;
        self.read_from(file)
    }

    pub fn read_from<R: Read>(&mut self, reader: R) -> Result<()> {
        for (number, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() != 4 {
                return Err(StreakError::Parse(format!(
                    "override line {}: expected 4 fields, found {}",
                    number + 1,
                    parts.len()
                )));
            }

            let probability: f64 = parts[2].parse().map_err(|e| {
                StreakError::Parse(format!("override line {}: probability: {}", number + 1, e))
            })?;
            let spread: f64 = parts[3].parse().map_err(|e| {
                StreakError::Parse(format!("override line {}: spread: {}", number + 1, e))
            })?;

            self.add_override(
                Team::from(parts[0]),
                Team::from(parts[1]),
                Prediction::new(probability, spread),
            );
        }

        Ok(())
    }

    /// Add or update an override for a matchup.
    pub fn add_override(&mut self, team1: Team, team2: Team, prediction: Prediction) {
        if team1 < team2 {
            self.overrides.insert((team1, team2), prediction);
        } else {
            self.overrides.insert((team2, team1), prediction.flip());
        }
    }

    pub fn remove_override(&mut self, team1: &Team, team2: &Team) {
        let key = if team1 < team2 {
            (team1.clone(), team2.clone())
        } else {
            (team2.clone(), team1.clone())
        };
        self.overrides.remove(&key);
    }

    /// The override for `team1` against `team2`, if one exists.
    pub fn get(&self, team1: &Team, team2: &Team) -> Option<Prediction> {
        if self.overrides.is_empty() {
            return None;
        }
        if team1 < team2 {
            self.overrides.get(&(team1.clone(), team2.clone())).copied()
        } else {
            self.overrides
                .get(&(team2.clone(), team1.clone()))
                .map(|p| p.flip())
        }
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
