use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreakError};
use crate::game::{Game, RelativeLocation};
use crate::team::Team;

/// One game as delivered by the schedule source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub home: Team,
    pub away: Team,
    #[serde(default)]
    pub neutral_site: bool,
}

impl GameRecord {
    pub fn new(home: Team, away: Team, neutral_site: bool) -> Self {
        GameRecord {
            home,
            away,
            neutral_site,
        }
    }

    /// The game from the home team's perspective.
    pub fn to_game(&self) -> Game {
        let location = if self.neutral_site {
            RelativeLocation::Neutral
        } else {
            RelativeLocation::Home
        };
        Game::new(self.home.clone(), self.away.clone(), location)
    }
}

/// Per-team game list for the remaining weeks of a season.
///
/// Every entry lists its team first; weeks without a game hold the
/// canonical bye game.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    games: BTreeMap<Team, Vec<Game>>,
    weeks: usize,
    first_week: usize,
}

impl Schedule {
    /// Build the schedule for `teams` from a season's weekly game lists.
    pub fn build<'a>(
        season: &[Vec<GameRecord>],
        teams: impl IntoIterator<Item = &'a Team>,
    ) -> Result<Self> {
        let mut games = BTreeMap::new();

        for team in teams {
            if team.is_reserved() {
                return Err(StreakError::ReservedTeam(team.clone()));
            }

            let row = season
                .iter()
                .map(|week| {
                    week.iter()
                        .find_map(|record| {
                            if &record.home == team {
                                Some(record.to_game())
                            } else if &record.away == team {
                                Some(record.to_game().swap())
                            } else {
                                None
                            }
                        })
                        .unwrap_or_else(|| Game::bye(team.clone()))
                })
                .collect();

            games.insert(team.clone(), row);
        }

        Ok(Schedule {
            games,
            weeks: season.len(),
            first_week: 0,
        })
    }

    /// Build directly from per-team game lists.
    ///
    /// Every list must have the same length and each game must involve its
    /// team; games are reoriented so the team is listed first.
    pub fn from_games(games: BTreeMap<Team, Vec<Game>>) -> Result<Self> {
        let weeks = games.values().map(Vec::len).max().unwrap_or(0);
        let mut oriented = BTreeMap::new();

        for (team, row) in games {
            if row.len() != weeks {
                return Err(StreakError::WeekOutOfRange {
                    week: row.len(),
                    weeks,
                });
            }
            let row = row
                .iter()
                .map(|game| {
                    game.from_perspective(&team)
                        .ok_or_else(|| StreakError::UnknownTeam(format!("{} not in {}", team, game)))
                })
                .collect::<Result<Vec<_>>>()?;
            oriented.insert(team, row);
        }

        Ok(Schedule {
            games: oriented,
            weeks,
            first_week: 0,
        })
    }

    /// Drop `weeks` weeks off the head of the schedule.
    pub fn truncate_head(&mut self, weeks: usize) -> Result<()> {
        if weeks > self.weeks {
            return Err(StreakError::WeekOutOfRange {
                week: weeks,
                weeks: self.weeks,
            });
        }
        for row in self.games.values_mut() {
            row.drain(..weeks);
        }
        self.weeks -= weeks;
        self.first_week += weeks;
        Ok(())
    }

    /// Copy of the schedule starting at `week`.
    pub fn remaining(&self, week: usize) -> Result<Schedule> {
        let mut schedule = self.clone();
        schedule.truncate_head(week)?;
        Ok(schedule)
    }

    pub fn num_weeks(&self) -> usize {
        self.weeks
    }

    /// Season week of the schedule's first column.
    pub fn first_week(&self) -> usize {
        self.first_week
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.games.keys()
    }

    pub fn contains(&self, team: &Team) -> bool {
        self.games.contains_key(team)
    }

    pub fn games_for(&self, team: &Team) -> Result<&[Game]> {
        self.games
            .get(team)
            .map(Vec::as_slice)
            .ok_or_else(|| StreakError::UnknownTeam(team.to_string()))
    }

    pub fn get(&self, team: &Team, week: usize) -> Result<&Game> {
        let row = self.games_for(team)?;
        row.get(week).ok_or(StreakError::WeekOutOfRange {
            week,
            weeks: self.weeks,
        })
    }

    /// Each physical contest once, as `(week, game)`, byes excluded.
    pub fn unique_games(&self) -> Vec<(usize, Game)> {
        let mut unique = Vec::new();
        for week in 0..self.weeks {
            let mut seen = HashSet::new();
            for row in self.games.values() {
                let game = &row[week];
                if game.is_bye() {
                    continue;
                }
                if seen.insert(game.clone()) {
                    unique.push((week, game.clone()));
                }
            }
        }
        unique
    }
}
