use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreakError};
use crate::team::Team;

/// Where a game is played, from the first team's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelativeLocation {
    Away = -2,
    Far = -1,
    Neutral = 0,
    Near = 1,
    Home = 2,
}

impl RelativeLocation {
    pub fn value(self) -> i8 {
        self as i8
    }

    /// The same site seen from the other team.
    pub fn flip(self) -> Self {
        match self {
            RelativeLocation::Away => RelativeLocation::Home,
            RelativeLocation::Far => RelativeLocation::Near,
            RelativeLocation::Neutral => RelativeLocation::Neutral,
            RelativeLocation::Near => RelativeLocation::Far,
            RelativeLocation::Home => RelativeLocation::Away,
        }
    }

    pub fn is_neutral(self) -> bool {
        self == RelativeLocation::Neutral
    }
}

/// A contest between two teams.
///
/// Equality and hashing ignore which team is listed first: `(a, b, Home)`
/// equals `(b, a, Away)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    pub team1: Team,
    pub team2: Team,
    pub location: RelativeLocation,
}

impl Game {
    pub fn new(team1: Team, team2: Team, location: RelativeLocation) -> Self {
        Game {
            team1,
            team2,
            location,
        }
    }

    /// The canonical bye game for `team`.
    pub fn bye(team: Team) -> Self {
        Game::new(team, Team::Bye, RelativeLocation::Neutral)
    }

    /// The same game seen from the second team.
    pub fn swap(&self) -> Self {
        Game::new(self.team2.clone(), self.team1.clone(), self.location.flip())
    }

    /// Participant by index (0 or 1).
    pub fn team(&self, index: usize) -> Result<&Team> {
        match index {
            0 => Ok(&self.team1),
            1 => Ok(&self.team2),
            _ => Err(StreakError::TeamIndexOutOfRange(index)),
        }
    }

    pub fn involves(&self, team: &Team) -> bool {
        &self.team1 == team || &self.team2 == team
    }

    /// Returns the game oriented so that `team` is listed first.
    pub fn from_perspective(&self, team: &Team) -> Option<Game> {
        if &self.team1 == team {
            Some(self.clone())
        } else if &self.team2 == team {
            Some(self.swap())
        } else {
            None
        }
    }

    pub fn is_bye(&self) -> bool {
        self.team1.is_bye() || self.team2.is_bye()
    }

    /// Orientation used for hashing: lower team identifier first.
    fn canonical_key(&self) -> (&Team, &Team, i8) {
        match self.team1.cmp(&self.team2) {
            std::cmp::Ordering::Less => (&self.team1, &self.team2, self.location.value()),
            std::cmp::Ordering::Greater => (&self.team2, &self.team1, -self.location.value()),
            std::cmp::Ordering::Equal => (&self.team1, &self.team2, self.location.value().abs()),
        }
    }
}

impl PartialEq for Game {
    fn eq(&self, other: &Self) -> bool {
        (self.team1 == other.team1 && self.team2 == other.team2 && self.location == other.location)
            || (self.team1 == other.team2
                && self.team2 == other.team1
                && self.location == other.location.flip())
    }
}

impl Eq for Game {}

impl Hash for Game {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = match self.location {
            RelativeLocation::Home | RelativeLocation::Near => "vs",
            RelativeLocation::Neutral => "n",
            RelativeLocation::Far | RelativeLocation::Away => "@",
        };
        write!(f, "{} {} {}", self.team1, sep, self.team2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn game(a: &str, b: &str, loc: RelativeLocation) -> Game {
        Game::new(Team::named(a), Team::named(b), loc)
    }

    #[test]
    fn test_swap_negates_location() {
        let g = game("A", "B", RelativeLocation::Near);
        let s = g.swap();
        assert_eq!(s.team1, Team::named("B"));
        assert_eq!(s.location, RelativeLocation::Far);
        assert_eq!(s.location.value(), -g.location.value());
    }

    #[test]
    fn test_equality_is_symmetric_under_swap() {
        let g = game("A", "B", RelativeLocation::Home);
        assert_eq!(g, g.swap());
        assert_ne!(g, game("A", "B", RelativeLocation::Away));

        let mut set = HashSet::new();
        set.insert(g.clone());
        set.insert(g.swap());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_team_index_bounds() {
        let g = game("A", "B", RelativeLocation::Neutral);
        assert_eq!(g.team(1).unwrap(), &Team::named("B"));
        assert!(matches!(g.team(2), Err(StreakError::TeamIndexOutOfRange(2))));
    }

    #[test]
    fn test_from_perspective() {
        let g = game("A", "B", RelativeLocation::Home);
        let b_view = g.from_perspective(&Team::named("B")).unwrap();
        assert_eq!(b_view.team1, Team::named("B"));
        assert_eq!(b_view.location, RelativeLocation::Away);
        assert!(g.from_perspective(&Team::named("C")).is_none());
    }
}
