use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreakError};
use crate::slots::PickSlots;
use crate::streak::Streak;
use crate::team::Team;

/// A streak participant, reduced to what the search needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Picker {
    #[serde(rename = "picker")]
    pub id: String,
    #[serde(rename = "remaining_teams")]
    pub remaining: Vec<Team>,
    pub slots: PickSlots,
}

impl Picker {
    pub fn new(id: impl Into<String>, remaining: Vec<Team>, slots: PickSlots) -> Self {
        Picker {
            id: id.into(),
            remaining,
            slots,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for team in &self.remaining {
            if team.is_reserved() {
                return Err(StreakError::ReservedTeam(team.clone()));
            }
            if !seen.insert(team) {
                return Err(StreakError::DuplicateTeam(team.clone()));
            }
        }
        self.slots.check_teams(self.remaining.len())
    }

    /// Remaining teams in sorted order with the slot counts.
    pub fn search_key(&self) -> SearchKey {
        let mut teams = self.remaining.clone();
        teams.sort();
        SearchKey {
            teams,
            slots: self.slots.clone(),
        }
    }

    /// The canonical streak over this picker's remaining teams.
    pub fn streak(&self) -> Result<Streak> {
        Streak::new(self.search_key().teams, &self.slots)
    }
}

/// Canonical identity of a search: pickers sharing it share one result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchKey {
    pub teams: Vec<Team>,
    pub slots: PickSlots,
}

/// Pickers with identical remaining teams and slot counts.
#[derive(Clone, Debug, PartialEq)]
pub struct PickerGroup {
    /// First picker of the group; its id labels the shared search.
    pub representative: Picker,
    /// Ids of every member, representative first.
    pub members: Vec<String>,
}

impl PickerGroup {
    pub fn clones(&self) -> impl Iterator<Item = &str> {
        self.members.iter().skip(1).map(String::as_str)
    }
}

/// Collapse duplicate pickers, keeping first-seen order.
pub fn group_duplicates(pickers: &[Picker]) -> Vec<PickerGroup> {
    let mut index: BTreeMap<SearchKey, usize> = BTreeMap::new();
    let mut groups: Vec<PickerGroup> = Vec::new();

    for picker in pickers {
        let key = picker.search_key();
        match index.get(&key) {
            Some(&i) => groups[i].members.push(picker.id.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(PickerGroup {
                    representative: picker.clone(),
                    members: vec![picker.id.clone()],
                });
            }
        }
    }
    groups
}

/// Resolve the requested picker names against the roster.
pub fn select_pickers(roster: &[Picker], names: &[String], all: bool) -> Result<Vec<Picker>> {
    if all {
        return Ok(roster.to_vec());
    }
    if names.is_empty() {
        return Err(StreakError::NoPickers);
    }
    names
        .iter()
        .map(|name| {
            roster
                .iter()
                .find(|p| &p.id == name)
                .cloned()
                .ok_or_else(|| StreakError::UnknownPicker(name.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker(id: &str, teams: &[&str], slots: Vec<usize>) -> Picker {
        Picker::new(
            id,
            teams.iter().map(|&t| Team::named(t)).collect(),
            PickSlots::new(slots),
        )
    }

    #[test]
    fn test_group_duplicates_ignores_team_order() {
        let pickers = vec![
            picker("ann", &["A", "B"], vec![0, 2]),
            picker("bob", &["B", "A"], vec![0, 2]),
            picker("cat", &["A", "B"], vec![1, 0, 1]),
        ];
        let groups = group_duplicates(&pickers);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["ann", "bob"]);
        assert_eq!(groups[0].clones().collect::<Vec<_>>(), vec!["bob"]);
        assert_eq!(groups[1].representative.id, "cat");
    }

    #[test]
    fn test_select_pickers() {
        let roster = vec![picker("ann", &["A"], vec![0, 1]), picker("bob", &["B"], vec![0, 1])];
        assert_eq!(select_pickers(&roster, &[], true).unwrap().len(), 2);
        assert!(matches!(select_pickers(&roster, &[], false), Err(StreakError::NoPickers)));
        assert!(matches!(
            select_pickers(&roster, &["zed".to_string()], false),
            Err(StreakError::UnknownPicker(_))
        ));
        let chosen = select_pickers(&roster, &["bob".to_string()], false).unwrap();
        assert_eq!(chosen[0].id, "bob");
    }

    #[test]
    fn test_validate() {
        assert!(picker("ann", &["A", "B"], vec![0, 2]).validate().is_ok());
        assert!(picker("ann", &["A", "B"], vec![0, 1]).validate().is_err());
        assert!(picker("ann", &["A", "A"], vec![0, 2]).validate().is_err());
    }
}
