use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::anneal::{search, AnnealParams, StreakCandidate};
use crate::cancel::CancelToken;
use crate::error::{Result, StreakError};
use crate::picker::{group_duplicates, Picker, PickerGroup};
use crate::predictions::Predictions;
use crate::slots::PickSlots;
use crate::streak::WeekPlan;
use crate::team::Team;

/// Best full-season plan for one opening pick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidatePlan {
    pub first_pick: Team,
    pub probability: f64,
    pub spread: f64,
    pub expected: f64,
    pub weeks: Vec<WeekPlan>,
}

/// Search result published for one picker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreakPrediction {
    pub picker: String,
    pub season: i32,
    pub week: usize,
    pub remaining_teams: Vec<Team>,
    pub remaining_slots: PickSlots,
    /// Teams of this week's recommended pick.
    pub best_picks: Vec<Team>,
    pub probability: f64,
    pub spread: f64,
    /// Every opening pick, best first.
    pub candidates: Vec<CandidatePlan>,
    pub calculation_start: DateTime<Utc>,
    pub calculation_end: DateTime<Utc>,
}

impl StreakPrediction {
    /// Same record for another picker.
    pub fn for_picker(&self, picker: &str) -> Self {
        StreakPrediction {
            picker: picker.to_string(),
            ..self.clone()
        }
    }
}

/// Sort by `probability × spread` descending, ties by probability descending.
pub fn rank_candidates(candidates: &mut [CandidatePlan]) {
    candidates.sort_by(|a, b| {
        b.expected
            .total_cmp(&a.expected)
            .then(b.probability.total_cmp(&a.probability))
    });
}

/// Fold reducer output for one search into a published record.
///
/// `week` is the season week of the first remaining week; plan weeks are
/// reported in season numbering.
pub fn build_prediction(
    group: &PickerGroup,
    candidates: Vec<StreakCandidate>,
    predictions: &Predictions,
    season: i32,
    week: usize,
    calculation_start: DateTime<Utc>,
    calculation_end: DateTime<Utc>,
) -> Result<StreakPrediction> {
    let mut plans = candidates
        .into_iter()
        .map(|candidate| {
            let mut weeks = candidate.streak.plan(predictions)?;
            for plan in &mut weeks {
                plan.week += week;
            }
            Ok(CandidatePlan {
                expected: candidate.expected(),
                first_pick: candidate.team,
                probability: candidate.probability,
                spread: candidate.spread,
                weeks,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    rank_candidates(&mut plans);

    let (best_picks, probability, spread) = match plans.first() {
        Some(best) => (
            best.weeks
                .first()
                .map(|w| w.picks.iter().map(|p| p.team.clone()).collect())
                .unwrap_or_default(),
            best.probability,
            best.spread,
        ),
        None => (Vec::new(), 0.0, 0.0),
    };

    let picker = &group.representative;
    Ok(StreakPrediction {
        picker: picker.id.clone(),
        season,
        week,
        remaining_teams: picker.remaining.clone(),
        remaining_slots: picker.slots.clone(),
        best_picks,
        probability,
        spread,
        candidates: plans,
        calculation_start,
        calculation_end,
    })
}

/// Run one search per distinct picker and replicate results to duplicates.
///
/// Every picker is validated against `predictions` before any search starts.
pub fn predict_streaks(
    pickers: &[Picker],
    predictions: &Predictions,
    params: &AnnealParams,
    cancel: &CancelToken,
    season: i32,
    week: usize,
) -> Result<Vec<StreakPrediction>> {
    for picker in pickers {
        picker.validate()?;
        if let Some(team) = picker.remaining.iter().find(|t| !predictions.contains(t)) {
            return Err(StreakError::UnknownTeam(format!("{} (picker {})", team, picker.id)));
        }
    }

    let groups = group_duplicates(pickers);
    info!(pickers = pickers.len(), searches = groups.len(), season, week, "predicting streaks");

    let mut results = Vec::with_capacity(pickers.len());
    for group in &groups {
        let start = Utc::now();
        let streak = group.representative.streak()?;
        let candidates = search(&group.representative.id, &streak, predictions, params, cancel)?;
        let end = Utc::now();

        let prediction = build_prediction(group, candidates, predictions, season, week, start, end)?;
        info!(
            picker = %prediction.picker,
            clones = group.members.len() - 1,
            best = ?prediction.best_picks.iter().map(Team::name).collect::<Vec<_>>(),
            probability = prediction.probability,
            spread = prediction.spread,
            "streak prediction ready"
        );
        let replicas: Vec<StreakPrediction> =
            group.clones().map(|clone| prediction.for_picker(clone)).collect();
        results.push(prediction);
        results.extend(replicas);
    }
    Ok(results)
}
