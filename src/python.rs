//! Python bindings.

use std::collections::HashMap;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::aggregate::predict_streaks;
use crate::anneal::AnnealParams;
use crate::cancel::CancelToken;
use crate::error::StreakError;
use crate::game::{Game, RelativeLocation};
use crate::model::{OutcomeModel, Prediction};
use crate::picker::Picker;
use crate::posterior::SeasonSimulator;
use crate::predictions::Predictions;
use crate::schedule::{GameRecord, Schedule};
use crate::slots::PickSlots;
use crate::team::Team;
use crate::win_prob::{GaussianSpreadModel, Rating};

impl From<StreakError> for PyErr {
    fn from(err: StreakError) -> PyErr {
        match err {
            StreakError::Cancelled | StreakError::Io(_) => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

fn gaussian_model(
    ratings: HashMap<String, (f64, f64)>,
    bias: f64,
    stddev: f64,
) -> Result<GaussianSpreadModel, StreakError> {
    let ratings = ratings
        .into_iter()
        .map(|(team, (points, home_bonus))| (Team::from(team), Rating::new(points, home_bonus)))
        .collect();
    GaussianSpreadModel::new(ratings, bias, stddev)
}

/// Win probability and spread for `team1` hosting `team2`.
///
/// `ratings` maps team name to `(points, home_bonus)`.
#[pyfunction]
#[pyo3(signature = (ratings, team1, team2, neutral_site = false, bias = 0.0, stddev = 13.5))]
fn predict_game(
    ratings: HashMap<String, (f64, f64)>,
    team1: String,
    team2: String,
    neutral_site: bool,
    bias: f64,
    stddev: f64,
) -> PyResult<(f64, f64)> {
    let model = gaussian_model(ratings, bias, stddev)?;
    let location = if neutral_site {
        RelativeLocation::Neutral
    } else {
        RelativeLocation::Home
    };
    let prediction = model.predict(&Game::new(Team::from(team1), Team::from(team2), location))?;
    Ok((prediction.probability, prediction.spread))
}

/// Ranked `(first_pick, probability, spread, weeks)` plans for one picker.
///
/// `predictions` maps team name to one `(probability, spread)` per remaining week.
#[pyfunction]
#[pyo3(signature = (predictions, teams, slots, iterations = 100_000, workers = 4, seed = None))]
fn best_streaks(
    py: Python<'_>,
    predictions: HashMap<String, Vec<(f64, f64)>>,
    teams: Vec<String>,
    slots: Vec<usize>,
    iterations: u64,
    workers: usize,
    seed: Option<u64>,
) -> PyResult<Vec<(String, f64, f64, Vec<Vec<String>>)>> {
    let weeks = predictions.values().map(Vec::len).max().unwrap_or(0);
    let table = predictions
        .into_iter()
        .map(|(team, row)| {
            let row = row.into_iter().map(|(p, s)| Prediction::new(p, s)).collect();
            (Team::from(team), row)
        })
        .collect();
    let predictions = Predictions::from_table(weeks, table)?;

    let picker = Picker::new(
        "python",
        teams.into_iter().map(Team::from).collect(),
        PickSlots::new(slots),
    );
    let params = AnnealParams {
        workers: workers.max(1),
        max_iterations: iterations,
        seed,
        ..AnnealParams::default()
    };

    let mut results = py.allow_threads(|| {
        predict_streaks(&[picker], &predictions, &params, &CancelToken::new(), 0, 0)
    })?;
    let prediction = results
        .pop()
        .ok_or_else(|| PyRuntimeError::new_err("search produced no prediction"))?;

    Ok(prediction
        .candidates
        .into_iter()
        .map(|plan| {
            let weeks = plan
                .weeks
                .iter()
                .map(|w| w.picks.iter().map(|p| p.team.name().to_string()).collect())
                .collect();
            (plan.first_pick.name().to_string(), plan.probability, plan.spread, weeks)
        })
        .collect())
}

/// Per-team `(mean, min, q25, q50, q75, max)` season wins.
///
/// `weeks` lists `(home, away, neutral_site)` games per week.
#[pyfunction]
#[pyo3(signature = (weeks, ratings, n_simulations, bias = 0.0, stddev = 13.5, seed = None, championship = false))]
#[allow(clippy::too_many_arguments)]
fn simulate_season(
    py: Python<'_>,
    weeks: Vec<Vec<(String, String, bool)>>,
    ratings: HashMap<String, (f64, f64)>,
    n_simulations: usize,
    bias: f64,
    stddev: f64,
    seed: Option<u64>,
    championship: bool,
) -> PyResult<HashMap<String, (f64, u32, u32, u32, u32, u32)>> {
    let season: Vec<Vec<GameRecord>> = weeks
        .into_iter()
        .map(|week| {
            week.into_iter()
                .map(|(home, away, neutral)| GameRecord::new(Team::from(home), Team::from(away), neutral))
                .collect()
        })
        .collect();
    let model = gaussian_model(ratings, bias, stddev)?;
    let teams: Vec<Team> = model.ratings().keys().cloned().collect();
    let schedule = Schedule::build(&season, teams.iter())?;

    let report = py.allow_threads(|| {
        SeasonSimulator::new(&schedule, &model)?
            .with_championship(championship)
            .run(n_simulations, seed, &CancelToken::new())
    })?;

    Ok(report
        .into_iter()
        .map(|d| (d.team.name().to_string(), (d.mean, d.min, d.q25, d.q50, d.q75, d.max)))
        .collect())
}

/// Python module definition
#[pymodule]
fn streak_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(predict_game, m)?)?;
    m.add_function(wrap_pyfunction!(best_streaks, m)?)?;
    m.add_function(wrap_pyfunction!(simulate_season, m)?)?;

    m.add("MAX_ITERATIONS", crate::constants::MAX_ITERATIONS)?;
    m.add("BYE", crate::team::BYE_NAME)?;
    m.add("NONE", crate::team::NONE_NAME)?;

    Ok(())
}
