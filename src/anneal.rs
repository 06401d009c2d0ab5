//! Simulated-annealing search over the streak space.
//!
//! Each worker owns a working streak and RNG, and reports every new
//! reset-best streak once per team in its first week. A single reducer keeps
//! the best report per `(player, team)`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::cancel::CancelToken;
use crate::constants::{
    DEFAULT_WORKERS, MAX_DEGENERATE_MOVES, MAX_ITERATIONS, QUEUE_BOUND, TEMPERATURE_CONSTANT,
    TEMPERATURE_EXPONENT, WANDER_LIMIT,
};
use crate::error::{Result, StreakError};
use crate::predictions::Predictions;
use crate::streak::{Perturbation, Streak, StreakSummary};
use crate::team::Team;

/// Annealing parameters shared by every worker of a search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnealParams {
    pub workers: usize,
    pub max_iterations: u64,
    pub temperature_constant: f64,
    pub temperature_exponent: f64,
    pub wander_limit: u64,
    /// Base seed; `None` seeds from the wall clock.
    pub seed: Option<u64>,
    pub queue_bound: usize,
}

impl Default for AnnealParams {
    fn default() -> Self {
        AnnealParams {
            workers: DEFAULT_WORKERS,
            max_iterations: MAX_ITERATIONS,
            temperature_constant: TEMPERATURE_CONSTANT,
            temperature_exponent: TEMPERATURE_EXPONENT,
            wander_limit: WANDER_LIMIT,
            seed: None,
            queue_bound: QUEUE_BOUND,
        }
    }
}

impl AnnealParams {
    /// `(tC · (maxIterations − i) / maxIterations)^tE`
    pub fn temperature(&self, iteration: u64) -> f64 {
        if self.max_iterations == 0 {
            return 0.0;
        }
        let remaining = self.max_iterations.saturating_sub(iteration) as f64;
        (self.temperature_constant * remaining / self.max_iterations as f64)
            .powf(self.temperature_exponent)
    }

    fn base_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        })
    }
}

/// Acceptance rule for replacing the best streak.
///
/// Improvements are always taken; otherwise the loss scaled by the size of
/// both objectives must beat a uniform draw.
pub fn accept(candidate: f64, best: f64, draw: f64) -> bool {
    if candidate > best {
        return true;
    }
    let delta = candidate - best;
    let scale = (best + candidate).abs().max(1.0);
    delta / scale > draw
}

/// A streak reported by a worker for one opening pick.
#[derive(Clone, Debug)]
pub struct StreakCandidate {
    pub player: String,
    pub team: Team,
    pub streak: Streak,
    pub probability: f64,
    pub spread: f64,
}

impl StreakCandidate {
    pub fn expected(&self) -> f64 {
        self.probability * self.spread
    }

    /// Lexicographic order on `(probability, spread)`.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.probability
            .total_cmp(&other.probability)
            .then(self.spread.total_cmp(&other.spread))
    }
}

/// Keeps the lexicographic-max candidate per `(player, team)`.
#[derive(Debug, Default)]
pub struct Reducer {
    best: HashMap<(String, Team), StreakCandidate>,
}

impl Reducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, candidate: StreakCandidate) {
        let key = (candidate.player.clone(), candidate.team.clone());
        match self.best.get_mut(&key) {
            Some(current) => {
                if candidate.cmp_key(current) == Ordering::Greater {
                    *current = candidate;
                }
            }
            None => {
                self.best.insert(key, candidate);
            }
        }
    }

    pub fn get(&self, player: &str, team: &Team) -> Option<&StreakCandidate> {
        self.best.get(&(player.to_string(), team.clone()))
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn into_candidates(self) -> Vec<StreakCandidate> {
        self.best.into_values().collect()
    }
}

/// Counters from one worker run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub iterations: u64,
    pub degenerate_moves: u64,
    pub improvements: u64,
    pub wander_resets: u64,
}

/// Run one annealing worker from `start`.
///
/// `emit` receives each new reset-best streak once per team in its first
/// week; an error from `emit` stops the worker.
pub fn anneal_worker<F>(
    player: &str,
    start: Streak,
    predictions: &Predictions,
    params: &AnnealParams,
    seed: u64,
    cancel: &CancelToken,
    mut emit: F,
) -> Result<WorkerStats>
where
    F: FnMut(StreakCandidate) -> Result<()>,
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut stats = WorkerStats::default();

    let mut current = start;
    current.shuffle(&mut rng);
    let mut current_summary = current.summarize(predictions)?;

    let mut best: Option<(Streak, StreakSummary)> = None;
    let mut reset: Option<(Streak, StreakSummary)> = None;
    let mut report = |streak: &Streak, summary: &StreakSummary| -> Result<()> {
        for team in streak.first_week() {
            emit(StreakCandidate {
                player: player.to_string(),
                team: team.clone(),
                streak: streak.clone(),
                probability: summary.probability,
                spread: summary.spread,
            })?;
        }
        Ok(())
    };

    if current_summary.probability > 0.0 {
        best = Some((current.clone(), current_summary));
        reset = Some((current.clone(), current_summary));
        report(&current, &current_summary)?;
    }

    let mut wander = 0u64;
    let mut consecutive_degenerate = 0u64;
    let degenerate_limit = params.max_iterations.clamp(1, MAX_DEGENERATE_MOVES);

    while stats.iterations < params.max_iterations {
        if cancel.is_cancelled() {
            return Err(StreakError::Cancelled);
        }

        let perturbation = current.perturbate(&mut rng, true);
        if perturbation == Perturbation::Nothing {
            break;
        }

        let summary = current.summarize(predictions)?;
        if summary.probability == 0.0 {
            stats.degenerate_moves += 1;
            consecutive_degenerate += 1;
            if current_summary.probability > 0.0 {
                current.undo(perturbation);
            } else {
                current_summary = summary;
            }
            if consecutive_degenerate >= degenerate_limit {
                warn!(player, seed, "every neighbouring streak loses, stopping worker");
                break;
            }
            continue;
        }
        consecutive_degenerate = 0;
        current_summary = summary;
        stats.iterations += 1;
        wander += 1;

        let draw: f64 = rng.gen();
        let replace = match best.as_ref() {
            Some((_, best_summary)) => accept(summary.expected(), best_summary.expected(), draw),
            None => true,
        };
        if replace {
            best = Some((current.clone(), summary));
        }

        if let Some((best_streak, best_summary)) = best.as_ref() {
            let improved = reset
                .as_ref()
                .map_or(true, |(_, r)| best_summary.expected() > r.expected());
            if improved {
                reset = Some((best_streak.clone(), *best_summary));
                wander = 0;
                stats.improvements += 1;
                debug!(
                    player,
                    seed,
                    iteration = stats.iterations,
                    temperature = params.temperature(stats.iterations),
                    probability = best_summary.probability,
                    spread = best_summary.spread,
                    "new best streak"
                );
                report(best_streak, best_summary)?;
            }
        }

        if wander >= params.wander_limit {
            if let Some((reset_streak, reset_summary)) = reset.as_ref() {
                trace!(player, seed, iteration = stats.iterations, "wander limit reached, resetting");
                current.clone_from(reset_streak);
                current_summary = *reset_summary;
                stats.wander_resets += 1;
            }
            wander = 0;
        }
    }

    Ok(stats)
}

/// Anneal one streak space with `params.workers` parallel workers.
///
/// Returns the best candidate per opening team. The reducer drains the
/// queue to completion before the first worker error, if any, is returned.
pub fn search(
    player: &str,
    streak: &Streak,
    predictions: &Predictions,
    params: &AnnealParams,
    cancel: &CancelToken,
) -> Result<Vec<StreakCandidate>> {
    let workers = params.workers.max(1);
    let base_seed = params.base_seed();
    info!(
        player,
        workers,
        iterations = params.max_iterations,
        teams = streak.num_teams(),
        weeks = streak.num_weeks(),
        "starting annealing search"
    );

    let (tx, rx) = mpsc::sync_channel::<StreakCandidate>(params.queue_bound.max(1));

    let (reducer, results) = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers as u64)
            .map(|worker| {
                let tx = tx.clone();
                scope.spawn(move || {
                    anneal_worker(
                        player,
                        streak.clone(),
                        predictions,
                        params,
                        base_seed.wrapping_add(worker),
                        cancel,
                        |candidate| tx.send(candidate).map_err(|_| StreakError::Cancelled),
                    )
                })
            })
            .collect();
        drop(tx);

        let mut reducer = Reducer::new();
        for candidate in rx {
            reducer.offer(candidate);
        }

        let results: Vec<Result<WorkerStats>> = handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect();
        (reducer, results)
    });

    let mut total = WorkerStats::default();
    for result in results {
        let stats = result?;
        total.iterations += stats.iterations;
        total.degenerate_moves += stats.degenerate_moves;
        total.improvements += stats.improvements;
        total.wander_resets += stats.wander_resets;
    }

    info!(
        player,
        candidates = reducer.len(),
        iterations = total.iterations,
        degenerate = total.degenerate_moves,
        improvements = total.improvements,
        resets = total.wander_resets,
        "annealing search finished"
    );
    Ok(reducer.into_candidates())
}
