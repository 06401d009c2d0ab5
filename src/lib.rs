//! Streak Core - survivor-streak pick optimisation.
//!
//! Predicts per-game outcomes from team ratings, searches each picker's
//! remaining streak space with parallel simulated annealing, and offers a
//! brute-force enumerator and a season simulator for posterior analysis.
//! Python bindings are available behind the `python` feature.

pub mod aggregate;
pub mod anneal;
pub mod cancel;
pub mod config;
pub mod constants;
pub mod enumerate;
pub mod error;
pub mod game;
pub mod ingest;
pub mod model;
pub mod oracle;
pub mod overrides;
pub mod permutor;
pub mod picker;
pub mod posterior;
pub mod predictions;
pub mod schedule;
pub mod slots;
pub mod streak;
pub mod team;
pub mod win_prob;

#[cfg(feature = "python")]
mod python;

pub use aggregate::{predict_streaks, CandidatePlan, StreakPrediction};
pub use anneal::{search, AnnealParams, Reducer, StreakCandidate};
pub use cancel::CancelToken;
pub use config::{Config, PosteriorConfig, SearchConfig};
pub use enumerate::{EnumerationTally, Enumerator};
pub use error::{Result, StreakError};
pub use game::{Game, RelativeLocation};
pub use model::{OutcomeModel, Prediction};
pub use oracle::{GameResult, OracleModel};
pub use overrides::OverridesMap;
pub use permutor::{IdenticalPermutor, IndexPermutor, Permutor};
pub use picker::{group_duplicates, select_pickers, Picker};
pub use posterior::{SeasonSimulator, WinDistribution};
pub use predictions::Predictions;
pub use schedule::{GameRecord, Schedule};
pub use slots::PickSlots;
pub use streak::{Perturbation, Streak, StreakSummary};
pub use team::Team;
pub use win_prob::{calculate_spread, GaussianSpreadModel, Rating};
