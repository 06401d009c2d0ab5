//! TOML run configuration.
//!
//! Every field is optional in the file; missing fields take the search
//! defaults. Command-line flags are applied on top by the binary.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::anneal::AnnealParams;
use crate::cancel::CancelToken;
use crate::constants::{
    DEFAULT_SIMULATIONS, DEFAULT_WORKERS, MAX_ITERATIONS, QUEUE_BOUND, TEMPERATURE_CONSTANT,
    TEMPERATURE_EXPONENT, WANDER_LIMIT,
};
use crate::error::Result;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub posterior: PosteriorConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Annealing search settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Parallel annealing workers per search.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Iterations per worker.
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Non-improving iterations before a worker reshuffles.
    #[serde(default = "default_wander_limit")]
    pub wander_limit: u64,
    #[serde(default = "default_temperature_constant")]
    pub temperature_constant: f64,
    #[serde(default = "default_temperature_exponent")]
    pub temperature_exponent: f64,
    /// Negative seeds from the wall clock.
    #[serde(default = "default_seed")]
    pub seed: i64,
    /// Capacity of the worker report channel.
    #[serde(default = "default_queue_bound")]
    pub queue_bound: usize,
    /// Cancel the run after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_iterations() -> u64 {
    MAX_ITERATIONS
}

fn default_wander_limit() -> u64 {
    WANDER_LIMIT
}

fn default_temperature_constant() -> f64 {
    TEMPERATURE_CONSTANT
}

fn default_temperature_exponent() -> f64 {
    TEMPERATURE_EXPONENT
}

fn default_seed() -> i64 {
    -1
}

fn default_queue_bound() -> usize {
    QUEUE_BOUND
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            iterations: default_iterations(),
            wander_limit: default_wander_limit(),
            temperature_constant: default_temperature_constant(),
            temperature_exponent: default_temperature_exponent(),
            seed: default_seed(),
            queue_bound: default_queue_bound(),
            timeout_secs: None,
        }
    }
}

impl SearchConfig {
    pub fn seed(&self) -> Option<u64> {
        u64::try_from(self.seed).ok()
    }

    pub fn anneal_params(&self) -> AnnealParams {
        AnnealParams {
            workers: self.workers.max(1),
            max_iterations: self.iterations,
            temperature_constant: self.temperature_constant,
            temperature_exponent: self.temperature_exponent,
            wander_limit: self.wander_limit,
            seed: self.seed(),
            queue_bound: self.queue_bound.max(1),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        match self.timeout_secs {
            Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
            None => CancelToken::new(),
        }
    }
}

/// Season simulation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PosteriorConfig {
    #[serde(default = "default_simulations")]
    pub simulations: usize,
    /// Play a title game between the top two teams by wins.
    #[serde(default)]
    pub championship: bool,
}

fn default_simulations() -> usize {
    DEFAULT_SIMULATIONS
}

impl Default for PosteriorConfig {
    fn default() -> Self {
        Self {
            simulations: default_simulations(),
            championship: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search.anneal_params(), AnnealParams::default());
    }

    #[test]
    fn test_partial_search_section() {
        let config = Config::from_toml(
            r#"
            [search]
            workers = 8
            seed = 42
            timeout_secs = 30

            [posterior]
            championship = true
            "#,
        )
        .unwrap();
        assert_eq!(config.search.workers, 8);
        assert_eq!(config.search.iterations, MAX_ITERATIONS);
        assert_eq!(config.search.seed(), Some(42));
        assert_eq!(config.posterior.simulations, DEFAULT_SIMULATIONS);
        assert!(config.posterior.championship);
    }

    #[test]
    fn test_negative_seed_means_wall_clock() {
        let config = SearchConfig {
            seed: -5,
            ..SearchConfig::default()
        };
        assert_eq!(config.anneal_params().seed, None);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(Config::from_toml("[search]\nworkers = \"many\"").is_err());
    }
}
