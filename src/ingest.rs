//! Data sources the core reads from and the sinks it publishes to.
//!
//! The traits are the seams; the JSON file adapters are the concrete
//! collaborators the CLI wires in.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::StreakPrediction;
use crate::error::Result;
use crate::game::{Game, RelativeLocation};
use crate::oracle::{GameResult, OracleModel};
use crate::overrides::OverridesMap;
use crate::picker::Picker;
use crate::schedule::GameRecord;
use crate::team::Team;
use crate::win_prob::{GaussianSpreadModel, Rating};

/// Yields the season's weekly game lists.
pub trait ScheduleSource {
    fn load_schedule(&self, season: i32) -> Result<Vec<Vec<GameRecord>>>;
}

/// Yields team ratings and the residual distribution.
pub trait RatingSource {
    fn load_ratings(&self, season: i32, week: usize) -> Result<RatingTable>;
}

/// Yields every picker still alive.
pub trait RosterSource {
    fn load_roster(&self, season: i32, week: usize) -> Result<Vec<Picker>>;
}

/// Accepts finished predictions.
pub trait ResultSink {
    fn publish(&mut self, prediction: &StreakPrediction) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ResultSink for Vec<StreakPrediction> {
    fn publish(&mut self, prediction: &StreakPrediction) -> Result<()> {
        self.push(prediction.clone());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub team: Team,
    pub points: f64,
    #[serde(default)]
    pub home_bonus: f64,
}

/// Ratings file contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    pub bias: f64,
    pub stddev: f64,
    pub teams: Vec<TeamRating>,
}

impl RatingTable {
    pub fn ratings(&self) -> HashMap<Team, Rating> {
        self.teams
            .iter()
            .map(|r| (r.team.clone(), Rating::new(r.points, r.home_bonus)))
            .collect()
    }

    pub fn into_model(self, overrides: OverridesMap) -> Result<GaussianSpreadModel> {
        Ok(GaussianSpreadModel::new(self.ratings(), self.bias, self.stddev)?.with_overrides(overrides))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ScheduleDocument {
    weeks: Vec<Vec<GameRecord>>,
}

/// One realised result as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub week: usize,
    pub home: Team,
    pub away: Team,
    #[serde(default)]
    pub neutral_site: bool,
    pub home_score: f64,
    pub away_score: f64,
}

impl ResultRecord {
    pub fn to_result(&self) -> GameResult {
        let location = if self.neutral_site {
            RelativeLocation::Neutral
        } else {
            RelativeLocation::Home
        };
        GameResult {
            game: Game::new(self.home.clone(), self.away.clone(), location),
            margin: self.home_score - self.away_score,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// `{"weeks": [[{home, away, neutral_site}, ...], ...]}`
#[derive(Clone, Debug)]
pub struct ScheduleFile(pub PathBuf);

impl ScheduleSource for ScheduleFile {
    fn load_schedule(&self, season: i32) -> Result<Vec<Vec<GameRecord>>> {
        let doc: ScheduleDocument = read_json(&self.0)?;
        debug!(season, weeks = doc.weeks.len(), path = %self.0.display(), "loaded schedule");
        Ok(doc.weeks)
    }
}

/// `{"bias": .., "stddev": .., "teams": [{team, points, home_bonus}, ...]}`
#[derive(Clone, Debug)]
pub struct RatingsFile(pub PathBuf);

impl RatingSource for RatingsFile {
    fn load_ratings(&self, season: i32, week: usize) -> Result<RatingTable> {
        let table: RatingTable = read_json(&self.0)?;
        debug!(season, week, teams = table.teams.len(), path = %self.0.display(), "loaded ratings");
        Ok(table)
    }
}

/// `[{picker, remaining_teams, slots}, ...]`
#[derive(Clone, Debug)]
pub struct RosterFile(pub PathBuf);

impl RosterSource for RosterFile {
    fn load_roster(&self, season: i32, week: usize) -> Result<Vec<Picker>> {
        let roster: Vec<Picker> = read_json(&self.0)?;
        debug!(season, week, pickers = roster.len(), path = %self.0.display(), "loaded roster");
        Ok(roster)
    }
}

/// Load realised results, keeping those before `before_week` when given.
pub fn load_results(path: impl AsRef<Path>, before_week: Option<usize>) -> Result<OracleModel> {
    let records: Vec<ResultRecord> = read_json(path.as_ref())?;
    let results = records
        .iter()
        .filter(|r| before_week.map_or(true, |w| r.week < w))
        .map(ResultRecord::to_result);
    Ok(OracleModel::new(results))
}

/// Writes one JSON document per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(JsonLinesSink::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn publish(&mut self, prediction: &StreakPrediction) -> Result<()> {
        serde_json::to_writer(&mut self.writer, prediction)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Dry-run sink: logs each prediction and publishes nothing.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl ResultSink for LoggingSink {
    fn publish(&mut self, prediction: &StreakPrediction) -> Result<()> {
        let picks: Vec<&str> = prediction.best_picks.iter().map(Team::name).collect();
        info!(
            picker = %prediction.picker,
            season = prediction.season,
            week = prediction.week,
            picks = ?picks,
            probability = prediction.probability,
            spread = prediction.spread,
            "dry run, not publishing"
        );
        Ok(())
    }
}
