//! streak-optimizer - command-line entry point.
//!
//! Commands:
//! - `streak-optimizer predict` - best streaks for the selected pickers
//! - `streak-optimizer enumerate` - brute-force posterior tables for one picker
//! - `streak-optimizer posterior` - simulated season win distributions

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use streak_core::ingest::{
    load_results, JsonLinesSink, LoggingSink, RatingSource, RatingsFile, ResultSink, RosterFile,
    RosterSource, ScheduleFile, ScheduleSource,
};
use streak_core::{
    predict_streaks, select_pickers, CancelToken, Config, Enumerator, OutcomeModel, OverridesMap,
    Predictions, Schedule, SeasonSimulator, Team,
};

/// Survivor-streak pick optimiser
#[derive(Parser, Debug)]
#[command(name = "streak-optimizer")]
#[command(author, version, about = "Optimise survivor-streak picks")]
struct Cli {
    /// TOML run configuration
    #[arg(long, global = true, env = "STREAK_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the best streaks for the selected pickers and publish them
    Predict(PredictArgs),

    /// Walk every streak of one picker and write the posterior tables
    Enumerate(EnumerateArgs),

    /// Simulate whole seasons and report each team's win distribution
    Posterior(PosteriorArgs),
}

#[derive(Args, Debug)]
struct SeasonArgs {
    season: i32,

    /// First remaining week (0-based)
    week: usize,

    #[arg(long, default_value = "schedule.json")]
    schedule: PathBuf,

    #[arg(long, default_value = "ratings.json")]
    ratings: PathBuf,

    /// Realised results; predicts from them instead of the ratings
    #[arg(long)]
    results: Option<PathBuf>,

    /// CSV of forced matchup predictions
    #[arg(long)]
    overrides: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Negative seeds from the wall clock
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    iterations: Option<u64>,

    #[arg(long)]
    wander_limit: Option<u64>,

    /// Temperature constant
    #[arg(long = "c")]
    temperature_constant: Option<f64>,

    /// Temperature exponent
    #[arg(long = "e")]
    temperature_exponent: Option<f64>,

    /// Cancel after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[command(flatten)]
    season: SeasonArgs,

    #[command(flatten)]
    search: SearchArgs,

    /// Pickers to predict
    pickers: Vec<String>,

    /// Predict every picker in the roster
    #[arg(long)]
    all: bool,

    #[arg(long, default_value = "roster.json")]
    roster: PathBuf,

    /// JSON-lines output; defaults to streaks-<season>-<week>.jsonl
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log results instead of publishing them
    #[arg(long)]
    dry_run: bool,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct EnumerateArgs {
    #[command(flatten)]
    season: SeasonArgs,

    picker: String,

    #[arg(long, default_value = "roster.json")]
    roster: PathBuf,

    /// Directory for the CSV tables
    #[arg(long, default_value = "enumeration")]
    output: PathBuf,

    /// Refuse larger streak spaces unless forced
    #[arg(long, default_value_t = 100_000_000)]
    max_streaks: u128,

    #[arg(long)]
    timeout: Option<u64>,

    /// Log the summary without writing the tables
    #[arg(long)]
    dry_run: bool,

    /// Enumerate past --max-streaks
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct PosteriorArgs {
    #[command(flatten)]
    season: SeasonArgs,

    #[arg(long)]
    simulations: Option<usize>,

    /// Finish each season with a title game between the top two teams
    #[arg(long)]
    championship: bool,

    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,

    /// JSON report; printed to stdout when absent
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Predict(args) => run_predict(config, args),
        Commands::Enumerate(args) => run_enumerate(config, args),
        Commands::Posterior(args) => run_posterior(config, args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "debug,streak_core=debug"
    } else {
        "info,streak_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn load_model(args: &SeasonArgs) -> Result<Box<dyn OutcomeModel>> {
    if let Some(path) = &args.results {
        let oracle = load_results(path, None)
            .with_context(|| format!("failed to load results {}", path.display()))?;
        info!(results = oracle.len(), "predicting from realised results");
        return Ok(Box::new(oracle));
    }

    let mut overrides = OverridesMap::new();
    if let Some(path) = &args.overrides {
        overrides
            .read_from_file(path)
            .with_context(|| format!("failed to load overrides {}", path.display()))?;
        info!(overrides = overrides.len(), "loaded prediction overrides");
    }

    let table = RatingsFile(args.ratings.clone())
        .load_ratings(args.season, args.week)
        .with_context(|| format!("failed to load ratings {}", args.ratings.display()))?;
    Ok(Box::new(table.into_model(overrides)?))
}

/// Remaining schedule for `teams` and the per-(team, week) predictions over it.
fn load_predictions<'a>(
    args: &SeasonArgs,
    teams: impl IntoIterator<Item = &'a Team>,
) -> Result<(Schedule, Predictions)> {
    let season = ScheduleFile(args.schedule.clone())
        .load_schedule(args.season)
        .with_context(|| format!("failed to load schedule {}", args.schedule.display()))?;
    let schedule = Schedule::build(&season, teams)?.remaining(args.week)?;
    let model = load_model(args)?;
    let predictions = Predictions::from_schedule(&schedule, model.as_ref())?;
    Ok((schedule, predictions))
}

fn run_predict(config: Config, args: PredictArgs) -> Result<()> {
    let mut search = config.search;
    let SearchArgs {
        seed,
        workers,
        iterations,
        wander_limit,
        temperature_constant,
        temperature_exponent,
        timeout,
    } = args.search;
    if let Some(v) = seed {
        search.seed = v;
    }
    if let Some(v) = workers {
        search.workers = v;
    }
    if let Some(v) = iterations {
        search.iterations = v;
    }
    if let Some(v) = wander_limit {
        search.wander_limit = v;
    }
    if let Some(v) = temperature_constant {
        search.temperature_constant = v;
    }
    if let Some(v) = temperature_exponent {
        search.temperature_exponent = v;
    }
    if timeout.is_some() {
        search.timeout_secs = timeout;
    }

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!("streaks-{}-{}.jsonl", args.season.season, args.season.week))
    });
    if !args.dry_run && output.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let roster = RosterFile(args.roster.clone())
        .load_roster(args.season.season, args.season.week)
        .with_context(|| format!("failed to load roster {}", args.roster.display()))?;
    let pickers = select_pickers(&roster, &args.pickers, args.all)?;
    let teams: BTreeSet<Team> = pickers.iter().flat_map(|p| p.remaining.iter().cloned()).collect();

    let (schedule, predictions) = load_predictions(&args.season, teams.iter())?;
    info!(
        season = args.season.season,
        week = schedule.first_week(),
        weeks = schedule.num_weeks(),
        teams = teams.len(),
        "predictions ready"
    );

    let params = search.anneal_params();
    let cancel = search.cancel_token();
    let results = predict_streaks(
        &pickers,
        &predictions,
        &params,
        &cancel,
        args.season.season,
        args.season.week,
    )?;

    let mut sink: Box<dyn ResultSink> = if args.dry_run {
        Box::new(LoggingSink)
    } else {
        Box::new(
            JsonLinesSink::create(&output)
                .with_context(|| format!("failed to create {}", output.display()))?,
        )
    };
    for prediction in &results {
        sink.publish(prediction)?;
    }
    sink.flush()?;

    if !args.dry_run {
        info!(predictions = results.len(), path = %output.display(), "published streak predictions");
    }
    Ok(())
}

fn run_enumerate(config: Config, args: EnumerateArgs) -> Result<()> {
    let roster = RosterFile(args.roster.clone())
        .load_roster(args.season.season, args.season.week)
        .with_context(|| format!("failed to load roster {}", args.roster.display()))?;
    let picker = select_pickers(&roster, std::slice::from_ref(&args.picker), false)?.remove(0);
    picker.validate()?;

    let (_, predictions) = load_predictions(&args.season, picker.remaining.iter())?;
    let enumerator = Enumerator::new(picker.streak()?, &predictions).with_first_week(args.season.week);

    let size = enumerator.size();
    if size > args.max_streaks {
        if !args.force {
            bail!(
                "{} streaks exceed --max-streaks {} (use --force to enumerate anyway)",
                size,
                args.max_streaks
            );
        }
        warn!(streaks = %size, "enumerating past --max-streaks");
    }

    let cancel = match args.timeout.or(config.search.timeout_secs) {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let tally = enumerator.run(&cancel)?;

    if let Some((streak, summary)) = &tally.best {
        info!(
            picker = %picker.id,
            best = %streak,
            probability = summary.probability,
            spread = summary.spread,
            "best enumerated streak"
        );
    }
    if args.dry_run {
        return Ok(());
    }
    tally
        .write_tables(&args.output)
        .with_context(|| format!("failed to write tables to {}", args.output.display()))?;
    info!(path = %args.output.display(), "wrote enumeration tables");
    Ok(())
}

fn run_posterior(config: Config, args: PosteriorArgs) -> Result<()> {
    let season = ScheduleFile(args.season.schedule.clone())
        .load_schedule(args.season.season)
        .with_context(|| format!("failed to load schedule {}", args.season.schedule.display()))?;
    let teams: BTreeSet<Team> = season
        .iter()
        .flatten()
        .flat_map(|g| [g.home.clone(), g.away.clone()])
        .collect();
    let schedule = Schedule::build(&season, teams.iter())?.remaining(args.season.week)?;
    let model = load_model(&args.season)?;

    let simulations = args.simulations.unwrap_or(config.posterior.simulations);
    let championship = args.championship || config.posterior.championship;
    let seed = args.seed.unwrap_or(config.search.seed);

    let report = SeasonSimulator::new(&schedule, model.as_ref())?
        .with_championship(championship)
        .run(simulations, u64::try_from(seed).ok(), &config.search.cancel_token())?;

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => write_report(path, &json)?,
        None => println!("{}", json),
    }
    Ok(())
}

fn write_report(path: &Path, json: &str) -> Result<()> {
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote posterior report");
    Ok(())
}
