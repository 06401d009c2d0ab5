use std::collections::HashMap;

use streak_core::ingest::{
    JsonLinesSink, RatingSource, RatingsFile, ResultSink, RosterFile, RosterSource, ScheduleFile,
    ScheduleSource,
};
use streak_core::{
    predict_streaks, AnnealParams, CancelToken, Enumerator, GameRecord, GaussianSpreadModel,
    OverridesMap, PickSlots, Picker, Prediction, Predictions, Rating, Schedule, SeasonSimulator,
    Streak, StreakPrediction, Team,
};

fn t(name: &str) -> Team {
    Team::named(name)
}

fn params(iterations: u64) -> AnnealParams {
    AnnealParams {
        workers: 2,
        max_iterations: iterations,
        wander_limit: 100,
        seed: Some(2024),
        ..AnnealParams::default()
    }
}

fn table(rows: &[(&str, &[(f64, f64)])]) -> Predictions {
    let weeks = rows.first().map_or(0, |(_, r)| r.len());
    let table: HashMap<Team, Vec<Prediction>> = rows
        .iter()
        .map(|&(team, row)| (t(team), row.iter().map(|&(p, s)| Prediction::new(p, s)).collect()))
        .collect();
    Predictions::from_table(weeks, table).unwrap()
}

fn sorted(mut teams: Vec<Team>) -> Vec<Team> {
    teams.sort();
    teams
}

#[test]
fn tiny_annealer_prefers_the_stronger_team() {
    let ratings = HashMap::from([(t("A"), Rating::new(10.0, 0.0)), (t("B"), Rating::new(0.0, 0.0))]);
    let model = GaussianSpreadModel::new(ratings, 0.0, 10.0).unwrap();
    let season = vec![vec![GameRecord::new(t("A"), t("B"), false)]];
    let schedule = Schedule::build(&season, [t("A"), t("B")].iter()).unwrap();
    let predictions = Predictions::from_schedule(&schedule, &model).unwrap();

    let pickers = vec![
        Picker::new("ann", vec![t("A")], PickSlots::new(vec![0, 1])),
        Picker::new("bob", vec![t("B")], PickSlots::new(vec![0, 1])),
    ];
    let results =
        predict_streaks(&pickers, &predictions, &params(100), &CancelToken::new(), 2024, 0).unwrap();

    let ann = &results[0];
    assert_eq!(ann.best_picks, vec![t("A")]);
    assert!((ann.probability - 0.841344746).abs() < 1e-6);
    assert!((ann.spread - 10.0).abs() < 1e-12);

    let bob = &results[1];
    assert!((bob.probability - (1.0 - 0.841344746)).abs() < 1e-6);
    assert!(bob.probability * bob.spread < ann.probability * ann.spread);
}

#[test]
fn bye_weeks_force_the_only_live_order() {
    let mut overrides = OverridesMap::new();
    overrides.add_override(t("A"), t("X"), Prediction::new(0.9, 7.0));
    overrides.add_override(t("B"), t("Y"), Prediction::new(0.8, 5.0));
    let model = GaussianSpreadModel::new(HashMap::new(), 0.0, 10.0)
        .unwrap()
        .with_overrides(overrides);

    // A idle in week 1, B idle in week 0
    let season = vec![
        vec![GameRecord::new(t("A"), t("X"), false)],
        vec![GameRecord::new(t("B"), t("Y"), false)],
    ];
    let schedule = Schedule::build(&season, [t("A"), t("B")].iter()).unwrap();
    let predictions = Predictions::from_schedule(&schedule, &model).unwrap();

    let picker = Picker::new("ann", vec![t("A"), t("B")], PickSlots::new(vec![0, 2]));
    let results =
        predict_streaks(&[picker], &predictions, &params(500), &CancelToken::new(), 2024, 0).unwrap();

    let best = &results[0];
    assert_eq!(best.best_picks, vec![t("A")]);
    assert!((best.probability - 0.72).abs() < 1e-12);
    assert!((best.spread - 12.0).abs() < 1e-12);
    assert_eq!(best.candidates[0].weeks[1].picks[0].team, t("B"));
}

#[test]
fn double_down_week_takes_the_two_strongest() {
    let predictions = table(&[
        ("A", &[(0.9, 1.0), (0.6, 1.0)]),
        ("B", &[(0.8, 1.0), (0.5, 1.0)]),
        ("C", &[(0.7, 1.0), (0.5, 1.0)]),
    ]);
    let picker = Picker::new("ann", vec![t("A"), t("B"), t("C")], PickSlots::new(vec![0, 1, 1]));
    let results =
        predict_streaks(&[picker], &predictions, &params(2_000), &CancelToken::new(), 2024, 0).unwrap();

    let best = &results[0];
    assert!((best.probability - 0.36).abs() < 1e-12);
    assert_eq!(sorted(best.best_picks.clone()), vec![t("A"), t("B")]);
    assert!(best.candidates.iter().all(|c| c.probability <= 0.36 + 1e-12));

    // C alone then A+B loses to B+C then A
    let c_then_ab = Streak::with_week_sizes(vec![t("C"), t("A"), t("B")], &[1, 2]).unwrap();
    let bc_then_a = Streak::with_week_sizes(vec![t("B"), t("C"), t("A")], &[2, 1]).unwrap();
    let low = c_then_ab.summarize(&predictions).unwrap().probability;
    let high = bc_then_a.summarize(&predictions).unwrap().probability;
    assert!((low - 0.21).abs() < 1e-12);
    assert!((high - 0.336).abs() < 1e-12);
}

#[test]
fn enumerator_counts_two_single_weeks() {
    let predictions = table(&[("A", &[(0.9, 7.0), (0.6, 2.0)]), ("B", &[(0.8, 5.0), (0.7, 3.0)])]);
    let streak = Streak::new(vec![t("A"), t("B")], &PickSlots::new(vec![0, 2])).unwrap();
    let tally = Enumerator::new(streak, &predictions).run(&CancelToken::new()).unwrap();

    assert_eq!(tally.total_streaks, 2);
    assert_eq!(tally.surviving_streaks, 2);
    assert_eq!(tally.success_by_team[&t("A")], vec![1, 1]);
    assert_eq!(tally.success_by_team[&t("B")], vec![1, 1]);
}

#[test]
fn posterior_matches_two_coin_flips() {
    let ratings = HashMap::from([
        (t("A"), Rating::new(0.0, 0.0)),
        (t("X"), Rating::new(0.0, 0.0)),
        (t("Y"), Rating::new(0.0, 0.0)),
    ]);
    let model = GaussianSpreadModel::new(ratings, 0.0, 10.0).unwrap();
    let season = vec![
        vec![GameRecord::new(t("A"), t("X"), false)],
        vec![GameRecord::new(t("Y"), t("A"), true)],
    ];
    // X and Y are opponents only
    let schedule = Schedule::build(&season, [t("A")].iter()).unwrap();

    let report = SeasonSimulator::new(&schedule, &model)
        .unwrap()
        .run(10_000, Some(99), &CancelToken::new())
        .unwrap();
    let a = report.iter().find(|d| d.team == t("A")).unwrap();

    // 3σ of Binomial(10000, 0.25) is 130, of Binomial(10000, 0.5) is 150
    assert!((a.histogram[0] as i64 - 2500).abs() <= 130, "{:?}", a.histogram);
    assert!((a.histogram[1] as i64 - 5000).abs() <= 150, "{:?}", a.histogram);
    assert!((a.histogram[2] as i64 - 2500).abs() <= 130, "{:?}", a.histogram);
}

#[test]
fn duplicate_pickers_share_one_search() {
    let predictions = table(&[
        ("A", &[(0.9, 7.0), (0.6, 2.0)]),
        ("B", &[(0.8, 5.0), (0.7, 3.0)]),
        ("C", &[(0.4, -2.0), (0.95, 9.0)]),
    ]);
    let pickers = vec![
        Picker::new("ann", vec![t("A"), t("B"), t("C")], PickSlots::new(vec![0, 1, 1])),
        Picker::new("bob", vec![t("C"), t("A"), t("B")], PickSlots::new(vec![0, 1, 1])),
    ];
    let results =
        predict_streaks(&pickers, &predictions, &params(1_000), &CancelToken::new(), 2024, 0).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].picker, "ann");
    assert_eq!(results[1].picker, "bob");
    // one search: identical timestamps and candidates
    assert_eq!(results[1], results[0].for_picker("bob"));
}

#[test]
fn predict_flow_from_files() {
    let dir = std::env::temp_dir().join(format!("streak-flow-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("schedule.json"),
        r#"{"weeks": [
            [{"home": "A", "away": "C"}, {"home": "B", "away": "D"}],
            [{"home": "C", "away": "B"}, {"home": "D", "away": "A", "neutral_site": true}],
            [{"home": "A", "away": "B"}]
        ]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("ratings.json"),
        r#"{"bias": 0.0, "stddev": 13.0, "teams": [
            {"team": "A", "points": 12.0, "home_bonus": 3.0},
            {"team": "B", "points": 6.0, "home_bonus": 3.0},
            {"team": "C", "points": -4.0, "home_bonus": 2.0},
            {"team": "D", "points": 0.0, "home_bonus": 2.0}
        ]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("roster.json"),
        r#"[{"picker": "ann", "remaining_teams": ["A", "B"], "slots": [0, 2]},
            {"picker": "bob", "remaining_teams": ["A", "B"], "slots": [0, 2]},
            {"picker": "cat", "remaining_teams": ["A"], "slots": [0, 1]}]"#,
    )
    .unwrap();

    let season = ScheduleFile(dir.join("schedule.json")).load_schedule(2024).unwrap();
    let model = RatingsFile(dir.join("ratings.json"))
        .load_ratings(2024, 1)
        .unwrap()
        .into_model(OverridesMap::new())
        .unwrap();
    let roster = RosterFile(dir.join("roster.json")).load_roster(2024, 1).unwrap();

    let teams = [t("A"), t("B"), t("C"), t("D")];
    let schedule = Schedule::build(&season, teams.iter()).unwrap().remaining(1).unwrap();
    assert_eq!(schedule.first_week(), 1);
    let predictions = Predictions::from_schedule(&schedule, &model).unwrap();

    let results =
        predict_streaks(&roster, &predictions, &params(300), &CancelToken::new(), 2024, 1).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.week == 1 && r.probability > 0.0));

    let mut sink = JsonLinesSink::new(Vec::new());
    for prediction in &results {
        sink.publish(prediction).unwrap();
    }
    sink.flush().unwrap();
    let text = String::from_utf8(sink.into_inner()).unwrap();
    let published: Vec<StreakPrediction> =
        text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(published.len(), 3);
    assert_eq!(published[2].picker, "cat");
    assert_eq!(published[2].candidates[0].weeks[0].week, 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
