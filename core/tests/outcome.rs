//! End-of-run assessment tests.

use krishicash_core::{
    config::GameConfig,
    outcome::{self, Verdict},
    state::{GameState, Phase, YearRecord},
};

fn base() -> GameState {
    GameState::initial(&GameConfig::builtin())
}

#[test]
fn verdict_thresholds() {
    let at = |score: f64| outcome::verdict(&GameState { stability_score: score, ..base() });

    assert_eq!(at(81.0), Verdict::Secure);
    assert_eq!(at(80.0), Verdict::Stable);
    assert_eq!(at(51.0), Verdict::Stable);
    assert_eq!(at(50.0), Verdict::Vulnerable);
    assert_eq!(at(0.0), Verdict::Vulnerable);
    assert!(Verdict::Secure.title().contains("Secure"));
}

#[test]
fn struggling_household_gets_corrective_lessons() {
    let state = GameState {
        savings: 1000.0,
        debt: 4000.0,
        stability_score: 40.0,
        ..base()
    };
    let lessons = outcome::lessons(&state);

    assert_eq!(lessons.len(), 2);
    assert!(lessons.iter().all(|l| !l.positive));
    assert!(lessons[0].text.contains("save more"));
    assert!(lessons[1].text.contains("loans"));
}

#[test]
fn thriving_household_gets_praise_in_order() {
    let state = GameState {
        savings: 25000.0,
        monthly_income: 16500.0,
        stability_score: 92.0,
        completed_goals: vec!["emergency_fund".into(), "irrigation_pump".into(), "education_fund".into()],
        ..base()
    };
    let lessons = outcome::lessons(&state);

    assert_eq!(lessons.len(), 5);
    assert!(lessons.iter().all(|l| l.positive));
    assert!(lessons[0].text.contains("completed 3 major goals"));
    assert!(lessons[4].text.contains("stability"));
}

#[test]
fn goal_progress_caps_at_100() {
    let halfway = GameState { savings: 5000.0, ..base() };
    let beyond = GameState { savings: 25000.0, ..base() };
    let no_goal = GameState { current_goal: None, phase: Phase::Ended, ..base() };

    assert_eq!(outcome::goal_progress(&halfway), 50.0);
    assert_eq!(outcome::remaining_to_goal(&halfway), 5000.0);
    assert_eq!(outcome::goal_progress(&beyond), 100.0);
    assert_eq!(outcome::remaining_to_goal(&beyond), 0.0);
    assert_eq!(outcome::goal_progress(&no_goal), 0.0);
    assert_eq!(outcome::remaining_to_goal(&no_goal), 0.0);
}

#[test]
fn years_played_counts_year_in_progress() {
    let record = |year: u32| YearRecord {
        year,
        savings: 0.0,
        income: 12000.0,
        stability_score: 60.0,
        goal_met: false,
        goal_name: "Emergency Fund".into(),
    };

    assert_eq!(outcome::years_played(&base()), 1);

    let third_year = GameState {
        year: 3,
        year_history: vec![record(1), record(2)],
        ..base()
    };
    assert_eq!(outcome::years_played(&third_year), 3);

    let ended = GameState {
        year: 2,
        phase: Phase::Ended,
        year_history: vec![record(1), record(2)],
        ..base()
    };
    assert_eq!(outcome::years_played(&ended), 2);
}
