use claimfield_core::{CaptureEngine, Command, Event, LifecycleState, Position, Role, Team};
use claimfield_system_target_capture::{Target, TargetCapture};

const ME: &str = "me@illinois.edu";
const TEAMMATE: &str = "friend@illinois.edu";
const RIVAL: &str = "rival@illinois.edu";
const PROXIMITY_METERS: f64 = 5.0;

/// Lays targets out on a plane of thousandth-degree steps near campus.
fn pos(x: f64, y: f64) -> Position {
    Position::new(40.0 + y * 0.001, -88.0 + x * 0.001)
}

fn target(id: &str, x: f64, y: f64) -> Target {
    Target::new(id, pos(x, y), None)
}

fn engine_with(targets: Vec<Target>, role: Role) -> TargetCapture {
    TargetCapture::new(targets, ME, role, PROXIMITY_METERS).expect("unique target ids")
}

/// A teammate's line runs west to east below my last capture.
fn barrier_scenario(barrier_email: &str, barrier_team: Team) -> TargetCapture {
    let mut engine = engine_with(
        vec![
            target("West", -1.0, 0.0),
            target("East", 1.0, 0.0),
            target("Mine", 0.0, 1.0),
            target("FarDown", 0.5, -2.0),
            target("FarUp", 0.5, 3.0),
        ],
        Role::Player(Team::Yellow),
    );
    assert!(engine.apply_peer_capture(barrier_email, "West", barrier_team));
    assert!(engine.apply_peer_capture(barrier_email, "East", barrier_team));
    assert_eq!(
        engine.attempt_own_capture("Mine"),
        Some(Command::TargetVisit {
            target_id: "Mine".to_owned()
        })
    );
    engine
}

fn total_score(engine: &TargetCapture) -> usize {
    Team::ALL.iter().map(|team| engine.score_of(*team)).sum()
}

#[test]
fn first_capture_may_be_any_unowned_target() {
    let mut engine = engine_with(
        vec![target("A", 0.0, 0.0), target("B", 3.0, 3.0)],
        Role::Player(Team::Green),
    );

    let command = engine.attempt_own_capture("B");

    assert_eq!(
        command,
        Some(Command::TargetVisit {
            target_id: "B".to_owned()
        })
    );
    assert_eq!(engine.owner_of("B"), Some(Team::Green));
    assert_eq!(engine.path_of(ME), vec!["B"]);
}

#[test]
fn capture_crossing_a_teammates_line_is_rejected() {
    let mut engine = barrier_scenario(TEAMMATE, Team::Yellow);
    let before = engine.score_of(Team::Yellow);

    assert_eq!(engine.attempt_own_capture("FarDown"), None);

    assert_eq!(engine.score_of(Team::Yellow), before);
    assert_eq!(engine.owner_of("FarDown"), None);
    assert_eq!(engine.path_of(ME), vec!["Mine"]);
}

#[test]
fn capture_crossing_an_opponents_line_is_rejected() {
    let mut engine = barrier_scenario(RIVAL, Team::Red);

    assert_eq!(engine.attempt_own_capture("FarDown"), None);
    assert_eq!(engine.score_of(Team::Red), 2);
}

#[test]
fn capture_away_from_existing_lines_succeeds() {
    let mut engine = barrier_scenario(TEAMMATE, Team::Yellow);
    let before = engine.score_of(Team::Yellow);

    assert_eq!(
        engine.attempt_own_capture("FarUp"),
        Some(Command::TargetVisit {
            target_id: "FarUp".to_owned()
        })
    );

    assert_eq!(engine.score_of(Team::Yellow), before + 1);
    assert_eq!(engine.path_of(ME), vec!["Mine", "FarUp"]);
}

#[test]
fn own_path_may_not_cross_itself() {
    let mut engine = engine_with(
        vec![
            target("P1", 0.0, 0.0),
            target("P2", 2.0, 0.0),
            target("P3", 1.0, 1.0),
            target("P4", 1.0, -1.0),
        ],
        Role::Player(Team::Blue),
    );
    for id in ["P1", "P2", "P3"] {
        assert!(engine.attempt_own_capture(id).is_some(), "{id} should be capturable");
    }

    assert_eq!(engine.attempt_own_capture("P4"), None);
    assert_eq!(engine.path_of(ME), vec!["P1", "P2", "P3"]);
    assert_eq!(engine.segments().count(), 2);
}

#[test]
fn owned_targets_cannot_be_captured_again() {
    let mut engine = engine_with(
        vec![
            Target::new("Theirs", pos(0.0, 0.0), Some(Team::Red)),
            Target::new("Ours", pos(1.0, 0.0), Some(Team::Yellow)),
            target("Free", 2.0, 0.0),
        ],
        Role::Player(Team::Yellow),
    );

    assert_eq!(engine.attempt_own_capture("Theirs"), None);
    assert_eq!(engine.attempt_own_capture("Ours"), None);
    assert!(engine.attempt_own_capture("Free").is_some());
    assert_eq!(engine.attempt_own_capture("Free"), None);
    assert_eq!(engine.owner_of("Theirs"), Some(Team::Red));
    assert_eq!(engine.score_of(Team::Yellow), 2);
}

#[test]
fn unknown_targets_are_ignored() {
    let mut engine = engine_with(vec![target("A", 0.0, 0.0)], Role::Player(Team::Red));

    assert_eq!(engine.attempt_own_capture("Nowhere"), None);
    assert!(!engine.apply_peer_capture(RIVAL, "Nowhere", Team::Blue));
    assert!(engine.handle_peer_event(&Event::PlayerTargetVisit {
        email: RIVAL.to_owned(),
        team: Role::Player(Team::Blue),
        target_id: "Nowhere".to_owned(),
    }));
    assert_eq!(engine.unclaimed_count(), 1);
}

#[test]
fn observers_never_capture() {
    let mut engine = engine_with(vec![target("A", 0.0, 0.0)], Role::Observer);
    let mut commands = Vec::new();

    assert_eq!(engine.attempt_own_capture("A"), None);
    engine.handle_own_movement(pos(0.0, 0.0), &mut commands);

    assert!(commands.is_empty());
    assert_eq!(engine.unclaimed_count(), 1);
}

#[test]
fn peer_capture_creates_the_players_path() {
    let mut engine = engine_with(
        vec![target("A", 0.0, 0.0), target("B", 1.0, 0.0)],
        Role::Player(Team::Yellow),
    );

    assert!(engine.handle_peer_event(&Event::PlayerTargetVisit {
        email: RIVAL.to_owned(),
        team: Role::Player(Team::Red),
        target_id: "A".to_owned(),
    }));
    assert!(engine.apply_peer_capture(RIVAL, "B", Team::Red));

    assert_eq!(engine.path_of(RIVAL), vec!["A", "B"]);
    assert_eq!(engine.players().collect::<Vec<_>>(), vec![RIVAL]);
    assert_eq!(engine.score_of(Team::Red), 2);
    assert_eq!(engine.segments().count(), 1);
}

#[test]
fn replaying_a_peer_capture_is_a_no_op() {
    let mut engine = engine_with(vec![target("A", 0.0, 0.0)], Role::Player(Team::Yellow));
    let event = Event::PlayerTargetVisit {
        email: RIVAL.to_owned(),
        team: Role::Player(Team::Green),
        target_id: "A".to_owned(),
    };

    assert!(engine.handle_peer_event(&event));
    assert!(engine.handle_peer_event(&event));

    assert_eq!(engine.path_of(RIVAL), vec!["A"]);
    assert_eq!(engine.score_of(Team::Green), 1);
    assert!(!engine.apply_peer_capture(RIVAL, "A", Team::Green));
}

#[test]
fn conflicting_peer_capture_overrides_a_local_capture() {
    let mut engine = engine_with(
        vec![target("A", 0.0, 0.0), target("B", 1.0, 0.0)],
        Role::Player(Team::Blue),
    );
    assert!(engine.attempt_own_capture("A").is_some());
    assert!(engine.attempt_own_capture("B").is_some());

    assert!(engine.apply_peer_capture(RIVAL, "A", Team::Red));

    assert_eq!(engine.owner_of("A"), Some(Team::Red));
    assert_eq!(engine.score_of(Team::Red), 1);
    assert_eq!(engine.score_of(Team::Blue), 1);
    assert_eq!(engine.path_of(RIVAL), vec!["A"]);
    assert_eq!(engine.path_of(ME), vec!["B"]);
    assert_eq!(engine.segments().count(), 0);
    assert!(!engine.apply_peer_capture(RIVAL, "A", Team::Red));
}

#[test]
fn peer_capture_moves_a_target_between_peer_paths() {
    let mut engine = engine_with(vec![target("A", 0.0, 0.0)], Role::Player(Team::Yellow));
    assert!(engine.apply_peer_capture(RIVAL, "A", Team::Green));

    assert!(engine.apply_peer_capture(TEAMMATE, "A", Team::Yellow));

    assert_eq!(engine.owner_of("A"), Some(Team::Yellow));
    assert!(engine.path_of(RIVAL).is_empty());
    assert_eq!(engine.path_of(TEAMMATE), vec!["A"]);
    assert_eq!(total_score(&engine) + engine.unclaimed_count(), engine.target_count());
}

#[test]
fn same_player_reporting_a_new_team_only_changes_the_owner() {
    let mut engine = engine_with(vec![target("A", 0.0, 0.0)], Role::Player(Team::Yellow));
    assert!(engine.apply_peer_capture(RIVAL, "A", Team::Green));

    assert!(engine.apply_peer_capture(RIVAL, "A", Team::Red));

    assert_eq!(engine.owner_of("A"), Some(Team::Red));
    assert_eq!(engine.path_of(RIVAL), vec!["A"]);
}

#[test]
fn observer_peer_capture_is_handled_without_claiming() {
    let mut engine = engine_with(vec![target("A", 0.0, 0.0)], Role::Player(Team::Yellow));

    assert!(engine.handle_peer_event(&Event::PlayerTargetVisit {
        email: RIVAL.to_owned(),
        team: Role::Observer,
        target_id: "A".to_owned(),
    }));
    assert_eq!(engine.owner_of("A"), None);
    assert_eq!(engine.players().count(), 0);
}

#[test]
fn movement_captures_targets_within_the_threshold() {
    let mut engine = engine_with(
        vec![target("A", 0.0, 0.0), target("B", 1.0, 0.0)],
        Role::Player(Team::Blue),
    );
    let mut commands = Vec::new();

    // About eleven meters north of A.
    engine.handle_own_movement(Position::new(40.000_1, -88.0), &mut commands);
    assert!(commands.is_empty());

    // About three meters north of A.
    engine.handle_own_movement(Position::new(40.000_03, -88.0), &mut commands);
    engine.handle_own_movement(pos(0.0, 0.0), &mut commands);

    assert_eq!(
        commands,
        vec![Command::TargetVisit {
            target_id: "A".to_owned()
        }]
    );
    assert_eq!(engine.targets_within(pos(1.0, 0.0)).count(), 1);
}

#[test]
fn events_from_other_modes_are_not_handled() {
    let mut engine = engine_with(vec![target("A", 0.0, 0.0)], Role::Player(Team::Yellow));

    assert!(!engine.handle_peer_event(&Event::PlayerCellCapture {
        email: RIVAL.to_owned(),
        team: Role::Player(Team::Red),
        x: 0,
        y: 0,
    }));
    assert!(!engine.handle_peer_event(&Event::GameState {
        state: LifecycleState::Ended
    }));
    assert!(!engine.handle_peer_event(&Event::Unknown));
}

#[test]
fn scores_and_unclaimed_targets_cover_the_registry() {
    let mut engine = barrier_scenario(RIVAL, Team::Blue);
    assert_eq!(total_score(&engine) + engine.unclaimed_count(), 5);

    let _ = engine.attempt_own_capture("FarUp");
    let _ = engine.apply_peer_capture(TEAMMATE, "FarDown", Team::Yellow);

    assert_eq!(engine.unclaimed_count(), 0);
    assert_eq!(total_score(&engine), engine.target_count());
    assert_eq!(engine.capturable_count(), 5);
}
