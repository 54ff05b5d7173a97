use lastspike_core::diff::diff;
use lastspike_core::plan::{plan, PhaseKind, Release, SequencerConfig};
use lastspike_core::sequencer::{Sequencer, SequencerEvent};
use lastspike_core::state::{ActionType, GameSnapshot, PlayerId, PlayerState, Property, Trade};
use lastspike_core::{City, CommitCue, TradeEvent};

fn player(position: u8, money: i64) -> PlayerState {
    PlayerState {
        money,
        board_position: position,
        skip_next_turn: false,
    }
}

fn snapshot_with(players: &[(&str, u8, i64)]) -> GameSnapshot {
    let mut snapshot = GameSnapshot::empty();
    for (id, position, money) in players {
        snapshot
            .players
            .insert(PlayerId::from(*id), player(*position, *money));
    }
    snapshot
}

fn position_of(sequencer: &Sequencer, id: &str) -> u8 {
    sequencer
        .rendered()
        .player(&PlayerId::from(id))
        .expect("player is tracked")
        .board_position
}

/// Drives the sequencer the way the browser runtime does: jump the clock to
/// each deadline until the queue drains, collecting every event.
fn run_to_idle(sequencer: &mut Sequencer) -> Vec<SequencerEvent> {
    let mut events = Vec::new();
    while let Some(deadline) = sequencer.next_deadline() {
        events.extend(sequencer.tick(deadline));
    }
    events
}

#[test]
fn unchanged_snapshot_plans_one_immediate_commit() {
    let snapshot = snapshot_with(&[("a", 5, 50_000), ("b", 11, 42_000)]);
    let phases = plan(&diff(&snapshot, &snapshot), &SequencerConfig::default());
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].duration_ms, 0);
    assert_eq!(phases[0].releases, Release::Full);
}

#[test]
fn commit_of_identical_snapshot_is_idempotent() {
    let mut sequencer = Sequencer::new(SequencerConfig::default());
    let snapshot = snapshot_with(&[("a", 5, 50_000)]);
    sequencer.offer(snapshot.clone(), 0);
    let before = sequencer.rendered().clone();

    let events = sequencer.offer(snapshot, 10);
    assert_eq!(sequencer.rendered(), &before);
    let commits: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, SequencerEvent::Committed(_)))
        .collect();
    assert_eq!(commits.len(), 1);
    assert!(!sequencer.is_animating());
}

#[test]
fn wrap_move_steps_through_every_space() {
    // A backward-looking move is still one forward lap.
    let result = diff(
        &snapshot_with(&[("a", 5, 0)]),
        &snapshot_with(&[("a", 2, 0)]),
    );
    assert_eq!(result.moved_players.len(), 1);
    let phases = plan(&result, &SequencerConfig::default());
    let PhaseKind::TokenMove(paths) = &phases[0].kind else {
        panic!("expected a token move phase");
    };
    let expected: Vec<u8> = (5..20).chain(0..=2).collect();
    assert_eq!(paths[0].path, expected);
}

#[test]
fn dice_reveal_commits_before_any_token_move() {
    let previous = snapshot_with(&[("a", 3, 50_000)]);
    let mut next = snapshot_with(&[("a", 11, 50_000)]);
    next.dice1 = 3;
    next.dice2 = 5;

    let mut sequencer = Sequencer::new(SequencerConfig::default());
    sequencer.offer(previous, 0);
    let mut events = sequencer.offer(next, 1_000);
    events.extend(run_to_idle(&mut sequencer));

    let order: Vec<Release> = events
        .iter()
        .filter_map(|event| match event {
            SequencerEvent::Committed(release) => Some(*release),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec![Release::Dice, Release::Positions, Release::Full]);
}

#[test]
fn dice_stay_hidden_until_the_reveal_window_elapses() {
    let config = SequencerConfig::default();
    let previous = snapshot_with(&[("a", 3, 50_000)]);
    let mut next = previous.clone();
    next.dice1 = 6;
    next.dice2 = 2;

    let mut sequencer = Sequencer::new(config);
    sequencer.offer(previous, 0);
    sequencer.offer(next, 1_000);
    assert_eq!(sequencer.rendered().dice1, 0);

    sequencer.tick(1_000 + u64::from(config.dice_reveal_ms) - 1);
    assert_eq!(sequencer.rendered().dice1, 0);

    sequencer.tick(1_000 + u64::from(config.dice_reveal_ms));
    assert_eq!(sequencer.rendered().dice1, 6);
    assert_eq!(sequencer.rendered().dice2, 2);
}

#[test]
fn superseding_snapshot_wins_after_the_inflight_phase() {
    let config = SequencerConfig::default();
    let mut sequencer = Sequencer::new(config);
    sequencer.offer(snapshot_with(&[("a", 4, 50_000)]), 0);

    // Start a token move, then push a newer truth before its timer fires.
    let intermediate = snapshot_with(&[("a", 7, 46_000)]);
    sequencer.offer(intermediate.clone(), 1_000);
    let first_deadline = sequencer.next_deadline().expect("move in flight");

    let newest = snapshot_with(&[("a", 9, 40_000)]);
    sequencer.offer(newest.clone(), 1_500);

    // The in-flight phase still completes: the token lands on 7 first.
    sequencer.tick(first_deadline);
    assert_eq!(position_of(&sequencer, "a"), 7);
    // The superseded snapshot's money never shows; the replan is already
    // animating toward the newest truth.
    assert_eq!(
        sequencer
            .rendered()
            .player(&PlayerId::from("a"))
            .unwrap()
            .money,
        50_000
    );
    assert!(sequencer.is_animating());

    run_to_idle(&mut sequencer);
    assert_eq!(sequencer.rendered(), &newest);
}

#[test]
fn concurrent_wrapping_movers_commit_together() {
    let config = SequencerConfig::default();
    let previous = snapshot_with(&[("a", 18, 50_000), ("b", 19, 50_000)]);
    // a rolls to 3 (5 steps), b to 9 (10 steps): both cross GO this turn.
    let next = snapshot_with(&[("a", 3, 50_000), ("b", 9, 50_000)]);

    let mut sequencer = Sequencer::new(config);
    sequencer.offer(previous, 0);
    let events = sequencer.offer(next.clone(), 1_000);

    let moves: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            SequencerEvent::PhaseStarted(PhaseKind::TokenMove(paths)) => Some(paths),
            _ => None,
        })
        .collect();
    assert_eq!(moves.len(), 1, "both players share one move phase");
    assert_eq!(moves[0].len(), 2);

    // The phase is gated by the slower mover.
    let deadline = sequencer.next_deadline().unwrap();
    assert_eq!(deadline, 1_000 + u64::from(10 * config.token_step_ms));

    // One tick short: neither token has committed its landing space.
    sequencer.tick(deadline - 1);
    assert_eq!(position_of(&sequencer, "a"), 18);
    assert_eq!(position_of(&sequencer, "b"), 19);

    sequencer.tick(deadline);
    assert_eq!(position_of(&sequencer, "a"), 3);
    assert_eq!(position_of(&sequencer, "b"), 9);
    run_to_idle(&mut sequencer);
    assert_eq!(sequencer.rendered(), &next);
}

#[test]
fn accepted_trade_commits_money_and_deeds_in_one_notification() {
    let trade = Trade {
        player1_id: PlayerId::from("a"),
        player2_id: PlayerId::from("b"),
        player1_money: 5_000,
        player2_money: 0,
        properties: vec![Property {
            city: City::Montreal,
            owner: Some(PlayerId::from("b")),
        }],
    };
    let mut previous = snapshot_with(&[("a", 3, 50_000), ("b", 9, 40_000)]);
    previous.properties.push(Property {
        city: City::Montreal,
        owner: Some(PlayerId::from("b")),
    });
    previous.pending_trade = Some(trade);

    let mut next = snapshot_with(&[("a", 3, 45_000), ("b", 9, 45_000)]);
    next.properties.push(Property {
        city: City::Montreal,
        owner: Some(PlayerId::from("a")),
    });

    let mut sequencer = Sequencer::new(SequencerConfig::default());
    sequencer.offer(previous.clone(), 0);
    assert_eq!(sequencer.rendered(), &previous);

    let events = sequencer.offer(next.clone(), 1_000);
    let commits: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, SequencerEvent::Committed(_)))
        .collect();
    assert_eq!(commits.len(), 1, "trade settlement is atomic");
    assert_eq!(sequencer.rendered(), &next);

    let cues: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            SequencerEvent::Cue(cue) => Some(cue.clone()),
            _ => None,
        })
        .collect();
    assert!(cues.contains(&CommitCue::MoneyChange {
        player: PlayerId::from("a"),
        delta: -5_000,
    }));
    assert!(cues.contains(&CommitCue::MoneyChange {
        player: PlayerId::from("b"),
        delta: 5_000,
    }));
    assert!(cues.contains(&CommitCue::TradeEvent(TradeEvent::Resolved)));
}

#[test]
fn actions_are_gated_while_a_sequence_runs() {
    let mut previous = snapshot_with(&[("a", 3, 50_000)]);
    previous.valid_actions = vec![ActionType::Move, ActionType::Trade];
    let mut next = snapshot_with(&[("a", 8, 50_000)]);
    next.valid_actions = vec![ActionType::Accept];

    let mut sequencer = Sequencer::new(SequencerConfig::default());
    sequencer.offer(previous, 0);
    let events = sequencer.offer(next.clone(), 1_000);
    assert!(events
        .iter()
        .any(|event| matches!(event, SequencerEvent::ActionsGated)));
    assert!(
        sequencer.rendered().valid_actions.is_empty(),
        "no button is interactable mid-animation"
    );

    run_to_idle(&mut sequencer);
    assert_eq!(sequencer.rendered().valid_actions, vec![ActionType::Accept]);
}

#[test]
fn disconnected_player_is_dropped_without_animation() {
    let previous = snapshot_with(&[("a", 3, 50_000), ("b", 9, 40_000)]);
    let next = snapshot_with(&[("a", 3, 50_000)]);

    let mut sequencer = Sequencer::new(SequencerConfig::default());
    sequencer.offer(previous, 0);
    let events = sequencer.offer(next.clone(), 1_000);
    assert!(!sequencer.is_animating());
    assert_eq!(sequencer.rendered(), &next);
    assert!(events
        .iter()
        .any(|event| matches!(event, SequencerEvent::Cue(CommitCue::PlayerRemoved(id)) if id == &PlayerId::from("b"))));
}
