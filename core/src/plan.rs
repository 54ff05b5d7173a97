use crate::board::forward_path;
use crate::diff::{SnapshotDiff, TrackDelta, TradeEvent};
use crate::state::PlayerId;

/// Presentation tuning constants. Only the dice-before-move ordering is an
/// invariant; the durations themselves are configuration.
pub const DICE_REVEAL_MS_DEFAULT: u32 = 3_000;
pub const TOKEN_STEP_MS_DEFAULT: u32 = 400;
pub const TOKEN_MOVE_MAX_MS_DEFAULT: u32 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Minimum window the revealed roll stays on screen before anything
    /// else commits.
    pub dice_reveal_ms: u32,
    /// Per-space duration of a token hop.
    pub token_step_ms: u32,
    /// Cap on a whole token-move phase; long laps compress to fit.
    pub token_move_max_ms: u32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            dice_reveal_ms: DICE_REVEAL_MS_DEFAULT,
            token_step_ms: TOKEN_STEP_MS_DEFAULT,
            token_move_max_ms: TOKEN_MOVE_MAX_MS_DEFAULT,
        }
    }
}

/// One moving token: the ordered spaces it passes through, endpoints
/// included. All movers in a phase animate concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPath {
    pub player: PlayerId,
    pub from: u8,
    pub to: u8,
    pub path: Vec<u8>,
}

impl TokenPath {
    pub fn steps(&self) -> u32 {
        self.path.len().saturating_sub(1) as u32
    }
}

/// Instantaneous changes carried by the final commit phase. They release in
/// the same observer notification as the rest of the snapshot, so paired
/// changes (trade money + deed transfer) are never split.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitCue {
    TrackChange(TrackDelta),
    MoneyChange { player: PlayerId, delta: i64 },
    TradeEvent(TradeEvent),
    PlayerRemoved(PlayerId),
    GameOver,
}

/// Which snapshot fields become visible when a phase completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Only `dice1`/`dice2`.
    Dice,
    /// Every tracked player's board position, committed together.
    Positions,
    /// The complete pending snapshot.
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhaseKind {
    DiceReveal { dice1: u8, dice2: u8 },
    TokenMove(Vec<TokenPath>),
    Commit(Vec<CommitCue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPhase {
    pub kind: PhaseKind,
    pub duration_ms: u32,
    pub releases: Release,
}

/// Builds the ordered phase plan for a diff. The result always ends with a
/// full-commit phase; when nothing animates that is the only phase and it
/// carries no delay.
pub fn plan(diff: &SnapshotDiff, config: &SequencerConfig) -> Vec<AnimationPhase> {
    let mut phases = Vec::new();

    // A roll is the rules cause of a move: reveal it fully before any token
    // starts walking.
    if diff.dice_changed {
        phases.push(AnimationPhase {
            kind: PhaseKind::DiceReveal {
                dice1: diff.dice.0,
                dice2: diff.dice.1,
            },
            duration_ms: config.dice_reveal_ms,
            releases: Release::Dice,
        });
    }

    if !diff.moved_players.is_empty() {
        let mut paths = Vec::with_capacity(diff.moved_players.len());
        for (player, movement) in &diff.moved_players {
            paths.push(TokenPath {
                player: player.clone(),
                from: movement.from,
                to: movement.to,
                path: forward_path(movement.from, movement.to),
            });
        }
        // The commit waits for the slowest mover.
        let slowest = paths
            .iter()
            .map(|path| path.steps().saturating_mul(config.token_step_ms))
            .max()
            .unwrap_or(0);
        phases.push(AnimationPhase {
            kind: PhaseKind::TokenMove(paths),
            duration_ms: slowest.min(config.token_move_max_ms),
            releases: Release::Positions,
        });
    }

    let mut cues = Vec::new();
    for delta in &diff.track_deltas {
        cues.push(CommitCue::TrackChange(*delta));
    }
    for (player, delta) in &diff.money_deltas {
        cues.push(CommitCue::MoneyChange {
            player: player.clone(),
            delta: *delta,
        });
    }
    if let Some(event) = diff.trade_event {
        cues.push(CommitCue::TradeEvent(event));
    }
    for player in &diff.removed_players {
        cues.push(CommitCue::PlayerRemoved(player.clone()));
    }
    if diff.game_over_set {
        cues.push(CommitCue::GameOver);
    }

    phases.push(AnimationPhase {
        kind: PhaseKind::Commit(cues),
        duration_ms: 0,
        releases: Release::Full,
    });

    phases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{diff, Movement};
    use crate::state::{GameSnapshot, PlayerState};

    fn movement_diff(moves: &[(&str, u8, u8)]) -> SnapshotDiff {
        let mut result = SnapshotDiff::default();
        for (id, from, to) in moves {
            result
                .moved_players
                .insert(PlayerId::from(*id), Movement { from: *from, to: *to });
        }
        result
    }

    #[test]
    fn empty_diff_plans_single_immediate_commit() {
        let phases = plan(&SnapshotDiff::default(), &SequencerConfig::default());
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].duration_ms, 0);
        assert_eq!(phases[0].releases, Release::Full);
        assert!(matches!(&phases[0].kind, PhaseKind::Commit(cues) if cues.is_empty()));
    }

    #[test]
    fn identical_snapshots_plan_single_immediate_commit() {
        let mut snapshot = GameSnapshot::empty();
        snapshot.players.insert(
            PlayerId::from("a"),
            PlayerState {
                money: 50_000,
                board_position: 4,
                skip_next_turn: false,
            },
        );
        let phases = plan(&diff(&snapshot, &snapshot), &SequencerConfig::default());
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].duration_ms, 0);
    }

    #[test]
    fn dice_reveal_precedes_token_move() {
        let mut result = movement_diff(&[("a", 3, 10)]);
        result.dice_changed = true;
        result.dice = (3, 4);
        let phases = plan(&result, &SequencerConfig::default());
        assert_eq!(phases.len(), 3);
        assert!(matches!(phases[0].kind, PhaseKind::DiceReveal { .. }));
        assert_eq!(phases[0].releases, Release::Dice);
        assert!(matches!(phases[1].kind, PhaseKind::TokenMove(_)));
        assert!(matches!(phases[2].kind, PhaseKind::Commit(_)));
    }

    #[test]
    fn dice_reveal_holds_for_the_configured_window() {
        let mut result = SnapshotDiff::default();
        result.dice_changed = true;
        result.dice = (6, 6);
        let phases = plan(&result, &SequencerConfig::default());
        assert_eq!(phases[0].duration_ms, DICE_REVEAL_MS_DEFAULT);
    }

    #[test]
    fn slowest_mover_gates_the_phase() {
        let config = SequencerConfig::default();
        let result = movement_diff(&[("a", 18, 1), ("b", 19, 6)]);
        let phases = plan(&result, &config);
        let PhaseKind::TokenMove(paths) = &phases[0].kind else {
            panic!("expected a token move phase");
        };
        assert_eq!(paths.len(), 2);
        // a walks 3 spaces, b walks 7; the phase lasts as long as b.
        assert_eq!(phases[0].duration_ms, 7 * config.token_step_ms);
    }

    #[test]
    fn long_lap_is_clamped() {
        let config = SequencerConfig::default();
        let result = movement_diff(&[("a", 5, 2)]);
        let phases = plan(&result, &config);
        // 17 steps at 400ms would be 6.8s; the cap wins.
        assert_eq!(phases[0].duration_ms, config.token_move_max_ms);
    }

    #[test]
    fn wrap_move_walks_forward_only() {
        let result = movement_diff(&[("a", 5, 2)]);
        let phases = plan(&result, &SequencerConfig::default());
        let PhaseKind::TokenMove(paths) = &phases[0].kind else {
            panic!("expected a token move phase");
        };
        let expected: Vec<u8> = (5..20).chain(0..=2).collect();
        assert_eq!(paths[0].path, expected);
    }

    #[test]
    fn instantaneous_changes_ride_the_final_commit() {
        let mut result = SnapshotDiff::default();
        result.money_deltas.insert(PlayerId::from("a"), -5_000);
        result.money_deltas.insert(PlayerId::from("b"), 5_000);
        result.trade_event = Some(TradeEvent::Resolved);
        let phases = plan(&result, &SequencerConfig::default());
        assert_eq!(phases.len(), 1);
        let PhaseKind::Commit(cues) = &phases[0].kind else {
            panic!("expected a commit phase");
        };
        assert_eq!(cues.len(), 3);
        assert_eq!(phases[0].duration_ms, 0);
    }
}
