use std::collections::BTreeMap;

use crate::board::CityPair;
use crate::state::{GameSnapshot, PlayerId};

/// A player's position change between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub from: u8,
    pub to: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackChangeKind {
    Built,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackDelta {
    pub pair: CityPair,
    pub kind: TrackChangeKind,
    pub from: u8,
    pub to: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeEvent {
    Proposed,
    Resolved,
}

/// Animation-relevant differences between the rendered snapshot and a newly
/// fetched one. Produced by [`diff`], consumed by the scheduler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    pub dice_changed: bool,
    /// The newly fetched dice faces; meaningful when `dice_changed` is set.
    pub dice: (u8, u8),
    pub moved_players: BTreeMap<PlayerId, Movement>,
    pub track_deltas: Vec<TrackDelta>,
    pub money_deltas: BTreeMap<PlayerId, i64>,
    pub trade_event: Option<TradeEvent>,
    pub game_over_set: bool,
    /// Players present before but gone now: disconnections, dropped from
    /// tracking without an error.
    pub removed_players: Vec<PlayerId>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        !self.dice_changed
            && self.moved_players.is_empty()
            && self.track_deltas.is_empty()
            && self.money_deltas.is_empty()
            && self.trade_event.is_none()
            && !self.game_over_set
            && self.removed_players.is_empty()
    }
}

/// Compares the rendered snapshot against a freshly fetched one. Total over
/// well-formed snapshots: entries missing on either side fall back to
/// first-seen semantics (no animation) rather than an error.
pub fn diff(previous: &GameSnapshot, next: &GameSnapshot) -> SnapshotDiff {
    let mut result = SnapshotDiff::default();

    if next.dice1 != 0 && (next.dice1 != previous.dice1 || next.dice2 != previous.dice2) {
        result.dice_changed = true;
        result.dice = (next.dice1, next.dice2);
    }

    // The very first snapshot after joining a started game is an initial
    // placement, not a move.
    let has_prior_players = !previous.players.is_empty();
    for (id, state) in &next.players {
        let Some(prior) = previous.players.get(id) else {
            continue;
        };
        if has_prior_players && prior.board_position != state.board_position {
            result.moved_players.insert(
                id.clone(),
                Movement {
                    from: prior.board_position,
                    to: state.board_position,
                },
            );
        }
        let delta = state.money - prior.money;
        if delta != 0 {
            result.money_deltas.insert(id.clone(), delta);
        }
    }

    for id in previous.players.keys() {
        if !next.players.contains_key(id) {
            result.removed_players.push(id.clone());
        }
    }

    for route in &next.routes {
        let Some(pair) = route.city_pair else {
            continue;
        };
        let prior_tracks = previous.tracks_on(pair);
        if route.num_tracks == prior_tracks {
            continue;
        }
        let kind = if route.num_tracks > prior_tracks {
            TrackChangeKind::Built
        } else {
            TrackChangeKind::Removed
        };
        result.track_deltas.push(TrackDelta {
            pair,
            kind,
            from: prior_tracks,
            to: route.num_tracks,
        });
    }

    result.trade_event = match (&previous.pending_trade, &next.pending_trade) {
        (None, Some(_)) => Some(TradeEvent::Proposed),
        (Some(_), None) => Some(TradeEvent::Resolved),
        (Some(before), Some(after)) if before != after => Some(TradeEvent::Proposed),
        _ => None,
    };

    result.game_over_set = !previous.is_game_over && next.is_game_over;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{City, CityPair};
    use crate::state::{PlayerState, Route, Trade};

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

    #[test]
    fn identical_snapshots_diff_empty() {
        let snapshot = snapshot_with(&[("a", 3, 50_000), ("b", 9, 40_000)]);
        assert!(diff(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn first_snapshot_is_initial_placement_not_a_move() {
        let previous = GameSnapshot::empty();
        let next = snapshot_with(&[("a", 7, 50_000)]);
        let result = diff(&previous, &next);
        assert!(result.moved_players.is_empty());
        assert!(result.money_deltas.is_empty());
    }

    #[test]
    fn dice_change_requires_nonzero_roll() {
        let previous = snapshot_with(&[("a", 0, 0)]);
        let mut rolled = previous.clone();
        rolled.dice1 = 0;
        rolled.dice2 = 0;
        assert!(!diff(&previous, &rolled).dice_changed);
        rolled.dice1 = 3;
        rolled.dice2 = 5;
        let result = diff(&previous, &rolled);
        assert!(result.dice_changed);
        assert_eq!(result.dice, (3, 5));
    }

    #[test]
    fn movement_and_money_classified_per_player() {
        let previous = snapshot_with(&[("a", 3, 50_000), ("b", 9, 40_000)]);
        let next = snapshot_with(&[("a", 8, 46_000), ("b", 9, 40_000)]);
        let result = diff(&previous, &next);
        assert_eq!(
            result.moved_players.get(&PlayerId::from("a")),
            Some(&Movement { from: 3, to: 8 })
        );
        assert!(!result.moved_players.contains_key(&PlayerId::from("b")));
        assert_eq!(result.money_deltas.get(&PlayerId::from("a")), Some(&-4_000));
        assert!(!result.money_deltas.contains_key(&PlayerId::from("b")));
    }

    #[test]
    fn unknown_player_defaults_to_first_seen() {
        let previous = snapshot_with(&[("a", 3, 50_000)]);
        let next = snapshot_with(&[("a", 3, 50_000), ("c", 12, 50_000)]);
        let result = diff(&previous, &next);
        assert!(result.moved_players.is_empty());
        assert!(result.money_deltas.is_empty());
    }

    #[test]
    fn missing_player_is_a_disconnection() {
        let previous = snapshot_with(&[("a", 3, 50_000), ("b", 9, 40_000)]);
        let next = snapshot_with(&[("a", 3, 50_000)]);
        let result = diff(&previous, &next);
        assert_eq!(result.removed_players, vec![PlayerId::from("b")]);
    }

    #[test]
    fn track_deltas_are_direction_independent() {
        let pair = CityPair::new(City::Calgary, City::Vancouver);
        let flipped = CityPair::new(City::Vancouver, City::Calgary);
        let mut previous = GameSnapshot::empty();
        previous.players.insert(PlayerId::from("a"), player(0, 0));
        previous.routes.push(Route {
            city_pair: Some(pair),
            num_tracks: 1,
        });
        let mut next = previous.clone();
        next.routes[0] = Route {
            city_pair: Some(flipped),
            num_tracks: 2,
        };
        let result = diff(&previous, &next);
        assert_eq!(result.track_deltas.len(), 1);
        assert_eq!(result.track_deltas[0].kind, TrackChangeKind::Built);
        assert_eq!(result.track_deltas[0].from, 1);
        assert_eq!(result.track_deltas[0].to, 2);
    }

    #[test]
    fn track_decrease_classified_as_removed() {
        let pair = CityPair::new(City::Sudbury, City::Winnipeg);
        let mut previous = GameSnapshot::empty();
        previous.players.insert(PlayerId::from("a"), player(0, 0));
        previous.routes.push(Route {
            city_pair: Some(pair),
            num_tracks: 3,
        });
        let mut next = previous.clone();
        next.routes[0].num_tracks = 1;
        let result = diff(&previous, &next);
        assert_eq!(result.track_deltas[0].kind, TrackChangeKind::Removed);
    }

    #[test]
    fn trade_transitions_classified() {
        let trade = Trade {
            player1_id: PlayerId::from("a"),
            player2_id: PlayerId::from("b"),
            player1_money: 5_000,
            player2_money: 0,
            properties: Vec::new(),
        };
        let without = snapshot_with(&[("a", 0, 0), ("b", 0, 0)]);
        let mut with = without.clone();
        with.pending_trade = Some(trade);
        assert_eq!(
            diff(&without, &with).trade_event,
            Some(TradeEvent::Proposed)
        );
        assert_eq!(diff(&with, &without).trade_event, Some(TradeEvent::Resolved));
        assert_eq!(diff(&with, &with).trade_event, None);
    }
}
