use std::collections::BTreeMap;
use std::fmt;

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Deserializer, Serialize};

use crate::board::{City, CityPair, MAX_DEEDS_PER_CITY};

/// Backend-issued player identifier (an opaque GUID string).
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug, PartialEq, Eq, PartialOrd, Ord))]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        PlayerId(value.to_string())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    pub money: i64,
    pub board_position: u8,
    pub skip_next_turn: bool,
}

/// One edge of the route map. The backend nulls the pair on rows it has not
/// initialized yet; such routes are ignored until a pair shows up.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase", default)]
pub struct Route {
    pub city_pair: Option<CityPair>,
    pub num_tracks: u8,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize,
)]
#[rkyv(derive(Debug))]
pub struct Property {
    pub city: City,
    #[serde(
        rename = "owner_PID",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub owner: Option<PlayerId>,
}

/// A proposed exchange: player 1 offers `player1_money` plus their listed
/// properties against `player2_money` plus player 2's listed properties.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub player1_money: i64,
    pub player2_money: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<Property>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum TurnPhase {
    #[default]
    Start,
    SpaceOption,
    RouteSelect,
    End,
}

impl From<TurnPhase> for u8 {
    fn from(phase: TurnPhase) -> u8 {
        phase as u8
    }
}

impl TryFrom<u8> for TurnPhase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TurnPhase::Start),
            1 => Ok(TurnPhase::SpaceOption),
            2 => Ok(TurnPhase::RouteSelect),
            3 => Ok(TurnPhase::End),
            other => Err(format!("invalid turn phase {other}")),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ActionType {
    Move,
    Accept,
    Pass,
    Rebellion,
    Trade,
    PlaceTrack,
}

impl ActionType {
    pub fn label(self) -> &'static str {
        match self {
            ActionType::Move => "Roll Dice",
            ActionType::Accept => "Ok",
            ActionType::Pass => "Pass",
            ActionType::Rebellion => "Rebellion",
            ActionType::Trade => "Trade",
            ActionType::PlaceTrack => "Place Track",
        }
    }
}

impl From<ActionType> for u8 {
    fn from(action: ActionType) -> u8 {
        action as u8
    }
}

impl TryFrom<u8> for ActionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ActionType::Move),
            1 => Ok(ActionType::Accept),
            2 => Ok(ActionType::Pass),
            3 => Ok(ActionType::Rebellion),
            4 => Ok(ActionType::Trade),
            5 => Ok(ActionType::PlaceTrack),
            other => Err(format!("invalid action type {other}")),
        }
    }
}

/// The authoritative truth at one instant, as fetched from the backend.
/// The rendered copy held by the sequencer has the same shape and lags this
/// one while animations are in flight.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase", default)]
pub struct GameSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub players: BTreeMap<PlayerId, PlayerState>,
    #[serde(deserialize_with = "null_as_default")]
    pub routes: Vec<Route>,
    #[serde(deserialize_with = "null_as_default")]
    pub properties: Vec<Property>,
    pub current_player_id: PlayerId,
    pub turn_phase: TurnPhase,
    #[serde(deserialize_with = "null_as_default")]
    pub valid_actions: Vec<ActionType>,
    pub pending_trade: Option<Trade>,
    pub is_game_over: bool,
    pub dice1: u8,
    pub dice2: u8,
}

impl GameSnapshot {
    /// The session-start rendered state: no players, no roll, nothing owned.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Tracks on the route matching `pair`, regardless of pair direction.
    pub fn tracks_on(&self, pair: CityPair) -> u8 {
        self.routes
            .iter()
            .find(|route| route.city_pair == Some(pair))
            .map(|route| route.num_tracks)
            .unwrap_or(0)
    }

    /// Deeds `owner` holds in `city`, capped at the scarcity limit.
    pub fn deeds_held(&self, city: City, owner: &PlayerId) -> u8 {
        let held = self
            .properties
            .iter()
            .filter(|property| property.city == city && property.owner.as_ref() == Some(owner))
            .count();
        (held as u8).min(MAX_DEEDS_PER_CITY)
    }

    /// Where `owner`'s holdings in `city` sit on the deed value ladder.
    pub fn deed_value(&self, city: City, owner: &PlayerId) -> i64 {
        city.deed_values()[self.deeds_held(city, owner) as usize]
    }
}

/// The backend serializes uninitialized collections as JSON null.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<PlayerId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.is_empty()).map(PlayerId))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::City;

    #[test]
    fn decodes_backend_snapshot_json() {
        let raw = r#"{
            "players": {
                "a1": { "money": 50000, "boardPosition": 3, "skipNextTurn": false },
                "b2": { "money": 42000, "boardPosition": 19, "skipNextTurn": true }
            },
            "routes": [
                { "cityPair": [6, 8], "numTracks": 2 },
                { "cityPair": null, "numTracks": 0 }
            ],
            "properties": [
                { "city": 2, "owner_PID": "a1" },
                { "city": 7, "owner_PID": "" }
            ],
            "currentPlayerId": "a1",
            "turnPhase": 1,
            "validActions": [0, 2],
            "pendingTrade": null,
            "isGameOver": false,
            "dice1": 3,
            "dice2": 5
        }"#;
        let snapshot: GameSnapshot = serde_json::from_str(raw).expect("snapshot should decode");
        assert_eq!(snapshot.players.len(), 2);
        let a1 = snapshot.player(&PlayerId::from("a1")).unwrap();
        assert_eq!(a1.money, 50_000);
        assert_eq!(a1.board_position, 3);
        assert_eq!(
            snapshot.routes[0].city_pair,
            Some(CityPair::new(City::Winnipeg, City::Toronto))
        );
        assert_eq!(snapshot.routes[1].city_pair, None);
        assert_eq!(snapshot.properties[0].owner, Some(PlayerId::from("a1")));
        assert_eq!(snapshot.properties[1].owner, None);
        assert_eq!(snapshot.turn_phase, TurnPhase::SpaceOption);
        assert_eq!(
            snapshot.valid_actions,
            vec![ActionType::Move, ActionType::Pass]
        );
        assert_eq!((snapshot.dice1, snapshot.dice2), (3, 5));
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let raw = r#"{
            "players": null,
            "routes": null,
            "properties": null,
            "currentPlayerId": "",
            "turnPhase": 0,
            "validActions": null,
            "pendingTrade": null,
            "isGameOver": false,
            "dice1": 0,
            "dice2": 0
        }"#;
        let snapshot: GameSnapshot = serde_json::from_str(raw).expect("snapshot should decode");
        assert!(snapshot.players.is_empty());
        assert!(snapshot.routes.is_empty());
        assert!(snapshot.properties.is_empty());
        assert!(snapshot.valid_actions.is_empty());
    }

    #[test]
    fn deed_value_climbs_the_ladder_with_holdings() {
        let owner = PlayerId::from("a");
        let mut snapshot = GameSnapshot::empty();
        assert_eq!(snapshot.deed_value(City::Montreal, &owner), 0);
        for _ in 0..2 {
            snapshot.properties.push(Property {
                city: City::Montreal,
                owner: Some(owner.clone()),
            });
        }
        snapshot.properties.push(Property {
            city: City::Montreal,
            owner: None,
        });
        assert_eq!(snapshot.deeds_held(City::Montreal, &owner), 2);
        assert_eq!(snapshot.deed_value(City::Montreal, &owner), 25_000);
    }

    #[test]
    fn tracks_on_matches_either_direction() {
        let mut snapshot = GameSnapshot::empty();
        snapshot.routes.push(Route {
            city_pair: Some(CityPair::new(City::Calgary, City::Vancouver)),
            num_tracks: 3,
        });
        assert_eq!(
            snapshot.tracks_on(CityPair::new(City::Vancouver, City::Calgary)),
            3
        );
    }
}
