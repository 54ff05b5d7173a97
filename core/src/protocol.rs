use rkyv::{Archive, Deserialize, Serialize};

/// Push-channel frames. The payload is never trusted as game state: every
/// notify only triggers a re-fetch of the authoritative snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum NotifyMsg {
    GameStarted,
    BoardUpdated,
    PlayerJoined { player_id: String },
    PlayerRemoved { player_id: String },
    SessionClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ClientMsg {
    Subscribe { session_id: String },
    Ping { nonce: Option<u64> },
}
