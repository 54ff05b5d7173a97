pub mod board;
pub mod codec;
pub mod diff;
pub mod plan;
pub mod protocol;
pub mod sequencer;
pub mod session;
pub mod state;

pub use board::{
    forward_path, City, CityPair, SpaceDef, SpaceType, BOARD_SPACES, MAX_DEEDS_PER_CITY, SPACES,
    VALID_CITY_PAIRS,
};
pub use codec::{decode, encode};
pub use diff::{diff, Movement, SnapshotDiff, TrackChangeKind, TrackDelta, TradeEvent};
pub use plan::{plan, AnimationPhase, CommitCue, PhaseKind, Release, SequencerConfig, TokenPath};
pub use protocol::{ClientMsg, NotifyMsg};
pub use sequencer::{Sequencer, SequencerEvent};
pub use session::{is_valid_session_id, PlayerProfile, SessionData, SessionId, SessionIdError};
pub use state::{ActionType, GameSnapshot, PlayerId, PlayerState, Property, Route, Trade, TurnPhase};
