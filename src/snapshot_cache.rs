use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rkyv::{Archive, Deserialize, Serialize};

use lastspike_core::{decode, encode, GameSnapshot};

const SNAPSHOT_KEY: &str = "lastspike.snapshot";
const SNAPSHOT_VERSION: u32 = 1;

/// Versioned wrapper around the last rendered snapshot. A reload restores
/// this as the starting rendered state, so the stale board shows immediately
/// and the next fetch diffs against it instead of animating the whole game.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
struct CachedSnapshot {
    version: u32,
    session_id: String,
    snapshot: GameSnapshot,
}

pub(crate) fn load_cached_snapshot(session_id: &str) -> Option<GameSnapshot> {
    #[cfg(target_arch = "wasm32")]
    {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;
        let raw = storage.get_item(SNAPSHOT_KEY).ok()??;
        if raw.is_empty() {
            return None;
        }
        let bytes = STANDARD.decode(raw.as_bytes()).ok()?;
        let cached = decode::<CachedSnapshot>(&bytes)?;
        if cached.version != SNAPSHOT_VERSION {
            gloo::console::log!("snapshot cache: version mismatch", cached.version);
            return None;
        }
        if cached.session_id != session_id {
            return None;
        }
        gloo::console::log!("snapshot cache: restored");
        Some(cached.snapshot)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = session_id;
        None
    }
}

pub(crate) fn save_cached_snapshot(session_id: &str, snapshot: &GameSnapshot) {
    #[cfg(target_arch = "wasm32")]
    {
        let cached = CachedSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: session_id.to_string(),
            snapshot: snapshot.clone(),
        };
        let Some(bytes) = encode(&cached) else {
            gloo::console::log!("snapshot cache: encode failed");
            return;
        };
        let raw = STANDARD.encode(bytes);
        let Some(storage) =
            web_sys::window().and_then(|window| window.local_storage().ok().flatten())
        else {
            return;
        };
        if storage.set_item(SNAPSHOT_KEY, &raw).is_err() {
            gloo::console::log!("snapshot cache: storage set failed");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (session_id, snapshot);
    }
}

pub(crate) fn clear_cached_snapshot() {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(storage) =
            web_sys::window().and_then(|window| window.local_storage().ok().flatten())
        else {
            return;
        };
        let _ = storage.remove_item(SNAPSHOT_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_snapshot_round_trips_through_the_codec() {
        let cached = CachedSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: "3f2504e0-4f89-11d3-9a0c-0305e82c3301".to_string(),
            snapshot: GameSnapshot::empty(),
        };
        let bytes = encode(&cached).expect("encode");
        assert_eq!(decode::<CachedSnapshot>(&bytes), Some(cached));
    }
}
