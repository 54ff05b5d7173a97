use rkyv::api::high::{HighDeserializer, HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

/// Binary framing for the notify channel and the local snapshot cache.
/// Corrupt input decodes to `None`; the callers treat that as "no data".
pub fn encode<T>(value: &T) -> Option<Vec<u8>>
where
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    rkyv::to_bytes::<Error>(value)
        .ok()
        .map(|bytes| bytes.into_vec())
}

pub fn decode<T>(bytes: &[u8]) -> Option<T>
where
    T: Archive,
    T::Archived:
        for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    rkyv::from_bytes::<T, Error>(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NotifyMsg;

    #[test]
    fn notify_frames_round_trip() {
        let msg = NotifyMsg::PlayerJoined {
            player_id: "a1".to_string(),
        };
        let bytes = encode(&msg).expect("encode");
        assert_eq!(decode::<NotifyMsg>(&bytes), Some(msg));
    }

    #[test]
    fn garbage_decodes_to_none() {
        assert_eq!(decode::<NotifyMsg>(&[0x13, 0x37, 0x00]), None);
    }
}
