use web_sys::UrlSearchParams;

use lastspike_core::is_valid_session_id;

const PLAYER_ID_KEY: &str = "lastspike.playerId";
const PLAYER_NAME_KEY: &str = "lastspike.playerName";

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SessionConfig {
    pub(crate) session_id: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct StoredIdentity {
    pub(crate) player_id: Option<String>,
    pub(crate) player_name: Option<String>,
}

pub(crate) fn load_session_config() -> Option<SessionConfig> {
    let window = web_sys::window()?;
    let hash = window.location().hash().ok()?;
    if let Some(config) = parse_session_from_hash(&hash) {
        return Some(config);
    }
    let search = window.location().search().ok()?;
    parse_session_from_query(&search)
}

pub(crate) fn parse_session_from_hash(hash: &str) -> Option<SessionConfig> {
    let raw = hash.trim().trim_start_matches('#').trim();
    if raw.is_empty() {
        return None;
    }
    let mut session_id = None;
    for chunk in raw.split(';') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let mut iter = chunk.splitn(2, '=');
        let key = iter.next().unwrap_or("").trim();
        let value = iter.next().unwrap_or("").trim();
        if key.eq_ignore_ascii_case("session") || key.eq_ignore_ascii_case("session_id") {
            session_id = Some(value.to_string());
        }
    }
    let session_id = session_id?.trim().to_string();
    if !is_valid_session_id(&session_id) {
        return None;
    }
    Some(SessionConfig { session_id })
}

fn parse_session_from_query(search: &str) -> Option<SessionConfig> {
    let search = search.trim();
    if search.is_empty() {
        return None;
    }
    let params = UrlSearchParams::new_with_str(search).ok()?;
    let session = params.get("session").or_else(|| params.get("session_id"))?;
    let session_id = session.trim().to_string();
    if !is_valid_session_id(&session_id) {
        return None;
    }
    Some(SessionConfig { session_id })
}

pub(crate) fn set_session_hash(session_id: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let _ = window.location().set_hash(&format!("session={session_id}"));
}

pub(crate) fn load_identity() -> StoredIdentity {
    let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
    let Some(storage) = storage else {
        return StoredIdentity::default();
    };
    StoredIdentity {
        player_id: storage.get_item(PLAYER_ID_KEY).ok().flatten(),
        player_name: storage.get_item(PLAYER_NAME_KEY).ok().flatten(),
    }
}

pub(crate) fn save_identity(player_id: &str, player_name: &str) {
    let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
    let Some(storage) = storage else {
        return;
    };
    let _ = storage.set_item(PLAYER_ID_KEY, player_id);
    let _ = storage.set_item(PLAYER_NAME_KEY, player_name);
}

pub(crate) fn default_api_base() -> String {
    if let Some(raw) = option_env!("LASTSPIKE_API_BASE")
        .or(option_env!("TRUNK_PUBLIC_LASTSPIKE_API_BASE"))
    {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.trim_end_matches('/').to_string();
        }
    }
    if let Some(window) = web_sys::window() {
        let location = window.location();
        if let (Ok(protocol), Ok(host)) = (location.protocol(), location.host()) {
            if !host.trim().is_empty() {
                return format!("{protocol}//{host}");
            }
        }
    }
    "http://localhost:5098".to_string()
}

pub(crate) fn default_ws_base() -> Option<String> {
    if let Some(raw) = option_env!("LASTSPIKE_WS_BASE")
        .or(option_env!("TRUNK_PUBLIC_LASTSPIKE_WS_BASE"))
    {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(normalize_ws_base(trimmed));
        }
    }
    let window = web_sys::window()?;
    let location = window.location();
    let host = location.host().ok()?;
    if host.trim().is_empty() {
        return None;
    }
    let protocol = location.protocol().ok()?.to_ascii_lowercase();
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Some(format!("{scheme}://{host}/ws"))
}

pub(crate) fn build_notify_ws_url(ws_base: &str, session_id: &str) -> String {
    let base = ws_base.trim_end_matches('/');
    format!("{base}/{session_id}")
}

pub(crate) fn normalize_ws_base(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        trimmed.to_string()
    }
}
