mod api;
mod app_router;
mod game_view;
mod push;
mod snapshot_cache;
mod sounds;
mod sync_runtime;

use game_view::App;

fn main() {
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const SESSION: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";

    #[wasm_bindgen_test]
    fn hash_with_session_key_parses() {
        let config = app_router::parse_session_from_hash(&format!("#session={SESSION}"))
            .expect("hash should parse");
        assert_eq!(config.session_id, SESSION);
    }

    #[wasm_bindgen_test]
    fn hash_with_other_keys_still_finds_session() {
        let config =
            app_router::parse_session_from_hash(&format!("#debug=1;session_id={SESSION}"))
                .expect("hash should parse");
        assert_eq!(config.session_id, SESSION);
    }

    #[wasm_bindgen_test]
    fn malformed_session_hash_is_rejected() {
        assert!(app_router::parse_session_from_hash("#session=not-a-guid").is_none());
        assert!(app_router::parse_session_from_hash("#").is_none());
        assert!(app_router::parse_session_from_hash("").is_none());
    }

    #[wasm_bindgen_test]
    fn ws_base_normalization_rewrites_http_schemes() {
        assert_eq!(
            app_router::normalize_ws_base("https://play.example.com/ws"),
            "wss://play.example.com/ws"
        );
        assert_eq!(
            app_router::normalize_ws_base("http://localhost:5098/ws"),
            "ws://localhost:5098/ws"
        );
        assert_eq!(
            app_router::normalize_ws_base("wss://already.example.com"),
            "wss://already.example.com"
        );
    }

    #[wasm_bindgen_test]
    fn push_channel_reports_disconnected_before_any_session() {
        assert!(!sync_runtime::push_connected());
    }

    #[wasm_bindgen_test]
    fn notify_url_joins_base_and_session() {
        assert_eq!(
            app_router::build_notify_ws_url("ws://localhost:5098/ws/", SESSION),
            format!("ws://localhost:5098/ws/{SESSION}")
        );
    }
}
