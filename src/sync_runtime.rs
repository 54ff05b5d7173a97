use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::{Interval, Timeout};
use wasm_bindgen_futures::spawn_local;

use crate::api::ApiClient;
use crate::app_router;
use crate::push::NotifyAdapter;
use crate::snapshot_cache;
use crate::sounds::SoundBank;
use lastspike_core::{
    ActionType, CommitCue, GameSnapshot, NotifyMsg, PhaseKind, Sequencer, SequencerConfig,
    SequencerEvent, Trade,
};

/// How often the runtime re-fetches even without a notify frame. The push
/// channel is an optimization; polling is the correctness backstop.
const POLL_INTERVAL_MS: u32 = 2_000;

const RETRY_DELAYS_MS: &[u32] = &[200, 500, 1_000, 2_000, 4_000, 8_000, 15_000, 30_000];

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RuntimeEvent {
    ActionsGated,
    PushLost,
    SessionClosed,
}

#[derive(Clone)]
pub(crate) struct SyncHooks {
    pub(crate) on_render: Rc<dyn Fn(GameSnapshot)>,
    pub(crate) on_phase: Rc<dyn Fn(PhaseKind)>,
    pub(crate) on_cue: Rc<dyn Fn(CommitCue)>,
    pub(crate) on_event: Rc<dyn Fn(RuntimeEvent)>,
}

impl SyncHooks {
    pub(crate) fn empty() -> Self {
        Self {
            on_render: Rc::new(|_| {}),
            on_phase: Rc::new(|_| {}),
            on_cue: Rc::new(|_| {}),
            on_event: Rc::new(|_| {}),
        }
    }
}

#[derive(Clone)]
struct RuntimeConfig {
    api: ApiClient,
    session_id: String,
    player_id: String,
}

struct SyncRuntimeState {
    config: Option<RuntimeConfig>,
    sequencer: Sequencer,
    adapter: NotifyAdapter,
    hooks: SyncHooks,
    sounds: Option<SoundBank>,
    poll_interval: Option<Interval>,
    tick_timer: Option<Timeout>,
    fetch_inflight: bool,
    refetch_queued: bool,
    retry_attempts: u32,
    retry_timer: Option<Timeout>,
}

impl SyncRuntimeState {
    fn new() -> Self {
        Self {
            config: None,
            sequencer: Sequencer::new(SequencerConfig::default()),
            adapter: NotifyAdapter::new(),
            hooks: SyncHooks::empty(),
            sounds: None,
            poll_interval: None,
            tick_timer: None,
            fetch_inflight: false,
            refetch_queued: false,
            retry_attempts: 0,
            retry_timer: None,
        }
    }
}

thread_local! {
    static STATE: RefCell<SyncRuntimeState> = RefCell::new(SyncRuntimeState::new());
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Starts (or restarts) the runtime for one session. The cached snapshot, if
/// any, becomes the initial rendered state so a reload shows the stale board
/// while the first fetch is in flight.
pub(crate) fn init(session_id: &str, player_id: &str) {
    let api = ApiClient::new(app_router::default_api_base());
    let restored = snapshot_cache::load_cached_snapshot(session_id);
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.config = Some(RuntimeConfig {
            api,
            session_id: session_id.to_string(),
            player_id: player_id.to_string(),
        });
        state.sequencer = match restored {
            Some(snapshot) => Sequencer::with_rendered(snapshot, SequencerConfig::default()),
            None => Sequencer::new(SequencerConfig::default()),
        };
        if state.sounds.is_none() {
            state.sounds = Some(SoundBank::new());
        }
        state.retry_attempts = 0;
        state.retry_timer.take();
        state.poll_interval = Some(Interval::new(POLL_INTERVAL_MS, request_fetch));
    });
    connect_push();
    request_fetch();
}

pub(crate) fn shutdown() {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.config = None;
        state.adapter.disconnect();
        state.poll_interval.take();
        state.tick_timer.take();
        state.retry_timer.take();
        state.hooks = SyncHooks::empty();
    });
}

pub(crate) fn set_hooks(hooks: SyncHooks) {
    let snapshot = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.hooks = hooks;
        state.sequencer.rendered().clone()
    });
    let on_render = STATE.with(|slot| slot.borrow().hooks.on_render.clone());
    on_render(snapshot);
}

pub(crate) fn clear_hooks() {
    STATE.with(|slot| {
        slot.borrow_mut().hooks = SyncHooks::empty();
    });
}

pub(crate) fn rendered() -> GameSnapshot {
    STATE.with(|slot| slot.borrow().sequencer.rendered().clone())
}

pub(crate) fn push_connected() -> bool {
    STATE.with(|slot| slot.borrow().adapter.is_connected())
}

fn connect_push() {
    let (config, ws_base) = STATE.with(|slot| {
        let state = slot.borrow();
        (state.config.clone(), app_router::default_ws_base())
    });
    let Some(config) = config else {
        return;
    };
    let Some(ws_base) = ws_base else {
        gloo::console::warn!("no websocket base; polling only");
        return;
    };
    let url = app_router::build_notify_ws_url(&ws_base, &config.session_id);
    let on_notify: Rc<dyn Fn(NotifyMsg)> = Rc::new(handle_notify);
    // Deferred so a synchronous connect failure cannot re-enter STATE.
    let on_fail: Rc<dyn Fn()> = Rc::new(|| {
        Timeout::new(0, schedule_push_retry).forget();
    });
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state
            .adapter
            .connect(&url, &config.session_id, on_notify, on_fail);
    });
}

fn handle_notify(msg: NotifyMsg) {
    match msg {
        NotifyMsg::GameStarted
        | NotifyMsg::BoardUpdated
        | NotifyMsg::PlayerJoined { .. }
        | NotifyMsg::PlayerRemoved { .. } => request_fetch(),
        NotifyMsg::SessionClosed => {
            STATE.with(|slot| {
                let mut state = slot.borrow_mut();
                state.adapter.disconnect();
                state.poll_interval.take();
            });
            snapshot_cache::clear_cached_snapshot();
            emit_event(RuntimeEvent::SessionClosed);
        }
    }
}

/// Reconnects the push channel with capped backoff. Polling keeps the board
/// fresh in the meantime, so losing the socket is never fatal.
fn schedule_push_retry() {
    let delay = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        if state.config.is_none() {
            return None;
        }
        let attempt = state.retry_attempts as usize;
        let delay = RETRY_DELAYS_MS
            .get(attempt)
            .copied()
            .unwrap_or_else(|| *RETRY_DELAYS_MS.last().unwrap_or(&30_000));
        state.retry_attempts = state.retry_attempts.saturating_add(1);
        let timer = Timeout::new(delay, || {
            let has_config = STATE.with(|slot| slot.borrow().config.is_some());
            if has_config {
                connect_push();
            }
        });
        state.retry_timer = Some(timer);
        Some(delay)
    });
    if delay.is_some() {
        emit_event(RuntimeEvent::PushLost);
    }
}

fn emit_event(event: RuntimeEvent) {
    let hook = STATE.with(|slot| slot.borrow().hooks.on_event.clone());
    hook(event);
}

/// Single entry point for "go get the truth". Collapses concurrent callers
/// into one in-flight request plus at most one queued refetch.
pub(crate) fn request_fetch() {
    let config = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        if state.config.is_none() {
            return None;
        }
        if state.fetch_inflight {
            state.refetch_queued = true;
            return None;
        }
        state.fetch_inflight = true;
        state.config.clone()
    });
    let Some(config) = config else {
        return;
    };
    spawn_local(async move {
        let result = config.api.get_game_state(&config.session_id).await;
        let queued = STATE.with(|slot| {
            let mut state = slot.borrow_mut();
            state.fetch_inflight = false;
            std::mem::take(&mut state.refetch_queued)
        });
        match result {
            Ok(snapshot) => {
                STATE.with(|slot| {
                    let mut state = slot.borrow_mut();
                    state.retry_attempts = 0;
                });
                offer_snapshot(snapshot);
            }
            Err(err) => {
                // The previously rendered snapshot stays on screen; the next
                // poll or notify retries.
                gloo::console::warn!("snapshot fetch failed", err.to_string());
            }
        }
        if queued {
            request_fetch();
        }
    });
}

fn offer_snapshot(snapshot: GameSnapshot) {
    let events = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.sequencer.offer(snapshot, now_ms())
    });
    dispatch(events);
    arm_tick_timer();
}

fn tick_now() {
    let events = STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        state.sequencer.tick(now_ms())
    });
    dispatch(events);
    arm_tick_timer();
}

fn arm_tick_timer() {
    STATE.with(|slot| {
        let mut state = slot.borrow_mut();
        let Some(deadline) = state.sequencer.next_deadline() else {
            state.tick_timer.take();
            return;
        };
        let delay = deadline.saturating_sub(now_ms());
        let delay = u32::try_from(delay).unwrap_or(u32::MAX);
        state.tick_timer = Some(Timeout::new(delay, tick_now));
    });
}

fn dispatch(events: Vec<SequencerEvent>) {
    if events.is_empty() {
        return;
    }
    let hooks = STATE.with(|slot| slot.borrow().hooks.clone());
    let mut committed = false;
    for event in events {
        match event {
            SequencerEvent::ActionsGated => {
                (hooks.on_event)(RuntimeEvent::ActionsGated);
                committed = true;
            }
            SequencerEvent::PhaseStarted(kind) => {
                STATE.with(|slot| {
                    if let Some(sounds) = slot.borrow_mut().sounds.as_mut() {
                        sounds.on_phase(&kind);
                    }
                });
                (hooks.on_phase)(kind);
            }
            SequencerEvent::Committed(_) => {
                committed = true;
            }
            SequencerEvent::Cue(cue) => {
                STATE.with(|slot| {
                    if let Some(sounds) = slot.borrow_mut().sounds.as_mut() {
                        sounds.on_cue(&cue);
                    }
                });
                (hooks.on_cue)(cue);
            }
        }
    }
    if committed {
        let (snapshot, session_id) = STATE.with(|slot| {
            let state = slot.borrow();
            (
                state.sequencer.rendered().clone(),
                state.config.as_ref().map(|config| config.session_id.clone()),
            )
        });
        if let Some(session_id) = session_id {
            snapshot_cache::save_cached_snapshot(&session_id, &snapshot);
        }
        (hooks.on_render)(snapshot);
    }
}

pub(crate) fn submit_action(action: ActionType) {
    let Some(config) = STATE.with(|slot| slot.borrow().config.clone()) else {
        return;
    };
    spawn_local(async move {
        match config
            .api
            .submit_action(&config.session_id, &config.player_id, action.into())
            .await
        {
            Ok(()) => request_fetch(),
            Err(err) => gloo::console::warn!("action rejected", err.to_string()),
        }
    });
}

pub(crate) fn propose_trade(trade: Trade) {
    let Some(config) = STATE.with(|slot| slot.borrow().config.clone()) else {
        return;
    };
    spawn_local(async move {
        match config.api.propose_trade(&config.session_id, &trade).await {
            Ok(()) => request_fetch(),
            Err(err) => gloo::console::warn!("trade rejected", err.to_string()),
        }
    });
}

pub(crate) fn respond_trade(accept: bool) {
    let Some(config) = STATE.with(|slot| slot.borrow().config.clone()) else {
        return;
    };
    spawn_local(async move {
        match config
            .api
            .respond_trade(&config.session_id, &config.player_id, accept)
            .await
        {
            Ok(()) => request_fetch(),
            Err(err) => gloo::console::warn!("trade response rejected", err.to_string()),
        }
    });
}
