use std::collections::HashMap;
use std::rc::Rc;

use gloo::timers::callback::Interval;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::api::ApiClient;
use crate::app_router::{self, SessionConfig};
use crate::sync_runtime::{self, RuntimeEvent, SyncHooks};
use lastspike_core::{
    ActionType, GameSnapshot, PhaseKind, PlayerId, PlayerProfile, Trade, SPACES,
};

const LOBBY_POLL_MS: u32 = 2_000;
const CHANNEL_POLL_MS: u32 = 2_000;

#[function_component(App)]
pub(crate) fn app() -> Html {
    let session = use_state(app_router::load_session_config);
    let on_enter = {
        let session = session.clone();
        Callback::from(move |config: SessionConfig| {
            app_router::set_session_hash(&config.session_id);
            session.set(Some(config));
        })
    };
    match (*session).clone() {
        Some(config) => html! { <SessionView {config} /> },
        None => html! { <Lobby {on_enter} /> },
    }
}

#[derive(Properties, PartialEq)]
struct LobbyProps {
    on_enter: Callback<SessionConfig>,
}

/// Entry screen: pick a name, then host a new session or join an existing
/// one. The player identity persists in local storage across reloads.
#[function_component(Lobby)]
fn lobby(props: &LobbyProps) -> Html {
    let identity = use_state(app_router::load_identity);
    let name_ref = use_node_ref();
    let join_ref = use_node_ref();
    let error = use_state(|| None::<String>);
    let busy = use_state(|| false);

    let stored_name = identity.player_name.clone().unwrap_or_default();

    // Reuses the stored player id when present; otherwise registers a new
    // player under the entered name.
    async fn ensure_player(
        api: &ApiClient,
        identity: &app_router::StoredIdentity,
        name: &str,
    ) -> Result<String, String> {
        if let Some(player_id) = identity.player_id.as_deref() {
            if api.get_player(player_id).await.is_ok() {
                return Ok(player_id.to_string());
            }
        }
        let profile = api
            .create_player(name)
            .await
            .map_err(|err| err.to_string())?;
        app_router::save_identity(&profile.id, name);
        Ok(profile.id)
    }

    let on_create = {
        let identity = identity.clone();
        let name_ref = name_ref.clone();
        let error = error.clone();
        let busy = busy.clone();
        let on_enter = props.on_enter.clone();
        Callback::from(move |_event: MouseEvent| {
            let Some(input) = name_ref.cast::<HtmlInputElement>() else {
                return;
            };
            let name = input.value().trim().to_string();
            if name.is_empty() {
                error.set(Some("enter a name first".to_string()));
                return;
            }
            busy.set(true);
            let identity = (*identity).clone();
            let error = error.clone();
            let busy = busy.clone();
            let on_enter = on_enter.clone();
            spawn_local(async move {
                let api = ApiClient::new(app_router::default_api_base());
                let result = async {
                    let player_id = ensure_player(&api, &identity, &name).await?;
                    let session = api
                        .create_session(&player_id)
                        .await
                        .map_err(|err| err.to_string())?;
                    Ok::<String, String>(session.id)
                }
                .await;
                busy.set(false);
                match result {
                    Ok(session_id) => on_enter.emit(SessionConfig { session_id }),
                    Err(message) => error.set(Some(message)),
                }
            });
        })
    };

    let on_join = {
        let identity = identity.clone();
        let name_ref = name_ref.clone();
        let join_ref = join_ref.clone();
        let error = error.clone();
        let busy = busy.clone();
        let on_enter = props.on_enter.clone();
        Callback::from(move |_event: MouseEvent| {
            let Some(name_input) = name_ref.cast::<HtmlInputElement>() else {
                return;
            };
            let Some(join_input) = join_ref.cast::<HtmlInputElement>() else {
                return;
            };
            let name = name_input.value().trim().to_string();
            let session_id = join_input.value().trim().to_string();
            if name.is_empty() {
                error.set(Some("enter a name first".to_string()));
                return;
            }
            if !lastspike_core::is_valid_session_id(&session_id) {
                error.set(Some("that does not look like a session id".to_string()));
                return;
            }
            busy.set(true);
            let identity = (*identity).clone();
            let error = error.clone();
            let busy = busy.clone();
            let on_enter = on_enter.clone();
            spawn_local(async move {
                let api = ApiClient::new(app_router::default_api_base());
                let result = async {
                    let player_id = ensure_player(&api, &identity, &name).await?;
                    api.join_session(&session_id, &player_id)
                        .await
                        .map_err(|err| err.to_string())?;
                    Ok::<String, String>(session_id)
                }
                .await;
                busy.set(false);
                match result {
                    Ok(session_id) => on_enter.emit(SessionConfig { session_id }),
                    Err(message) => error.set(Some(message)),
                }
            });
        })
    };

    html! {
        <main class="lobby">
            <h1>{ "Last Spike" }</h1>
            <label>
                { "Name" }
                <input ref={name_ref} value={stored_name} placeholder="Your name" />
            </label>
            <button onclick={on_create} disabled={*busy}>{ "Create session" }</button>
            <label>
                { "Session id" }
                <input ref={join_ref} placeholder="Session id to join" />
            </label>
            <button onclick={on_join} disabled={*busy}>{ "Join session" }</button>
            if let Some(message) = (*error).clone() {
                <p class="error">{ message }</p>
            }
        </main>
    }
}

#[derive(Properties, PartialEq)]
struct SessionProps {
    config: SessionConfig,
}

/// Waiting room for one session: polls the lobby roster until the host
/// starts the game, then hands over to the board.
#[function_component(SessionView)]
fn session_view(props: &SessionProps) -> Html {
    let session = use_state(|| None::<lastspike_core::SessionData>);
    let players = use_state(Vec::<PlayerProfile>::new);
    let identity = use_state(app_router::load_identity);

    {
        let session = session.clone();
        let players = players.clone();
        use_effect_with(props.config.clone(), move |config| {
            let session_id = config.session_id.clone();
            let refresh = Rc::new(move || {
                let session = session.clone();
                let players = players.clone();
                let session_id = session_id.clone();
                spawn_local(async move {
                    let api = ApiClient::new(app_router::default_api_base());
                    let Ok(data) = api.get_session(&session_id).await else {
                        gloo::console::warn!("lobby fetch failed", session_id);
                        return;
                    };
                    let mut profiles = Vec::with_capacity(data.player_ids.len());
                    for player_id in &data.player_ids {
                        match api.get_player(player_id).await {
                            Ok(profile) => profiles.push(profile),
                            Err(_) => profiles.push(PlayerProfile {
                                id: player_id.clone(),
                                name: None,
                            }),
                        }
                    }
                    players.set(profiles);
                    session.set(Some(data));
                });
            });
            refresh();
            let interval = {
                let refresh = refresh.clone();
                Interval::new(LOBBY_POLL_MS, move || refresh())
            };
            move || drop(interval)
        });
    }

    let player_id = identity.player_id.clone().unwrap_or_default();
    let Some(data) = (*session).clone() else {
        return html! { <main class="lobby"><p>{ "Loading session..." }</p></main> };
    };

    if data.has_started() {
        return html! {
            <GameView
                session_id={props.config.session_id.clone()}
                player_id={player_id}
                players={(*players).clone()}
            />
        };
    }

    let is_host = data.host_id() == Some(player_id.as_str());
    let on_start = {
        let session_id = props.config.session_id.clone();
        let player_id = player_id.clone();
        Callback::from(move |_event: MouseEvent| {
            let session_id = session_id.clone();
            let player_id = player_id.clone();
            spawn_local(async move {
                let api = ApiClient::new(app_router::default_api_base());
                if let Err(err) = api.start_game(&session_id, &player_id).await {
                    gloo::console::warn!("start failed", err.to_string());
                }
            });
        })
    };

    html! {
        <main class="lobby">
            <h1>{ "Lobby" }</h1>
            <p class="session-id">{ &props.config.session_id }</p>
            <ul class="players">
                { for players.iter().enumerate().map(|(index, profile)| {
                    let label = profile.name.clone().unwrap_or_else(|| "Unknown player".to_string());
                    let you = profile.id == player_id;
                    html! {
                        <li key={profile.id.clone()}>
                            { if index == 0 { "👑 " } else { "" } }
                            { label }
                            { if you { " (you)" } else { "" } }
                        </li>
                    }
                }) }
            </ul>
            if is_host {
                <button onclick={on_start}>{ "Start game" }</button>
            } else {
                <p>{ "Waiting for the host to start..." }</p>
            }
        </main>
    }
}

#[derive(Properties, PartialEq)]
struct GameProps {
    session_id: String,
    player_id: String,
    players: Vec<PlayerProfile>,
}

/// The running game. Everything shown here comes from the sequencer's
/// rendered snapshot; the runtime pushes a fresh copy on every commit.
#[function_component(GameView)]
fn game_view(props: &GameProps) -> Html {
    let snapshot = use_state(sync_runtime::rendered);
    let rolling = use_state(|| false);
    let notice = use_state(|| None::<String>);
    let trade_open = use_state(|| false);
    let push_live = use_state(sync_runtime::push_connected);

    {
        let push_live = push_live.clone();
        use_effect_with((), move |_| {
            let interval = Interval::new(CHANNEL_POLL_MS, move || {
                push_live.set(sync_runtime::push_connected());
            });
            move || drop(interval)
        });
    }

    {
        let snapshot = snapshot.clone();
        let rolling = rolling.clone();
        let notice = notice.clone();
        use_effect_with(
            (props.session_id.clone(), props.player_id.clone()),
            move |(session_id, player_id)| {
                sync_runtime::init(session_id, player_id);
                let on_render = {
                    let snapshot = snapshot.clone();
                    let rolling = rolling.clone();
                    Rc::new(move |next: GameSnapshot| {
                        if next.dice1 != 0 {
                            rolling.set(false);
                        }
                        snapshot.set(next);
                    })
                };
                let on_phase = {
                    let rolling = rolling.clone();
                    Rc::new(move |kind: PhaseKind| {
                        if matches!(kind, PhaseKind::DiceReveal { .. }) {
                            rolling.set(true);
                        }
                    })
                };
                let on_event = {
                    let notice = notice.clone();
                    Rc::new(move |event: RuntimeEvent| match event {
                        RuntimeEvent::SessionClosed => {
                            notice.set(Some("Session closed by the server".to_string()));
                        }
                        RuntimeEvent::PushLost => {
                            gloo::console::log!("push channel lost; polling");
                        }
                        RuntimeEvent::ActionsGated => {}
                    })
                };
                sync_runtime::set_hooks(SyncHooks {
                    on_render,
                    on_phase,
                    on_cue: Rc::new(|_| {}),
                    on_event,
                });
                || {
                    sync_runtime::clear_hooks();
                    sync_runtime::shutdown();
                }
            },
        );
    }

    let names: HashMap<String, String> = props
        .players
        .iter()
        .map(|profile| {
            (
                profile.id.clone(),
                profile
                    .name
                    .clone()
                    .unwrap_or_else(|| profile.id.clone()),
            )
        })
        .collect();
    let display_name = |id: &PlayerId| -> String {
        names
            .get(id.as_str())
            .cloned()
            .unwrap_or_else(|| id.to_string())
    };

    let me = PlayerId::from(props.player_id.as_str());
    let rendered = (*snapshot).clone();
    let my_turn = rendered.current_player_id == me;

    let on_action = {
        let trade_open = trade_open.clone();
        Callback::from(move |action: ActionType| {
            if action == ActionType::Trade {
                trade_open.set(true);
            } else {
                sync_runtime::submit_action(action);
            }
        })
    };

    html! {
        <main class="game">
            if let Some(message) = (*notice).clone() {
                <p class="notice">{ message }</p>
            }
            <p class="channel">
                { if *push_live { "live updates" } else { "polling for updates" } }
            </p>
            if rendered.is_game_over {
                <GameOverBanner winner={winner_name(&rendered, &names)} />
            }
            <DicePanel rolling={*rolling} dice1={rendered.dice1} dice2={rendered.dice2} />
            <section class="players">
                <h2>{ "Players" }</h2>
                <table>
                    <thead>
                        <tr><th>{ "Player" }</th><th>{ "Money" }</th><th>{ "Space" }</th></tr>
                    </thead>
                    <tbody>
                        { for rendered.players.iter().map(|(id, state)| {
                            let current = *id == rendered.current_player_id;
                            let space = SPACES
                                .get(state.board_position as usize)
                                .map(|def| def.space_type.label())
                                .unwrap_or("?");
                            html! {
                                <tr key={id.to_string()} class={classes!(current.then_some("current"))}>
                                    <td>{ display_name(id) }</td>
                                    <td>{ format!("${}", state.money) }</td>
                                    <td>{ format!("{} ({})", state.board_position, space) }</td>
                                </tr>
                            }
                        }) }
                    </tbody>
                </table>
            </section>
            <section class="routes">
                <h2>{ "Routes" }</h2>
                <ul>
                    { for rendered.routes.iter().filter_map(|route| {
                        let pair = route.city_pair?;
                        Some(html! {
                            <li>
                                { format!("{} - {}: {} tracks",
                                    pair.first().name(), pair.second().name(), route.num_tracks) }
                            </li>
                        })
                    }) }
                </ul>
            </section>
            <section class="deeds">
                <h2>{ "Deeds" }</h2>
                <ul>
                    { for rendered.properties.iter().map(|property| {
                        let line = match &property.owner {
                            Some(owner) => format!(
                                "{}: {} (worth ${})",
                                property.city.name(),
                                display_name(owner),
                                rendered.deed_value(property.city, owner),
                            ),
                            None => format!("{}: unowned", property.city.name()),
                        };
                        html! { <li>{ line }</li> }
                    }) }
                </ul>
            </section>
            // The commit gate empties valid_actions while a sequence runs,
            // so this bar vanishes on its own during animations.
            if my_turn && !rendered.valid_actions.is_empty() {
                <ActionBar actions={rendered.valid_actions.clone()} on_action={on_action} />
            }
            if let Some(trade) = rendered.pending_trade.clone() {
                <PendingTradePanel {trade} me={me.clone()} />
            }
            if *trade_open {
                <TradeForm
                    me={me.clone()}
                    snapshot={rendered.clone()}
                    on_close={Callback::from({
                        let trade_open = trade_open.clone();
                        move |_: ()| trade_open.set(false)
                    })}
                />
            }
        </main>
    }
}

fn winner_name(snapshot: &GameSnapshot, names: &HashMap<String, String>) -> String {
    snapshot
        .players
        .iter()
        .max_by_key(|(_, state)| state.money)
        .map(|(id, _)| {
            names
                .get(id.as_str())
                .cloned()
                .unwrap_or_else(|| id.to_string())
        })
        .unwrap_or_else(|| "nobody".to_string())
}

#[derive(Properties, PartialEq)]
struct GameOverProps {
    winner: String,
}

#[function_component(GameOverBanner)]
fn game_over_banner(props: &GameOverProps) -> Html {
    html! {
        <div class="game-over">
            <h2>{ "Game over" }</h2>
            <p>{ format!("{} wins!", props.winner) }</p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct PendingTradeProps {
    trade: Trade,
    me: PlayerId,
}

/// Shows the outstanding trade offer. The receiving player gets the
/// accept/decline controls; everyone else just sees it is pending.
#[function_component(PendingTradePanel)]
fn pending_trade_panel(props: &PendingTradeProps) -> Html {
    let trade = &props.trade;
    let deeds = trade.properties.len();
    let mine_to_answer = trade.player2_id == props.me;
    let on_accept = Callback::from(|_event: MouseEvent| sync_runtime::respond_trade(true));
    let on_decline = Callback::from(|_event: MouseEvent| sync_runtime::respond_trade(false));
    html! {
        <div class="pending-trade">
            <h3>{ "Trade offer" }</h3>
            <p>
                { format!(
                    "{} offers ${} against ${} from {}",
                    trade.player1_id, trade.player1_money, trade.player2_money, trade.player2_id,
                ) }
                { if deeds > 0 { format!(" ({deeds} deeds included)") } else { String::new() } }
            </p>
            if mine_to_answer {
                <button onclick={on_accept}>{ "Accept" }</button>
                <button onclick={on_decline}>{ "Decline" }</button>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct DiceProps {
    rolling: bool,
    dice1: u8,
    dice2: u8,
}

#[function_component(DicePanel)]
fn dice_panel(props: &DiceProps) -> Html {
    if props.rolling {
        return html! { <div class="dice rolling">{ "🎲 Rolling..." }</div> };
    }
    if props.dice1 == 0 {
        return html! {};
    }
    html! {
        <div class="dice">
            { format!("🎲 {} + {} = {}", props.dice1, props.dice2, props.dice1 + props.dice2) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ActionBarProps {
    actions: Vec<ActionType>,
    on_action: Callback<ActionType>,
}

#[function_component(ActionBar)]
fn action_bar(props: &ActionBarProps) -> Html {
    html! {
        <div class="action-bar">
            { for props.actions.iter().copied().map(|action| {
                let on_action = props.on_action.clone();
                html! {
                    <button onclick={Callback::from(move |_: MouseEvent| on_action.emit(action))}>
                        { action.label() }
                    </button>
                }
            }) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct TradeFormProps {
    me: PlayerId,
    snapshot: GameSnapshot,
    on_close: Callback<()>,
}

/// Money-for-money trade proposal form. Deed selection follows the same
/// shape: properties listed in the trade change owner when accepted.
#[function_component(TradeForm)]
fn trade_form(props: &TradeFormProps) -> Html {
    let offer_ref = use_node_ref();
    let ask_ref = use_node_ref();
    let target = use_state(|| {
        props
            .snapshot
            .players
            .keys()
            .find(|id| **id != props.me)
            .cloned()
    });

    let Some(target_id) = (*target).clone() else {
        return html! {};
    };

    let on_submit = {
        let me = props.me.clone();
        let target_id = target_id.clone();
        let offer_ref = offer_ref.clone();
        let ask_ref = ask_ref.clone();
        let on_close = props.on_close.clone();
        Callback::from(move |_event: MouseEvent| {
            let offer = offer_ref
                .cast::<HtmlInputElement>()
                .and_then(|input| input.value().trim().parse::<i64>().ok())
                .unwrap_or(0);
            let ask = ask_ref
                .cast::<HtmlInputElement>()
                .and_then(|input| input.value().trim().parse::<i64>().ok())
                .unwrap_or(0);
            sync_runtime::propose_trade(Trade {
                player1_id: me.clone(),
                player2_id: target_id.clone(),
                player1_money: offer,
                player2_money: ask,
                properties: Vec::new(),
            });
            on_close.emit(());
        })
    };
    let on_cancel = {
        let on_close = props.on_close.clone();
        Callback::from(move |_event: MouseEvent| on_close.emit(()))
    };

    html! {
        <div class="trade-form">
            <h3>{ format!("Trade with {}", target_id) }</h3>
            <label>{ "You offer" }<input ref={offer_ref} type="number" value="0" /></label>
            <label>{ "You ask" }<input ref={ask_ref} type="number" value="0" /></label>
            <button onclick={on_submit}>{ "Propose" }</button>
            <button onclick={on_cancel}>{ "Cancel" }</button>
        </div>
    }
}
