use std::collections::HashMap;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Serialize;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use lastspike_core::codec::{decode, encode};
use lastspike_core::plan::{plan, PhaseKind, SequencerConfig};
use lastspike_core::protocol::{ClientMsg, NotifyMsg};
use lastspike_core::session::SessionId;
use lastspike_core::{diff, CommitCue, GameSnapshot, PlayerId, PlayerProfile, SessionData};

const POLL_BASE_MS: u64 = 2_000;
const POLL_JITTER_MS: u64 = 500;
const KEEPALIVE_SECS: u64 = 30;

#[derive(Parser)]
#[command(name = "lastspike-cli", version, about = "Lobby tools and a headless watcher for lastspike sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Follows a running game: re-fetches on every notify frame and prints
    /// the classified changes and the animation plan a client would run.
    Watch {
        #[arg(long, env = "LASTSPIKE_API_BASE", default_value = "http://localhost:5098")]
        api_base: String,
        #[arg(long, env = "LASTSPIKE_WS_BASE")]
        ws_base: Option<String>,
        #[arg(long)]
        session: String,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    Create {
        #[arg(long, env = "LASTSPIKE_API_BASE", default_value = "http://localhost:5098")]
        api_base: String,
        #[arg(long)]
        name: String,
    },
    Join {
        #[arg(long, env = "LASTSPIKE_API_BASE", default_value = "http://localhost:5098")]
        api_base: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        name: String,
    },
    Start {
        #[arg(long, env = "LASTSPIKE_API_BASE", default_value = "http://localhost:5098")]
        api_base: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        player: String,
    },
}

#[derive(Serialize)]
struct CreatePlayerBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody<'a> {
    player_ids: [&'a str; 1],
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sessions { command } => match command {
            SessionCommand::Create { api_base, name } => {
                let client = reqwest::Client::new();
                let player = create_player(&client, &api_base, &name).await?;
                let session: SessionData = client
                    .post(format!("{}/api/Sessions", api_base.trim_end_matches('/')))
                    .json(&CreateSessionBody {
                        player_ids: [player.id.as_str()],
                    })
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                println!("player_id: {}", player.id);
                println!("session_id: {}", session.id);
            }
            SessionCommand::Join {
                api_base,
                session,
                name,
            } => {
                let session = SessionId::parse(&session)?;
                let client = reqwest::Client::new();
                let player = create_player(&client, &api_base, &name).await?;
                client
                    .post(format!(
                        "{}/api/Sessions/{session}/players/{}",
                        api_base.trim_end_matches('/'),
                        player.id
                    ))
                    .send()
                    .await?
                    .error_for_status()?;
                println!("player_id: {}", player.id);
                println!("joined: {session}");
            }
            SessionCommand::Start {
                api_base,
                session,
                player,
            } => {
                let session = SessionId::parse(&session)?;
                let client = reqwest::Client::new();
                client
                    .put(format!(
                        "{}/api/Sessions/{session}/start_game?playerId={player}",
                        api_base.trim_end_matches('/')
                    ))
                    .send()
                    .await?
                    .error_for_status()?;
                println!("started: {session}");
            }
        },
        Commands::Watch {
            api_base,
            ws_base,
            session,
        } => {
            let session = SessionId::parse(&session)?;
            watch(&api_base, ws_base.as_deref(), &session).await?;
        }
    }

    Ok(())
}

async fn create_player(
    client: &reqwest::Client,
    api_base: &str,
    name: &str,
) -> Result<PlayerProfile, reqwest::Error> {
    client
        .post(format!("{}/api/Players", api_base.trim_end_matches('/')))
        .json(&CreatePlayerBody { name })
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

async fn fetch_snapshot(
    client: &reqwest::Client,
    api_base: &str,
    session: &SessionId,
) -> Result<GameSnapshot, reqwest::Error> {
    client
        .get(format!(
            "{}/api/Sessions/{session}/game_state",
            api_base.trim_end_matches('/')
        ))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

fn build_notify_url(ws_base: &str, session: &SessionId) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(ws_base)?;
    let base_path = url.path().trim_end_matches('/');
    let path = format!("{base_path}/{session}");
    url.set_path(&path);
    Ok(url)
}

fn poll_delay() -> Duration {
    let jitter = rand::rng().random_range(0..POLL_JITTER_MS);
    Duration::from_millis(POLL_BASE_MS + jitter)
}

fn display_name<'a>(names: &'a HashMap<String, String>, id: &'a PlayerId) -> &'a str {
    names
        .get(id.as_str())
        .map(String::as_str)
        .unwrap_or(id.as_str())
}

/// Runs the same diff/plan core as the browser client, but commits
/// immediately and prints what the client would animate.
fn report_changes(rendered: &GameSnapshot, next: &GameSnapshot, names: &HashMap<String, String>) {
    let changes = diff(rendered, next);
    if changes.is_empty() {
        return;
    }
    let phases = plan(&changes, &SequencerConfig::default());
    for phase in &phases {
        match &phase.kind {
            PhaseKind::DiceReveal { dice1, dice2 } => {
                println!("roll: {dice1} + {dice2} (reveal {}ms)", phase.duration_ms);
            }
            PhaseKind::TokenMove(paths) => {
                for path in paths {
                    println!(
                        "move: {} {} -> {} ({} steps)",
                        display_name(names, &path.player),
                        path.from,
                        path.to,
                        path.steps()
                    );
                }
                println!("move phase: {}ms", phase.duration_ms);
            }
            PhaseKind::Commit(cues) => {
                for cue in cues {
                    match cue {
                        CommitCue::TrackChange(delta) => println!(
                            "track: {} - {} {} -> {}",
                            delta.pair.first().name(),
                            delta.pair.second().name(),
                            delta.from,
                            delta.to
                        ),
                        CommitCue::MoneyChange { player, delta } => {
                            println!("money: {} {delta:+}", display_name(names, player))
                        }
                        CommitCue::TradeEvent(event) => println!("trade: {event:?}"),
                        CommitCue::PlayerRemoved(player) => {
                            println!("left: {}", display_name(names, player))
                        }
                        CommitCue::GameOver => println!("game over"),
                    }
                }
            }
        }
    }
    if !next.valid_actions.is_empty() {
        let labels: Vec<&str> = next
            .valid_actions
            .iter()
            .map(|action| action.label())
            .collect();
        println!(
            "turn: {} [{}] actions: {}",
            display_name(names, &next.current_player_id),
            phase_name(next),
            labels.join(", ")
        );
    }
}

fn phase_name(snapshot: &GameSnapshot) -> &'static str {
    use lastspike_core::TurnPhase;
    match snapshot.turn_phase {
        TurnPhase::Start => "start",
        TurnPhase::SpaceOption => "space option",
        TurnPhase::RouteSelect => "route select",
        TurnPhase::End => "end",
    }
}

async fn watch(
    api_base: &str,
    ws_base: Option<&str>,
    session: &SessionId,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let mut rendered = GameSnapshot::empty();
    let mut names: HashMap<String, String> = HashMap::new();

    match fetch_snapshot(&client, api_base, session).await {
        Ok(snapshot) => {
            println!("watching {session} ({} players)", snapshot.players.len());
            rendered = snapshot;
        }
        Err(err) => eprintln!("initial fetch failed: {err}"),
    }
    refresh_names(&client, api_base, session, &mut names).await;

    let mut socket = match ws_base {
        Some(base) => {
            let url = build_notify_url(base, session)?;
            match tokio_tungstenite::connect_async(url.as_str()).await {
                Ok((ws, _response)) => {
                    println!("notify channel connected: {url}");
                    Some(ws)
                }
                Err(err) => {
                    eprintln!("notify connect failed, polling only: {err}");
                    None
                }
            }
        }
        None => None,
    };

    if let Some(ws) = socket.as_mut() {
        if let Some(payload) = encode(&ClientMsg::Subscribe {
            session_id: session.to_string(),
        }) {
            ws.send(Message::Binary(payload.into())).await?;
        }
    }

    let mut keepalive = tokio::time::interval(Duration::from_secs(KEEPALIVE_SECS));
    let mut nonce: u64 = 0;

    loop {
        let poll = tokio::time::sleep(poll_delay());
        tokio::pin!(poll);

        // The notify future holds the socket borrow, so the select arms only
        // classify the wakeup; all socket handling happens after it resolves.
        let wake = {
            let notify = async {
                match socket.as_mut() {
                    Some(ws) => ws.next().await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = &mut poll => Wake::Poll,
                _ = keepalive.tick() => Wake::Keepalive,
                message = notify => match message {
                    Some(Ok(Message::Binary(bytes))) => match decode::<NotifyMsg>(&bytes) {
                        Some(msg) => Wake::Notify(msg),
                        None => Wake::Skip,
                    },
                    Some(Ok(Message::Close(frame))) => {
                        eprintln!("notify channel closed: {frame:?}; polling only");
                        Wake::ChannelDown
                    }
                    Some(Ok(_)) => Wake::Skip,
                    Some(Err(err)) => {
                        eprintln!("notify channel error: {err}; polling only");
                        Wake::ChannelDown
                    }
                    None => Wake::ChannelDown,
                },
            }
        };

        match wake {
            Wake::Skip => continue,
            Wake::ChannelDown => {
                socket = None;
                continue;
            }
            Wake::Keepalive => {
                if let Some(ws) = socket.as_mut() {
                    nonce = nonce.wrapping_add(1);
                    if let Some(payload) = encode(&ClientMsg::Ping { nonce: Some(nonce) }) {
                        let _ = ws.send(Message::Binary(payload.into())).await;
                    }
                }
                continue;
            }
            Wake::Notify(NotifyMsg::SessionClosed) => {
                println!("session closed");
                return Ok(());
            }
            Wake::Notify(NotifyMsg::PlayerJoined { player_id }) => {
                println!("joined: {player_id}");
                refresh_names(&client, api_base, session, &mut names).await;
            }
            Wake::Notify(_) | Wake::Poll => {}
        }

        match fetch_snapshot(&client, api_base, session).await {
            Ok(next) => {
                report_changes(&rendered, &next, &names);
                rendered = next;
            }
            Err(err) => eprintln!("fetch failed: {err}"),
        }
    }
}

enum Wake {
    Poll,
    Keepalive,
    Notify(NotifyMsg),
    ChannelDown,
    Skip,
}

async fn refresh_names(
    client: &reqwest::Client,
    api_base: &str,
    session: &SessionId,
    names: &mut HashMap<String, String>,
) {
    let url = format!(
        "{}/api/Sessions/{session}",
        api_base.trim_end_matches('/')
    );
    let Ok(response) = client.get(url).send().await else {
        return;
    };
    let Ok(data) = response.json::<SessionData>().await else {
        return;
    };
    for player_id in &data.player_ids {
        if names.contains_key(player_id) {
            continue;
        }
        let url = format!(
            "{}/api/Players/{player_id}",
            api_base.trim_end_matches('/')
        );
        let Ok(response) = client.get(url).send().await else {
            continue;
        };
        if let Ok(profile) = response.json::<PlayerProfile>().await {
            if let Some(name) = profile.name {
                names.insert(player_id.clone(), name);
            }
        }
    }
}
