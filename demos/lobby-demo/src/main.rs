use std::time::Duration;

use anteroom::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;

type Lobby = LobbyService<ChannelNotifier, PlaceholderProfiles>;
type Events = UnboundedReceiver<Notification>;
type DemoResult<T> = Result<T, Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

/// Turns an error response into an `Err` so scenarios can use `?`.
fn accepted(response: LobbyResponse) -> DemoResult<LobbyResponse> {
    match response {
        LobbyResponse::Error { code, message } => Err(format!("{code:?}: {message}").into()),
        other => Ok(other),
    }
}

fn request(lobby: &Lobby, player: u64, req: LobbyRequest) -> DemoResult<LobbyResponse> {
    accepted(lobby.handle(PlayerId(player), req))
}

/// Logs everything the notifier has queued and returns the tokens that were
/// handed out, keyed by recipient.
fn deliver(events: &mut Events) -> Vec<(PlayerId, String)> {
    let mut tokens = Vec::new();
    while let Ok(Notification { recipients, event }) = events.try_recv() {
        tracing::info!(?recipients, ?event, "deliver");
        if let LobbyEvent::GameStarting { token, .. } = event {
            tokens.extend(recipients.into_iter().map(|p| (p, token.clone())));
        }
    }
    tokens
}

fn token_of(tokens: &[(PlayerId, String)], player: u64) -> DemoResult<String> {
    tokens
        .iter()
        .find(|(p, _)| *p == PlayerId(player))
        .map(|(_, t)| t.clone())
        .ok_or_else(|| format!("no token sent to player {player}").into())
}

/// Owner 1 opens a room, players 2 and 3 join.
fn open_room(lobby: &Lobby, events: &mut Events, name: &str) -> DemoResult<RoomId> {
    let LobbyResponse::RoomCreated { room } = request(
        lobby,
        1,
        LobbyRequest::CreateRoom {
            name: name.into(),
            options: RoomOptions::default(),
        },
    )?
    else {
        return Err("expected RoomCreated".into());
    };
    for player in [2, 3] {
        request(lobby, player, LobbyRequest::JoinRoom { room_id: room.id })?;
    }
    deliver(events);
    Ok(room.id)
}

fn status(lobby: &Lobby, room_id: RoomId) -> DemoResult<RoomStatus> {
    match request(lobby, 1, LobbyRequest::RoomInfo { room_id })? {
        LobbyResponse::RoomInfo { room } => Ok(room.status),
        other => Err(format!("expected RoomInfo, got {other:?}").into()),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Everyone confirms: the room ends up `InProgress`.
fn everyone_ready(lobby: &Lobby, events: &mut Events) -> DemoResult<RoomStatus> {
    let room_id = open_room(lobby, events, "everyone ready")?;

    request(lobby, 1, LobbyRequest::StartGame)?;
    let tokens = deliver(events);

    request(lobby, 2, LobbyRequest::PlayerReady { token: token_of(&tokens, 2)? })?;
    let midway = status(lobby, room_id)?;
    tracing::info!(status = %midway, "after first confirmation");
    request(lobby, 3, LobbyRequest::PlayerReady { token: token_of(&tokens, 3)? })?;
    deliver(events);

    status(lobby, room_id)
}

/// Only player 2 confirms: the start times out, and the next attempt hands
/// player 2 a different token.
async fn ready_timeout(lobby: &Lobby, events: &mut Events, wait: Duration) -> DemoResult<(RoomStatus, bool)> {
    let room_id = open_room(lobby, events, "ready timeout")?;

    request(lobby, 1, LobbyRequest::StartGame)?;
    let first = token_of(&deliver(events), 2)?;
    request(lobby, 2, LobbyRequest::PlayerReady { token: first.clone() })?;
    deliver(events);

    tokio::time::sleep(wait).await;
    let after_timeout = status(lobby, room_id)?;

    request(lobby, 1, LobbyRequest::StartGame)?;
    let second = token_of(&deliver(events), 2)?;
    request(lobby, 1, LobbyRequest::CancelStart)?;
    deliver(events);

    Ok((after_timeout, first != second))
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn init_tracing(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> DemoResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => LobbyConfig::load(path)?,
        None => LobbyConfig::default(),
    };
    init_tracing(&config.logging.filter);

    // Both scenarios need room for an owner and two members.
    let rooms = RoomConfig {
        max_players: config.rooms.max_players.max(3),
        ..config.room_config()
    };

    let (notifier, mut events) = ChannelNotifier::new();
    let lobby = LobbyService::builder()
        .room_config(rooms.clone())
        .build(notifier, PlaceholderProfiles);
    let status = everyone_ready(&lobby, &mut events)?;
    tracing::info!(%status, "scenario finished: everyone ready");

    let timeout = Duration::from_millis(100);
    let (notifier, mut events) = ChannelNotifier::new();
    let lobby = LobbyService::builder()
        .room_config(RoomConfig {
            ready_timeout: timeout,
            ..rooms
        })
        .build(notifier, PlaceholderProfiles);
    let (status, rotated) = ready_timeout(&lobby, &mut events, timeout * 2).await?;
    tracing::info!(%status, token_rotated = rotated, "scenario finished: ready timeout");

    Ok(())
}
