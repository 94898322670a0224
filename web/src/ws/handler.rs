use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use domain::Id;
use futures::{sink::SinkExt, stream::StreamExt};
use log::*;
use realtime::message::ClientFrame;
use realtime::{LiveConnection, Manager};
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const MIN_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Per-channel limits taken from the config at upgrade time.
#[derive(Clone, Copy, Debug)]
struct ChannelSettings {
    outbound_buffer: usize,
    write_timeout: Duration,
    require_session: bool,
}

impl ChannelSettings {
    // Zero buffer or zero timeout would close every channel on its first frame
    fn from_config(config: &Config) -> Self {
        Self {
            outbound_buffer: config.ws_outbound_buffer.max(1),
            write_timeout: config.ws_write_timeout().max(MIN_WRITE_TIMEOUT),
            require_session: config.ws_require_session,
        }
    }
}

/// Upgrades to a live channel. The channel starts anonymous and is tied to a
/// user only by a `login` frame.
pub(crate) async fn ws_handler(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ws: WebSocketUpgrade,
) -> Response {
    let config = app_state.config();
    let settings = ChannelSettings::from_config(config);

    // Owner of the session cookie presented at upgrade, if it is still valid
    let session_user = jar
        .get(&config.session_cookie_name)
        .and_then(|cookie| app_state.sessions().get(cookie.value()))
        .map(|session| session.user_id);

    let live = Arc::clone(&app_state.live);
    ws.on_upgrade(move |socket| handle_socket(socket, live, settings, session_user))
}

async fn handle_socket(
    socket: WebSocket,
    live: Arc<Manager>,
    settings: ChannelSettings,
    session_user: Option<Id>,
) {
    let (tx, mut rx) = mpsc::channel::<String>(settings.outbound_buffer);
    let connection = live.connect(tx);
    let connection_id = connection.id().as_str().to_owned();
    info!("Live connection {connection_id} opened");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Task to push queued frames to the socket
    let writer_id = connection_id.clone();
    let writer = async move {
        while let Some(frame) = rx.recv().await {
            match tokio::time::timeout(
                settings.write_timeout,
                ws_sender.send(Message::Text(frame.into())),
            )
            .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("Write to live connection {writer_id} failed: {e}");
                    break;
                }
                Err(_) => {
                    warn!(
                        "Write to live connection {writer_id} timed out after {:?}, closing",
                        settings.write_timeout
                    );
                    break;
                }
            }
        }
        if let Err(e) = ws_sender.close().await {
            trace!("Closing live connection {writer_id}: {e}");
        }
    };

    // Frames from one client are handled strictly one after another
    let reader = async {
        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    handle_frame(&connection, text.as_str(), &settings, session_user)
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Read from live connection {connection_id} failed: {e}");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    drop(connection);
    info!("Live connection {connection_id} closed");
}

fn handle_frame(
    connection: &LiveConnection,
    text: &str,
    settings: &ChannelSettings,
    session_user: Option<Id>,
) {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Login { user_id }) => {
            if settings.require_session && session_user != Some(user_id) {
                warn!(
                    "Live connection {} tried to log in as {user_id} without that user's session",
                    connection.id().as_str()
                );
                return;
            }
            connection.login(user_id);
        }
        Ok(ClientFrame::Logout) => connection.logout(),
        Err(e) => debug!(
            "Ignoring frame on live connection {}: {e}",
            connection.id().as_str()
        ),
    }
}
