//! Drives the `/ws` endpoint over real sockets.

use anyhow::{anyhow, Result};
use events::EventPublisher;
use futures::{SinkExt, StreamExt};
use realtime::Manager;
use serde_json::{json, Value};
use service::config::Config;
use session::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;
use web::AppState;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(live: Arc<Manager>) -> Result<String> {
    let db = Arc::new(sea_orm::DatabaseConnection::Disconnected);
    let sessions = Arc::new(SessionStore::new(chrono::Duration::hours(2)));
    let app_state = AppState::new(
        service::AppState::new(Config::from_env(), &db, &sessions),
        &live,
        &Arc::new(EventPublisher::new()),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, web::router::define_routes(app_state)).await;
    });

    Ok(format!("ws://{address}/ws"))
}

async fn connect_as(url: &str, user_id: Uuid) -> Result<Client> {
    let (mut client, _) = connect_async(url).await?;
    let login = json!({"type": "login", "data": {"userID": user_id}});
    client.send(Message::text(login.to_string())).await?;
    Ok(client)
}

async fn wait_until_online(live: &Manager, users: &[Uuid]) -> Result<()> {
    for _ in 0..100 {
        if users.iter().all(|user| live.registry().is_online(user)) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Err(anyhow!("users never came online"))
}

/// Next event of `event_type`, skipping any other frames, or `None` if nothing
/// matching arrives within `wait`.
async fn next_event(client: &mut Client, event_type: &str, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, client.next()).await.ok()??;
        if let Ok(Message::Text(text)) = frame {
            let event: Value = serde_json::from_str(text.as_str()).ok()?;
            if event["type"] == event_type {
                return Some(event);
            }
        }
    }
}

#[tokio::test]
async fn direct_message_reaches_only_the_receiver() -> Result<()> {
    let live = Arc::new(Manager::new().with_sender_echo(false));
    let url = serve(Arc::clone(&live)).await?;

    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let mut alice_ws = connect_as(&url, alice).await?;
    let mut bob_ws = connect_as(&url, bob).await?;
    let mut carol_ws = connect_as(&url, carol).await?;
    wait_until_online(&live, &[alice, bob, carol]).await?;

    let delivered = live.broadcast_message(json!({"content": "hi bob"}), alice, bob);
    assert_eq!(delivered, 1);

    let event = next_event(&mut bob_ws, "message", Duration::from_secs(2))
        .await
        .ok_or_else(|| anyhow!("bob got no message"))?;
    assert_eq!(event["message"]["content"], "hi bob");

    let quiet = Duration::from_millis(200);
    assert!(next_event(&mut alice_ws, "message", quiet).await.is_none());
    assert!(next_event(&mut carol_ws, "message", quiet).await.is_none());
    Ok(())
}

#[tokio::test]
async fn presence_changes_reach_other_users() -> Result<()> {
    let live = Arc::new(Manager::new());
    let url = serve(Arc::clone(&live)).await?;

    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let mut bob_ws = connect_as(&url, bob).await?;
    wait_until_online(&live, &[bob]).await?;

    let alice_ws = connect_as(&url, alice).await?;
    let online = next_event(&mut bob_ws, "status", Duration::from_secs(2))
        .await
        .ok_or_else(|| anyhow!("no online status"))?;
    assert_eq!(online["userID"], alice.to_string());
    assert_eq!(online["online"], true);

    drop(alice_ws);
    let offline = next_event(&mut bob_ws, "status", Duration::from_secs(2))
        .await
        .ok_or_else(|| anyhow!("no offline status"))?;
    assert_eq!(offline["userID"], alice.to_string());
    assert_eq!(offline["online"], false);
    Ok(())
}

#[tokio::test]
async fn new_posts_reach_anonymous_channels() -> Result<()> {
    let live = Arc::new(Manager::new());
    let url = serve(Arc::clone(&live)).await?;

    let (mut anonymous_ws, _) = connect_async(&url).await?;
    for _ in 0..100 {
        if !live.registry().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(live.broadcast_new_post(json!({"title": "Hello"})), 1);
    let event = next_event(&mut anonymous_ws, "post", Duration::from_secs(2))
        .await
        .ok_or_else(|| anyhow!("no post event"))?;
    assert_eq!(event["post"]["title"], "Hello");
    Ok(())
}
