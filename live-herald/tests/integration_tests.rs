//! End-to-end: real detector, JSON store and Telegram channel against local
//! stand-ins for the streaming site and the Bot API.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use live_herald::Herald;
use live_herald::monitor::{TransitionEvent, WatcherState};
use live_herald::notification::{MessageTemplates, TelegramChannel, TelegramConfig};
use live_herald::subscribers::{JsonFileStore, SubscriberId, SubscriberStore};
use live_probe::{DetectorConfig, LiveDetector, LiveState, RoomIdCache, client};

const BLOCKED_CHAT: i64 = 3;

#[derive(Default)]
struct FakeSite {
    /// Status codes answered in order; the last one repeats.
    statuses: Mutex<VecDeque<u8>>,
    status_queries: Mutex<Vec<String>>,
}

#[derive(Default)]
struct FakeBotApi {
    sent: Mutex<Vec<(i64, String)>>,
}

async fn live_page() -> &'static str {
    r#"<html><script id="SIGI_STATE">{"LiveRoom":{"roomId":"777"}}</script></html>"#
}

async fn room_status(
    State(site): State<Arc<FakeSite>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    site.status_queries
        .lock()
        .push(params.get("roomID").cloned().unwrap_or_default());
    let mut statuses = site.statuses.lock();
    let status = if statuses.len() > 1 {
        statuses.pop_front().unwrap_or(4)
    } else {
        statuses.front().copied().unwrap_or(4)
    };
    Json(json!({"LiveRoomInfo": {"status": status}}))
}

async fn send_message(
    State(api): State<Arc<FakeBotApi>>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let chat_id = payload["chat_id"].as_i64().unwrap_or_default();
    let text = payload["text"].as_str().unwrap_or_default().to_string();
    api.sent.lock().push((chat_id, text));

    if chat_id == BLOCKED_CHAT {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })),
        );
    }
    (StatusCode::OK, Json(json!({"ok": true, "result": {}})))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

struct Harness {
    herald: Herald,
    site: Arc<FakeSite>,
    bot: Arc<FakeBotApi>,
    store_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

async fn harness(statuses: &[u8]) -> Harness {
    let site = Arc::new(FakeSite {
        statuses: Mutex::new(statuses.iter().copied().collect()),
        ..Default::default()
    });
    let site_addr = serve(
        Router::new()
            .route("/@ana/live", get(live_page))
            .route("/api/live/detail/", get(room_status))
            .with_state(site.clone()),
    )
    .await;

    let bot = Arc::new(FakeBotApi::default());
    let bot_addr = serve(
        Router::new()
            .route("/botTEST/sendMessage", post(send_message))
            .with_state(bot.clone()),
    )
    .await;

    let target_url = format!("http://{site_addr}/@ana/live");
    let mut detector_config = DetectorConfig::new(&target_url);
    detector_config.status.endpoint =
        format!("http://{site_addr}/api/live/detail/?aid=1988&roomID={{room_id}}");
    let detector = LiveDetector::with_client(
        client::build_client(Duration::from_secs(5)).unwrap(),
        detector_config,
        Arc::new(RoomIdCache::new()),
    )
    .unwrap();

    let channel = TelegramChannel::new(TelegramConfig {
        api_base: format!("http://{bot_addr}"),
        ..TelegramConfig::new("TEST")
    })
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("subscribers.json");

    let herald = Herald::new(
        Arc::new(JsonFileStore::new(&store_path)),
        Arc::new(detector),
        Arc::new(channel),
        MessageTemplates::new("Ana", target_url),
    )
    .with_send_delay(Duration::ZERO);

    Harness {
        herald,
        site,
        bot,
        store_path,
        _dir: dir,
    }
}

#[tokio::test]
async fn transitions_reach_subscribers_and_blocked_chats_are_pruned() {
    // priming read: ended, then live twice, then ended
    let h = harness(&[4, 2, 2, 4]).await;
    for id in [1, 2, BLOCKED_CHAT] {
        assert!(h.herald.subscribe(SubscriberId(id)).await.unwrap());
    }

    let mut watcher = h.herald.watcher();
    watcher.prime().await;
    assert_eq!(watcher.state(), WatcherState::NotLive);
    assert!(h.bot.sent.lock().is_empty());

    assert_eq!(watcher.tick().await, Some(TransitionEvent::Started));
    assert_eq!(watcher.tick().await, None);
    assert_eq!(watcher.tick().await, Some(TransitionEvent::Ended));

    let sent = h.bot.sent.lock().clone();
    let started: Vec<i64> = sent
        .iter()
        .filter(|(_, text)| text.contains("is live on TikTok now!"))
        .map(|(id, _)| *id)
        .collect();
    let ended: Vec<i64> = sent
        .iter()
        .filter(|(_, text)| text.contains("live has ended"))
        .map(|(id, _)| *id)
        .collect();

    assert_eq!(started, vec![1, 2, BLOCKED_CHAT]);
    assert_eq!(ended, vec![1, 2]);

    assert_eq!(std::fs::read_to_string(&h.store_path).unwrap(), "[1,2]");
    assert!(h.site.status_queries.lock().iter().all(|id| id == "777"));
}

#[tokio::test]
async fn admin_broadcast_and_status_query() {
    let h = harness(&[2]).await;
    h.herald.subscribe(SubscriberId(10)).await.unwrap();
    h.herald.subscribe(SubscriberId(BLOCKED_CHAT)).await.unwrap();

    let read = h.herald.query().await;
    assert_eq!(read.state, LiveState::Live);
    assert_eq!(read.room_id.as_deref(), Some("777"));
    assert!(h.herald.status_text().await.contains("is live right now"));

    assert_eq!(h.herald.broadcast("Stream moved to 9pm").await, 1);
    assert_eq!(
        h.herald.subscribers().await.unwrap(),
        vec![SubscriberId(10)]
    );
}

#[tokio::test]
async fn store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscribers.json");

    {
        let store = JsonFileStore::new(&path);
        store.add(SubscriberId(-100987)).await.unwrap();
        store.add(SubscriberId(12345)).await.unwrap();
        store.remove(SubscriberId(12345)).await.unwrap();
    }

    let store = JsonFileStore::new(&path);
    let ids = store.list().await.unwrap();
    assert_eq!(ids.len(), 1);
    assert!(ids.contains(&SubscriberId(-100987)));
}
