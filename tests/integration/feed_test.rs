//! Integration tests for the market data feed

use futures_util::{SinkExt, StreamExt};
use perp_feed::feed::{
    ConnectionStatus, FeedClient, FeedMode, FeedSettings, FeedSnapshot, SyntheticMarkets,
};
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

const TICKER: &str = r#"{"stream":"btcusdt@ticker","data":{"e":"24hrTicker","E":1704067200000,"s":"BTCUSDT","p":"150.00","P":"0.348","c":"43250.00","o":"43100.00","h":"43800.00","l":"42900.00","v":"15234.567","n":125678}}"#;
const MARK: &str = r#"{"stream":"btcusdt@markPrice@1s","data":{"e":"markPriceUpdate","E":1704067201000,"s":"BTCUSDT","p":"43251.10","i":"43249.80","r":"0.00010000","T":1704096000000}}"#;

fn fast_settings(url: String) -> FeedSettings {
    FeedSettings {
        initial_reconnect_delay: Duration::from_millis(20),
        max_reconnect_delay: Duration::from_millis(100),
        ..FeedSettings::live(url)
    }
}

async fn wait_for<F>(rx: &mut watch::Receiver<FeedSnapshot>, pred: F) -> FeedSnapshot
where
    F: Fn(&FeedSnapshot) -> bool,
{
    let result = tokio::time::timeout(Duration::from_secs(10), rx.wait_for(|s| pred(s)))
        .await
        .expect("timed out waiting for snapshot");
    let snapshot = result.expect("feed stopped").clone();
    snapshot
}

#[tokio::test]
async fn test_live_feed_against_local_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let (close_tx, close_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(Message::Text(TICKER.to_string())).await.unwrap();
        ws.send(Message::Text(MARK.to_string())).await.unwrap();

        while let Some(Ok(message)) = ws.next().await {
            if let Message::Close(frame) = message {
                let _ = close_tx.send(frame.map(|f| f.code));
                break;
            }
        }
    });

    let client = FeedClient::new(fast_settings(url), SyntheticMarkets::new(Duration::from_secs(30)));
    let handle = client.subscribe("btcusdt", &[]);
    assert_eq!(handle.symbol(), "BTCUSDT");
    let mut rx = handle.updates();

    let snapshot = wait_for(&mut rx, |s| s.updates == 2).await;
    assert!(snapshot.is_connected());
    assert_eq!(snapshot.connection.mode, FeedMode::Live);
    assert_eq!(snapshot.last_price(), Some(dec!(43250.00)));
    assert_eq!(snapshot.price_change(), Some(dec!(150.00)));
    assert_eq!(snapshot.mark_price(), Some(dec!(43251.10)));
    assert_eq!(snapshot.funding_rate(), Some(dec!(0.0001)));

    handle.shutdown().await;

    let code = tokio::time::timeout(Duration::from_secs(5), close_rx)
        .await
        .expect("server never saw a close frame")
        .unwrap();
    assert_eq!(code, Some(CloseCode::Normal));
}

#[tokio::test]
async fn test_server_close_triggers_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        // First session: the server hangs up cleanly right away
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let _ = ws
            .close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "maintenance".into(),
            }))
            .await;
        while ws.next().await.is_some() {}

        // Second session serves data and stays open
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(Message::Text(TICKER.to_string())).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let client = FeedClient::new(fast_settings(url), SyntheticMarkets::new(Duration::from_secs(30)));
    let handle = client.subscribe("BTCUSDT", &[]);
    let mut rx = handle.updates();

    let snapshot = wait_for(&mut rx, |s| s.updates == 1).await;
    assert!(snapshot.is_connected());
    assert_eq!(snapshot.last_price(), Some(dec!(43250.00)));
    assert_eq!(snapshot.connection.reconnect_attempts, 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_server_gives_up() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let settings = FeedSettings {
        max_reconnect_attempts: 2,
        initial_reconnect_delay: Duration::from_millis(10),
        max_reconnect_delay: Duration::from_millis(20),
        ..FeedSettings::live(url)
    };
    let client = FeedClient::new(settings, SyntheticMarkets::new(Duration::from_secs(30)));
    let handle = client.subscribe("BTCUSDT", &[]);
    let mut rx = handle.updates();

    let snapshot = wait_for(&mut rx, |s| s.connection.status == ConnectionStatus::Failed).await;
    assert_eq!(snapshot.connection.reconnect_attempts, 2);
    assert!(snapshot.last_price().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_synthetic_clients_share_one_market() {
    let markets = SyntheticMarkets::seeded(Duration::from_secs(30), 42);
    let first = FeedClient::new(FeedSettings::synthetic(), markets.clone());
    let second = FeedClient::new(FeedSettings::synthetic(), markets);

    let a = first.subscribe("BTCUSDT", &[]);
    let b = second.subscribe("BTCUSDT", &[]);
    let mut a_rx = a.updates();
    let mut b_rx = b.updates();

    for _ in 0..3 {
        a_rx.changed().await.unwrap();
        b_rx.changed().await.unwrap();
        let a_snap = a_rx.borrow_and_update().clone();
        let b_snap = b_rx.borrow_and_update().clone();
        assert!(a_snap.is_connected());
        assert_eq!(a_snap.ticker, b_snap.ticker);
        assert_eq!(a_snap.mark_price, b_snap.mark_price);
    }

    a.shutdown().await;
    b.shutdown().await;
}
