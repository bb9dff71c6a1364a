//! Integration tests for `ChatClient` against a scripted WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parley::prelude::*;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

// =========================================================================
// Helpers
// =========================================================================

type ServerWs = WebSocketStream<TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

/// Binds a listener on a random port. The returned task resolves to the
/// server side of the first accepted connection.
async fn listen() -> (String, tokio::task::JoinHandle<ServerWs>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("local addr"));
    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("ws handshake")
    });
    (url, accept)
}

/// Connects a client and waits until it reports `Connected`.
async fn connect(name: &str) -> (ChatClient<WebSocketChannel>, ServerWs) {
    let (url, accept) = listen().await;
    let mut client = ChatClient::builder()
        .url(&url)
        .display_name(name)
        .connect()
        .expect("connect");
    let server = accept.await.expect("accept task");
    let update = next_update(&mut client).await;
    assert!(matches!(update, ClientUpdate::Connected), "got {update:?}");
    (client, server)
}

async fn next_update(client: &mut ChatClient<WebSocketChannel>) -> ClientUpdate {
    tokio::time::timeout(WAIT, client.next_event())
        .await
        .expect("timed out waiting for client update")
        .expect("client event stream ended")
}

async fn recv_json(server: &mut ServerWs) -> Value {
    loop {
        let msg = tokio::time::timeout(WAIT, server.next())
            .await
            .expect("timed out waiting for client frame")
            .expect("client went away")
            .expect("recv");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("client sent JSON");
        }
    }
}

async fn send_json(server: &mut ServerWs, value: Value) {
    server
        .send(WsMessage::Text(value.to_string().into()))
        .await
        .expect("send");
}

/// Registers as `u1` with `u2` ("Bob") online.
async fn registered(
    name: &str,
) -> (ChatClient<WebSocketChannel>, ServerWs) {
    let (mut client, mut server) = connect(name).await;
    assert_eq!(
        recv_json(&mut server).await,
        json!({"type": "register", "name": name})
    );
    send_json(&mut server, json!({"type": "registered", "user_id": "u1", "name": name})).await;
    next_update(&mut client).await;
    send_json(
        &mut server,
        json!({
            "type": "presence",
            "users": [{"id": "u1", "name": name}, {"id": "u2", "name": "Bob"}]
        }),
    )
    .await;
    next_update(&mut client).await;
    (client, server)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_register_and_presence() {
    let (client, _server) = registered("Ada").await;

    let snapshot = client.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.user_id, Some(UserId::new("u1")));
    assert_eq!(snapshot.display_name, "Ada");
    assert_eq!(snapshot.roster.as_slice(), &[RosterEntry::new("u2", "Bob")]);
    assert_eq!(client.channel_state(), ChannelState::Open);
}

#[tokio::test]
async fn test_full_conversation() {
    let (mut client, mut server) = registered("Ada").await;
    let bob = UserId::new("u2");

    client.start_chat(&bob).expect("start chat");
    assert_eq!(
        recv_json(&mut server).await,
        json!({"type": "start_chat", "target_id": "u2"})
    );
    send_json(&mut server, json!({"type": "chat_started", "pair": ["u1", "u2"]})).await;
    next_update(&mut client).await;
    assert_eq!(client.phase(), Phase::Paired);
    assert_eq!(client.peer(), Some(&bob));

    client.send_message("  hello Bob  ").expect("send");
    assert_eq!(
        recv_json(&mut server).await,
        json!({"type": "message", "to": "u2", "content": "hello Bob"})
    );

    // The server relays to both ends, so our own message comes back.
    send_json(
        &mut server,
        json!({"type": "message", "from": "u1", "content": "hello Bob"}),
    )
    .await;
    let echo = next_update(&mut client).await;
    assert!(matches!(
        echo,
        ClientUpdate::Applied { kind: "message", outcome: Outcome::Unchanged }
    ));

    send_json(
        &mut server,
        json!({"type": "message", "from": "u2", "content": "hi Ada"}),
    )
    .await;
    next_update(&mut client).await;
    assert_eq!(
        client.messages(),
        &[Message::new("u1", "hello Bob"), Message::new("u2", "hi Ada")]
    );

    client.end_chat().expect("end chat");
    assert_eq!(
        recv_json(&mut server).await,
        json!({"type": "end_chat", "target_id": "u2"})
    );
    assert_eq!(client.phase(), Phase::Idle);
    assert!(client.messages().is_empty());

    // The confirmation arrives after we already reset.
    send_json(&mut server, json!({"type": "chat_ended", "pair": ["u1", "u2"]})).await;
    let update = next_update(&mut client).await;
    assert!(matches!(
        update,
        ClientUpdate::Applied { kind: "chat_ended", outcome: Outcome::Unchanged }
    ));
}

#[tokio::test]
async fn test_peer_ends_chat() {
    let (mut client, mut server) = registered("Ada").await;
    send_json(&mut server, json!({"type": "chat_started", "pair": ["u2", "u1"]})).await;
    next_update(&mut client).await;
    send_json(
        &mut server,
        json!({"type": "message", "from": "u2", "content": "bye"}),
    )
    .await;
    next_update(&mut client).await;
    assert_eq!(client.messages().len(), 1);

    send_json(&mut server, json!({"type": "chat_ended"})).await;
    next_update(&mut client).await;

    assert_eq!(client.phase(), Phase::Idle);
    assert_eq!(client.peer(), None);
    assert!(client.messages().is_empty());
}

#[tokio::test]
async fn test_malformed_and_error_frames_do_not_change_state() {
    let (mut client, mut server) = registered("Ada").await;
    let before = client.snapshot();

    server
        .send(WsMessage::Text("not json".into()))
        .await
        .expect("send");
    let update = next_update(&mut client).await;
    assert!(matches!(update, ClientUpdate::Discarded(ProtocolError::Decode(_))));

    send_json(&mut server, json!({"type": "typing"})).await;
    let update = next_update(&mut client).await;
    assert!(matches!(
        update,
        ClientUpdate::Discarded(ProtocolError::UnknownType(ref t)) if t == "typing"
    ));

    send_json(&mut server, json!({"error": "invalid_json"})).await;
    let update = next_update(&mut client).await;
    assert!(matches!(
        update,
        ClientUpdate::Applied { kind: "error", outcome: Outcome::Unchanged }
    ));

    assert_eq!(client.snapshot(), before);
}

#[tokio::test]
async fn test_subscribers_see_roster_changes() {
    let (mut client, mut server) = registered("Ada").await;
    let mut rx = client.subscribe();
    rx.borrow_and_update();

    send_json(
        &mut server,
        json!({
            "type": "presence",
            "users": [
                {"id": "u1", "name": "Ada"},
                {"id": "u2", "name": "Bob"},
                {"id": "u3", "name": "Cy"}
            ]
        }),
    )
    .await;
    next_update(&mut client).await;

    assert!(rx.has_changed().expect("sender alive"));
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.roster.len(), 2);
    assert_eq!(snapshot.name_of(&UserId::new("u3")), Some("Cy"));
}

#[tokio::test]
async fn test_server_close_ends_session() {
    let (mut client, mut server) = registered("Ada").await;

    server
        .close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "shutting down".into(),
        }))
        .await
        .expect("close");

    let update = next_update(&mut client).await;
    assert!(
        matches!(
            update,
            ClientUpdate::Disconnected { reason: Some(ref r) } if r == "shutting down"
        ),
        "got {update:?}"
    );
    assert_eq!(client.phase(), Phase::Closed);
    assert!(client.roster().is_empty());
    assert_eq!(client.channel_state(), ChannelState::Closed);
    assert!(client.next_event().await.is_none());

    let err = client.send_message("anyone?").unwrap_err();
    assert!(matches!(err, ParleyError::Session(SessionError::Closed)));
}

#[tokio::test]
async fn test_local_close_reaches_server() {
    let (mut client, mut server) = registered("Ada").await;

    client.close();
    assert_eq!(client.phase(), Phase::Closed);

    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match server.next().await {
                Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server never saw the close");

    let update = next_update(&mut client).await;
    assert!(matches!(update, ClientUpdate::Disconnected { .. }));
    assert!(client.next_event().await.is_none());
}

#[tokio::test]
async fn test_connect_refused_reports_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("local addr"));
    drop(listener);

    let mut client = ChatClient::builder().url(&url).connect().expect("connect");
    let update = next_update(&mut client).await;

    assert!(matches!(update, ClientUpdate::Disconnected { reason: Some(_) }));
    assert_eq!(client.phase(), Phase::Closed);
    assert!(client.user_id().is_none());
}

#[tokio::test]
async fn test_full_send_queue_is_reported_as_backpressure() {
    let (url, accept) = listen().await;
    let mut client = ChatClient::builder()
        .url(&url)
        .display_name("Ada")
        .channel_config(ChannelConfig::default().with_outbound_capacity(1))
        .connect()
        .expect("connect");
    let mut server = accept.await.expect("accept task");
    next_update(&mut client).await;
    recv_json(&mut server).await;
    send_json(&mut server, json!({"type": "registered", "user_id": "u1"})).await;
    next_update(&mut client).await;
    send_json(&mut server, json!({"type": "chat_started", "pair": ["u1", "u2"]})).await;
    next_update(&mut client).await;

    // No await in between, so the writer task cannot drain the queue.
    client.send_message("one").expect("first send fits");
    let err = client.send_message("two").unwrap_err();
    assert!(matches!(err, ParleyError::Session(SessionError::Backpressure)));
    assert_eq!(client.messages(), &[Message::new("u1", "one")]);

    assert_eq!(
        recv_json(&mut server).await,
        json!({"type": "message", "to": "u2", "content": "one"})
    );
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let result = ChatClient::builder().url("not a url").connect();
    assert!(matches!(
        result,
        Err(ParleyError::Transport(TransportError::InvalidUrl(_)))
    ));
}

#[tokio::test]
async fn test_requested_user_id_is_sent() {
    let (url, accept) = listen().await;
    let mut client = ChatClient::builder()
        .url(&url)
        .display_name("Ada")
        .requested_user_id("u-previous")
        .connect()
        .expect("connect");
    let mut server = accept.await.expect("accept task");
    next_update(&mut client).await;

    assert_eq!(
        recv_json(&mut server).await,
        json!({"type": "register", "name": "Ada", "user_id": "u-previous"})
    );
}
