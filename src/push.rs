//! Live channel: a Socket.IO subscription (Engine.IO v4 over a websocket)
//! delivering `parking_status_update` events.

use crate::state::Update;
use crate::types::PushUpdate;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::time::delay_for;
use tungstenite::Message;
use url::Url;

pub const PARKING_STATUS_EVENT: &str = "parking_status_update";

#[derive(Debug, PartialEq)]
pub enum Packet {
    Open(Value),
    Close,
    Ping,
    Connected,
    Disconnected,
    Event { name: String, data: Value },
    Ignored(String),
}

#[derive(Debug, PartialEq)]
enum Disconnect {
    Dropped,
    ViewClosed,
}

pub fn live_url(host: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "ws://{}/socket.io/?EIO=4&transport=websocket",
        host
    ))
}

/// Keeps a live subscription open, reconnecting after `reconnect` whenever
/// it drops. Returns once the view stops accepting updates.
pub async fn run(url: Url, reconnect: Duration, tx: Sender<Update>) {
    loop {
        match tokio_tungstenite::connect_async(&url).await {
            Ok(connection) => {
                if handle_connection(connection.0, tx.clone()).await == Disconnect::ViewClosed {
                    info!("View closed; leaving live channel");
                    return;
                }
            }
            Err(e) => error!("Error connecting to live channel: {}", e),
        }
        info!("Waiting {:?} and reconnecting to live channel...", reconnect);
        delay_for(reconnect).await;
    }
}

async fn handle_connection(
    connection: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    mut tx: Sender<Update>,
) -> Disconnect {
    info!("Handling live channel connection");
    let (mut write, mut read) = connection.split();
    while let Some(message_result) = read.next().await {
        let message = match message_result {
            Ok(message) => message,
            Err(e) => {
                error!("Live channel error: {:?}", e);
                break;
            }
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(close_frame) => {
                warn!("Live channel close message: {:?}", close_frame);
                continue;
            }
            _ => {
                debug!("Ignoring websocket message: {:?}", message);
                continue;
            }
        };
        // Malformed packets are logged and skipped; the subscription stays open.
        let reply = match decode_packet(&text) {
            Ok(Packet::Open(handshake)) => {
                debug!("Engine.IO handshake: {}", handshake);
                Some("40")
            }
            Ok(Packet::Ping) => Some("3"),
            Ok(Packet::Connected) => {
                info!("Subscribed to {}", PARKING_STATUS_EVENT);
                None
            }
            Ok(Packet::Event { name, data }) if name == PARKING_STATUS_EVENT => {
                match PushUpdate::from_json(&data) {
                    Ok(update) => {
                        if tx.send(Update::Push(update)).await.is_err() {
                            return Disconnect::ViewClosed;
                        }
                    }
                    Err(e) => warn!("Bad {} payload: {}", PARKING_STATUS_EVENT, e),
                }
                None
            }
            Ok(Packet::Event { name, .. }) => {
                debug!("Ignoring live event {}", name);
                None
            }
            Ok(Packet::Close) | Ok(Packet::Disconnected) => {
                info!("Server closed the live session");
                break;
            }
            Ok(Packet::Ignored(packet)) => {
                debug!("Ignoring live packet {}", packet);
                None
            }
            Err(msg) => {
                error!("Error handling live message: {}", msg);
                None
            }
        };
        if let Some(reply) = reply {
            if let Err(e) = write.send(Message::text(reply)).await {
                error!("Error replying on live channel: {}", e);
                break;
            }
        }
    }
    Disconnect::Dropped
}

/// Decodes one Engine.IO text packet, unwrapping Socket.IO messages.
pub fn decode_packet(s: &str) -> Result<Packet, String> {
    let mut chars = s.chars();
    let kind = chars
        .next()
        .ok_or_else(|| "Empty live packet".to_string())?;
    let body = chars.as_str();
    match kind {
        '0' => serde_json::from_str(body)
            .map(Packet::Open)
            .map_err(|_| format!("Bad open packet: {}", s)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' | '6' => Ok(Packet::Ignored(s.to_string())),
        '4' => decode_message(body),
        _ => Err(format!("Unrecognized live packet: {}", s)),
    }
}

fn decode_message(s: &str) -> Result<Packet, String> {
    let mut chars = s.chars();
    let kind = chars
        .next()
        .ok_or_else(|| "Empty Socket.IO message".to_string())?;
    match kind {
        '0' => Ok(Packet::Connected),
        '1' => Ok(Packet::Disconnected),
        '2' => decode_event(chars.as_str()),
        '4' => Err(format!("Socket.IO connect error: {}", chars.as_str())),
        _ => Ok(Packet::Ignored(s.to_string())),
    }
}

fn decode_event(s: &str) -> Result<Packet, String> {
    let mut rest = s;
    if rest.starts_with('/') {
        let comma = rest
            .find(',')
            .ok_or_else(|| format!("Unterminated namespace in event: {}", s))?;
        rest = &rest[comma + 1..];
    }
    // Skip an ack id, if any.
    rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    let value: Value =
        serde_json::from_str(rest).map_err(|_| format!("Failed to parse event: {}", s))?;
    let args = value
        .as_array()
        .ok_or_else(|| format!("Unexpected event JSON type: {}", s))?;
    let name = args
        .get(0)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing event name: {}", s))?;
    Ok(Packet::Event {
        name: name.to_string(),
        data: args.get(1).cloned().unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpotState;
    use serde_json::json;
    use tokio::sync::mpsc::channel;
    use tokio::time::timeout;
    use warp::Filter;

    #[test]
    fn decodes_engine_io_packets() {
        assert_eq!(
            decode_packet("0{\"sid\":\"abc\",\"pingInterval\":25000}").unwrap(),
            Packet::Open(json!({"sid": "abc", "pingInterval": 25000}))
        );
        assert_eq!(decode_packet("2").unwrap(), Packet::Ping);
        assert_eq!(decode_packet("1").unwrap(), Packet::Close);
        assert_eq!(decode_packet("40{\"sid\":\"x\"}").unwrap(), Packet::Connected);
        assert_eq!(decode_packet("41").unwrap(), Packet::Disconnected);
        assert!(matches!(decode_packet("3").unwrap(), Packet::Ignored(_)));
        assert!(decode_packet("").is_err());
        assert!(decode_packet("x").is_err());
        assert!(decode_packet("44{\"message\":\"denied\"}").is_err());
    }

    #[test]
    fn decodes_events_with_namespace_and_ack_id() {
        let expected = Packet::Event {
            name: PARKING_STATUS_EVENT.to_string(),
            data: json!({"spot_number": 3, "status": "occupied"}),
        };
        assert_eq!(
            decode_packet(r#"42["parking_status_update",{"spot_number":3,"status":"occupied"}]"#)
                .unwrap(),
            expected
        );
        assert_eq!(
            decode_packet(r#"42/lot,17["parking_status_update",{"spot_number":3,"status":"occupied"}]"#)
                .unwrap(),
            expected
        );
        assert_eq!(
            decode_packet(r#"42["heartbeat"]"#).unwrap(),
            Packet::Event {
                name: "heartbeat".to_string(),
                data: Value::Null
            }
        );
        assert!(decode_packet("42/lot[\"x\"]").is_err());
        assert!(decode_packet("42{\"not\":\"array\"}").is_err());
    }

    #[test]
    fn builds_socket_io_url() {
        assert_eq!(
            live_url("localhost:5000").unwrap().as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[tokio::test]
    async fn forwards_parking_events_after_handshake() {
        let route = warp::path("socket.io").and(warp::ws()).map(|ws: warp::ws::Ws| {
            ws.on_upgrade(|socket| async move {
                let (mut tx, mut rx) = socket.split();
                let _ = tx
                    .send(warp::ws::Message::text("0{\"sid\":\"s1\",\"pingInterval\":25000}"))
                    .await;
                // Wait for the namespace connect before emitting anything.
                while let Some(Ok(message)) = rx.next().await {
                    if message.to_str() == Ok("40") {
                        break;
                    }
                }
                for packet in [
                    "40{\"sid\":\"n1\"}",
                    "42[\"other_event\",{}]",
                    "42[\"parking_status_update\",{\"spot_number\":1}]",
                    "42[\"parking_status_update\",{\"spot_number\":2,\"status\":{\"status\":\"occupied\",\"plate\":\"DL3C\"}}]",
                ]
                .iter()
                {
                    let _ = tx.send(warp::ws::Message::text(*packet)).await;
                }
                // Hold the socket open until the client goes away.
                while let Some(Ok(_)) = rx.next().await {}
            })
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let (tx, mut rx) = channel(8);
        let url = live_url(&addr.to_string()).unwrap();
        let task = tokio::spawn(run(url, Duration::from_secs(10), tx));

        let update = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            update,
            Update::Push(PushUpdate {
                spot_number: "2".to_string(),
                status: SpotState::Occupied,
                plate: Some("DL3C".to_string()),
            })
        );
        drop(rx);
        drop(task);
    }
}
