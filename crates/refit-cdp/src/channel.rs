//! The bidirectional debugging channel.
//!
//! Id-correlated request/response over a WebSocket, with unsolicited protocol
//! events fanned out to subscribers. One pump task owns the socket; calls go
//! through a command queue and resolve through oneshot replies.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::CdpError;

/// Transport configuration for the debugging channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub request_timeout: Duration,
    /// Capacity of the event fan-out before slow subscribers lag.
    pub event_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            event_capacity: 1024,
        }
    }
}

/// An unsolicited protocol event (`method` + `params`).
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    pub method: String,
    pub params: Value,
}

struct Call {
    method: String,
    params: Value,
    reply: oneshot::Sender<Result<Value, CdpError>>,
}

/// A connected debugging channel. Cheap to clone; clones share the socket.
#[derive(Clone)]
pub struct DebugChannel {
    calls: mpsc::Sender<Call>,
    events: broadcast::Sender<ChannelEvent>,
    config: ChannelConfig,
}

impl DebugChannel {
    /// Connect to a target's WebSocket debugger URL.
    pub async fn connect(ws_url: &str, config: ChannelConfig) -> Result<Self, CdpError> {
        let (socket, _) = connect_async(ws_url)
            .await
            .map_err(|err| CdpError::Transport(err.to_string()))?;

        let (calls_tx, calls_rx) = mpsc::channel::<Call>(64);
        let (events_tx, _) = broadcast::channel(config.event_capacity);

        tokio::spawn(pump(socket, calls_rx, events_tx.clone()));

        Ok(Self {
            calls: calls_tx,
            events: events_tx,
            config,
        })
    }

    /// Issue one protocol call and wait for its response.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, CdpError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.calls
            .send(Call {
                method: method.to_string(),
                params,
                reply: reply_tx,
            })
            .await
            .map_err(|_| CdpError::Transport("debugging channel closed".into()))?;

        match tokio::time::timeout(self.config.request_timeout, reply_rx).await {
            Err(_) => Err(CdpError::CallTimeout {
                method: method.to_string(),
            }),
            Ok(Err(_)) => Err(CdpError::Transport("debugging channel closed".into())),
            Ok(Ok(result)) => result,
        }
    }

    /// Subscribe to unsolicited protocol events.
    pub fn events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }
}

type Socket = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn pump(
    socket: Socket,
    mut calls: mpsc::Receiver<Call>,
    events: broadcast::Sender<ChannelEvent>,
) {
    let (mut sink, mut stream) = socket.split();
    let mut pending: HashMap<u64, oneshot::Sender<Result<Value, CdpError>>> = HashMap::new();
    let mut next_id: u64 = 1;

    loop {
        tokio::select! {
            call = calls.recv() => {
                let Some(call) = call else { break };
                let id = next_id;
                next_id += 1;
                let frame = json!({
                    "id": id,
                    "method": call.method,
                    "params": call.params,
                })
                .to_string();
                if let Err(err) = sink.send(Message::Text(frame.into())).await {
                    let _ = call.reply.send(Err(CdpError::Transport(err.to_string())));
                    break;
                }
                pending.insert(id, call.reply);
            }
            message = stream.next() => {
                let Some(Ok(message)) = message else { break };
                let Message::Text(text) = message else { continue };
                let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                dispatch(frame, &mut pending, &events);
            }
        }
    }

    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(CdpError::Transport("debugging channel closed".into())));
    }
}

fn dispatch(
    frame: Value,
    pending: &mut HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>,
    events: &broadcast::Sender<ChannelEvent>,
) {
    if let Some(id) = frame.get("id").and_then(Value::as_u64) {
        let Some(reply) = pending.remove(&id) else { return };
        let outcome = match frame.get("error") {
            Some(error) => Err(CdpError::Protocol(
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unspecified protocol error")
                    .to_string(),
            )),
            None => Ok(frame.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = reply.send(outcome);
        return;
    }

    if let Some(method) = frame.get("method").and_then(Value::as_str) {
        let _ = events.send(ChannelEvent {
            method: method.to_string(),
            params: frame.get("params").cloned().unwrap_or(Value::Null),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn responses_resolve_pending_calls() {
        let (events, _keep) = broadcast::channel(8);
        let mut pending = HashMap::new();
        let (tx, rx) = oneshot::channel();
        pending.insert(4u64, tx);

        dispatch(json!({"id": 4, "result": {"value": 2}}), &mut pending, &events);
        let result = rx.blocking_recv().unwrap().unwrap();
        assert_eq!(result["value"], 2);
        assert!(pending.is_empty());
    }

    #[test]
    fn protocol_errors_surface_their_message() {
        let (events, _keep) = broadcast::channel(8);
        let mut pending = HashMap::new();
        let (tx, rx) = oneshot::channel();
        pending.insert(7u64, tx);

        dispatch(
            json!({"id": 7, "error": {"message": "no such frame"}}),
            &mut pending,
            &events,
        );
        let err = rx.blocking_recv().unwrap().unwrap_err();
        assert!(matches!(err, CdpError::Protocol(msg) if msg == "no such frame"));
    }

    #[test]
    fn unsolicited_frames_become_events() {
        let (events, mut rx) = broadcast::channel(8);
        let mut pending = HashMap::new();

        dispatch(
            json!({"method": "Runtime.bindingCalled", "params": {"name": "x"}}),
            &mut pending,
            &events,
        );
        let event = rx.try_recv().unwrap();
        assert_eq!(event.method, "Runtime.bindingCalled");
        assert_eq!(event.params["name"], "x");
    }
}
