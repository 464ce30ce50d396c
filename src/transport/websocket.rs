use super::{
    Connector, Outbound, SessionEvent, SessionEventKind, SessionEvents, SessionHandle, SessionId,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

/// Close code reported when the peer's close frame carries no status
const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code reported when the stream ends without a close frame
const ABNORMAL_CLOSURE: u16 = 1006;

/// Connects to the observation endpoint over WebSocket
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WebSocketConnector {
    fn connect(&mut self, session: SessionId, events: SessionEvents) -> SessionHandle {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(
            self.url.clone(),
            session,
            outbound_rx,
            events,
        ));
        SessionHandle::new(session, outbound_tx, Some(task))
    }
}

/// Drive one WebSocket connection until it closes
async fn run_session(
    url: String,
    session: SessionId,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: SessionEvents,
) {
    let emit = |kind| {
        // Supervisor gone: nothing left to report to
        let _ = events.send(SessionEvent { session, kind });
    };

    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            emit(SessionEventKind::Error(e.to_string()));
            return;
        }
    };
    emit(SessionEventKind::Opened);

    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        emit(SessionEventKind::Message(text.as_str().to_string()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                            .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                        emit(SessionEventKind::Closed { code, reason });
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ignore binary, ping, pong frames
                    }
                    Some(Err(e)) => {
                        emit(SessionEventKind::Error(e.to_string()));
                        break;
                    }
                    None => {
                        emit(SessionEventKind::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: String::new(),
                        });
                        break;
                    }
                }
            }

            command = outbound.recv() => {
                match command {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = write.send(Message::text(text)).await {
                            emit(SessionEventKind::Error(e.to_string()));
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        debug!(session = %session, "Closing WebSocket session");
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }
}
