//! Socket transport abstraction and the tokio-tungstenite implementation.

use crate::types::realtime::DisconnectInfo;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::AbortHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// What a transport reports back to the realtime client.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Message(String),
    /// Connection attempt failed, or a frame could not be handled.
    Error(String),
    Closed(DisconnectInfo),
}

/// Carries text frames between the realtime client and the server.
///
/// Implementations push [`TransportEvent`]s into the channel handed to
/// [`RtTransport::connect`] from whatever thread they run on.
pub trait RtTransport: Send + Sync {
    /// Opens a connection to `url`. Completion is reported as
    /// [`TransportEvent::Connected`] or [`TransportEvent::Error`].
    fn connect(&self, url: &str, events: UnboundedSender<TransportEvent>);

    /// Queues a text frame. Returns `false` if there is no open connection.
    fn send(&self, text: String) -> bool;

    /// Closes the connection. No further events are required after this.
    fn disconnect(&self);

    fn is_connected(&self) -> bool;
}

/// [`RtTransport`] over a WebSocket, driven by a task on a tokio runtime.
///
/// Outgoing frames go through an unbounded channel to the connection task, so
/// `send` never blocks the calling thread.
pub struct WebSocketTransport {
    runtime: Handle,
    outgoing: Mutex<Option<UnboundedSender<Message>>>,
    task: Mutex<Option<AbortHandle>>,
    connected: Arc<AtomicBool>,
}

impl WebSocketTransport {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            outgoing: Mutex::new(None),
            task: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    fn close(&self) -> bool {
        let sender = self.outgoing.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.connected.store(false, Ordering::SeqCst);
        // Dropping the sender lets the task send a close frame and exit.
        sender.is_some()
    }
}

impl RtTransport for WebSocketTransport {
    fn connect(&self, url: &str, events: UnboundedSender<TransportEvent>) {
        if self.close() {
            debug!("Replacing the previous socket connection");
        }
        if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }

        let (outgoing_tx, mut outgoing_rx) = unbounded_channel::<Message>();
        *self.outgoing.lock().unwrap_or_else(PoisonError::into_inner) = Some(outgoing_tx);

        let connected = self.connected.clone();
        let url = url.to_string();
        let task = self.runtime.spawn(async move {
            let stream = match connect_async(url.as_str()).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    let _ = events.send(TransportEvent::Error(e.to_string()));
                    return;
                }
            };

            connected.store(true, Ordering::SeqCst);
            let _ = events.send(TransportEvent::Connected);
            let (mut sink, mut source) = stream.split();

            let info = loop {
                tokio::select! {
                    outgoing = outgoing_rx.recv() => match outgoing {
                        Some(message) => {
                            if let Err(e) = sink.send(message).await {
                                break DisconnectInfo {
                                    code: DisconnectInfo::TRANSPORT_ERROR,
                                    reason: e.to_string(),
                                    remote: false,
                                };
                            }
                        }
                        None => {
                            let _ = sink.send(Message::Close(None)).await;
                            break DisconnectInfo {
                                code: DisconnectInfo::NORMAL_CLOSURE,
                                reason: "closed by client".to_string(),
                                remote: false,
                            };
                        }
                    },
                    incoming = source.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let _ = events.send(TransportEvent::Message(text.to_string()));
                        }
                        Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => {
                                let _ = events.send(TransportEvent::Message(text));
                            }
                            Err(_) => {
                                let _ = events.send(TransportEvent::Error("binary frame is not UTF-8".to_string()));
                            }
                        },
                        Some(Ok(Message::Close(frame))) => {
                            break match frame {
                                Some(frame) => DisconnectInfo {
                                    code: u16::from(frame.code),
                                    reason: frame.reason.to_string(),
                                    remote: true,
                                },
                                None => DisconnectInfo {
                                    code: DisconnectInfo::NORMAL_CLOSURE,
                                    reason: String::new(),
                                    remote: true,
                                },
                            };
                        }
                        // Ping and pong frames are answered by tungstenite.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            break DisconnectInfo {
                                code: DisconnectInfo::ABNORMAL_CLOSURE,
                                reason: e.to_string(),
                                remote: true,
                            };
                        }
                        None => {
                            break DisconnectInfo {
                                code: DisconnectInfo::ABNORMAL_CLOSURE,
                                reason: "stream ended".to_string(),
                                remote: true,
                            };
                        }
                    }
                }
            };

            connected.store(false, Ordering::SeqCst);
            info!("🔌 Socket closed: {} {}", info.code, info.reason);
            let _ = events.send(TransportEvent::Closed(info));
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task.abort_handle());
    }

    fn send(&self, text: String) -> bool {
        if !self.connected.load(Ordering::SeqCst) {
            return false;
        }
        match self.outgoing.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(sender) => sender.send(Message::Text(text.into())).is_ok(),
            None => false,
        }
    }

    fn disconnect(&self) {
        if !self.close() {
            debug!("Socket already closed");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
        if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            if !task.is_finished() {
                warn!("🔌 Aborting socket task on drop");
            }
            task.abort();
        }
    }
}
