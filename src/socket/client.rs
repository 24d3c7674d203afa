use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Duration, sleep};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use url::Url;

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::socket::LiveChannel;
use crate::socket::events::{ClientEvent, ServerEvent};

/// Fixed delay between reconnect attempts. The reconnect policy is
/// deliberately plain: steady interval, log, retry.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Capacity of the incoming broadcast buffer; a subscriber that lags this
/// far behind misses events rather than stalling the reader.
const INCOMING_BUFFER: usize = 256;

/// The shared live connection. One instance per application, constructed by
/// the composition root and handed to the chat components; lives until
/// [`SocketClient::close`].
///
/// Outbound events go through [`LiveChannel::emit`] and are drained by a
/// background writer. Incoming frames are decoded and fanned out to every
/// [`SocketClient::subscribe`] receiver.
pub struct SocketClient {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    incoming: broadcast::Sender<ServerEvent>,
    shutdown: watch::Sender<bool>,
}

impl SocketClient {
    /// Open the connection described by `config` and spawn the background
    /// task that owns it. The task connects and reconnects on its own; this
    /// call only fails on an invalid endpoint URL.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &ChatConfig) -> Result<Self> {
        let mut url = Url::parse(&config.socket_url)?;
        if let Some(token) = &config.token {
            // Transport-level credential propagation; no separate handshake.
            url.query_pairs_mut().append_pair("token", token);
        }

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (incoming, _) = broadcast::channel(INCOMING_BUFFER);
        let (shutdown, shutdown_rx) = watch::channel(false);

        tokio::spawn(run(
            url.to_string(),
            outbound_rx,
            incoming.clone(),
            shutdown_rx,
        ));

        Ok(Self {
            outbound,
            incoming,
            shutdown,
        })
    }

    /// Subscribe to events pushed by the server.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.incoming.subscribe()
    }

    /// Stop the background task and drop the connection.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl LiveChannel for SocketClient {
    fn emit(&self, event: ClientEvent) -> Result<()> {
        self.outbound
            .send(event)
            .map_err(|_| ChatError::ChannelClosed)
    }
}

/// Connection supervisor: connect, pump frames both ways, reconnect on drop.
async fn run(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
    incoming: broadcast::Sender<ServerEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                log::info!("live channel connected");
                let (mut write, mut read) = stream.split();
                loop {
                    tokio::select! {
                        event = outbound.recv() => {
                            let Some(event) = event else { return };
                            let frame = match serde_json::to_string(&event) {
                                Ok(frame) => frame,
                                Err(err) => {
                                    log::warn!("dropping unserializable event: {}", err);
                                    continue;
                                }
                            };
                            if let Err(err) = write.send(WsMessage::Text(frame)).await {
                                log::warn!("live channel send failed: {}", err);
                                break;
                            }
                        }
                        frame = read.next() => {
                            match frame {
                                Some(Ok(WsMessage::Text(text))) => match serde_json::from_str(&text) {
                                    Ok(event) => {
                                        let _ = incoming.send(event);
                                    }
                                    Err(err) => log::debug!("ignoring unknown frame: {}", err),
                                },
                                Some(Ok(WsMessage::Close(_))) | None => {
                                    log::info!("live channel closed by server");
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(err)) => {
                                    log::warn!("live channel read error: {}", err);
                                    break;
                                }
                            }
                        }
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                let _ = write.send(WsMessage::Close(None)).await;
                                return;
                            }
                        }
                    }
                }
            }
            Err(err) => log::warn!("live channel connect failed: {}", err),
        }

        // TODO: re-join the active room after a reconnect; until then the
        // session has to be reopened to resubscribe.
        tokio::select! {
            _ = sleep(RECONNECT_DELAY) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
