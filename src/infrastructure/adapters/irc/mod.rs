//! IRC adapter - Socket session, read loop and reconnects

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout, timeout_at, Instant};

use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::queue::{self, OutboundQueue, POLL_INTERVAL};
use crate::application::messaging::Dispatcher;
use crate::domain::entities::{Event, EventContext, EventRegistry, Matcher};
use crate::domain::traits::LineSink;
use crate::infrastructure::config::Config;

/// Writes CRLF-terminated lines to the socket
pub struct WireSink<W> {
    writer: W,
    verbose: bool,
}

impl<W> WireSink<W> {
    pub fn new(writer: W, verbose: bool) -> Self {
        Self { writer, verbose }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> LineSink for WireSink<W> {
    async fn send_line(&mut self, line: &str) -> Result<(), BotError> {
        if self.verbose {
            tracing::info!("< {}", line);
        } else {
            tracing::trace!("< {}", line);
        }
        let mut buf = Vec::with_capacity(line.len() + 2);
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(b"\r\n");
        self.writer
            .write_all(&buf)
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| BotError::Network(e.to_string()))
    }
}

/// Requests from outside code to the live connection
enum Control {
    Execute(Event),
    Custom { name: String, message: String },
}

/// A handle to a running session.
///
/// Requests are handled on the connection's read loop, in order with
/// inbound lines. Requests made while disconnected wait for the next
/// connection.
#[derive(Clone)]
pub struct SessionHandle {
    control_tx: mpsc::UnboundedSender<Control>,
}

impl SessionHandle {
    /// Run a handler body outside any event and send what it produces:
    ///
    /// ```ignore
    /// handle.execute(|ctx| {
    ///     ctx.msg("harryjr", "you're awesome");
    ///     Ok(())
    /// })?;
    /// ```
    pub fn execute<F>(&self, handler: F) -> Result<(), BotError>
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.send(Control::Execute(Event::new(Matcher::Any, handler)))
    }

    /// Fire the custom event `name` with `message` as its text
    pub fn trigger(&self, name: &str, message: &str) -> Result<(), BotError> {
        self.send(Control::Custom {
            name: name.to_string(),
            message: message.to_string(),
        })
    }

    fn send(&self, control: Control) -> Result<(), BotError> {
        self.control_tx
            .send(control)
            .map_err(|_| BotError::Internal("session is gone".to_string()))
    }
}

/// One bot identity against one server.
///
/// Holds the configuration and the event registrations, both fixed for the
/// life of the session. Queue and channel state belong to a single
/// connection and start fresh on every reconnect.
pub struct Session {
    config: Config,
    registry: Arc<EventRegistry>,
    control_tx: mpsc::UnboundedSender<Control>,
    control_rx: Mutex<mpsc::UnboundedReceiver<Control>>,
}

impl Session {
    pub fn new(config: Config, registry: EventRegistry) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        Self {
            config,
            registry: Arc::new(registry),
            control_tx,
            control_rx: Mutex::new(control_rx),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            control_tx: self.control_tx.clone(),
        }
    }

    /// Connect and keep reconnecting after timeouts until the server closes
    /// the connection, a fatal error occurs or the process is interrupted.
    pub async fn run(&self) -> Result<(), BotError> {
        tracing::info!("==== Starting {} ====", self.config.irc.nick);
        let result = tokio::select! {
            result = self.run_with_reconnect() => result,
            _ = tokio::signal::ctrl_c() => Err(BotError::Interrupted),
        };
        match &result {
            Ok(()) => tracing::info!("Connection closed by server"),
            Err(e) => tracing::error!("Disconnected! An error occurred: {}", e),
        }
        tracing::info!("==== Ending {} ====", self.config.irc.nick);
        result
    }

    async fn run_with_reconnect(&self) -> Result<(), BotError> {
        loop {
            match self.connect().await {
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("{}. Reconnecting.", e);
                }
                other => return other,
            }
        }
    }

    /// A single connection attempt, from socket open to close.
    ///
    /// Returns `Ok` when the server closes the stream.
    pub async fn connect(&self) -> Result<(), BotError> {
        let irc = &self.config.irc;
        let conn = &self.config.connection;
        let mut control_rx = self.control_rx.lock().await;

        tracing::info!("Connecting to {} at port {}", irc.server, irc.port);
        let stream = timeout(conn.connect_timeout(), TcpStream::connect(irc.address()))
            .await
            .map_err(|_| BotError::Timeout(format!("connecting to {}", irc.address())))?
            .map_err(|e| BotError::Network(e.to_string()))?;
        tracing::info!("Connection established.");

        let (reader, writer) = stream.into_split();
        let outbound = Arc::new(OutboundQueue::new());
        let mut drain = tokio::spawn(queue::drain(
            outbound.clone(),
            WireSink::new(writer, irc.verbose),
            POLL_INTERVAL,
        ));

        let mut dispatcher = Dispatcher::new(irc.clone(), self.registry.clone(), outbound);
        dispatcher.handshake();

        // Lines are read as bytes: text that is not UTF-8 is decoded lossily
        // instead of failing the connection. A read cancelled by another
        // branch keeps its partial bytes in `buf`.
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut deadline = Instant::now() + conn.read_timeout();
        let result = loop {
            tokio::select! {
                read = timeout_at(deadline, reader.read_until(b'\n', &mut buf)) => match read {
                    Err(_) => break Err(BotError::Timeout(format!(
                        "nothing read for {}s", conn.read_timeout_seconds
                    ))),
                    Ok(Err(e)) => break Err(BotError::Network(e.to_string())),
                    Ok(Ok(0)) => break Ok(()),
                    Ok(Ok(_)) => {
                        let line = String::from_utf8_lossy(&buf).into_owned();
                        buf.clear();
                        deadline = Instant::now() + conn.read_timeout();
                        dispatcher.handle_line(&line);
                    }
                },
                Some(control) = control_rx.recv() => match control {
                    Control::Execute(event) => dispatcher.execute_event(&event),
                    Control::Custom { name, message } => dispatcher.dispatch_custom(&name, &message),
                },
                joined = &mut drain => break match joined {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(BotError::Internal(format!("drain task failed: {}", e))),
                },
            }
        };

        drain.abort();
        result
    }
}
