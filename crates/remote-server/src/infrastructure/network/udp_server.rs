//! UDP server: the single event loop.
//!
//! One Tokio task owns the socket, the [`Dispatcher`] (and with it the
//! session store and motion filter) and the sweeper ticker.  It `select!`s
//! over four event sources:
//!
//! ```text
//!             ┌────────────── recv_from ───────────► Dispatcher::handle ─┐
//!             │                                                          │
//! event loop ─┼────────────── sweeper tick ────────► InactivitySweeper ──┤──► actions
//!             │                                                          │
//!             ├────────────── frame job done ──────► frame datagram(s) ──┘
//!             │
//!             └────────────── 200 ms poll ─────────► shutdown flag?
//! ```
//!
//! Because nothing else ever touches session state, no lock is needed.
//!
//! # Frame jobs
//!
//! Capture and JPEG encoding are CPU-bound, so each `request_frame` becomes a
//! blocking job in a [`JoinSet`].  At most one job per endpoint is in flight;
//! requests arriving while one is pending are coalesced into it.  A finished
//! frame is sent only if its endpoint is still authenticated at that moment.
//!
//! # Shutdown
//!
//! When the shared `running` flag is cleared the loop stops receiving, waits
//! for in-flight frame jobs, sends "Server is shutting down" to every session
//! and drops the socket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use remote_core::{encode_server_message, frame_messages, ServerMessage};
use tokio::net::UdpSocket;
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::NetworkError;
use crate::application::{Action, Dispatcher, FrameError, FrameProducer, InactivitySweeper};
use crate::domain::ServerConfig;

/// Largest possible UDP payload; anything bigger cannot arrive.
const RECV_BUFFER_BYTES: usize = 65_535;

/// How often the loop checks the shutdown flag when otherwise idle.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

type FrameOutcome = (SocketAddr, Result<String, FrameError>);

// ── Public API ────────────────────────────────────────────────────────────────

/// The bound server, ready to [`run`](UdpServer::run).
pub struct UdpServer {
    socket: UdpSocket,
    dispatcher: Dispatcher,
    sweeper: InactivitySweeper,
    frames: FrameProducer,
    max_datagram_bytes: usize,
}

impl UdpServer {
    /// Binds the UDP socket on `config.udp_bind_addr`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Bind`] if the address is in use or not permitted.
    pub async fn bind(
        config: &ServerConfig,
        dispatcher: Dispatcher,
        frames: FrameProducer,
    ) -> Result<Self, NetworkError> {
        let addr = config.udp_bind_addr;
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| NetworkError::Bind { addr, source })?;

        Ok(Self {
            socket,
            dispatcher,
            sweeper: InactivitySweeper::new(config.inactivity_timeout, config.sweep_interval),
            frames,
            max_datagram_bytes: config.max_datagram_bytes,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        Ok(self.socket.local_addr()?)
    }

    /// Runs the event loop until `running` is set to `false`.
    ///
    /// # Errors
    ///
    /// Currently always `Ok`; receive and send errors are logged and the loop
    /// carries on.
    pub async fn run(self, running: Arc<AtomicBool>) -> Result<(), NetworkError> {
        let UdpServer {
            socket,
            mut dispatcher,
            sweeper,
            frames,
            max_datagram_bytes,
        } = self;

        info!("UDP server listening on {}", socket.local_addr()?);

        let mut buf = vec![0u8; RECV_BUFFER_BYTES];
        let mut sweep_ticks = sweeper.ticker();
        let mut shutdown_poll = interval(SHUTDOWN_POLL);
        shutdown_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut jobs = FrameJobs::new(frames);

        loop {
            tokio::select! {
                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, sender)) => {
                        let actions = dispatcher.handle(&buf[..len], sender, Instant::now());
                        perform(&socket, &mut jobs, actions).await;
                    }
                    // e.g. ICMP "port unreachable" surfacing as ConnectionReset on Windows
                    Err(e) => debug!("recv error: {e}"),
                },

                _ = sweep_ticks.tick() => {
                    let actions = sweeper.sweep(dispatcher.sessions_mut(), Instant::now());
                    perform(&socket, &mut jobs, actions).await;
                }

                Some(joined) = jobs.set.join_next_with_id() => {
                    let Some((endpoint, outcome)) = jobs.finish(joined) else {
                        continue;
                    };
                    match outcome {
                        Ok(data) if dispatcher.is_authenticated(&endpoint) => {
                            let frame_id = jobs.next_frame_id();
                            for message in frame_messages(data, frame_id, max_datagram_bytes) {
                                send(&socket, endpoint, &message).await;
                            }
                        }
                        Ok(_) => debug!(%endpoint, "frame dropped: endpoint no longer authenticated"),
                        Err(e) => warn!(%endpoint, "frame capture failed: {e}"),
                    }
                }

                _ = shutdown_poll.tick() => {
                    if !running.load(Ordering::Relaxed) {
                        info!("shutdown flag set; stopping UDP server");
                        break;
                    }
                }
            }
        }

        jobs.set.shutdown().await;
        for action in dispatcher.shutdown() {
            if let Action::Send { to, message } = action {
                send(&socket, to, &message).await;
            }
        }
        info!("UDP server stopped");
        Ok(())
    }
}

// ── Frame job bookkeeping ─────────────────────────────────────────────────────

struct FrameJobs {
    producer: FrameProducer,
    set: JoinSet<FrameOutcome>,
    /// Endpoint of every job still in flight, by task id.
    in_flight: HashMap<task::Id, SocketAddr>,
    frame_id: u32,
}

impl FrameJobs {
    fn new(producer: FrameProducer) -> Self {
        Self {
            producer,
            set: JoinSet::new(),
            in_flight: HashMap::new(),
            frame_id: 0,
        }
    }

    fn is_pending(&self, endpoint: SocketAddr) -> bool {
        self.in_flight.values().any(|pending| *pending == endpoint)
    }

    /// Starts a capture for `endpoint` unless one is already pending.
    fn request(&mut self, endpoint: SocketAddr) {
        if self.is_pending(endpoint) {
            debug!(%endpoint, "frame request coalesced with pending capture");
            return;
        }
        let producer = self.producer.clone();
        let handle = self
            .set
            .spawn_blocking(move || (endpoint, producer.produce()));
        self.in_flight.insert(handle.id(), endpoint);
    }

    /// Clears the pending mark for a finished job, panicked ones included.
    fn finish(
        &mut self,
        joined: Result<(task::Id, FrameOutcome), JoinError>,
    ) -> Option<FrameOutcome> {
        match joined {
            Ok((id, outcome)) => {
                self.in_flight.remove(&id);
                Some(outcome)
            }
            Err(e) => {
                let endpoint = self.in_flight.remove(&e.id());
                error!(?endpoint, "frame worker failed: {e}");
                None
            }
        }
    }

    fn next_frame_id(&mut self) -> u32 {
        let id = self.frame_id;
        self.frame_id = self.frame_id.wrapping_add(1);
        id
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn perform(socket: &UdpSocket, jobs: &mut FrameJobs, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Send { to, message } => send(socket, to, &message).await,
            Action::CaptureFrame { for_endpoint } => jobs.request(for_endpoint),
        }
    }
}

/// Best-effort send: failures are logged, never propagated.
async fn send(socket: &UdpSocket, to: SocketAddr, message: &ServerMessage) {
    let bytes = match encode_server_message(message) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(%to, "failed to encode reply: {e}");
            return;
        }
    };
    if let Err(e) = socket.send_to(&bytes, to).await {
        debug!(%to, kind = %message.kind(), "send failed: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
