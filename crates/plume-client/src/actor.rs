//! Actor-based feed engine for one client process.
//!
//! Provides a cloneable [`FeedHandle`] in front of a [`FeedActor`] running
//! in a `spawn_local` task. The actor owns every piece of mutable state —
//! the reconciler (and through it the post store), the follow coordinator,
//! the session context, and the push connection — and processes one message
//! at a time, so every state transition is atomic with respect to observers.
//!
//! ```text
//!   FeedHandle (Clone)           mpsc      FeedActor (spawn_local)
//!   ┌─────────────────────┐  ────────▶  ┌──────────────────────────────┐
//!   │ .start() / .stop()  │             │ Reconciler + PostStore       │
//!   │ .timeline(mode)     │  ◀────────  │ FollowCoordinator            │
//!   │ .toggle_follow()    │   oneshot   │ SessionContext + EventSource │
//!   │ .subscribe()        │ ◀─broadcast─│                              │
//!   └─────────────────────┘             └──────────────────────────────┘
//! ```
//!
//! Concurrency is interleaving, never parallelism: stream chunks, follow
//! confirmations, and commands arrive as messages and are folded in between
//! suspension points. The suspension points are exactly opening the push
//! connection, the snapshot fetch, and the follow confirmation requests
//! (which run as child tasks and resolve back through a message).

use std::rc::Rc;

use plume_feed::{
    ApplyResult, FollowCoordinator, FollowIntent, Reconciler, ResolveOutcome, SessionContext,
    ToggleOutcome, ViewMode, project,
};
use plume_types::{Post, SessionId, UserId};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::api::{Connector, EventSource, FeedApi, StreamError};
use crate::constants::{CHANGE_CHANNEL_CAPACITY, CONNECT_TIMEOUT};
use crate::events::{ConnectionStatus, StreamEvent};
use crate::sse::SseDecoder;

// ============================================================================
// Error Type
// ============================================================================

/// Errors surfaced through the handle.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The command needs an active session and there is none.
    #[error("no active session")]
    NotStarted,
    /// The actor is gone (all handles dropped or task aborted).
    #[error("feed actor shut down")]
    Shutdown,
}

// ============================================================================
// Change Notifications
// ============================================================================

/// Notifications broadcast to subscribers on every observable change.
///
/// Notifications carry versions, not state: a subscriber re-reads through
/// the handle, so a lagging receiver that misses a few is still correct.
#[derive(Clone, Debug)]
pub enum FeedChange {
    /// The post store changed (snapshot load or applied delta).
    Posts { version: u64 },
    /// The followed-user set changed (optimistic flip or rollback).
    Following { version: u64 },
    /// An in-flight follow mutation resolved. `rolled_back` is the
    /// user-visible failure signal — rendering it is the caller's job.
    FollowSettled { target: UserId, rolled_back: bool },
    /// Connection lifecycle transition.
    Status(ConnectionStatus),
}

// ============================================================================
// Commands (internal)
// ============================================================================

/// Internal command sent from FeedHandle → FeedActor via mpsc.
enum FeedCommand {
    Start {
        ctx: SessionContext,
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Timeline {
        mode: ViewMode,
        reply: oneshot::Sender<Vec<Post>>,
    },
    Following {
        reply: oneshot::Sender<Vec<UserId>>,
    },
    ToggleFollow {
        target: UserId,
        reply: oneshot::Sender<Result<ToggleOutcome, FeedError>>,
    },
}

/// Outcome of one confirmation request, routed back to the actor.
struct FollowResolution {
    /// Session that issued the request. A resolution from a dead session
    /// must not touch the live coordinator.
    session_id: SessionId,
    target: UserId,
    seq: u64,
    success: bool,
}

// ============================================================================
// FeedHandle (public API)
// ============================================================================

/// Cloneable handle to a feed actor.
///
/// Each method sends a command via mpsc and awaits the oneshot reply.
#[derive(Clone)]
pub struct FeedHandle {
    tx: mpsc::UnboundedSender<FeedCommand>,
    change_tx: broadcast::Sender<FeedChange>,
}

impl FeedHandle {
    /// Start a session: open the push connection, load the snapshot, seed
    /// the follow set from `ctx`. Returns once the initial load settled
    /// (possibly into the empty or disconnected state — failures are
    /// reported through [`FeedHandle::subscribe`], not here).
    ///
    /// Starting while a session is active tears the old one down first.
    pub async fn start(&self, ctx: SessionContext) -> Result<(), FeedError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(FeedCommand::Start { ctx, reply }).map_err(|_| FeedError::Shutdown)?;
        rx.await.map_err(|_| FeedError::Shutdown)
    }

    /// End the session: close the push connection and clear all transient
    /// state. Synchronous from the store's point of view — once this
    /// returns, no late stream event can mutate anything.
    pub async fn stop(&self) -> Result<(), FeedError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(FeedCommand::Stop { reply }).map_err(|_| FeedError::Shutdown)?;
        rx.await.map_err(|_| FeedError::Shutdown)
    }

    /// Project the current timeline for a view mode. Empty when no session
    /// is active.
    pub async fn timeline(&self, mode: ViewMode) -> Result<Vec<Post>, FeedError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(FeedCommand::Timeline { mode, reply }).map_err(|_| FeedError::Shutdown)?;
        rx.await.map_err(|_| FeedError::Shutdown)
    }

    /// The followed-user set as currently (optimistically) known.
    pub async fn following(&self) -> Result<Vec<UserId>, FeedError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(FeedCommand::Following { reply }).map_err(|_| FeedError::Shutdown)?;
        rx.await.map_err(|_| FeedError::Shutdown)
    }

    /// Toggle follow state for `target`, optimistically.
    ///
    /// Self-follow is the caller's responsibility to prevent — the engine
    /// applies whatever target it is handed.
    pub async fn toggle_follow(&self, target: UserId) -> Result<ToggleOutcome, FeedError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(FeedCommand::ToggleFollow { target, reply })
            .map_err(|_| FeedError::Shutdown)?;
        rx.await.map_err(|_| FeedError::Shutdown)?
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedChange> {
        self.change_tx.subscribe()
    }
}

// ============================================================================
// FeedActor (internal, runs in spawn_local)
// ============================================================================

/// What one select iteration produced.
enum Step {
    Cmd(Option<FeedCommand>),
    Resolution(FollowResolution),
    Chunk(Option<Result<Vec<u8>, StreamError>>),
}

/// How a dead stream ended, noted while the snapshot fetch is in flight.
enum StreamEnd {
    Failed(StreamError),
    Closed,
}

/// The actor that owns all feed state.
struct FeedActor<A, C: Connector> {
    api: Rc<A>,
    connector: C,
    reconciler: Reconciler,
    follows: FollowCoordinator,
    session: Option<SessionContext>,
    /// Live push connection (None = disconnected).
    source: Option<C::Source>,
    change_tx: broadcast::Sender<FeedChange>,
    resolve_tx: mpsc::UnboundedSender<FollowResolution>,
}

/// Await the next chunk, or park forever if there is no connection (the
/// select guard keeps this branch disabled in that case).
async fn recv_chunk<S: EventSource>(source: &mut Option<S>) -> Option<Result<Vec<u8>, StreamError>> {
    match source.as_mut() {
        Some(s) => s.next_chunk().await,
        None => std::future::pending().await,
    }
}

impl<A, C> FeedActor<A, C>
where
    A: FeedApi + 'static,
    C: Connector,
{
    /// Process messages until every handle is dropped.
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<FeedCommand>,
        mut resolve_rx: mpsc::UnboundedReceiver<FollowResolution>,
    ) {
        let mut decoder = SseDecoder::new();
        loop {
            let connected = self.source.is_some();
            // Biased so delivered stream data and settled confirmations are
            // folded in before the command that reads them: a reply always
            // reflects everything the transport handed over first.
            let step = tokio::select! {
                biased;
                res = resolve_rx.recv() => match res {
                    Some(r) => Step::Resolution(r),
                    // The actor holds a sender; this can't happen.
                    None => continue,
                },
                chunk = recv_chunk(&mut self.source), if connected => {
                    Step::Chunk(chunk)
                }
                cmd = cmd_rx.recv() => Step::Cmd(cmd),
            };
            match step {
                Step::Cmd(Some(cmd)) => self.handle_command(cmd, &mut decoder).await,
                Step::Cmd(None) => break,
                Step::Resolution(r) => self.handle_resolution(r),
                Step::Chunk(chunk) => self.handle_chunk(chunk, &mut decoder),
            }
        }
        debug!("feed actor shutting down: all handles dropped");
    }

    async fn handle_command(&mut self, cmd: FeedCommand, decoder: &mut SseDecoder) {
        match cmd {
            FeedCommand::Start { ctx, reply } => {
                self.start_session(ctx, decoder).await;
                let _ = reply.send(());
            }
            FeedCommand::Stop { reply } => {
                self.stop_session();
                let _ = reply.send(());
            }
            FeedCommand::Timeline { mode, reply } => {
                let _ = reply.send(self.timeline(mode));
            }
            FeedCommand::Following { reply } => {
                let _ = reply.send(self.follows.following().iter().cloned().collect());
            }
            FeedCommand::ToggleFollow { target, reply } => {
                let _ = reply.send(self.toggle_follow(target));
            }
        }
    }

    // ── Session lifecycle ────────────────────────────────────────────────

    async fn start_session(&mut self, ctx: SessionContext, decoder: &mut SseDecoder) {
        if self.session.is_some() {
            self.stop_session();
        }
        info!(session = %ctx.session_id.short(), user = %ctx.user_id, "starting feed session");
        self.follows = FollowCoordinator::seeded(ctx.following.iter().cloned());
        self.session = Some(ctx);
        *decoder = SseDecoder::new();

        let mut source = match tokio::time::timeout(CONNECT_TIMEOUT, self.connector.connect())
            .await
            .unwrap_or_else(|_| Err(StreamError::Connect("timed out".to_owned())))
        {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, "push connection failed to open");
                self.broadcast(FeedChange::Status(ConnectionStatus::Error(e.to_string())));
                return;
            }
        };

        // The snapshot is authoritative for the moment it completes: drain
        // and discard whatever the stream delivers while the fetch is in
        // flight. Anything still in transit completes after the load and is
        // applied as a delta, which idempotence makes safe.
        let mut stream_end = None;
        let fetched = {
            let api = Rc::clone(&self.api);
            let fetch = api.fetch_timeline();
            tokio::pin!(fetch);
            loop {
                if stream_end.is_some() {
                    break (&mut fetch).await;
                }
                tokio::select! {
                    biased;
                    chunk = source.next_chunk() => match chunk {
                        Some(Ok(bytes)) => {
                            let discarded = decoder.feed(&bytes).len();
                            if discarded > 0 {
                                trace!(discarded, "events before snapshot load discarded");
                            }
                        }
                        Some(Err(e)) => stream_end = Some(StreamEnd::Failed(e)),
                        None => stream_end = Some(StreamEnd::Closed),
                    },
                    result = &mut fetch => break result,
                }
            }
        };

        match fetched {
            Ok(posts) => self.reconciler.load_snapshot(posts),
            Err(e) => {
                // No data available: an empty feed rather than a stale one.
                warn!(error = %e, "snapshot fetch failed, starting from empty");
                self.reconciler.load_snapshot(Vec::new());
            }
        }
        self.broadcast(FeedChange::Posts { version: self.reconciler.store().version() });

        match stream_end {
            None => {
                self.source = Some(source);
                self.broadcast(FeedChange::Status(ConnectionStatus::Connected));
            }
            Some(StreamEnd::Failed(e)) => {
                warn!(error = %e, "push stream failed during snapshot load");
                self.broadcast(FeedChange::Status(ConnectionStatus::Error(e.to_string())));
            }
            Some(StreamEnd::Closed) => {
                self.broadcast(FeedChange::Status(ConnectionStatus::Disconnected));
            }
        }
    }

    /// Tear down the session. Dropping the source closes the connection
    /// before this returns, so no late event can reach the store.
    fn stop_session(&mut self) {
        let Some(ctx) = self.session.take() else {
            return;
        };
        self.source = None;
        self.reconciler.clear();
        self.follows = FollowCoordinator::new();
        self.broadcast(FeedChange::Status(ConnectionStatus::Disconnected));
        info!(session = %ctx.session_id.short(), "feed session stopped");
    }

    // ── Stream events ────────────────────────────────────────────────────

    fn handle_chunk(&mut self, chunk: Option<Result<Vec<u8>, StreamError>>, decoder: &mut SseDecoder) {
        match chunk {
            Some(Ok(bytes)) => {
                for frame in decoder.feed(&bytes) {
                    let Some(event) = StreamEvent::decode(&frame) else {
                        continue;
                    };
                    if let ApplyResult::Applied = self.reconciler.apply(event.into()) {
                        self.broadcast(FeedChange::Posts {
                            version: self.reconciler.store().version(),
                        });
                    }
                }
            }
            Some(Err(e)) => {
                // Close on error; the materialized store stays as-is and
                // reopening is the caller's decision via a fresh start.
                warn!(error = %e, "push stream failed, closing connection");
                self.source = None;
                self.broadcast(FeedChange::Status(ConnectionStatus::Error(e.to_string())));
            }
            None => {
                debug!("push stream closed by server");
                self.source = None;
                self.broadcast(FeedChange::Status(ConnectionStatus::Disconnected));
            }
        }
    }

    // ── Follow mutations ─────────────────────────────────────────────────

    fn toggle_follow(&mut self, target: UserId) -> Result<ToggleOutcome, FeedError> {
        let Some(session) = &self.session else {
            return Err(FeedError::NotStarted);
        };
        let outcome = self.follows.toggle(&target);
        if let ToggleOutcome::Started { intent, seq } = outcome {
            self.broadcast(FeedChange::Following { version: self.follows.version() });

            let api = Rc::clone(&self.api);
            let resolve_tx = self.resolve_tx.clone();
            let session_id = session.session_id;
            tokio::task::spawn_local(async move {
                let follow = matches!(intent, FollowIntent::Follow);
                let success = match api.set_following(&target, follow).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(%target, follow, error = %e, "follow confirmation failed");
                        false
                    }
                };
                let _ = resolve_tx.send(FollowResolution { session_id, target, seq, success });
            });
        }
        Ok(outcome)
    }

    fn handle_resolution(&mut self, r: FollowResolution) {
        // Guard on session identity: a confirmation issued under a session
        // that has since ended must not touch the live coordinator.
        match &self.session {
            Some(ctx) if ctx.session_id == r.session_id => {}
            _ => {
                trace!(target = %r.target, "follow resolution from ended session ignored");
                return;
            }
        }
        match self.follows.resolve(&r.target, r.seq, r.success) {
            ResolveOutcome::Confirmed => {
                self.broadcast(FeedChange::FollowSettled { target: r.target, rolled_back: false });
            }
            ResolveOutcome::RolledBack => {
                self.broadcast(FeedChange::Following { version: self.follows.version() });
                self.broadcast(FeedChange::FollowSettled { target: r.target, rolled_back: true });
            }
            ResolveOutcome::Stale => {}
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────

    fn timeline(&self, mode: ViewMode) -> Vec<Post> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        project(self.reconciler.store(), self.follows.following(), &session.user_id, mode)
            .into_iter()
            .cloned()
            .collect()
    }

    fn broadcast(&self, change: FeedChange) {
        // No subscribers is fine.
        let _ = self.change_tx.send(change);
    }
}

// ============================================================================
// Public spawn function
// ============================================================================

/// Spawn a feed actor in the current `LocalSet` context.
///
/// Returns a cloneable [`FeedHandle`]. Must be called from within a
/// `tokio::task::LocalSet` because the actor and its confirmation child
/// tasks run on local tasks (collaborators may be `!Send`).
pub fn spawn_feed<A, C>(api: A, connector: C) -> FeedHandle
where
    A: FeedApi + 'static,
    C: Connector + 'static,
    C::Source: 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (resolve_tx, resolve_rx) = mpsc::unbounded_channel();
    let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
    let actor = FeedActor {
        api: Rc::new(api),
        connector,
        reconciler: Reconciler::new(),
        follows: FollowCoordinator::new(),
        session: None,
        source: None,
        change_tx: change_tx.clone(),
        resolve_tx,
    };
    tokio::task::spawn_local(actor.run(cmd_rx, resolve_rx));
    FeedHandle { tx: cmd_tx, change_tx }
}

// ============================================================================
// Tests
// ============================================================================
