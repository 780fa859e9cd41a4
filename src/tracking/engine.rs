use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::machine::SessionMachine;
use super::models::{ActivityKind, ActivitySession, ActivityState, PositionFix};
use super::source::{FixStream, PositionSource};
use crate::config::TrackingConfig;
use crate::error::{Command, InvalidTransition, SourceError, StartError, TrackerError};

/// Read-only view published after every accepted mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    pub state: ActivityState,
    pub session: Option<Arc<ActivitySession>>,
}

type Reply<T> = oneshot::Sender<T>;

enum Request {
    Start {
        kind: ActivityKind,
        metadata: BTreeMap<String, String>,
        reply: Reply<Result<ActivitySession, StartError>>,
    },
    Pause(Reply<Result<(), InvalidTransition>>),
    Resume(Reply<Result<(), InvalidTransition>>),
    Stop(Reply<Result<ActivitySession, InvalidTransition>>),
    Reset(Reply<Result<(), InvalidTransition>>),
}

const COMMAND_CAPACITY: usize = 32;

/// Caller-side handle of a tracking engine.
///
/// All mutation happens on one spawned task; this handle only sends requests
/// and reads published snapshots. Cloning the handle shares the same engine.
#[derive(Clone)]
pub struct TrackingEngine {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<EngineSnapshot>,
}

impl TrackingEngine {
    /// Spawn the engine task on the current tokio runtime.
    pub fn spawn(
        source: Arc<dyn PositionSource>,
        clock: Arc<dyn Clock>,
        config: TrackingConfig,
    ) -> Self {
        let (requests, inbox) = mpsc::channel(COMMAND_CAPACITY);
        let (publisher, snapshots) = watch::channel(EngineSnapshot::default());

        let worker = EngineWorker {
            machine: SessionMachine::new(config),
            source,
            clock,
            inbox,
            publisher,
            fixes: None,
            ticker: None,
            updates_on: false,
        };
        tokio::spawn(worker.run());

        Self {
            requests,
            snapshots,
        }
    }

    pub async fn start(&self, kind: ActivityKind) -> Result<ActivitySession, StartError> {
        self.start_with_metadata(kind, BTreeMap::new()).await
    }

    pub async fn start_with_metadata(
        &self,
        kind: ActivityKind,
        metadata: BTreeMap<String, String>,
    ) -> Result<ActivitySession, StartError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request::Start {
                kind,
                metadata,
                reply,
            })
            .await
            .map_err(|_| StartError::EngineClosed)?;
        response.await.map_err(|_| StartError::EngineClosed)?
    }

    pub async fn pause(&self) -> Result<(), TrackerError> {
        self.call(Request::Pause).await
    }

    pub async fn resume(&self) -> Result<(), TrackerError> {
        self.call(Request::Resume).await
    }

    /// Finish the session and return the final record.
    pub async fn stop(&self) -> Result<ActivitySession, TrackerError> {
        self.call(Request::Stop).await
    }

    pub async fn reset(&self) -> Result<(), TrackerError> {
        self.call(Request::Reset).await
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> ActivityState {
        self.snapshots.borrow().state
    }

    /// Receiver notified after every accepted mutation.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshots.clone()
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(Reply<Result<T, InvalidTransition>>) -> Request,
    ) -> Result<T, TrackerError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(request(reply))
            .await
            .map_err(|_| TrackerError::EngineClosed)?;
        let result = response.await.map_err(|_| TrackerError::EngineClosed)?;
        Ok(result?)
    }
}

/// The single owner of the state machine. Requests, fixes and ticks are
/// handled one at a time, in arrival order.
struct EngineWorker {
    machine: SessionMachine,
    source: Arc<dyn PositionSource>,
    clock: Arc<dyn Clock>,
    inbox: mpsc::Receiver<Request>,
    publisher: watch::Sender<EngineSnapshot>,
    fixes: Option<FixStream>,
    ticker: Option<Interval>,
    updates_on: bool,
}

impl EngineWorker {
    async fn run(mut self) {
        debug!("Tracking engine started");

        loop {
            tokio::select! {
                biased;

                request = self.inbox.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
                item = next_fix(&mut self.fixes) => match item {
                    Some(Ok(fix)) => self.handle_fix(fix),
                    Some(Err(fault)) => self.handle_fault(fault),
                    None => {
                        warn!("Position stream ended, continuing with stale data");
                        self.fixes = None;
                    }
                },
                _ = next_tick(&mut self.ticker) => self.handle_tick(),
            }
        }

        self.release_source().await;
        debug!("Tracking engine stopped");
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::Start {
                kind,
                metadata,
                reply,
            } => {
                let result = self.start(kind, metadata).await;
                let _ = reply.send(result);
            }
            Request::Pause(reply) => {
                let result = self.machine.pause(self.clock.now());
                if result.is_ok() {
                    self.ticker = None;
                    self.publish();
                }
                let _ = reply.send(self.reported(Command::Pause, result));
            }
            Request::Resume(reply) => {
                let result = self.machine.resume(self.clock.now());
                if result.is_ok() {
                    self.ticker = Some(self.new_ticker());
                    self.publish();
                }
                let _ = reply.send(self.reported(Command::Resume, result));
            }
            Request::Stop(reply) => {
                let result = self.machine.stop(self.clock.now());
                if result.is_ok() {
                    self.ticker = None;
                    self.release_source().await;
                    self.publish();
                }
                let _ = reply.send(self.reported(Command::Stop, result));
            }
            Request::Reset(reply) => {
                let result = self.machine.reset();
                if result.is_ok() {
                    self.publish();
                }
                let _ = reply.send(self.reported(Command::Reset, result));
            }
        }
    }

    async fn start(
        &mut self,
        kind: ActivityKind,
        metadata: BTreeMap<String, String>,
    ) -> Result<ActivitySession, StartError> {
        self.machine.guard(Command::Start)?;

        let policy = self.machine.config().acquisition.clone();
        let fix = policy.acquire(self.source.as_ref()).await?;
        self.updates_on = true;

        // Subscribe before opening the session so no fix after the anchor is missed.
        self.fixes = Some(self.source.subscribe());
        let now = self.clock.now();
        let session = self.machine.begin(kind, &fix, now, metadata)?.clone();
        self.ticker = Some(self.new_ticker());
        self.publish();

        Ok(session)
    }

    fn handle_fix(&mut self, fix: PositionFix) {
        match self.machine.on_fix(&fix, self.clock.now()) {
            Some(outcome) if outcome.is_accepted() => self.publish(),
            Some(_) => {}
            None => debug!("Fix ignored, session is not running"),
        }
    }

    fn handle_fault(&self, fault: SourceError) {
        warn!("Position stream fault ignored: {}", fault);
    }

    fn handle_tick(&mut self) {
        if self.machine.on_tick(self.clock.now()) {
            self.publish();
        }
    }

    async fn release_source(&mut self) {
        self.fixes = None;
        if std::mem::take(&mut self.updates_on) {
            if let Err(e) = self.source.stop_updates().await {
                error!("Could not disable position updates: {}", e);
            }
            info!("Position updates released");
        }
    }

    fn new_ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.machine.config().tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    fn publish(&self) {
        let snapshot = EngineSnapshot {
            state: self.machine.state(),
            session: self.machine.session().cloned().map(Arc::new),
        };
        self.publisher.send_replace(snapshot);
    }

    fn reported<T>(
        &self,
        command: Command,
        result: Result<T, InvalidTransition>,
    ) -> Result<T, InvalidTransition> {
        if let Err(e) = &result {
            warn!(%command, "Rejected command: {}", e);
        }
        result
    }
}

async fn next_fix(fixes: &mut Option<FixStream>) -> Option<Result<PositionFix, SourceError>> {
    match fixes {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
