use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use super::models::PositionFix;
use crate::error::SourceError;

pub type FixStream = BoxStream<'static, Result<PositionFix, SourceError>>;

/// The host platform's positional hardware as seen by the engine.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Switch the underlying tracking hardware on.
    async fn start_updates(&self) -> Result<(), SourceError>;

    /// Switch the underlying tracking hardware off.
    async fn stop_updates(&self) -> Result<(), SourceError>;

    /// One-shot request for the current position.
    async fn current_fix(&self, timeout: Duration) -> Result<PositionFix, SourceError>;

    /// Continuous, best-effort stream of fixes. Errors on the stream are not fatal.
    fn subscribe(&self) -> FixStream;
}

const CHANNEL_CAPACITY: usize = 256;

/// A source fed by whoever owns the hardware, through `push`.
pub struct ChannelSource {
    events: broadcast::Sender<Result<PositionFix, SourceError>>,
    latest: watch::Sender<Option<PositionFix>>,
    available: AtomicBool,
    active: AtomicBool,
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSource {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (latest, _) = watch::channel(None);

        Self {
            events,
            latest,
            available: AtomicBool::new(true),
            active: AtomicBool::new(false),
        }
    }

    /// Permission/availability switch. An unavailable source refuses to start.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Deliver a fix. Returns false when tracking is switched off and the fix was dropped.
    pub fn push(&self, fix: PositionFix) -> bool {
        if !self.is_active() {
            debug!("Dropping fix, position updates are off");
            return false;
        }

        self.latest.send_replace(Some(fix.clone()));
        // No subscriber is fine, acquisition reads `latest`.
        let _ = self.events.send(Ok(fix));
        true
    }

    pub fn push_fault(&self, message: impl Into<String>) {
        let _ = self.events.send(Err(SourceError::Stream(message.into())));
    }
}

#[async_trait]
impl PositionSource for ChannelSource {
    async fn start_updates(&self) -> Result<(), SourceError> {
        if !self.is_available() {
            return Err(SourceError::Unavailable(
                "location services are disabled".to_string(),
            ));
        }

        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_updates(&self) -> Result<(), SourceError> {
        self.active.store(false, Ordering::SeqCst);
        self.latest.send_replace(None);
        Ok(())
    }

    async fn current_fix(&self, timeout: Duration) -> Result<PositionFix, SourceError> {
        if !self.is_available() {
            return Err(SourceError::Unavailable(
                "location services are disabled".to_string(),
            ));
        }

        let mut rx = self.latest.subscribe();
        // The watch guard borrows `rx`; clone the fix out before `rx` is dropped.
        let result = match tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(fix)) => fix.as_ref().cloned().ok_or(SourceError::Timeout),
            Ok(Err(_)) => Err(SourceError::Unavailable("source closed".to_string())),
            Err(_) => Err(SourceError::Timeout),
        };
        result
    }

    fn subscribe(&self) -> FixStream {
        BroadcastStream::new(self.events.subscribe())
            .map(|item| match item {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => Err(SourceError::Stream(
                    format!("subscriber lagged, {} fixes skipped", skipped),
                )),
            })
            .boxed()
    }
}
