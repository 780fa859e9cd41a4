use std::time::Duration;

use tracing::{info, warn};
use validator::Validate;

use super::models::PositionFix;
use super::source::PositionSource;
use crate::error::StartError;

/// Startup sequence that must produce an initial fix before a session opens.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct AcquisitionPolicy {
    #[validate(range(min = 1, max = 20))]
    pub attempts: u32,
    #[validate(custom(function = "crate::config::non_zero_duration"))]
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for AcquisitionPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            attempt_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl AcquisitionPolicy {
    /// Enable the source and wait for one fix.
    ///
    /// On failure the source is switched back off and no session exists.
    pub async fn acquire(&self, source: &dyn PositionSource) -> Result<PositionFix, StartError> {
        if let Err(e) = source.start_updates().await {
            warn!("Could not enable position updates: {}", e);
            return Err(StartError::SourceUnstartable(e.to_string()));
        }

        for attempt in 1..=self.attempts {
            let result = tokio::time::timeout(
                self.attempt_timeout,
                source.current_fix(self.attempt_timeout),
            )
            .await;

            match result {
                Ok(Ok(fix)) => {
                    info!(attempt, accuracy = fix.accuracy, "Initial fix acquired");
                    return Ok(fix);
                }
                Ok(Err(e)) => warn!(attempt, "Fix attempt failed: {}", e),
                Err(_) => warn!(attempt, "Fix attempt timed out"),
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        if let Err(e) = source.stop_updates().await {
            warn!("Could not disable position updates: {}", e);
        }

        Err(StartError::PositionUnavailable {
            attempts: self.attempts,
        })
    }
}
